//! Widgets that draw their own content
//!
//! - [`label`] - Wrapped, aligned text with decoration
//! - [`button`] - Tappable autosized label
//! - [`image`] - Packed 4-bit bitmap
//! - [`icon`] - Tappable image with a caption strip
//! - [`text`] - Fonts, alignment and word wrap shared by labels

pub mod button;
pub mod icon;
pub mod image;
pub mod label;
pub mod text;

pub use button::Button;
pub use icon::Icon;
pub use image::Image;
pub use label::Label;
pub use text::{HAlign, TextSize, VAlign};
