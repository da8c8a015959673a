//! Styling system for UI elements
//!
//! - [`colors`] - Greyscale palette for 16-level e-paper panels
//! - [`layout`] - Padding around widget content
//! - [`style`] - Fill and outline decoration shared by labels and frames

pub mod colors;
pub mod layout;
pub mod style;

pub use colors::{BLACK, DARK_GREY, GREY, LIGHT_GREY, WHITE};
pub use layout::Padding;
pub use style::{Decoration, Outline};
