//! Greyscale palette
//!
//! E-paper panels show 16 grey levels. Values use the `Gray4` luma
//! convention: 0 is full black ink, 15 is bare white paper.

use embedded_graphics::pixelcolor::Gray4;

pub const BLACK: Gray4 = Gray4::new(0);

/// Strong secondary ink, used for outlines on light fills
pub const DARK_GREY: Gray4 = Gray4::new(4);

pub const GREY: Gray4 = Gray4::new(8);

/// Button and title bar fill
pub const LIGHT_GREY: Gray4 = Gray4::new(12);

pub const WHITE: Gray4 = Gray4::new(15);
