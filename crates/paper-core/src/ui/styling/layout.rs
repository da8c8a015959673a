//! Padding and the content box it leaves inside a widget

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Space between a widget's outline and its content, per edge
///
/// ```ignore
/// // Caption strip: 4px all round
/// let caption = Padding::all(4);
///
/// // Title bar: tight vertically, roomier horizontally
/// let title = Padding::symmetric(4, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Padding {
    pub fn all(value: u32) -> Self {
        Self::symmetric(value, value)
    }

    pub fn symmetric(vertical: u32, horizontal: u32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    /// Left plus right
    pub fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    /// Top plus bottom
    pub fn vertical(&self) -> u32 {
        self.top + self.bottom
    }

    /// Area left for content in a widget of `size` with a `border` px
    /// outline, in the widget's local coordinates.
    ///
    /// Collapses to zero width or height when the padding does not fit.
    pub fn content_box(&self, size: Size, border: u32) -> Rectangle {
        let origin = Point::new((self.left + border) as i32, (self.top + border) as i32);
        let width = size
            .width
            .saturating_sub(self.horizontal() + 2 * border);
        let height = size.height.saturating_sub(self.vertical() + 2 * border);
        Rectangle::new(origin, Size::new(width, height))
    }
}
