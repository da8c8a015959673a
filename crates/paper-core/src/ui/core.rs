//! Core UI traits and types for the Paper UI system

use alloc::boxed::Box;
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::ui::tree::UiTree;

/// Represents a 2D touch point on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub fn to_point(&self) -> Point {
        Point::new(self.x as i32, self.y as i32)
    }
}

/// Generational handle to a node stored in a [`UiTree`]
///
/// A handle outlives the node it names; once the slot is reused the
/// generation no longer matches and lookups fail instead of aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Draw/hit-test priority class
///
/// Draw visits layers ascending, hit-testing visits them descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Layer {
    Background,
    Lower,
    #[default]
    Centre,
    Upper,
    Top,
    Overlay,
}

impl Layer {
    /// Every layer, lowest first
    pub const ALL: [Layer; 6] = [
        Layer::Background,
        Layer::Lower,
        Layer::Centre,
        Layer::Upper,
        Layer::Top,
        Layer::Overlay,
    ];
}

/// Events delivered to button and icon callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
    Released,
    Hold,
    DoubleTap,
}

/// Callback invoked when a button or icon is tapped
///
/// Receives the tree so it can mutate other nodes, the id of the tapped
/// node and the event. Returning `true` asks for a display update.
pub type TouchCallback = Box<dyn FnMut(&mut UiTree, NodeId, ButtonEvent) -> bool>;

/// Running bounding box of changed rectangles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirtyRegion {
    pub bounds: Rectangle,
    pub is_dirty: bool,
}

impl Default for DirtyRegion {
    fn default() -> Self {
        Self::empty()
    }
}

impl DirtyRegion {
    pub fn new(bounds: Rectangle) -> Self {
        Self {
            bounds,
            is_dirty: !is_empty(&bounds),
        }
    }

    pub fn empty() -> Self {
        Self {
            bounds: Rectangle::zero(),
            is_dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Expand this dirty region to include another region
    ///
    /// Empty rectangles are ignored so they never drag the origin to (0, 0).
    pub fn expand_to_include(&mut self, other: Rectangle) {
        if is_empty(&other) {
            return;
        }
        if !self.is_dirty {
            self.bounds = other;
            self.is_dirty = true;
        } else {
            self.bounds = union(&self.bounds, &other);
        }
    }

    /// The accumulated rectangle, or the empty rectangle if nothing changed
    pub fn area(&self) -> Rectangle {
        if self.is_dirty {
            self.bounds
        } else {
            Rectangle::zero()
        }
    }
}

/// Capability interface for widgets that generate their own pixels
pub trait Drawable {
    /// Draw the content in local coordinates (origin at the node's corner)
    fn draw<D: DrawTarget<Color = Gray4>>(&self, target: &mut D) -> Result<(), D::Error>;

    /// Natural size of the content
    fn measure(&self) -> Size;

    /// Check if the content changed since the last render pass
    fn is_changed(&self) -> bool;
}

// ----------------------------------------------------------------------------
// Rectangle helpers
// ----------------------------------------------------------------------------

pub(crate) fn is_empty(rect: &Rectangle) -> bool {
    rect.size.width == 0 || rect.size.height == 0
}

fn right(rect: &Rectangle) -> i32 {
    rect.top_left.x + rect.size.width as i32
}

fn bottom(rect: &Rectangle) -> i32 {
    rect.top_left.y + rect.size.height as i32
}

fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Rectangle {
    if right <= left || bottom <= top {
        return Rectangle::zero();
    }
    Rectangle::new(
        Point::new(left, top),
        Size::new((right - left) as u32, (bottom - top) as u32),
    )
}

/// Smallest rectangle covering both inputs
pub(crate) fn union(a: &Rectangle, b: &Rectangle) -> Rectangle {
    from_edges(
        a.top_left.x.min(b.top_left.x),
        a.top_left.y.min(b.top_left.y),
        right(a).max(right(b)),
        bottom(a).max(bottom(b)),
    )
}

/// Overlap of two rectangles, empty when they only touch
pub(crate) fn intersection(a: &Rectangle, b: &Rectangle) -> Rectangle {
    from_edges(
        a.top_left.x.max(b.top_left.x),
        a.top_left.y.max(b.top_left.y),
        right(a).min(right(b)),
        bottom(a).min(bottom(b)),
    )
}

/// Strict overlap test: rectangles sharing only an edge do not overlap
pub(crate) fn overlaps(a: &Rectangle, b: &Rectangle) -> bool {
    !is_empty(&intersection(a, b))
}

pub(crate) fn contains_rect(outer: &Rectangle, inner: &Rectangle) -> bool {
    !is_empty(inner)
        && inner.top_left.x >= outer.top_left.x
        && inner.top_left.y >= outer.top_left.y
        && right(inner) <= right(outer)
        && bottom(inner) <= bottom(outer)
}

pub(crate) fn translate(rect: &Rectangle, by: Point) -> Rectangle {
    Rectangle::new(rect.top_left + by, rect.size)
}

/// Rectangle of a node in its own coordinate space
pub(crate) fn local(rect: &Rectangle) -> Rectangle {
    Rectangle::new(Point::zero(), rect.size)
}
