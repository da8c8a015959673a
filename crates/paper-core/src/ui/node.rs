//! Shared geometry and dirty-tracking component
//!
//! Every widget embeds one `Node`. It carries the rectangle relative to the
//! parent, the layer, the visibility and change flags that drive the
//! render pass, and the pixel surface the widget draws into.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::ui::core::{DirtyRegion, Layer, intersection, is_empty, local};
use crate::ui::surface::Surface;

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) bounds: Rectangle,
    pub(crate) layer: Layer,
    pub(crate) visible: bool,
    pub(crate) initialised: bool,
    pub(crate) content_changed: bool,
    pub(crate) visibility_changed: bool,
    pub(crate) parent_changed: bool,
    pub(crate) exposed: bool,
    pub(crate) drawn: bool,
    /// Union of exposures received this frame, local coordinates
    pub(crate) expose_area: Rectangle,
    /// Last computed repaint rectangle, local coordinates
    pub(crate) update_area: Rectangle,
    /// `None` for device-backed nodes, which draw straight to the raster
    pub(crate) surface: Option<Surface>,
}

impl Node {
    /// Create a node with its own surface sized to `bounds`.
    pub fn new(bounds: Rectangle) -> Self {
        Self {
            surface: Some(Surface::new(bounds.size)),
            ..Self::device_backed(bounds)
        }
    }

    /// Create a node without a surface.
    pub fn device_backed(bounds: Rectangle) -> Self {
        Self {
            bounds,
            layer: Layer::default(),
            visible: true,
            initialised: true,
            content_changed: true,
            visibility_changed: false,
            parent_changed: false,
            exposed: false,
            drawn: false,
            expose_area: Rectangle::zero(),
            update_area: Rectangle::zero(),
            surface: None,
        }
    }

    /// Rectangle relative to the parent's origin
    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// Rectangle in the node's own coordinate space
    pub fn local_bounds(&self) -> Rectangle {
        local(&self.bounds)
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn content_changed(&self) -> bool {
        self.content_changed
    }

    pub fn visibility_changed(&self) -> bool {
        self.visibility_changed
    }

    pub fn parent_changed(&self) -> bool {
        self.parent_changed
    }

    pub fn is_exposed(&self) -> bool {
        self.exposed
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }

    pub fn expose_area(&self) -> Rectangle {
        self.expose_area
    }

    pub fn update_area(&self) -> Rectangle {
        self.update_area
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Check if a point in parent coordinates falls inside the node.
    pub fn contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }

    /// True when any flag asks for the node to be redrawn or repacked
    pub fn is_dirty(&self) -> bool {
        self.content_changed || self.visibility_changed || self.parent_changed || self.exposed
    }

    pub(crate) fn mark_changed(&mut self) {
        self.content_changed = true;
    }

    /// Give up on rendering this node (missing asset, bad bitmap).
    pub(crate) fn mark_uninitialised(&mut self) {
        self.initialised = false;
    }

    pub(crate) fn show(&mut self) {
        self.visible = true;
        self.visibility_changed = true;
    }

    /// Returns `true` if the node was visible before the call.
    pub(crate) fn hide(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;
        self.visibility_changed = true;
        true
    }

    /// Record an exposure in local coordinates, clamped to the node.
    pub(crate) fn expose(&mut self, area: Rectangle) {
        let area = intersection(&area, &self.local_bounds());
        if is_empty(&area) {
            return;
        }
        let mut region = DirtyRegion::new(self.expose_area);
        region.expand_to_include(area);
        self.expose_area = region.area();
        self.exposed = true;
    }

    /// Move and/or resize; the surface is reallocated on a size change.
    pub(crate) fn set_bounds(&mut self, bounds: Rectangle) {
        let resized = bounds.size != self.bounds.size;
        self.bounds = bounds;
        self.expose_area = intersection(&self.expose_area, &self.local_bounds());
        if resized && let Some(surface) = self.surface.as_mut() {
            surface.resize(bounds.size);
        }
    }

    /// End-of-frame flag reset.
    ///
    /// Content and exposure flags only clear if the node was actually drawn
    /// this pass, so hidden nodes keep pending changes for when they show.
    pub(crate) fn reset_status(&mut self) {
        if self.drawn {
            self.content_changed = false;
            self.exposed = false;
            self.expose_area = Rectangle::zero();
            self.drawn = false;
        }
        self.parent_changed = false;
        self.visibility_changed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Node {
        Node::new(Rectangle::new(Point::new(10, 10), Size::new(40, 20)))
    }

    #[test]
    fn test_new_node_is_dirty_and_allocated() {
        let node = node();
        assert!(node.content_changed(), "A fresh node needs its first draw");
        assert!(node.is_visible() && node.is_initialised());
        assert_eq!(node.surface().map(|s| s.size()), Some(Size::new(40, 20)));
    }

    #[test]
    fn test_reset_status_clears_drawn_node() {
        let mut node = node();
        node.show();
        node.expose(Rectangle::new(Point::zero(), Size::new(5, 5)));
        node.drawn = true;

        node.reset_status();
        assert!(!node.is_dirty(), "All flags clear after a drawn frame");
        assert!(!node.is_drawn());

        node.reset_status();
        assert!(!node.is_dirty(), "Resetting twice keeps everything clear");
        assert!(!node.is_drawn());
    }

    #[test]
    fn test_reset_status_keeps_content_of_undrawn_node() {
        let mut node = node();
        node.hide();
        node.reset_status();
        assert!(node.content_changed(), "Undrawn content stays pending");
        assert!(!node.visibility_changed(), "Visibility flag always clears");
    }

    #[test]
    fn test_hide_only_when_visible() {
        let mut node = node();
        assert!(node.hide());
        node.reset_status();
        assert!(!node.hide(), "Hiding a hidden node is a no-op");
        assert!(!node.visibility_changed());
    }

    #[test]
    fn test_exposure_is_clamped_and_accumulated() {
        let mut node = node();
        node.expose(Rectangle::new(Point::new(-5, -5), Size::new(10, 10)));
        node.expose(Rectangle::new(Point::new(30, 15), Size::new(50, 50)));
        assert!(node.is_exposed());
        assert_eq!(
            node.expose_area(),
            Rectangle::new(Point::zero(), Size::new(40, 20))
        );
    }
}
