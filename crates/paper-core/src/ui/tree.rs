//! Arena-backed node tree and the render pipeline
//!
//! Containers own their children through [`NodeId`] handles stored in the
//! arena; each child keeps its parent's id for upward traversal only
//! (absolute positions, exposure bubbling). Removing a container frees its
//! whole subtree.
//!
//! One frame of the pipeline, driven by the display manager:
//! 1. [`UiTree::apply_layout`] resolves pending autosizes.
//! 2. [`UiTree::update_area`] aggregates changed rectangles bottom-up.
//! 3. [`UiTree::render`] redraws changed nodes into their surfaces and
//!    copies or packs them upward until they reach the device raster.
//! 4. [`UiTree::reset_status`] clears the per-frame flags.

use alloc::vec::Vec;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::error::UiError;
use crate::framebuffer::DeviceRaster;
use crate::ui::components::{Button, Image, Label};
use crate::ui::core::{
    ButtonEvent, Layer, NodeId, contains_rect, intersection, is_empty, translate,
};
use crate::ui::layouts::Frame;
use crate::ui::node::Node;
use crate::ui::widget::Widget;

struct Entry {
    parent: Option<NodeId>,
    widget: Widget,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Owner of every node in a UI
#[derive(Default)]
pub struct UiTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl UiTree {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------

    fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    fn alloc(&mut self, entry: Entry) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        NodeId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Free `id` and its subtree.
    fn release(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.release(child);
        }
        if let Some(slot) = self.slots.get_mut(id.index as usize)
            && slot.generation == id.generation
            && slot.entry.is_some()
        {
            slot.entry = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    /// Insert a parentless node, usually the device-backed root.
    pub fn insert_root(&mut self, widget: impl Into<Widget>) -> NodeId {
        self.alloc(Entry {
            parent: None,
            widget: widget.into(),
        })
    }

    /// Append `widget` as the last child of `parent`.
    pub fn add(&mut self, parent: NodeId, widget: impl Into<Widget>) -> Result<NodeId, UiError> {
        let index = self.children(parent).len();
        self.insert(parent, index, widget)
    }

    /// Insert `widget` at `index` among the children of `parent`.
    ///
    /// Insertion order breaks ties between children on the same layer.
    pub fn insert(
        &mut self,
        parent: NodeId,
        index: usize,
        widget: impl Into<Widget>,
    ) -> Result<NodeId, UiError> {
        match self.widget(parent) {
            None => return Err(UiError::StaleNode(parent)),
            Some(w) if w.frame().is_none() => return Err(UiError::NotAContainer(parent)),
            Some(_) => {}
        }

        let mut widget = widget.into();
        widget.node_mut().parent_changed = true;
        let id = self.alloc(Entry {
            parent: Some(parent),
            widget,
        });

        if let Some(frame) = self.frame_mut(parent) {
            let index = index.min(frame.children.len());
            frame.children.insert(index, id);
            frame.items_changed = true;
        }
        Ok(id)
    }

    /// Remove a node and its subtree, exposing the area it covered.
    pub fn remove(&mut self, id: NodeId) -> Result<(), UiError> {
        let entry = self.entry(id).ok_or(UiError::StaleNode(id))?;
        let parent = entry.parent;
        let node = entry.widget.node();
        let (bounds, visible) = (node.bounds, node.visible);

        if let Some(parent) = parent {
            if let Some(frame) = self.frame_mut(parent) {
                frame.children.retain(|&child| child != id);
                frame.items_changed = true;
            }
            if visible {
                self.expose(parent, bounds);
            }
        }
        self.release(id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    pub fn widget(&self, id: NodeId) -> Option<&Widget> {
        self.entry(id).map(|entry| &entry.widget)
    }

    pub fn widget_mut(&mut self, id: NodeId) -> Option<&mut Widget> {
        self.entry_mut(id).map(|entry| &mut entry.widget)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.widget(id).map(Widget::node)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.widget_mut(id).map(Widget::node_mut)
    }

    pub fn frame(&self, id: NodeId) -> Option<&Frame> {
        self.widget(id).and_then(Widget::frame)
    }

    pub fn frame_mut(&mut self, id: NodeId) -> Option<&mut Frame> {
        self.widget_mut(id).and_then(Widget::frame_mut)
    }

    /// Text of a label or button
    pub fn label_mut(&mut self, id: NodeId) -> Option<&mut Label> {
        self.widget_mut(id).and_then(Widget::label_mut)
    }

    pub fn button_mut(&mut self, id: NodeId) -> Option<&mut Button> {
        match self.widget_mut(id) {
            Some(Widget::Button(button)) => Some(button),
            _ => None,
        }
    }

    pub fn image_mut(&mut self, id: NodeId) -> Option<&mut Image> {
        match self.widget_mut(id) {
            Some(Widget::Image(image)) => Some(image),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).and_then(|entry| entry.parent)
    }

    /// Children in insertion order; empty for leaves and stale ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.frame(id) {
            Some(frame) => &frame.children,
            None => &[],
        }
    }

    /// Topmost ancestor of `id` (itself if parentless)
    pub fn top_level(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Sum of ancestor origins up to the root
    pub fn absolute_origin(&self, id: NodeId) -> Point {
        let mut origin = Point::zero();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(entry) = self.entry(node_id) else {
                break;
            };
            origin += entry.widget.node().bounds.top_left;
            current = entry.parent;
        }
        origin
    }

    pub fn absolute_bounds(&self, id: NodeId) -> Rectangle {
        let size = self.node(id).map_or(Size::zero(), |node| node.bounds.size);
        Rectangle::new(self.absolute_origin(id), size)
    }

    pub fn is_device_backed(&self, id: NodeId) -> bool {
        self.frame(id).is_some_and(Frame::is_device_backed)
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn show(&mut self, id: NodeId) -> Result<(), UiError> {
        self.node_mut(id).ok_or(UiError::StaleNode(id))?.show();
        Ok(())
    }

    /// Hide a visible node and expose what it covered on the top level.
    pub fn hide(&mut self, id: NodeId) -> Result<(), UiError> {
        let node = self.node_mut(id).ok_or(UiError::StaleNode(id))?;
        if node.hide() {
            let top = self.top_level(id);
            let top_origin = self.node(top).map_or(Point::zero(), |n| n.bounds.top_left);
            let area = translate(&self.absolute_bounds(id), -top_origin);
            self.expose(top, area);
        }
        Ok(())
    }

    /// Move a node, repainting both the vacated and the covered area.
    ///
    /// With `relative` set, `(x, y)` is an offset from the current position.
    pub fn move_node(&mut self, id: NodeId, x: i32, y: i32, relative: bool) -> Result<(), UiError> {
        let old = self.node(id).ok_or(UiError::StaleNode(id))?.bounds;
        let parent = self.parent(id);
        if let Some(parent) = parent {
            self.expose(parent, old);
        }

        let top_left = if relative {
            old.top_left + Point::new(x, y)
        } else {
            Point::new(x, y)
        };
        let new = Rectangle::new(top_left, old.size);
        if let Some(node) = self.node_mut(id) {
            node.set_bounds(new);
            node.parent_changed = true;
        }

        if let Some(parent) = parent {
            if let Some(frame) = self.frame_mut(parent) {
                frame.items_changed = true;
            }
            self.expose(parent, new);
        }
        Ok(())
    }

    pub fn set_layer(&mut self, id: NodeId, layer: Layer) -> Result<(), UiError> {
        let node = self.node_mut(id).ok_or(UiError::StaleNode(id))?;
        if node.layer == layer {
            return Ok(());
        }
        node.layer = layer;
        let bounds = node.bounds;
        if let Some(parent) = self.parent(id) {
            if let Some(frame) = self.frame_mut(parent) {
                frame.items_changed = true;
            }
            self.expose(parent, bounds);
        }
        Ok(())
    }

    /// Force a repaint of `area` (local to `id`).
    ///
    /// Device-backed and parentless nodes deliver the exposure to their
    /// children; anything else bubbles it to the parent, translated.
    pub fn expose(&mut self, id: NodeId, area: Rectangle) {
        if is_empty(&area) {
            return;
        }
        let Some(entry) = self.entry(id) else {
            return;
        };

        match entry.parent {
            Some(parent) if !self.is_device_backed(id) => {
                let origin = entry.widget.node().bounds.top_left;
                self.expose(parent, translate(&area, origin));
            }
            _ => self.deliver_exposure(id, area),
        }
    }

    /// Record an exposure on `id` and, for device-backed frames, on every
    /// visible child it touches.
    pub(crate) fn deliver_exposure(&mut self, id: NodeId, area: Rectangle) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.expose(area);

        if !self.is_device_backed(id) && self.parent(id).is_some() {
            return;
        }

        for child in self.children(id).to_vec() {
            let Some(node) = self.node(child) else {
                continue;
            };
            if !node.visible || !node.initialised {
                continue;
            }
            let bounds = node.bounds;
            let hit = if contains_rect(&area, &bounds) {
                bounds
            } else {
                intersection(&area, &bounds)
            };
            if !is_empty(&hit) {
                self.deliver_exposure(child, translate(&hit, -bounds.top_left));
            }
        }
    }

    /// Resolve pending autosizes in the subtree rooted at `id`.
    pub fn apply_layout(&mut self, id: NodeId) {
        self.layout_node(id);
        for child in self.children(id).to_vec() {
            self.apply_layout(child);
        }
    }

    /// Resolve a pending autosize on a single node.
    pub fn layout_node(&mut self, id: NodeId) {
        let Some(label) = self.label_mut(id) else {
            return;
        };
        if let Some(old) = label.relayout()
            && let Some(parent) = self.parent(id)
        {
            self.expose(parent, old);
        }
    }

    // ------------------------------------------------------------------
    // Change predicates
    // ------------------------------------------------------------------

    /// Content needs regenerating: leaf content changed, or for containers
    /// membership, visibility or any descendant changed.
    pub fn is_updated(&self, id: NodeId) -> bool {
        let Some(widget) = self.widget(id) else {
            return false;
        };
        match widget.frame() {
            None => widget.content_changed(),
            Some(frame) => {
                let node = &frame.node;
                frame.items_changed
                    || node.content_changed
                    || node.visibility_changed
                    || node.parent_changed
                    || (frame.is_device_backed() && node.exposed)
                    || frame
                        .children
                        .iter()
                        .any(|&child| self.is_object_changed(child))
            }
        }
    }

    /// A child that contributes to its container's update area
    pub fn is_object_changed(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        node.initialised
            && ((self.is_updated(id) && node.visible)
                || node.visibility_changed
                || node.parent_changed
                || (node.exposed && node.visible))
    }

    /// Whether the parent repaints under this node this frame, so the
    /// node must be recomposited even if unchanged.
    pub(crate) fn parent_repaints(&self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if self.is_device_backed(parent) {
            self.node(parent).is_some_and(|p| {
                p.visibility_changed || p.parent_changed || p.content_changed
            })
        } else {
            self.is_updated(parent)
        }
    }

    /// The node's whole rectangle must be repainted
    pub(crate) fn repaints_fully(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        self.is_updated(id)
            || node.visibility_changed
            || node.parent_changed
            || self.parent_repaints(id)
    }

    /// The node's pixels must be pushed upward this frame
    pub fn visual_change(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let parent_flipped = self
            .parent(id)
            .and_then(|parent| self.node(parent))
            .is_some_and(|parent| parent.visibility_changed);

        node.visibility_changed
            || node.parent_changed
            || self.is_updated(id)
            || node.exposed
            || parent_flipped
            || self.parent_repaints(id)
    }

    // ------------------------------------------------------------------
    // Render pass
    // ------------------------------------------------------------------

    /// Compute and store the node's update area (local coordinates).
    pub fn update_area(&mut self, id: NodeId) -> Rectangle {
        let area = if self.frame(id).is_some() {
            self.frame_update_area(id)
        } else {
            self.leaf_update_area(id)
        };
        if let Some(node) = self.node_mut(id) {
            node.update_area = area;
        }
        area
    }

    fn leaf_update_area(&self, id: NodeId) -> Rectangle {
        let Some(node) = self.node(id) else {
            return Rectangle::zero();
        };
        if self.repaints_fully(id) {
            node.local_bounds()
        } else if node.exposed {
            node.expose_area
        } else {
            Rectangle::zero()
        }
    }

    /// Redraw the subtree at `id` and push changed pixels upward.
    pub fn render(&mut self, id: NodeId, raster: &mut DeviceRaster) {
        let Some(node) = self.node(id) else {
            return;
        };
        if !node.initialised || !node.visible {
            return;
        }

        let area = self.update_area(id);
        let updated = self.is_updated(id);
        let visual_change = self.visual_change(id);

        if updated {
            if self.frame(id).is_some() {
                self.draw_frame(id, raster);
            } else if let Some(widget) = self.widget_mut(id) {
                widget.paint();
            }
        }

        if visual_change {
            self.propagate(id, area, raster);
        }

        if let Some(node) = self.node_mut(id) {
            node.drawn = true;
        }
    }

    /// Copy into the parent's surface, or pack into the device raster when
    /// the parent is absent or device-backed.
    fn propagate(&mut self, id: NodeId, area: Rectangle, raster: &mut DeviceRaster) {
        if is_empty(&area) {
            return;
        }

        match self.parent(id) {
            Some(parent) if !self.is_device_backed(parent) => {
                let Some(mut dest) = self.node_mut(parent).and_then(|p| p.surface.take()) else {
                    debug!("Parent of {:?} has no surface, skipping copy", id);
                    return;
                };
                if let Some(node) = self.node(id)
                    && let Some(surface) = node.surface.as_ref()
                {
                    surface.blit_into(&mut dest, node.bounds.top_left);
                }
                if let Some(parent) = self.node_mut(parent) {
                    parent.surface = Some(dest);
                }
            }
            _ => {
                let origin = self.absolute_origin(id);
                if let Some(surface) = self.node(id).and_then(|node| node.surface.as_ref()) {
                    raster.pack_surface(surface, &area, origin);
                }
            }
        }
    }

    /// End-of-frame reset of the subtree at `id`.
    pub fn reset_status(&mut self, id: NodeId) {
        if let Some(widget) = self.widget_mut(id) {
            if let Some(frame) = widget.frame_mut()
                && frame.node.drawn
            {
                frame.items_changed = false;
            }
            widget.node_mut().reset_status();
        }
        for child in self.children(id).to_vec() {
            self.reset_status(child);
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Deliver a tap at `point` (local to `id`).
    ///
    /// Returns `true` when a callback asked for a display update.
    pub fn touch_event(&mut self, id: NodeId, point: Point) -> bool {
        let Some(widget) = self.widget(id) else {
            return false;
        };
        let node = widget.node();
        if !node.initialised || !node.visible {
            return false;
        }

        match widget {
            Widget::Button(_) | Widget::Icon(_) => {
                self.invoke_callback(id, ButtonEvent::Released)
            }
            Widget::Frame(_) | Widget::Modal(_) => self.hit_test(id, point),
            _ => false,
        }
    }

    fn invoke_callback(&mut self, id: NodeId, event: ButtonEvent) -> bool {
        let Some(mut callback) = self.widget_mut(id).and_then(Widget::take_callback) else {
            return false;
        };
        let redraw = callback(self, id, event);
        if let Some(widget) = self.widget_mut(id) {
            widget.restore_callback(callback);
        }
        redraw
    }
}
