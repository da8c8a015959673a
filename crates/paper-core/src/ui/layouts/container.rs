//! Frame container: layered children, occlusion and hit-testing

use alloc::vec::Vec;
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::trace;

use crate::framebuffer::DeviceRaster;
use crate::ui::core::{
    DirtyRegion, Layer, NodeId, intersection, is_empty, overlaps, translate,
};
use crate::ui::node::Node;
use crate::ui::styling::{DARK_GREY, Decoration, Outline, WHITE};
use crate::ui::tree::UiTree;

/// Outline thickness of a default frame
const FRAME_OUTLINE: u32 = 2;

/// Corner radius of a default frame
const FRAME_RADIUS: u32 = 10;

/// Column granularity of device pushes, in pixels
const PUSH_ALIGN: u32 = 4;

/// Container node
///
/// Children are stored in insertion order; drawing is stable-sorted by
/// layer so equal layers keep that order. A buffered frame composites its
/// children into its own surface. A device-backed frame has no surface and
/// its children pack straight into the device raster.
pub struct Frame {
    pub(crate) node: Node,
    pub(crate) children: Vec<NodeId>,
    /// Membership or arrangement changed this frame
    pub(crate) items_changed: bool,
    device_backed: bool,
    background: Gray4,
    decoration: Decoration,
}

impl Frame {
    /// Buffered frame with a rounded dark grey outline.
    pub fn new(bounds: Rectangle) -> Self {
        Self {
            node: Node::new(bounds),
            children: Vec::new(),
            items_changed: false,
            device_backed: false,
            background: WHITE,
            decoration: Decoration::none().with_outline(Outline::new(
                DARK_GREY,
                FRAME_OUTLINE,
                FRAME_RADIUS,
            )),
        }
    }

    /// Frame drawing directly into the device raster (the screen root).
    pub fn device_backed(bounds: Rectangle) -> Self {
        Self {
            node: Node::device_backed(bounds),
            children: Vec::new(),
            items_changed: false,
            device_backed: true,
            background: WHITE,
            decoration: Decoration::none(),
        }
    }

    pub fn with_background(mut self, colour: Gray4) -> Self {
        self.background = colour;
        self
    }

    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decoration = decoration;
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.node.layer = layer;
        self
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_device_backed(&self) -> bool {
        self.device_backed
    }

    pub fn background(&self) -> Gray4 {
        self.background
    }

    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    pub fn set_background(&mut self, colour: Gray4) {
        self.background = colour;
        self.node.mark_changed();
    }

    pub fn set_decoration(&mut self, decoration: Decoration) {
        self.decoration = decoration;
        self.node.mark_changed();
    }

    /// Clear the surface to the background and lay down the fill.
    pub(crate) fn paint_background(&mut self) {
        let bounds = self.node.local_bounds();
        if let Some(surface) = self.node.surface.as_mut() {
            surface.fill(self.background.luma());
            let _ = self.decoration.draw_fill(bounds, surface);
        }
    }

    /// Stroke the outline over the composited children.
    pub(crate) fn paint_outline(&mut self) {
        let bounds = self.node.local_bounds();
        if let Some(surface) = self.node.surface.as_mut() {
            let _ = self.decoration.draw_outline(bounds, surface);
        }
    }
}

/// Widen `area` to a multiple of [`PUSH_ALIGN`] columns, shifting left if
/// the widened rectangle would run past `limit`.
fn align_columns(area: Rectangle, limit: u32) -> Rectangle {
    if is_empty(&area) {
        return area;
    }
    let width = area.size.width.div_ceil(PUSH_ALIGN) * PUSH_ALIGN;
    let overflow = area.top_left.x + width as i32 - limit as i32;
    let x = if overflow > 0 {
        (area.top_left.x - overflow).max(0)
    } else {
        area.top_left.x
    };
    Rectangle::new(Point::new(x, area.top_left.y), Size::new(width, area.size.height))
}

impl UiTree {
    // ------------------------------------------------------------------
    // Update area
    // ------------------------------------------------------------------

    /// Local rectangle a frame needs to repaint this pass.
    pub(crate) fn frame_update_area(&mut self, id: NodeId) -> Rectangle {
        let updated = self.is_updated(id);
        let parent_repaints = self.parent_repaints(id);
        let device_backed = self.is_device_backed(id);
        let Some(node) = self.node(id) else {
            return Rectangle::zero();
        };
        let local_bounds = node.local_bounds();

        // A buffered parent clears its surface before recompositing, so an
        // unchanged frame still has to copy itself back.
        if !updated && !node.exposed && !parent_repaints {
            return Rectangle::zero();
        }

        let area = if node.visibility_changed
            || node.parent_changed
            || node.content_changed
            || parent_repaints
        {
            local_bounds
        } else {
            let own_exposure = if node.exposed {
                node.expose_area
            } else {
                Rectangle::zero()
            };

            self.scan_occlusion(id);
            if device_backed {
                self.cascade_exposures(id);
            }

            let mut region = DirtyRegion::new(own_exposure);
            for child in self.children(id).to_vec() {
                if !self.is_object_changed(child) {
                    continue;
                }
                let origin = self.node(child).map_or(Point::zero(), |n| n.bounds.top_left);
                let child_area = self.update_area(child);
                region.expand_to_include(translate(&child_area, origin));
            }
            region.area()
        };

        let area = intersection(&area, &local_bounds);
        if device_backed {
            align_columns(area, local_bounds.size.width)
        } else {
            area
        }
    }

    /// Invalidate siblings sitting under children that were just hidden.
    pub(crate) fn scan_occlusion(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            let hidden = self
                .node(child)
                .is_some_and(|n| n.visibility_changed && !n.visible);
            if hidden {
                self.update_below(id, child);
            }
        }
    }

    /// Force a repaint of every sibling of `changed` that overlaps it.
    ///
    /// Whole siblings are invalidated, not just the overlapping strip.
    pub(crate) fn update_below(&mut self, parent: NodeId, changed: NodeId) {
        let Some(bounds) = self.node(changed).map(|n| n.bounds) else {
            return;
        };
        for sibling in self.children(parent).to_vec() {
            if sibling == changed {
                continue;
            }
            if let Some(node) = self.node_mut(sibling)
                && node.visible
                && overlaps(&node.bounds, &bounds)
            {
                trace!("{:?} uncovered by {:?}", sibling, changed);
                node.visibility_changed = true;
            }
        }
    }

    /// Expose unchanged children drawn after a sibling that repaints
    /// underneath them.
    ///
    /// Children of a device-backed frame pack straight into the raster in
    /// draw order, so an earlier child repainting over a later one would
    /// otherwise erase the later one's pixels.
    fn cascade_exposures(&mut self, id: NodeId) {
        let mut damage: Vec<Rectangle> = Vec::new();
        for child in self.draw_order(id) {
            let Some(node) = self.node(child) else {
                continue;
            };
            if !node.visible || !node.initialised {
                continue;
            }
            let bounds = node.bounds;

            if self.is_object_changed(child) {
                let area = translate(&self.update_area(child), bounds.top_left);
                if !is_empty(&area) {
                    damage.push(area);
                }
                continue;
            }

            for hit in damage.iter().map(|d| intersection(d, &bounds)) {
                if !is_empty(&hit) {
                    self.deliver_exposure(child, translate(&hit, -bounds.top_left));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Ordering and hit-testing
    // ------------------------------------------------------------------

    /// Children in painter's order: low layers first, ties by insertion.
    pub(crate) fn draw_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = self.children(id).to_vec();
        order.sort_by_key(|&child| self.node(child).map_or(Layer::Background, |n| n.layer));
        order
    }

    /// Route a tap to the topmost child under `point` (frame-local).
    ///
    /// Higher layers are tested first; within a layer the earliest added
    /// child wins. Only the first hit receives the tap.
    pub(crate) fn hit_test(&mut self, id: NodeId, point: Point) -> bool {
        let mut order = self.children(id).to_vec();
        order.sort_by_key(|&child| {
            core::cmp::Reverse(self.node(child).map_or(Layer::Background, |n| n.layer))
        });

        for child in order {
            let Some(node) = self.node(child) else {
                continue;
            };
            if node.visible && node.initialised && node.contains(point) {
                let local = point - node.bounds.top_left;
                return self.touch_event(child, local);
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Regenerate a frame's content and render its children.
    pub(crate) fn draw_frame(&mut self, id: NodeId, raster: &mut DeviceRaster) {
        let origin = self.absolute_origin(id);
        let device_backed = self.is_device_backed(id);

        if let Some(frame) = self.frame_mut(id) {
            if device_backed {
                let node = &frame.node;
                let clear = if node.visibility_changed || node.parent_changed || node.content_changed
                {
                    Some(translate(&node.local_bounds(), origin))
                } else if node.exposed {
                    Some(translate(&node.expose_area, origin))
                } else {
                    None
                };
                if let Some(area) = clear {
                    let _ = raster.fill_solid(&area, frame.background);
                }
            } else {
                frame.paint_background();
            }
        }

        for child in self.draw_order(id) {
            self.render(child, raster);
        }

        if !device_backed && let Some(frame) = self.frame_mut(id) {
            frame.paint_outline();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_LUMA;
    use crate::ui::components::Label;
    use crate::ui::styling::{BLACK, GREY};

    fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    fn screen() -> (UiTree, NodeId, DeviceRaster) {
        let mut tree = UiTree::new();
        let root = tree.insert_root(Frame::device_backed(rect(0, 0, 120, 80)));
        (tree, root, DeviceRaster::new(Size::new(120, 80)))
    }

    fn settle(tree: &mut UiTree, root: NodeId, raster: &mut DeviceRaster) {
        tree.render(root, raster);
        tree.reset_status(root);
    }

    #[test]
    fn test_align_columns() {
        assert_eq!(align_columns(rect(3, 0, 5, 2), 100), rect(3, 0, 8, 2));
        assert_eq!(align_columns(rect(97, 0, 3, 2), 100), rect(96, 0, 4, 2));
        assert_eq!(align_columns(rect(0, 0, 8, 2), 100), rect(0, 0, 8, 2));
        assert_eq!(align_columns(Rectangle::zero(), 100), Rectangle::zero());
    }

    #[test]
    fn test_draw_order_is_stable_by_layer() {
        let (mut tree, root, _) = screen();
        let square = |text, layer| Label::new(rect(0, 0, 10, 10), text).with_layer(layer);
        let a = tree.add(root, square("a", Layer::Upper)).unwrap();
        let b = tree.add(root, square("b", Layer::Centre)).unwrap();
        let c = tree.add(root, square("c", Layer::Background)).unwrap();
        let d = tree.add(root, square("d", Layer::Centre)).unwrap();

        assert_eq!(tree.draw_order(root), [c, b, d, a]);
    }

    #[test]
    fn test_non_overlapping_hide_leaves_siblings_alone() {
        let (mut tree, root, mut raster) = screen();
        let a = tree.add(root, Label::new(rect(0, 0, 20, 20), "a")).unwrap();
        let b = tree.add(root, Label::new(rect(20, 0, 20, 20), "b")).unwrap();
        settle(&mut tree, root, &mut raster);

        tree.hide(a).unwrap();
        tree.scan_occlusion(root);
        assert!(
            !tree.node(b).unwrap().visibility_changed(),
            "Touching edges do not count as overlap"
        );
    }

    #[test]
    fn test_earlier_sibling_repaint_restores_later_sibling() {
        let (mut tree, root, mut raster) = screen();
        let under = tree.add(root, Label::new(rect(0, 0, 60, 40), "under")).unwrap();
        let over = tree.add(root, Label::new(rect(40, 20, 40, 40), "")).unwrap();
        settle(&mut tree, root, &mut raster);
        assert_eq!(raster.pixel(40, 20), Some(0), "Later sibling's outline is on top");

        tree.label_mut(under).unwrap().set_text("changed");
        tree.render(root, &mut raster);

        assert!(tree.node(over).unwrap().is_exposed());
        assert_eq!(
            tree.node(over).unwrap().expose_area(),
            rect(0, 0, 20, 20),
            "Only the overlap is re-exposed"
        );
        assert_eq!(raster.pixel(40, 20), Some(0), "Overlap is repacked from the top sibling");
    }

    #[test]
    fn test_buffered_frame_composites_children() {
        let (mut tree, root, mut raster) = screen();
        let panel = tree
            .add(root, Frame::new(rect(10, 10, 60, 40)).with_background(GREY))
            .unwrap();
        tree.add(panel, Label::new(rect(10, 10, 20, 10), "").with_fill(BLACK, 0))
            .unwrap();
        settle(&mut tree, root, &mut raster);

        assert_eq!(raster.pixel(15, 25), Some(GREY.luma()), "Frame background");
        assert_eq!(raster.pixel(25, 25), Some(0), "Child fill inside the frame");
        assert_eq!(raster.pixel(5, 5), Some(MAX_LUMA), "Outside the frame");
    }

    #[test]
    fn test_device_backed_exposure_clears_background() {
        let (mut tree, root, mut raster) = screen();
        settle(&mut tree, root, &mut raster);
        raster.fill_solid(&rect(0, 0, 8, 8), BLACK).unwrap();

        tree.expose(root, rect(0, 0, 8, 8));
        assert_eq!(tree.update_area(root), rect(0, 0, 8, 8));
        settle(&mut tree, root, &mut raster);
        assert_eq!(raster.pixel(3, 3), Some(MAX_LUMA));
    }

    #[test]
    fn test_exposure_reaches_partially_covered_child() {
        let (mut tree, root, mut raster) = screen();
        let label = tree.add(root, Label::new(rect(20, 20, 40, 40), "a")).unwrap();
        settle(&mut tree, root, &mut raster);

        tree.expose(root, rect(0, 0, 30, 30));
        let node = tree.node(label).unwrap();
        assert!(node.is_exposed());
        assert_eq!(node.expose_area(), rect(0, 0, 10, 10));
    }

    #[test]
    fn test_unchanged_nested_frame_survives_parent_repaint() {
        let (mut tree, root, mut raster) = screen();
        let outer = tree
            .add(
                root,
                Frame::new(rect(0, 0, 100, 60))
                    .with_background(GREY)
                    .with_decoration(Decoration::none()),
            )
            .unwrap();
        let inner = tree
            .add(outer, Frame::new(rect(10, 10, 30, 30)).with_decoration(Decoration::none()))
            .unwrap();
        tree.add(inner, Label::new(rect(5, 5, 10, 10), "").with_fill(BLACK, 0))
            .unwrap();
        let sibling = tree.add(outer, Label::new(rect(60, 10, 30, 20), "a")).unwrap();
        settle(&mut tree, root, &mut raster);
        assert_eq!(raster.pixel(20, 20), Some(0), "Nested fill on the first frame");

        tree.label_mut(sibling).unwrap().set_text("b");
        tree.render(root, &mut raster);
        assert_eq!(
            tree.node(inner).unwrap().update_area(),
            rect(0, 0, 30, 30),
            "Unchanged frame is copied back whole"
        );
        let pixel = tree.node(outer).unwrap().surface().unwrap().pixel(20, 20);
        assert_eq!(pixel, Some(0), "Outer surface still holds the nested fill");
        tree.reset_status(root);

        tree.expose(root, rect(0, 0, 100, 60));
        settle(&mut tree, root, &mut raster);
        assert_eq!(raster.pixel(20, 20), Some(0), "Repacked region shows the nested fill");
        assert_eq!(raster.pixel(5, 5), Some(GREY.luma()), "Outer background");
    }

    #[test]
    fn test_set_background_repaints_whole_frame() {
        let (mut tree, root, mut raster) = screen();
        let panel = tree.add(root, Frame::new(rect(10, 10, 40, 40))).unwrap();
        settle(&mut tree, root, &mut raster);

        tree.frame_mut(panel).unwrap().set_background(GREY);
        assert_eq!(tree.update_area(panel), rect(0, 0, 40, 40));
    }
}
