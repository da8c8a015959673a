//! Display Manager for composing the UI and pushing it to the panel
//!
//! This module ties the pieces together:
//! - Owns the node tree, its device-backed root frame and the raster mirror
//! - Keeps the lazily created modal dialog above everything else
//! - Runs the layout / update-area / render / push / reset cycle
//! - Spaces panel refreshes by the configured minimum interval
//! - Routes debounced taps to the modal or to the widget tree

use alloc::borrow::Cow;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use log::{debug, error, info};

use crate::config::CompositorConfig;
use crate::drivers::{DisplayDriver, PowerControl};
use crate::error::UiError;
use crate::framebuffer::DeviceRaster;
use crate::input::{TouchFilter, TouchSample};
use crate::ui::core::is_empty;
use crate::ui::{ButtonEvent, Frame, ModalResult, NodeId, TouchPoint, UiTree, Widget};

/// Owner of the UI and its connection to the panel
///
/// # Examples
/// ```ignore
/// let mut manager = Manager::new(CompositorConfig::default())?;
/// manager.add(Label::new(Rectangle::new(Point::new(20, 40), Size::new(500, 200)), "Hello"))?;
///
/// loop {
///     manager.update_display(&mut panel, &mut delay, Instant::now())?;
///     manager.sleep_until_touch(&mut power, &mut delay, Instant::now());
///     manager.pump_touch(&TOUCH_CHANNEL, &mut filter, &mut panel, &mut delay, Instant::now())?;
/// }
/// ```
pub struct Manager {
    tree: UiTree,
    root: NodeId,
    modal: Option<NodeId>,
    raster: DeviceRaster,
    last_push: Option<Instant>,
    config: CompositorConfig,
}

impl Manager {
    /// Create a manager with a blank, full-screen root.
    pub fn new(config: CompositorConfig) -> Result<Self, UiError> {
        config.validate()?;

        let screen = config.screen_bounds();
        let mut tree = UiTree::new();
        let root = tree.insert_root(
            Frame::device_backed(screen).with_background(Gray4::new(config.display.background)),
        );

        info!(
            "Display manager created for a {}x{} panel",
            screen.size.width, screen.size.height
        );

        Ok(Self {
            tree,
            root,
            modal: None,
            raster: DeviceRaster::new(screen.size),
            last_push: None,
            config,
        })
    }

    pub fn tree(&self) -> &UiTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut UiTree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn raster(&self) -> &DeviceRaster {
        &self.raster
    }

    /// Time of the last successful panel push
    pub fn last_push(&self) -> Option<Instant> {
        self.last_push
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Building the UI
    // ------------------------------------------------------------------

    /// Add a widget to the root, below the modal.
    pub fn add(&mut self, widget: impl Into<Widget>) -> Result<NodeId, UiError> {
        match self.modal {
            Some(modal) => {
                let index = self
                    .tree
                    .children(self.root)
                    .iter()
                    .position(|&child| child == modal)
                    .unwrap_or(self.tree.children(self.root).len());
                self.tree.insert(self.root, index, widget)
            }
            None => self.tree.add(self.root, widget),
        }
    }

    /// Add an icon to the root, below the modal.
    pub fn add_icon<F>(
        &mut self,
        bounds: Rectangle,
        bitmap: impl Into<Cow<'static, [u8]>>,
        caption: &str,
        callback: F,
    ) -> Result<NodeId, UiError>
    where
        F: FnMut(&mut UiTree, NodeId, ButtonEvent) -> bool + 'static,
    {
        let id = self
            .tree
            .add_icon(self.root, bounds, bitmap, caption, callback)?;
        self.raise_modal();
        Ok(id)
    }

    /// Keep the modal as the root's last child.
    fn raise_modal(&mut self) {
        let Some(modal) = self.modal else {
            return;
        };
        if let Some(root) = self.tree.frame_mut(self.root) {
            root.children.retain(|&child| child != modal);
            root.children.push(modal);
        }
    }

    /// The modal dialog, created on first use.
    pub fn modal(&mut self) -> Result<NodeId, UiError> {
        if let Some(modal) = self.modal {
            return Ok(modal);
        }
        let modal = self.tree.add_modal(self.root, &self.config.modal)?;
        self.modal = Some(modal);
        Ok(modal)
    }

    /// Show an information dialog with an OK button.
    pub fn msgbox(&mut self, title: &str, body: &str) -> Result<(), UiError> {
        let modal = self.modal()?;
        self.tree.msgbox(modal, title, body)
    }

    /// Show a question with OK and Cancel buttons.
    pub fn confirm(&mut self, title: &str, body: &str) -> Result<(), UiError> {
        let modal = self.modal()?;
        self.tree.confirm(modal, title, body)
    }

    /// Outcome of the last dialog, `None` before one was created
    pub fn modal_result(&self) -> Option<ModalResult> {
        self.modal.and_then(|modal| self.tree.modal_result(modal))
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Render pending changes and push the changed rectangle to the panel.
    ///
    /// Returns the pushed rectangle, or `None` when nothing changed. If the
    /// push fails the rectangle stays exposed so the next call retries it.
    pub fn update_display<P, D>(
        &mut self,
        panel: &mut P,
        delay: &mut D,
        now: Instant,
    ) -> Result<Option<Rectangle>, P::Error>
    where
        P: DisplayDriver,
        D: DelayNs,
    {
        self.tree.apply_layout(self.root);
        self.tree.render(self.root, &mut self.raster);

        let area = self
            .tree
            .node(self.root)
            .map_or(Rectangle::zero(), |node| node.update_area());
        if is_empty(&area) {
            self.tree.reset_status(self.root);
            return Ok(None);
        }

        let waited = self.wait_for_panel(delay, now);
        let packed = self.raster.window(&area);
        debug!(
            "Pushing {}x{} at ({}, {}) after waiting {} ms",
            area.size.width,
            area.size.height,
            area.top_left.x,
            area.top_left.y,
            waited.as_millis()
        );

        if let Err(e) = panel.push_rect(area, &packed) {
            error!("Display push failed: {:?}", e);
            self.tree.reset_status(self.root);
            self.tree.expose(self.root, area);
            return Err(e);
        }

        self.last_push = Some(now + waited);
        self.tree.reset_status(self.root);
        Ok(Some(area))
    }

    /// Block until the minimum refresh interval since the last push has
    /// passed; returns how long that took.
    fn wait_for_panel<D: DelayNs>(&self, delay: &mut D, now: Instant) -> Duration {
        let Some(last) = self.last_push else {
            return Duration::from_ticks(0);
        };
        let elapsed = now.saturating_duration_since(last);
        let interval = self.config.min_refresh_interval();
        if elapsed >= interval {
            return Duration::from_ticks(0);
        }

        let remaining = interval - elapsed;
        let mut micros = remaining.as_micros();
        while micros > 0 {
            let step = micros.min(u32::MAX as u64) as u32;
            delay.delay_us(step);
            micros -= step as u64;
        }
        remaining
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Route a tap in screen coordinates.
    ///
    /// While the modal is showing it captures every tap: taps strictly
    /// inside it are delivered in modal coordinates, the rest are ignored.
    /// Returns `true` when a callback asked for a display update.
    pub fn touch_event(&mut self, point: TouchPoint) -> bool {
        let point = point.to_point();

        if let Some(modal) = self.modal
            && let Some(node) = self.tree.node(modal)
            && node.is_visible()
        {
            let bounds = node.bounds();
            let bottom_right = bounds.top_left + bounds.size;
            let inside = point.x > bounds.top_left.x
                && point.y > bounds.top_left.y
                && point.x < bottom_right.x
                && point.y < bottom_right.y;
            if !inside {
                debug!("Tap at {:?} outside the modal ignored", point);
                return false;
            }
            return self.tree.touch_event(modal, point - bounds.top_left);
        }

        self.tree.touch_event(self.root, point)
    }

    /// Dispatch a tap and refresh the display if a callback asked for it.
    pub fn handle_tap<P, D>(
        &mut self,
        point: TouchPoint,
        panel: &mut P,
        delay: &mut D,
        now: Instant,
    ) -> Result<Option<Rectangle>, P::Error>
    where
        P: DisplayDriver,
        D: DelayNs,
    {
        if self.touch_event(point) {
            self.update_display(panel, delay, now)
        } else {
            Ok(None)
        }
    }

    /// Drain queued touch samples, dispatching every debounced tap.
    ///
    /// Returns the number of taps delivered.
    pub fn pump_touch<M, const N: usize, P, D>(
        &mut self,
        queue: &Channel<M, TouchSample, N>,
        filter: &mut TouchFilter,
        panel: &mut P,
        delay: &mut D,
        now: Instant,
    ) -> Result<usize, P::Error>
    where
        M: RawMutex,
        P: DisplayDriver,
        D: DelayNs,
    {
        let mut taps = 0;
        while let Ok(sample) = queue.try_receive() {
            if let Some(point) = filter.process(sample, now) {
                taps += 1;
                self.handle_tap(point, panel, delay, now)?;
            }
        }
        Ok(taps)
    }

    /// Let the panel settle, then hand over to the power collaborator until
    /// the next touch.
    pub fn sleep_until_touch<W, D>(&mut self, power: &mut W, delay: &mut D, now: Instant)
    where
        W: PowerControl,
        D: DelayNs,
    {
        let waited = self.wait_for_panel(delay, now);
        let since = self
            .last_push
            .map(|last| (now + waited).saturating_duration_since(last));
        power.sleep_until_touch(since);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TouchQueue;
    use crate::ui::{Button, Image, Label};
    use crate::ui::core::contains_rect;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct RecordingPanel {
        pushes: Vec<(Rectangle, usize)>,
        fail: bool,
    }

    impl DisplayDriver for RecordingPanel {
        type Error = &'static str;

        fn push_rect(&mut self, area: Rectangle, packed: &[u8]) -> Result<(), Self::Error> {
            if self.fail {
                return Err("bus error");
            }
            self.pushes.push((area, packed.len()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    #[derive(Default)]
    struct FakePower {
        sleeps: Vec<Option<Duration>>,
    }

    impl PowerControl for FakePower {
        fn sleep_until_touch(&mut self, since_last_push: Option<Duration>) {
            self.sleeps.push(since_last_push);
        }
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    fn manager() -> (Manager, RecordingPanel, CountingDelay) {
        let manager = Manager::new(CompositorConfig::default()).unwrap();
        (manager, RecordingPanel::default(), CountingDelay::default())
    }

    #[test]
    fn test_first_update_pushes_whole_screen() {
        let (mut manager, mut panel, mut delay) = manager();
        manager.add(Label::new(rect(20, 40, 500, 200), "Hello")).unwrap();

        let area = manager.update_display(&mut panel, &mut delay, at(0)).unwrap();
        assert_eq!(area, Some(rect(0, 0, 540, 960)));
        assert_eq!(panel.pushes, [(rect(0, 0, 540, 960), 540 * 960 / 2)]);

        let area = manager.update_display(&mut panel, &mut delay, at(1_000)).unwrap();
        assert_eq!(area, None, "Nothing changed since the last push");
        assert_eq!(panel.pushes.len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = CompositorConfig::default();
        config.display.width = 541;
        assert!(matches!(Manager::new(config), Err(UiError::Config(_))));
    }

    #[test]
    fn test_text_change_pushes_only_the_label() {
        let (mut manager, mut panel, mut delay) = manager();
        let label = manager.add(Label::new(rect(20, 40, 100, 40), "one")).unwrap();
        manager.update_display(&mut panel, &mut delay, at(0)).unwrap();

        manager.tree_mut().label_mut(label).unwrap().set_text("two");
        let area = manager
            .update_display(&mut panel, &mut delay, at(1_000))
            .unwrap()
            .unwrap();
        assert!(contains_rect(&area, &rect(20, 40, 100, 40)));
        assert_eq!(area.size.width % 4, 0);
        assert!(area.size.width < 110, "Push stays local to the label");
    }

    #[test]
    fn test_msgbox_push_covers_modal() {
        let (mut manager, mut panel, mut delay) = manager();
        manager.add(Label::new(rect(20, 40, 500, 200), "Hello")).unwrap();
        manager.update_display(&mut panel, &mut delay, at(0)).unwrap();

        manager.msgbox("Hello", "World").unwrap();
        let area = manager
            .update_display(&mut panel, &mut delay, at(1_000))
            .unwrap()
            .unwrap();
        assert!(contains_rect(&area, &rect(50, 200, 400, 300)));
        assert_eq!(manager.modal_result(), Some(ModalResult::Pending));
    }

    #[test]
    fn test_modal_captures_taps() {
        let (mut manager, mut panel, mut delay) = manager();
        manager
            .add(Button::new(Point::new(60, 600), "Under").with_callback(|_, _, _| true))
            .unwrap();
        manager.msgbox("Title", "Body").unwrap();
        manager.update_display(&mut panel, &mut delay, at(0)).unwrap();

        assert!(
            !manager.touch_event(TouchPoint::new(70, 610)),
            "Taps outside a visible modal are swallowed"
        );

        let modal = manager.modal().unwrap();
        let Some(Widget::Modal(m)) = manager.tree().widget(modal) else {
            panic!("Expected the modal widget");
        };
        let ok = m.parts().unwrap().ok;
        let centre = manager.tree().absolute_bounds(ok).center();
        assert!(manager.touch_event(TouchPoint::new(centre.x as u16, centre.y as u16)));
        assert_eq!(manager.modal_result(), Some(ModalResult::Accepted));
        assert!(!manager.tree().node(modal).unwrap().is_visible());

        assert!(
            manager.touch_event(TouchPoint::new(70, 610)),
            "With the modal gone taps reach the tree again"
        );
    }

    #[test]
    fn test_widgets_added_later_stay_below_modal() {
        let (mut manager, _, _) = manager();
        let modal = manager.modal().unwrap();
        manager.add(Label::new(rect(0, 0, 10, 10), "a")).unwrap();
        manager
            .add_icon(
                rect(0, 0, 40, 60),
                alloc::vec![0u8; Image::expected_len(Size::new(40, 60))],
                "i",
                |_, _, _| false,
            )
            .unwrap();
        assert_eq!(manager.tree().children(manager.root()).last(), Some(&modal));
    }

    #[test]
    fn test_pushes_are_spaced_by_refresh_interval() {
        let (mut manager, mut panel, mut delay) = manager();
        let label = manager.add(Label::new(rect(20, 40, 100, 40), "one")).unwrap();
        manager.update_display(&mut panel, &mut delay, at(0)).unwrap();
        assert_eq!(manager.last_push(), Some(at(0)));
        assert_eq!(delay.total_ns, 0, "The first push never waits");

        manager.tree_mut().label_mut(label).unwrap().set_text("two");
        manager.update_display(&mut panel, &mut delay, at(100)).unwrap();
        assert_eq!(delay.total_ns, 400_000_000);
        assert_eq!(manager.last_push(), Some(at(500)));
    }

    #[test]
    fn test_long_refresh_interval_is_waited_in_full() {
        let mut config = CompositorConfig::default();
        // Longer than u32::MAX microseconds
        config.display.min_refresh_interval_ms = 5_000_000;
        let mut manager = Manager::new(config).unwrap();
        let (mut panel, mut delay) = (RecordingPanel::default(), CountingDelay::default());
        let label = manager.add(Label::new(rect(20, 40, 100, 40), "one")).unwrap();
        manager.update_display(&mut panel, &mut delay, at(0)).unwrap();

        manager.tree_mut().label_mut(label).unwrap().set_text("two");
        manager.update_display(&mut panel, &mut delay, at(0)).unwrap();
        assert_eq!(delay.total_ns, 5_000_000 * 1_000_000, "No truncation to 32 bits");
        assert_eq!(manager.last_push(), Some(at(5_000_000)));
    }

    #[test]
    fn test_failed_push_is_retried() {
        let (mut manager, mut panel, mut delay) = manager();
        let label = manager.add(Label::new(rect(20, 40, 100, 40), "one")).unwrap();
        manager.update_display(&mut panel, &mut delay, at(0)).unwrap();

        manager.tree_mut().label_mut(label).unwrap().set_text("two");
        panel.fail = true;
        assert!(manager.update_display(&mut panel, &mut delay, at(1_000)).is_err());
        assert_eq!(manager.last_push(), Some(at(0)));

        panel.fail = false;
        let area = manager
            .update_display(&mut panel, &mut delay, at(2_000))
            .unwrap()
            .unwrap();
        assert!(contains_rect(&area, &rect(20, 40, 100, 40)));
    }

    #[test]
    fn test_sleep_waits_for_panel_to_settle() {
        let (mut manager, mut panel, mut delay) = manager();
        let mut power = FakePower::default();

        manager.sleep_until_touch(&mut power, &mut delay, at(0));
        assert_eq!(power.sleeps, [None]);

        manager.add(Label::new(rect(20, 40, 100, 40), "one")).unwrap();
        manager.update_display(&mut panel, &mut delay, at(0)).unwrap();
        manager.sleep_until_touch(&mut power, &mut delay, at(100));
        assert_eq!(delay.total_ns, 400_000_000);
        assert_eq!(power.sleeps[1], Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_pump_touch_debounces_and_redraws() {
        let (mut manager, mut panel, mut delay) = manager();
        let label = manager.add(Label::new(rect(20, 40, 100, 40), "0")).unwrap();
        let button = Button::new(Point::new(20, 300), "Next").with_callback(
            move |tree, _, _| {
                if let Some(label) = tree.label_mut(label) {
                    label.set_text("1");
                }
                true
            },
        );
        manager.add(button).unwrap();
        manager.update_display(&mut panel, &mut delay, at(0)).unwrap();

        let queue = TouchQueue::new();
        for _ in 0..2 {
            queue.try_send(TouchSample::down(30, 310)).unwrap();
            queue.try_send(TouchSample::up(30, 310)).unwrap();
        }
        let mut filter = TouchFilter::new(manager.config().debounce());

        let taps = manager
            .pump_touch(&queue, &mut filter, &mut panel, &mut delay, at(1_000))
            .unwrap();
        assert_eq!(taps, 1, "The second tap falls inside the debounce window");
        assert_eq!(panel.pushes.len(), 2);
        assert_eq!(manager.tree_mut().label_mut(label).unwrap().text(), "1");
    }
}
