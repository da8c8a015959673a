//! Button component: a label that reports taps to a callback

use alloc::boxed::Box;
use embedded_graphics::prelude::*;

use super::label::Label;
use super::text::TextSize;
use crate::ui::core::{ButtonEvent, Layer, NodeId, TouchCallback};
use crate::ui::styling::{BLACK, LIGHT_GREY, Outline, Padding};
use crate::ui::tree::UiTree;

/// Corner radius shared by the button fill and outline
const BUTTON_RADIUS: u32 = 8;

/// Outline stroke width of a button
const BUTTON_OUTLINE: u32 = 3;

/// Tappable, autosized label
///
/// A button always reports [`ButtonEvent::Released`] when hit. The callback
/// receives the tree so it can update other nodes; returning `true` asks
/// the manager to refresh the display.
///
/// # Examples
/// ```ignore
/// let next = Button::new(Point::new(175, 730), "Next Quote").with_callback(
///     move |tree, _id, _event| {
///         if let Some(label) = tree.label_mut(quotes) {
///             label.set_text(pick_quote());
///         }
///         true
///     },
/// );
/// ```
pub struct Button {
    pub(crate) label: Label,
    pub(crate) callback: Option<TouchCallback>,
}

impl Button {
    /// Create a button sized around `caption`, with its corner at `origin`.
    pub fn new(origin: Point, caption: &str) -> Self {
        Self::from_label(
            Label::autosized(origin, caption)
                .with_fill(LIGHT_GREY, BUTTON_RADIUS)
                .with_outline(Outline::new(BLACK, BUTTON_OUTLINE, BUTTON_RADIUS)),
        )
    }

    /// Wrap an already styled label.
    pub fn from_label(label: Label) -> Self {
        Self {
            label,
            callback: None,
        }
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut UiTree, NodeId, ButtonEvent) -> bool + 'static,
    {
        self.set_callback(callback);
        self
    }

    pub fn with_font(mut self, size: TextSize) -> Self {
        self.label.set_font(size.font());
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.label.set_padding(padding);
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.label.node.layer = layer;
        self
    }

    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&mut UiTree, NodeId, ButtonEvent) -> bool + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn label_mut(&mut self) -> &mut Label {
        &mut self.label
    }

    /// Lay out and draw now so the first visible frame skips the redraw.
    pub fn pre_render(&mut self) {
        self.label.pre_render();
    }
}
