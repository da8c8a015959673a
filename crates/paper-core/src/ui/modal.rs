//! Modal dialog: title bar, message body and OK / Cancel / close buttons
//!
//! The modal is an ordinary frame on the overlay layer that starts hidden.
//! [`UiTree::msgbox`] and [`UiTree::confirm`] fill in the text, arrange the
//! buttons and show it; any of its buttons records a [`ModalResult`] and
//! hides it again.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, info};

use crate::config::ModalConfig;
use crate::error::UiError;
use crate::ui::components::{Button, HAlign, Label, TextSize, VAlign};
use crate::ui::core::{Layer, NodeId};
use crate::ui::layouts::Frame;
use crate::ui::styling::{BLACK, Decoration, LIGHT_GREY, Outline, Padding};
use crate::ui::tree::UiTree;
use crate::ui::widget::Widget;

/// Gap between the bottom edge and the OK / Cancel row
const BUTTON_MARGIN: i32 = 10;

/// Width reserved for the close button in the title bar
const CLOSE_WIDTH: i32 = 50;

/// Outcome of the last modal interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalResult {
    /// Shown and not yet dismissed
    #[default]
    Pending,
    /// OK or the close button
    Accepted,
    /// Cancel
    Rejected,
}

/// Handles of the modal's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalParts {
    pub title: NodeId,
    pub close: NodeId,
    pub content: NodeId,
    pub ok: NodeId,
    pub cancel: NodeId,
}

pub struct Modal {
    pub(crate) frame: Frame,
    result: ModalResult,
    parts: Option<ModalParts>,
}

impl Modal {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn result(&self) -> ModalResult {
        self.result
    }

    pub fn parts(&self) -> Option<ModalParts> {
        self.parts
    }
}

/// Button that records `result` on `modal` when tapped
///
/// Buttons sit one layer above the labels they overlap so they win the
/// hit test.
fn dismiss_button(origin: Point, caption: &str, modal: NodeId, result: ModalResult) -> Button {
    Button::new(origin, caption)
        .with_layer(Layer::Upper)
        .with_callback(move |tree, _, _| tree.resolve_modal(modal, result).is_ok())
}

impl UiTree {
    /// Build a hidden modal dialog under `parent`.
    pub fn add_modal(&mut self, parent: NodeId, config: &ModalConfig) -> Result<NodeId, UiError> {
        let bounds = config.bounds();
        let (w, h) = (bounds.size.width, bounds.size.height);
        let title_height = config.title_height;

        let mut frame = Frame::new(bounds)
            .with_decoration(Decoration::none().with_outline(Outline::new(BLACK, 4, 10)))
            .with_layer(Layer::Overlay);
        frame.node.visible = false;
        let id = self.add(
            parent,
            Widget::Modal(Modal {
                frame,
                result: ModalResult::Pending,
                parts: None,
            }),
        )?;

        let mut ok = dismiss_button(Point::zero(), "OK", id, ModalResult::Accepted);
        let mut cancel = dismiss_button(Point::zero(), "Cancel", id, ModalResult::Rejected);
        ok.pre_render();
        cancel.pre_render();
        let ok_height = ok.label().node().bounds().size.height;

        let title = self.add(
            id,
            Label::new(Rectangle::new(Point::zero(), Size::new(w, title_height)), "")
                .with_fill(LIGHT_GREY, 10)
                .with_outline(Outline::new(BLACK, 2, 10))
                .with_padding(Padding::symmetric(4, 10))
                .with_alignment(HAlign::Left, VAlign::Middle),
        )?;
        let mut close = dismiss_button(
            Point::new(w as i32 - CLOSE_WIDTH, 0),
            "X",
            id,
            ModalResult::Accepted,
        )
        .with_font(TextSize::Small)
        .with_padding(Padding::symmetric(4, 12));
        close.pre_render();
        let close = self.add(id, close)?;
        let content_height = h.saturating_sub(title_height + ok_height);
        let content = self.add(
            id,
            Label::new(
                Rectangle::new(
                    Point::new(0, title_height as i32),
                    Size::new(w, content_height),
                ),
                "",
            )
            .without_border(),
        )?;
        let ok = self.add(id, ok)?;
        let cancel = self.add(id, cancel)?;

        if let Some(Widget::Modal(modal)) = self.widget_mut(id) {
            modal.parts = Some(ModalParts {
                title,
                close,
                content,
                ok,
                cancel,
            });
        }
        info!("Modal created at {:?}", bounds);
        Ok(id)
    }

    fn modal_parts(&self, modal: NodeId) -> Result<ModalParts, UiError> {
        match self.widget(modal) {
            Some(Widget::Modal(m)) => m.parts.ok_or(UiError::NotAContainer(modal)),
            Some(_) => Err(UiError::NotAContainer(modal)),
            None => Err(UiError::StaleNode(modal)),
        }
    }

    /// Set the title and body text, reset the result and show the dialog.
    fn open_modal(&mut self, modal: NodeId, title: &str, body: &str) -> Result<ModalParts, UiError> {
        let parts = self.modal_parts(modal)?;
        if let Some(label) = self.label_mut(parts.title) {
            label.set_text(title);
        }
        if let Some(label) = self.label_mut(parts.content) {
            label.set_text(body);
        }
        if let Some(Widget::Modal(m)) = self.widget_mut(modal) {
            m.result = ModalResult::Pending;
        }
        self.show(parts.ok)?;
        self.layout_node(parts.ok);
        self.layout_node(parts.cancel);
        self.show(modal)?;
        Ok(parts)
    }

    /// Size of the modal and of one of its buttons.
    fn modal_geometry(&self, modal: NodeId, button: NodeId) -> (Size, Size) {
        let size = |id| self.node(id).map_or(Size::zero(), |n| n.bounds().size);
        (size(modal), size(button))
    }

    /// Show an information dialog with a single centred OK button.
    pub fn msgbox(&mut self, modal: NodeId, title: &str, body: &str) -> Result<(), UiError> {
        let parts = self.open_modal(modal, title, body)?;
        self.hide(parts.cancel)?;

        let (size, ok) = self.modal_geometry(modal, parts.ok);
        let x = (size.width as i32 - ok.width as i32) / 2;
        let y = size.height as i32 - ok.height as i32 - BUTTON_MARGIN;
        self.move_node(parts.ok, x, y, false)?;

        debug!("msgbox: {}", title);
        Ok(())
    }

    /// Show a question with OK and Cancel buttons.
    pub fn confirm(&mut self, modal: NodeId, title: &str, body: &str) -> Result<(), UiError> {
        let parts = self.open_modal(modal, title, body)?;
        self.show(parts.cancel)?;

        let (size, ok) = self.modal_geometry(modal, parts.ok);
        let (_, cancel) = self.modal_geometry(modal, parts.cancel);
        let bottom = size.height as i32 - BUTTON_MARGIN;
        self.move_node(parts.ok, size.width as i32 / 4, bottom - ok.height as i32, false)?;
        self.move_node(
            parts.cancel,
            size.width as i32 / 2,
            bottom - cancel.height as i32,
            false,
        )?;

        debug!("confirm: {}", title);
        Ok(())
    }

    /// Record `result` and hide the dialog.
    pub fn resolve_modal(&mut self, modal: NodeId, result: ModalResult) -> Result<(), UiError> {
        match self.widget_mut(modal) {
            Some(Widget::Modal(m)) => m.result = result,
            Some(_) => return Err(UiError::NotAContainer(modal)),
            None => return Err(UiError::StaleNode(modal)),
        }
        debug!("Modal resolved: {:?}", result);
        self.hide(modal)
    }

    pub fn modal_result(&self, modal: NodeId) -> Option<ModalResult> {
        match self.widget(modal) {
            Some(Widget::Modal(m)) => Some(m.result),
            _ => None,
        }
    }
}
