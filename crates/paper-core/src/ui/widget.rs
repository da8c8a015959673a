//! Closed set of widget variants stored in the tree
//!
//! Geometry and dirty tracking live in the embedded [`Node`]; variants only
//! differ in how they generate content and whether they hold children.

use crate::ui::components::{Button, Icon, Image, Label};
use crate::ui::core::{Drawable, TouchCallback};
use crate::ui::layouts::Frame;
use crate::ui::modal::Modal;
use crate::ui::node::Node;

pub enum Widget {
    Label(Label),
    Button(Button),
    Image(Image),
    Frame(Frame),
    Icon(Icon),
    Modal(Modal),
}

impl Widget {
    pub fn node(&self) -> &Node {
        match self {
            Widget::Label(label) => &label.node,
            Widget::Button(button) => &button.label.node,
            Widget::Image(image) => &image.node,
            Widget::Frame(frame) => &frame.node,
            Widget::Icon(icon) => &icon.frame.node,
            Widget::Modal(modal) => &modal.frame.node,
        }
    }

    pub fn node_mut(&mut self) -> &mut Node {
        match self {
            Widget::Label(label) => &mut label.node,
            Widget::Button(button) => &mut button.label.node,
            Widget::Image(image) => &mut image.node,
            Widget::Frame(frame) => &mut frame.node,
            Widget::Icon(icon) => &mut icon.frame.node,
            Widget::Modal(modal) => &mut modal.frame.node,
        }
    }

    /// The container part of frame-like widgets
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Widget::Frame(frame) => Some(frame),
            Widget::Icon(icon) => Some(&icon.frame),
            Widget::Modal(modal) => Some(&modal.frame),
            _ => None,
        }
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        match self {
            Widget::Frame(frame) => Some(frame),
            Widget::Icon(icon) => Some(&mut icon.frame),
            Widget::Modal(modal) => Some(&mut modal.frame),
            _ => None,
        }
    }

    /// The text part of labels and buttons
    pub fn label(&self) -> Option<&Label> {
        match self {
            Widget::Label(label) => Some(label),
            Widget::Button(button) => Some(&button.label),
            _ => None,
        }
    }

    pub fn label_mut(&mut self) -> Option<&mut Label> {
        match self {
            Widget::Label(label) => Some(label),
            Widget::Button(button) => Some(&mut button.label),
            _ => None,
        }
    }

    /// Leaf content changed since the last pass
    pub(crate) fn content_changed(&self) -> bool {
        match self {
            Widget::Label(label) => label.is_changed(),
            Widget::Button(button) => button.label.is_changed(),
            Widget::Image(image) => image.is_changed(),
            _ => self.node().content_changed,
        }
    }

    /// Run the leaf content-generation step into the node's surface.
    pub(crate) fn paint(&mut self) {
        match self {
            Widget::Label(label) => label.paint(),
            Widget::Button(button) => button.label.paint(),
            Widget::Image(image) => image.paint(),
            _ => {}
        }
    }

    pub(crate) fn take_callback(&mut self) -> Option<TouchCallback> {
        match self {
            Widget::Button(button) => button.callback.take(),
            Widget::Icon(icon) => icon.callback.take(),
            _ => None,
        }
    }

    /// Put a callback back unless the callback installed a replacement.
    pub(crate) fn restore_callback(&mut self, callback: TouchCallback) {
        let slot = match self {
            Widget::Button(button) => &mut button.callback,
            Widget::Icon(icon) => &mut icon.callback,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(callback);
        }
    }
}

impl From<Label> for Widget {
    fn from(label: Label) -> Self {
        Widget::Label(label)
    }
}

impl From<Button> for Widget {
    fn from(button: Button) -> Self {
        Widget::Button(button)
    }
}

impl From<Image> for Widget {
    fn from(image: Image) -> Self {
        Widget::Image(image)
    }
}

impl From<Frame> for Widget {
    fn from(frame: Frame) -> Self {
        Widget::Frame(frame)
    }
}
