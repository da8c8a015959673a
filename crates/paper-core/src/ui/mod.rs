//! Paper UI System - a retained-mode compositor for partial-refresh panels
//!
//! This module provides:
//! - Core types shared by every widget (ids, layers, dirty regions)
//! - The shared `Node` component carrying geometry and dirty flags
//! - The arena-backed `UiTree` with the render/compositing pipeline
//! - Frames (containers) with layered draw, hit-testing and occlusion
//! - Leaf and interactive widgets (labels, images, buttons, icons)
//! - The modal dialog used by the display manager

pub mod components;
pub mod core;
pub mod layouts;
pub mod modal;
pub mod node;
pub mod styling;
pub mod surface;
pub mod tree;
pub mod widget;

// Re-export commonly used items
pub use components::{Button, HAlign, Icon, Image, Label, TextSize, VAlign};
pub use self::core::{ButtonEvent, DirtyRegion, Drawable, Layer, NodeId, TouchCallback, TouchPoint};
pub use layouts::Frame;
pub use modal::{Modal, ModalResult};
pub use node::Node;
pub use styling::{Decoration, Outline, Padding};
pub use surface::Surface;
pub use tree::UiTree;
pub use widget::Widget;
