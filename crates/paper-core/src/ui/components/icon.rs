//! Icon component: a tappable image with a caption strip underneath

use alloc::borrow::Cow;
use alloc::boxed::Box;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::image::Image;
use super::label::Label;
use super::text::TextSize;
use crate::error::UiError;
use crate::ui::core::{ButtonEvent, NodeId, TouchCallback};
use crate::ui::layouts::Frame;
use crate::ui::styling::{Decoration, Padding};
use crate::ui::tree::UiTree;
use crate::ui::widget::Widget;

/// Padding around the caption text
const CAPTION_PADDING: u32 = 4;

/// Frame holding an image above a one-line caption
///
/// The whole icon is a single touch target: taps anywhere inside it go to
/// the icon's callback rather than to the image or caption.
pub struct Icon {
    pub(crate) frame: Frame,
    pub(crate) callback: Option<TouchCallback>,
    image: Option<NodeId>,
    caption: Option<NodeId>,
}

impl Icon {
    /// Height of the caption strip at the bottom of every icon
    pub fn caption_height() -> u32 {
        TextSize::Small.font().character_size.height + 2 * CAPTION_PADDING
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn image(&self) -> Option<NodeId> {
        self.image
    }

    pub fn caption(&self) -> Option<NodeId> {
        self.caption
    }
}

impl UiTree {
    /// Add an icon showing `bitmap` with `caption` below it.
    ///
    /// The bitmap must cover the area above the caption strip; a short
    /// bitmap leaves the image blank but the icon stays tappable.
    pub fn add_icon<F>(
        &mut self,
        parent: NodeId,
        bounds: Rectangle,
        bitmap: impl Into<Cow<'static, [u8]>>,
        caption: &str,
        callback: F,
    ) -> Result<NodeId, UiError>
    where
        F: FnMut(&mut UiTree, NodeId, ButtonEvent) -> bool + 'static,
    {
        let icon = Icon {
            frame: Frame::new(bounds).with_decoration(Decoration::none()),
            callback: Some(Box::new(callback)),
            image: None,
            caption: None,
        };
        let id = self.add(parent, Widget::Icon(icon))?;

        let strip = Icon::caption_height().min(bounds.size.height);
        let width = bounds.size.width;
        let image_height = bounds.size.height - strip;

        let image = self.add(
            id,
            Image::new(
                Rectangle::new(Point::zero(), Size::new(width, image_height)),
                bitmap,
            ),
        )?;
        let caption = self.add(
            id,
            Label::new(
                Rectangle::new(Point::new(0, image_height as i32), Size::new(width, strip)),
                caption,
            )
            .with_font(TextSize::Small)
            .with_padding(Padding::all(CAPTION_PADDING))
            .without_border(),
        )?;

        if let Some(Widget::Icon(icon)) = self.widget_mut(id) {
            icon.image = Some(image);
            icon.caption = Some(caption);
        }
        Ok(id)
    }
}
