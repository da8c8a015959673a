//! Label component: wrapped, aligned text with fill and outline decoration

use alloc::string::String;
use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};

use super::text::{HAlign, Lines, TextSize, VAlign, text_width, wrap_lines};
use crate::ui::core::{Drawable, Layer};
use crate::ui::node::Node;
use crate::ui::styling::{BLACK, Decoration, Outline, Padding, WHITE};

/// Padding applied on every side unless overridden
pub const DEFAULT_PADDING: u32 = 10;

/// Extra gap between wrapped lines, as a fraction of the font height
pub const DEFAULT_LINE_SPACING: f32 = 0.5;

/// Text label with optional fill and outline
///
/// Text is laid out inside the padding and outline, wrapped word by word
/// and anchored on a 3x3 grid. An autosized label derives its width and
/// height from the measured text instead of a fixed rectangle.
///
/// # Examples
/// ```ignore
/// let title = Label::new(Rectangle::new(Point::new(0, 0), Size::new(400, 30)), "Settings")
///     .with_fill(LIGHT_GREY, 10)
///     .with_alignment(HAlign::Left, VAlign::Middle);
///
/// let badge = Label::autosized(Point::new(20, 20), "3 new");
/// ```
pub struct Label {
    pub(crate) node: Node,
    text: String,
    font: &'static MonoFont<'static>,
    text_colour: Gray4,
    decoration: Decoration,
    padding: Padding,
    h_align: HAlign,
    v_align: VAlign,
    line_spacing: f32,
    autosize: bool,
    resize_needed: bool,
    pre_rendered: bool,
}

impl Label {
    /// Create a label with fixed geometry.
    pub fn new(bounds: Rectangle, text: &str) -> Self {
        Self {
            node: Node::new(bounds),
            text: String::from(text),
            font: TextSize::default().font(),
            text_colour: BLACK,
            decoration: Decoration::default(),
            padding: Padding::all(DEFAULT_PADDING),
            h_align: HAlign::default(),
            v_align: VAlign::default(),
            line_spacing: DEFAULT_LINE_SPACING,
            autosize: false,
            resize_needed: false,
            pre_rendered: false,
        }
    }

    /// Create a label whose size follows its text.
    ///
    /// The size is computed by the layout pass (or [`Label::pre_render`])
    /// before the first draw.
    pub fn autosized(origin: Point, text: &str) -> Self {
        let mut label = Self::new(Rectangle::new(origin, Size::zero()), text);
        label.autosize = true;
        label.resize_needed = true;
        label
    }

    pub fn with_font(mut self, size: TextSize) -> Self {
        self.set_font(size.font());
        self
    }

    pub fn with_custom_font(mut self, font: &'static MonoFont<'static>) -> Self {
        self.set_font(font);
        self
    }

    pub fn with_text_colour(mut self, colour: Gray4) -> Self {
        self.text_colour = colour;
        self
    }

    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decoration = decoration;
        self.resize_needed = true;
        self
    }

    pub fn with_fill(mut self, colour: Gray4, radius: u32) -> Self {
        self.set_fill(colour, radius);
        self
    }

    pub fn with_outline(mut self, outline: Outline) -> Self {
        self.set_outline(outline);
        self
    }

    /// Drop the outline (the content label of a modal, for example).
    pub fn without_border(mut self) -> Self {
        self.no_border();
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.set_padding(padding);
        self
    }

    pub fn with_alignment(mut self, h_align: HAlign, v_align: VAlign) -> Self {
        self.set_alignment(h_align, v_align);
        self
    }

    pub fn with_line_spacing(mut self, spacing: f32) -> Self {
        self.set_line_spacing(spacing);
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.node.layer = layer;
        self
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn is_autosize(&self) -> bool {
        self.autosize
    }

    pub fn resize_needed(&self) -> bool {
        self.resize_needed
    }

    /// Replace the text.
    ///
    /// Marks the label changed only if the text differs.
    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text = String::from(text);
            self.touch_layout();
        }
    }

    pub fn set_font(&mut self, font: &'static MonoFont<'static>) {
        self.font = font;
        self.touch_layout();
    }

    pub fn set_text_colour(&mut self, colour: Gray4) {
        self.text_colour = colour;
        self.node.mark_changed();
    }

    pub fn set_fill(&mut self, colour: Gray4, radius: u32) {
        self.decoration.fill = Some(colour);
        self.decoration.fill_radius = radius;
        self.touch_layout();
    }

    pub fn no_fill(&mut self) {
        self.decoration.fill = None;
        self.touch_layout();
    }

    pub fn set_outline(&mut self, outline: Outline) {
        self.decoration.outline = Some(outline);
        self.touch_layout();
    }

    pub fn no_border(&mut self) {
        self.decoration.outline = None;
        self.touch_layout();
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.padding = padding;
        self.touch_layout();
    }

    pub fn set_alignment(&mut self, h_align: HAlign, v_align: VAlign) {
        self.h_align = h_align;
        self.v_align = v_align;
        self.node.mark_changed();
    }

    pub fn set_line_spacing(&mut self, spacing: f32) {
        self.line_spacing = spacing.max(0.0);
        self.touch_layout();
    }

    pub fn set_autosize(&mut self, autosize: bool) {
        self.autosize = autosize;
        self.touch_layout();
    }

    fn touch_layout(&mut self) {
        self.node.mark_changed();
        self.resize_needed = true;
    }

    fn outline_thickness(&self) -> u32 {
        self.decoration.outline_thickness()
    }

    /// Local rectangle inside the padding and outline
    pub fn text_box(&self) -> Rectangle {
        self.padding
            .content_box(self.node.bounds.size, self.outline_thickness())
    }

    /// Width available to text inside the padding and outline
    pub fn text_area_width(&self) -> u32 {
        self.text_box().size.width
    }

    /// Wrapped lines for the current geometry
    pub fn lines(&self) -> Lines {
        let max_width = if self.autosize {
            u32::MAX
        } else {
            self.text_area_width()
        };
        wrap_lines(&self.text, max_width, |line| text_width(self.font, line))
    }

    fn font_height(&self) -> u32 {
        self.font.character_size.height
    }

    fn line_height(&self) -> u32 {
        (self.font_height() as f32 * (1.0 + self.line_spacing)) as u32
    }

    /// Height of `count` stacked lines, without trailing spacing
    fn block_height(&self, count: usize) -> u32 {
        if count == 0 {
            return 0;
        }
        let spacing = (self.font_height() as f32 * self.line_spacing) as u32;
        (count as u32 * self.line_height()).saturating_sub(spacing)
    }

    fn text_x(&self, line_width: u32) -> i32 {
        let inner = self.text_box();
        match self.h_align {
            HAlign::Left => inner.top_left.x,
            HAlign::Centre => (self.node.bounds.size.width as i32 - line_width as i32) / 2,
            HAlign::Right => inner.top_left.x + inner.size.width as i32 - line_width as i32,
        }
    }

    fn text_y(&self, block_height: u32) -> i32 {
        let inner = self.text_box();
        match self.v_align {
            VAlign::Top => inner.top_left.y,
            VAlign::Middle => (self.node.bounds.size.height as i32 - block_height as i32) / 2 + 1,
            VAlign::Bottom => inner.top_left.y + inner.size.height as i32 - block_height as i32,
        }
    }

    /// Apply a pending autosize.
    ///
    /// Returns the previous bounds when the geometry changed so the caller
    /// can expose the vacated rectangle.
    pub(crate) fn relayout(&mut self) -> Option<Rectangle> {
        if !self.resize_needed {
            return None;
        }
        self.resize_needed = false;
        if !self.autosize {
            return None;
        }

        let size = self.measure();
        let old = self.node.bounds;
        if size == old.size {
            return None;
        }
        self.node.set_bounds(Rectangle::new(old.top_left, size));
        self.node.mark_changed();
        Some(old)
    }

    /// Draw now and skip the next content redraw.
    ///
    /// Used to warm buttons that are added hidden, so showing them later
    /// does not cost a text layout on the first visible frame.
    pub fn pre_render(&mut self) {
        self.relayout();
        self.render_surface();
        self.pre_rendered = true;
    }

    /// Content-generation step of the render pass.
    pub(crate) fn paint(&mut self) {
        if self.pre_rendered {
            self.pre_rendered = false;
            return;
        }
        self.render_surface();
    }

    fn render_surface(&mut self) {
        if let Some(mut surface) = self.node.surface.take() {
            let _ = self.draw(&mut surface);
            self.node.surface = Some(surface);
        }
    }
}

impl Drawable for Label {
    fn draw<D: DrawTarget<Color = Gray4>>(&self, target: &mut D) -> Result<(), D::Error> {
        let bounds = self.node.local_bounds();
        target.clear(WHITE)?;
        self.decoration.draw_fill(bounds, target)?;

        let lines = self.lines();
        let style = MonoTextStyle::new(self.font, self.text_colour);
        let mut y = self.text_y(self.block_height(lines.len()));
        for range in lines {
            let line = &self.text[range];
            let x = self.text_x(text_width(self.font, line));
            Text::with_baseline(line, Point::new(x, y), style, Baseline::Top).draw(target)?;
            y += self.line_height() as i32;
        }

        self.decoration.draw_outline(bounds, target)
    }

    /// Size that fits the text plus padding and outline
    fn measure(&self) -> Size {
        let lines = wrap_lines(&self.text, u32::MAX, |line| text_width(self.font, line));
        let text_w = lines
            .iter()
            .map(|r| text_width(self.font, &self.text[r.clone()]))
            .max()
            .unwrap_or(0);
        let text_h = self.block_height(lines.len().max(1));
        let frame = 2 * self.outline_thickness();
        Size::new(
            text_w + self.padding.horizontal() + frame,
            text_h + self.padding.vertical() + frame,
        )
    }

    fn is_changed(&self) -> bool {
        self.node.content_changed
    }
}
