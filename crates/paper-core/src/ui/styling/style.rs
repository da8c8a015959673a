//! Fill and outline decoration
//!
//! Labels, buttons and frames share the same decoration model: an optional
//! rounded fill behind the content and an optional rounded outline drawn
//! inside the widget's bounds on top of it.

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    PrimitiveStyleBuilder, Rectangle, RoundedRectangle, StrokeAlignment,
};

use super::colors::BLACK;

/// Outline stroke drawn inside the widget bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outline {
    pub colour: Gray4,
    pub thickness: u32,
    pub radius: u32,
}

impl Outline {
    pub fn new(colour: Gray4, thickness: u32, radius: u32) -> Self {
        Self {
            colour,
            thickness,
            radius,
        }
    }
}

/// Decorative fill and outline of a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
    pub fill: Option<Gray4>,
    pub fill_radius: u32,
    pub outline: Option<Outline>,
}

impl Default for Decoration {
    /// Thin square black outline, no fill
    fn default() -> Self {
        Self {
            fill: None,
            fill_radius: 0,
            outline: Some(Outline::new(BLACK, 1, 0)),
        }
    }
}

impl Decoration {
    /// No fill and no outline
    pub fn none() -> Self {
        Self {
            fill: None,
            fill_radius: 0,
            outline: None,
        }
    }

    pub fn with_fill(mut self, colour: Gray4, radius: u32) -> Self {
        self.fill = Some(colour);
        self.fill_radius = radius;
        self
    }

    pub fn with_outline(mut self, outline: Outline) -> Self {
        self.outline = Some(outline);
        self
    }

    /// Width of the outline stroke, zero when there is none
    pub fn outline_thickness(&self) -> u32 {
        self.outline.map_or(0, |o| o.thickness)
    }

    /// Paint the fill covering `bounds`.
    pub fn draw_fill<D>(&self, bounds: Rectangle, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Gray4>,
    {
        if let Some(fill) = self.fill {
            let style = PrimitiveStyleBuilder::new().fill_color(fill).build();
            RoundedRectangle::with_equal_corners(
                bounds,
                Size::new(self.fill_radius, self.fill_radius),
            )
            .into_styled(style)
            .draw(target)?;
        }
        Ok(())
    }

    /// Stroke the outline inside `bounds`.
    pub fn draw_outline<D>(&self, bounds: Rectangle, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Gray4>,
    {
        if let Some(outline) = self.outline
            && outline.thickness > 0
        {
            let style = PrimitiveStyleBuilder::new()
                .stroke_color(outline.colour)
                .stroke_width(outline.thickness)
                .stroke_alignment(StrokeAlignment::Inside)
                .build();
            RoundedRectangle::with_equal_corners(
                bounds,
                Size::new(outline.radius, outline.radius),
            )
            .into_styled(style)
            .draw(target)?;
        }
        Ok(())
    }
}
