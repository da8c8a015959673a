//! Off-screen pixel surface owned by a node.
//!
//! One byte per pixel with only the low nibble significant, so widgets can
//! draw with plain embedded-graphics primitives and the compositor can copy
//! rows between surfaces without re-packing. Packing to the 4-bit device
//! format happens once, in [`crate::framebuffer::DeviceRaster`].

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::config::MAX_LUMA;

/// 8-bit indexed raster implementing `DrawTarget<Color = Gray4>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    /// Allocate a surface filled with white.
    pub fn new(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            pixels: vec![MAX_LUMA; (size.width * size.height) as usize],
        }
    }

    /// Reallocate for a new size, discarding the old content.
    pub fn resize(&mut self, size: Size) {
        *self = Self::new(size);
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// One row of pixels, or an empty slice past the bottom edge.
    pub fn row(&self, y: u32) -> &[u8] {
        if y >= self.height {
            return &[];
        }
        let start = (y * self.width) as usize;
        &self.pixels[start..start + self.width as usize]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn fill(&mut self, luma: u8) {
        self.pixels.fill(luma & MAX_LUMA);
    }

    /// Copy this surface into `dest` with its top-left corner at `at`.
    ///
    /// Rows and columns falling outside `dest` are truncated, never wrapped.
    pub fn blit_into(&self, dest: &mut Surface, at: Point) {
        let src_x0 = (-at.x).max(0) as u32;
        let src_y0 = (-at.y).max(0) as u32;
        let dst_x0 = at.x.max(0) as u32;
        let dst_y0 = at.y.max(0) as u32;
        if src_x0 >= self.width || dst_x0 >= dest.width {
            return;
        }

        let width = (self.width - src_x0).min(dest.width - dst_x0) as usize;
        let rows = self
            .height
            .saturating_sub(src_y0)
            .min(dest.height.saturating_sub(dst_y0));

        for row in 0..rows {
            let src = ((src_y0 + row) * self.width + src_x0) as usize;
            let dst = ((dst_y0 + row) * dest.width + dst_x0) as usize;
            dest.pixels[dst..dst + width].copy_from_slice(&self.pixels[src..src + width]);
        }
    }

    #[inline]
    fn set_pixel(&mut self, x: i32, y: i32, luma: u8) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            self.pixels[(y as u32 * self.width + x as u32) as usize] = luma;
        }
    }
}

impl OriginDimensions for Surface {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Surface {
    type Color = Gray4;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.set_pixel(coord.x, coord.y, color.luma());
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        if clipped.is_zero_sized() {
            return Ok(());
        }

        let x0 = clipped.top_left.x as usize;
        let w = clipped.size.width as usize;
        for y in clipped.rows() {
            let start = y as usize * self.width as usize + x0;
            self.pixels[start..start + w].fill(color.luma());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_white() {
        let surface = Surface::new(Size::new(4, 3));
        assert_eq!(surface.pixels().len(), 12);
        assert!(surface.pixels().iter().all(|&p| p == MAX_LUMA));
    }

    #[test]
    fn test_fill_solid_is_clipped() {
        let mut surface = Surface::new(Size::new(4, 4));
        surface
            .fill_solid(
                &Rectangle::new(Point::new(2, 2), Size::new(10, 10)),
                Gray4::new(3),
            )
            .unwrap();
        assert_eq!(surface.pixel(1, 1), Some(MAX_LUMA));
        assert_eq!(surface.pixel(3, 3), Some(3));
        assert_eq!(surface.row(2), &[MAX_LUMA, MAX_LUMA, 3, 3]);
    }

    #[test]
    fn test_blit_truncates_rows_past_parent_edge() {
        let mut child = Surface::new(Size::new(3, 3));
        child.fill(5);
        let mut parent = Surface::new(Size::new(4, 4));
        parent.fill(0);

        child.blit_into(&mut parent, Point::new(2, 2));

        assert_eq!(parent.row(1), &[0, 0, 0, 0]);
        assert_eq!(parent.row(2), &[0, 0, 5, 5], "Columns past the edge are cut, not wrapped");
        assert_eq!(parent.row(3), &[0, 0, 5, 5]);
    }

    #[test]
    fn test_blit_with_negative_offset() {
        let mut child = Surface::new(Size::new(3, 3));
        child.fill(7);
        let mut parent = Surface::new(Size::new(3, 3));
        parent.fill(0);

        child.blit_into(&mut parent, Point::new(-2, -1));

        assert_eq!(parent.row(0), &[7, 0, 0]);
        assert_eq!(parent.row(1), &[7, 0, 0]);
        assert_eq!(parent.row(2), &[0, 0, 0]);
    }
}
