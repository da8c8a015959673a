//! Device-backed raster mirroring the panel's 4-bit greyscale memory.
//!
//! Nodes whose parent is the device-backed root pack their surfaces into
//! this mirror at absolute coordinates. When the render pass is done the
//! manager extracts the update rectangle with [`DeviceRaster::window`] and
//! hands that buffer to the panel driver in a single transfer.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::config::MAX_LUMA;
use crate::ui::Surface;

/// Byte holding two white pixels.
const WHITE_PAIR: u8 = (MAX_LUMA << 4) | MAX_LUMA;

/// Offset of an absolute pixel inside a packed window covering `top`.
///
/// Counted in pixels; the byte is `offset / 2` and even offsets use the
/// high nibble. Only meaningful for points inside `top`.
pub fn window_offset(abs: Point, top: &Rectangle) -> usize {
    ((abs.y - top.top_left.y) as usize) * top.size.width as usize
        + (abs.x - top.top_left.x) as usize
}

/// Pack 8-bit indexed pixels (low nibble significant) two per byte.
///
/// The even pixel lands in the high nibble. `dst` must hold at least
/// `src.len() / 2` bytes; a trailing odd pixel is paired with white.
pub fn pack_gray4(src: &[u8], dst: &mut [u8]) {
    for (out, pair) in dst.iter_mut().zip(src.chunks(2)) {
        let hi = pair[0] & MAX_LUMA;
        let lo = pair.get(1).map_or(MAX_LUMA, |p| p & MAX_LUMA);
        *out = (hi << 4) | lo;
    }
}

/// Inverse of [`pack_gray4`].
pub fn unpack_gray4(src: &[u8], dst: &mut [u8]) {
    for (pair, byte) in dst.chunks_mut(2).zip(src) {
        pair[0] = byte >> 4;
        if let Some(lo) = pair.get_mut(1) {
            *lo = byte & MAX_LUMA;
        }
    }
}

/// Full-screen packed 4bpp mirror implementing `DrawTarget<Color = Gray4>`.
pub struct DeviceRaster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl DeviceRaster {
    /// Allocate a white raster. `size.width` must be even.
    pub fn new(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            data: vec![WHITE_PAIR; (size.width * size.height / 2) as usize],
        }
    }

    /// Raw packed memory, row-major, two pixels per byte.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) as usize;
        let byte = self.data[idx / 2];
        Some(if idx % 2 == 0 { byte >> 4 } else { byte & MAX_LUMA })
    }

    #[inline]
    fn set_pixel(&mut self, x: u32, y: u32, luma: u8) {
        let idx = (y * self.width + x) as usize;
        let byte = &mut self.data[idx / 2];
        *byte = if idx % 2 == 0 {
            (*byte & MAX_LUMA) | ((luma & MAX_LUMA) << 4)
        } else {
            (*byte & !MAX_LUMA) | (luma & MAX_LUMA)
        };
    }

    /// Pack `region` of `surface` so that surface pixel (0, 0) lands at `origin`.
    ///
    /// `region` is in surface coordinates and is clipped to both the surface
    /// and the raster.
    pub fn pack_surface(&mut self, surface: &Surface, region: &Rectangle, origin: Point) {
        let region = region.intersection(&surface.bounding_box());
        let target = Rectangle::new(origin + region.top_left, region.size)
            .intersection(&self.bounding_box());
        if target.is_zero_sized() {
            return;
        }

        for y in target.rows() {
            let row = surface.row((y - origin.y) as u32);
            for x in target.columns() {
                let luma = row[(x - origin.x) as usize];
                self.set_pixel(x as u32, y as u32, luma);
            }
        }
    }

    /// Copy `area` out as a packed window for the panel driver.
    ///
    /// Pixel (x, y) of the screen lands at [`window_offset`] within the
    /// returned buffer. Pixels outside the raster read as white.
    pub fn window(&self, area: &Rectangle) -> Vec<u8> {
        let pixels = (area.size.width * area.size.height) as usize;
        let mut out = vec![WHITE_PAIR; pixels.div_ceil(2)];

        debug!(
            "Packing {}x{} window at ({}, {})",
            area.size.width, area.size.height, area.top_left.x, area.top_left.y
        );

        for y in area.rows() {
            for x in area.columns() {
                if x < 0 || y < 0 {
                    continue;
                }
                let Some(luma) = self.pixel(x as u32, y as u32) else {
                    continue;
                };
                let offset = window_offset(Point::new(x, y), area);
                let byte = &mut out[offset / 2];
                *byte = if offset % 2 == 0 {
                    (*byte & MAX_LUMA) | (luma << 4)
                } else {
                    (*byte & !MAX_LUMA) | luma
                };
            }
        }
        out
    }
}

impl OriginDimensions for DeviceRaster {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for DeviceRaster {
    type Color = Gray4;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x >= 0
                && coord.y >= 0
                && (coord.x as u32) < self.width
                && (coord.y as u32) < self.height
            {
                self.set_pixel(coord.x as u32, coord.y as u32, color.luma());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        for y in clipped.rows() {
            for x in clipped.columns() {
                self.set_pixel(x as u32, y as u32, color.luma());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_round_trip() {
        let src: Vec<u8> = (0..32u8).map(|i| (i * 7) | 0xA0).collect();
        let mut packed = vec![0u8; src.len() / 2];
        pack_gray4(&src, &mut packed);

        let mut unpacked = vec![0u8; src.len()];
        unpack_gray4(&packed, &mut unpacked);

        for (i, (&orig, &back)) in src.iter().zip(&unpacked).enumerate() {
            assert_eq!(orig & 0x0F, back, "Pixel {} lost its low nibble", i);
        }
    }

    #[test]
    fn test_even_pixel_uses_high_nibble() {
        let mut packed = [0u8; 1];
        pack_gray4(&[0x03, 0x0C], &mut packed);
        assert_eq!(packed[0], 0x3C);
    }

    #[test]
    fn test_window_offset_matches_row_major_layout() {
        let top = Rectangle::new(Point::new(8, 4), Size::new(12, 6));
        assert_eq!(window_offset(Point::new(8, 4), &top), 0);
        assert_eq!(window_offset(Point::new(9, 4), &top), 1);
        assert_eq!(window_offset(Point::new(8, 5), &top), 12);
        assert_eq!(window_offset(Point::new(13, 7), &top), 3 * 12 + 5);
    }

    #[test]
    fn test_pack_surface_at_absolute_offset() {
        let mut raster = DeviceRaster::new(Size::new(16, 8));
        let mut surface = Surface::new(Size::new(4, 2));
        surface.fill(2);

        raster.pack_surface(&surface, &surface.bounding_box(), Point::new(5, 3));

        assert_eq!(raster.pixel(4, 3), Some(MAX_LUMA));
        assert_eq!(raster.pixel(5, 3), Some(2));
        assert_eq!(raster.pixel(8, 4), Some(2));
        assert_eq!(raster.pixel(9, 4), Some(MAX_LUMA));
        assert_eq!(raster.pixel(5, 5), Some(MAX_LUMA));
    }

    #[test]
    fn test_pack_surface_respects_region() {
        let mut raster = DeviceRaster::new(Size::new(8, 8));
        let mut surface = Surface::new(Size::new(4, 4));
        surface.fill(0);

        let region = Rectangle::new(Point::new(2, 2), Size::new(2, 2));
        raster.pack_surface(&surface, &region, Point::zero());

        assert_eq!(raster.pixel(1, 1), Some(MAX_LUMA), "Outside the region is untouched");
        assert_eq!(raster.pixel(2, 2), Some(0));
        assert_eq!(raster.pixel(3, 3), Some(0));
    }

    #[test]
    fn test_window_extracts_odd_origin() {
        let mut raster = DeviceRaster::new(Size::new(8, 4));
        raster
            .fill_solid(&Rectangle::new(Point::new(3, 1), Size::new(1, 1)), Gray4::new(1))
            .unwrap();

        let area = Rectangle::new(Point::new(3, 1), Size::new(4, 2));
        let window = raster.window(&area);

        assert_eq!(window.len(), 4);
        assert_eq!(window[0], 0x1F, "Pixel (3,1) is the first, high-nibble pixel");
        assert_eq!(window[1], WHITE_PAIR);
    }
}
