//! Image component: blits a packed 4-bit greyscale bitmap

use alloc::borrow::Cow;
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::warn;

use crate::config::MAX_LUMA;
use crate::drivers::AssetSource;
use crate::ui::core::{Drawable, Layer};
use crate::ui::node::Node;

/// Raw bitmap the size of its node
///
/// The bitmap is row-major, two pixels per byte with the even pixel in the
/// high nibble (the same layout the panel expects). An image whose bitmap
/// is missing or too short is left uninitialised and never renders.
pub struct Image {
    pub(crate) node: Node,
    bitmap: Cow<'static, [u8]>,
}

impl Image {
    pub fn new(bounds: Rectangle, bitmap: impl Into<Cow<'static, [u8]>>) -> Self {
        let mut image = Self {
            node: Node::new(bounds),
            bitmap: Cow::Borrowed(&[]),
        };
        image.set_bitmap(bitmap);
        image
    }

    /// Load the bitmap through an asset collaborator.
    ///
    /// A failed load leaves the image uninitialised; nothing retries it.
    pub fn from_asset<A: AssetSource>(bounds: Rectangle, source: &mut A, name: &str) -> Self {
        match source.load(name) {
            Ok(bytes) => Self::new(bounds, bytes),
            Err(e) => {
                warn!("Failed to load image asset {}: {:?}", name, e);
                let mut node = Node::new(bounds);
                node.mark_uninitialised();
                Self {
                    node,
                    bitmap: Cow::Borrowed(&[]),
                }
            }
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.node.layer = layer;
        self
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Bytes needed for a packed bitmap of `size`.
    pub fn expected_len(size: Size) -> usize {
        ((size.width * size.height) as usize).div_ceil(2)
    }

    /// Swap the bitmap and mark the image changed.
    pub fn set_bitmap(&mut self, bitmap: impl Into<Cow<'static, [u8]>>) {
        self.bitmap = bitmap.into();
        let expected = Self::expected_len(self.node.bounds.size);
        if self.bitmap.len() < expected {
            warn!(
                "Bitmap holds {} bytes, {} needed for {}x{}",
                self.bitmap.len(),
                expected,
                self.node.bounds.size.width,
                self.node.bounds.size.height
            );
            self.node.mark_uninitialised();
            return;
        }
        self.node.initialised = true;
        self.node.mark_changed();
    }

    pub(crate) fn paint(&mut self) {
        if let Some(mut surface) = self.node.surface.take() {
            let _ = self.draw(&mut surface);
            self.node.surface = Some(surface);
        }
    }
}

impl Drawable for Image {
    fn draw<D: DrawTarget<Color = Gray4>>(&self, target: &mut D) -> Result<(), D::Error> {
        let size = self.node.bounds.size;
        let count = (size.width * size.height) as usize;
        let bitmap = &self.bitmap;
        let pixels = (0..count).map(|i| {
            let byte = bitmap.get(i / 2).copied().unwrap_or(0xFF);
            let luma = if i % 2 == 0 { byte >> 4 } else { byte & MAX_LUMA };
            Gray4::new(luma)
        });
        target.fill_contiguous(&self.node.local_bounds(), pixels)
    }

    fn measure(&self) -> Size {
        self.node.bounds.size
    }

    fn is_changed(&self) -> bool {
        self.node.content_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    struct MemoryAssets;

    impl AssetSource for MemoryAssets {
        type Error = &'static str;

        fn load(&mut self, name: &str) -> Result<Vec<u8>, Self::Error> {
            match name {
                "checker" => Ok(vec![0x0F, 0xF0]),
                _ => Err("not found"),
            }
        }
    }

    fn bounds() -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(2, 2))
    }

    #[test]
    fn test_bitmap_is_unpacked_high_nibble_first() {
        let mut image = Image::new(bounds(), vec![0x0F, 0xF0]);
        image.paint();
        let surface = image.node().surface().unwrap();
        assert_eq!(surface.row(0), &[0x0, 0xF]);
        assert_eq!(surface.row(1), &[0xF, 0x0]);
    }

    #[test]
    fn test_short_bitmap_leaves_image_uninitialised() {
        let image = Image::new(bounds(), vec![0x00]);
        assert!(!image.node().is_initialised());
    }

    #[test]
    fn test_asset_loading() {
        let mut assets = MemoryAssets;
        let loaded = Image::from_asset(bounds(), &mut assets, "checker");
        assert!(loaded.node().is_initialised());

        let missing = Image::from_asset(bounds(), &mut assets, "missing.bin");
        assert!(
            !missing.node().is_initialised(),
            "A missing asset degrades to an invisible node"
        );
    }
}
