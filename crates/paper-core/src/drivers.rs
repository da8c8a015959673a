//! Collaborator interfaces the compositor depends on but does not implement
//!
//! The panel refresh sequence, power management and asset storage are
//! hardware specific. The core only talks to them through these traits,
//! which the firmware and the desktop simulator implement.

use alloc::vec::Vec;
use embassy_time::Duration;
use embedded_graphics::primitives::Rectangle;

/// Partial-refresh panel driver
pub trait DisplayDriver {
    type Error: core::fmt::Debug;

    /// Write a packed 4-bit greyscale window to `area` and refresh it.
    ///
    /// `packed` holds two pixels per byte, row-major, high nibble first.
    /// `area.size.width` is always a multiple of 4. The driver performs the
    /// two-phase refresh (init pass, then the visible greyscale pass); the
    /// caller has already waited out the minimum inter-refresh spacing.
    fn push_rect(&mut self, area: Rectangle, packed: &[u8]) -> Result<(), Self::Error>;
}

/// Power and sleep management
pub trait PowerControl {
    /// Block until the next touch-down interrupt.
    ///
    /// `since_last_push` is the time since the last display push, or `None`
    /// when nothing has been pushed yet.
    fn sleep_until_touch(&mut self, since_last_push: Option<Duration>);
}

/// Source of bitmap assets (SD card, flash partition, host filesystem)
pub trait AssetSource {
    type Error: core::fmt::Debug;

    /// Load a raw packed 4-bit greyscale bitmap by name.
    fn load(&mut self, name: &str) -> Result<Vec<u8>, Self::Error>;
}
