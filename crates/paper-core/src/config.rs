//! Compositor configuration
//!
//! Defaults describe the M5Paper panel (540 x 960, 4-bit greyscale). The
//! struct is serde-friendly so firmware can load it from a settings blob and
//! the simulator can override single fields.

use embassy_time::Duration;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Highest luma value a 4-bit greyscale pixel can hold.
pub const MAX_LUMA: u8 = 0x0F;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct CompositorConfig {
    pub display: DisplayConfig,
    pub input: InputConfig,
    pub modal: ModalConfig,
}

/// Physical panel geometry and refresh pacing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Panel width in pixels, must be a multiple of 4
    pub width: u32,
    /// Panel height in pixels
    pub height: u32,
    /// Minimum spacing between two panel refreshes
    pub min_refresh_interval_ms: u64,
    /// Luma used to clear exposed background (0 = black, 15 = white)
    pub background: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 540,
            height: 960,
            min_refresh_interval_ms: 500,
            background: MAX_LUMA,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Taps closer together than this are dropped
    pub debounce_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

/// Placement of the manager's modal dialog
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModalConfig {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub title_height: u32,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            x: 50,
            y: 200,
            width: 400,
            height: 300,
            title_height: 30,
        }
    }
}

impl ModalConfig {
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x, self.y),
            Size::new(self.width, self.height),
        )
    }
}

/// Reasons a configuration is rejected
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Display width {0} must be a non-zero multiple of 4")]
    InvalidWidth(u32),

    #[error("Display height must be non-zero")]
    ZeroHeight,

    #[error("Background luma {0} exceeds 15")]
    InvalidBackground(u8),

    #[error("Modal does not fit on a {width}x{height} screen")]
    ModalOutOfBounds { width: u32, height: u32 },
}

impl CompositorConfig {
    /// Check the configuration against the panel constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let display = &self.display;
        if display.width == 0 || display.width % 4 != 0 {
            return Err(ConfigError::InvalidWidth(display.width));
        }
        if display.height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        if display.background > MAX_LUMA {
            return Err(ConfigError::InvalidBackground(display.background));
        }

        let modal = &self.modal;
        let fits_x = modal.x >= 0 && modal.x as u32 + modal.width <= display.width;
        let fits_y = modal.y >= 0 && modal.y as u32 + modal.height <= display.height;
        if !fits_x || !fits_y || modal.title_height >= modal.height {
            return Err(ConfigError::ModalOutOfBounds {
                width: display.width,
                height: display.height,
            });
        }

        Ok(())
    }

    /// Full-screen rectangle in device coordinates.
    pub fn screen_bounds(&self) -> Rectangle {
        Rectangle::new(
            Point::zero(),
            Size::new(self.display.width, self.display.height),
        )
    }

    pub fn min_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.display.min_refresh_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.input.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CompositorConfig::default();
        assert_eq!(config.validate(), Ok(()), "M5Paper defaults should validate");
        assert_eq!(config.screen_bounds().size, Size::new(540, 960));
        assert_eq!(config.min_refresh_interval(), Duration::from_millis(500));
        assert_eq!(config.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn test_width_must_be_multiple_of_four() {
        let mut config = CompositorConfig::default();
        config.display.width = 542;
        assert_eq!(config.validate(), Err(ConfigError::InvalidWidth(542)));

        config.display.width = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidWidth(0)));
    }

    #[test]
    fn test_modal_must_fit_on_screen() {
        let mut config = CompositorConfig::default();
        config.modal.x = 300;
        assert!(
            matches!(
                config.validate(),
                Err(ConfigError::ModalOutOfBounds { .. })
            ),
            "A 400px modal at x=300 overflows a 540px panel"
        );
    }

    #[test]
    fn test_background_luma_is_four_bit() {
        let mut config = CompositorConfig::default();
        config.display.background = 16;
        assert_eq!(config.validate(), Err(ConfigError::InvalidBackground(16)));
    }
}
