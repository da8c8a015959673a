//! Hardware-independent core library for paper-rs
//!
//! This crate contains the retained-mode compositor for partial-refresh
//! e-paper panels: the node tree, dirty-rectangle aggregation, layered draw
//! and hit-testing, the 4-bit greyscale device raster, touch filtering and
//! the collaborator traits for the panel, power and asset drivers.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod config;
pub mod display_manager;
pub mod drivers;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod ui;

pub use config::CompositorConfig;
pub use display_manager::Manager;
pub use error::UiError;
