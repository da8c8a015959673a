//! Containers
//!
//! A [`Frame`] groups child nodes, draws them in layer order, routes taps
//! to the topmost hit and works out which parts of itself need repainting.

pub mod container;

pub use container::Frame;
