//! Data structures for bulb state.
//!
//! This module contains the value types passed through the command surface.

pub mod color;

pub use color::Rgb;
