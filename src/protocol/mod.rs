//! Protocol module for constructing bulb command frames.
//!
//! This module contains the encoders for the power and color frames
//! written to the light control characteristic.

pub mod commands;

pub use commands::{encode_color, encode_power, Command, COLOR_FRAME_LEN, POWER_FRAME_LEN};
