//! Command handlers.

pub mod lossless;
pub mod views;
