//! Data models

pub mod order;

pub use order::*;
