//! HTTP handlers for table reads and writes.

pub mod rest;
pub use rest::*;
