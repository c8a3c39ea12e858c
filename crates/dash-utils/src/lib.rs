//! Shared utilities for tickerdash
//!
//! This crate provides common functionality used across the workspace:
//! logging setup and the number formatting shared by every panel.

pub mod format;
pub mod logging;

pub use format::{format_decimal, format_percent, format_thousands};
pub use logging::{LogFormat, init_tracing};
