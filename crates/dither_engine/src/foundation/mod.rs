//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Keyed collections
//! - Logging utilities

pub mod collections;
pub mod math;
pub mod logging;
