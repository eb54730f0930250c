//! Utility functions for ValueSpace Core
//!
//! This module provides common utility functions used across the codebase.

mod unique_name;

pub use unique_name::unique_name;
