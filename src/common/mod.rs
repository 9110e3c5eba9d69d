//! Common types and utilities shared across pagedb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and open options
//! - Error types
//! - Page identifiers
//! - Little-endian byte cursors

pub mod codec;
pub mod config;
pub mod error;
mod page_id;

pub use config::Config;
pub use error::{Error, Result};
pub use page_id::PageId;
