//! aushadhi-common — Shared error taxonomy used across all AushadhiAI crates.

pub mod error;

pub use error::{AushadhiError, Result};
