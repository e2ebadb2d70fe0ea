//! HTTP handlers for all API routes.

pub mod chembl;
pub mod evaluation;
pub mod molecules;
pub mod protein;
pub mod system;
