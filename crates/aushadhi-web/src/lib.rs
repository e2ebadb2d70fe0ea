//! aushadhi-web — HTTP API for AushadhiAI
//! Serves the drug-discovery endpoints consumed by the frontend:
//!   - Disease -> protein associations
//!   - Target -> bioactive molecules with rendered structures
//!   - Alternate molecule candidates
//!   - Structure evaluation reports

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
