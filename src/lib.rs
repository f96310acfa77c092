// Ranked-term store for search popularity
// Rust callers hold a RankedTermService; hosts use the ranked_terms_* C functions

// Error taxonomy
mod error;
pub use error::*;

// Config file and env overrides
mod config;
pub use config::*;

// Log subscriber for embedders
mod logging;
pub use logging::*;

// Ranked-term store (backends, moderation, service, FFI bridge)
mod terms;
pub use terms::*;
