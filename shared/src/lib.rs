//! Account Auth Shared Library
//!
//! Request/response types, the response envelope and input validation
//! shared between the backend and its clients.

pub mod errors;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
