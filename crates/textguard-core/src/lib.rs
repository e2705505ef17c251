//! TextGuard Core
//!
//! Types shared by the TextGuard classifier and server crates.
//!
//! This crate provides:
//! - The public vocabulary of the service (`Label`, `Verdict`)
//! - Error types and result handling
//! - Echo helpers used when results quote submitted text back

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{echo_text, Label, Verdict, ECHO_LIMIT};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Label, Verdict};
}
