//! Error types for the Consumable adapter.
//!
//! Fallible functions return `Result<T, error_stack::Report<AdapterError>>` and
//! wrap lower-level failures with [`error_stack::ResultExt::change_context`].
//! A missing or malformed bid is never an error: it resolves to a pass.

use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum AdapterError {
    /// Static configuration is invalid; construction aborts.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// A slot descriptor could not be created from configuration.
    #[display("Invalid slot: {message}")]
    InvalidSlot { message: String },

    /// Creative registration or rendering failed.
    #[display("Render error: {message}")]
    Render { message: String },

    /// A win-notice pixel could not be delivered.
    #[display("Pixel error: {message}")]
    Pixel { message: String },
}
