pub mod client;
pub mod config;
pub mod error;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use client::{FittingClient, HealthStatus, Recommendation, DEFAULT_BASE_URL};
pub use config::Config;
pub use error::{api_error_message, ErrorPayload, FittingError};
pub use state::{ChatSnapshot, TranscriptEntry};
pub use store::ChatStore;
