// --- File: crates/autoservice_common/src/lib.rs ---

// Declare modules within this crate
pub mod models;    // Wire and domain data structures
pub mod error;     // Error handling
pub mod http;      // HTTP utilities
pub mod services;  // Backend service abstraction
pub mod logging;   // Logging utilities

// Re-export error types and utilities for easier access
pub use error::{
    AutoserviceError,
    BackendError,
    Context,
    config_error,
    validation_error,
    auth_error,
    external_service_error,
    internal_error,
};

// Re-export HTTP utilities for easier access
pub use http::{
    action_url,
    client::create_client,
};

// Re-export logging utilities for easier access
pub use logging::{
    init,
    init_with_level,
    init_with_file,
    init_from_config,
    log_error,
    log_result,
    mask_phone,
};

pub use services::{BookingBackend, BoxFuture};
