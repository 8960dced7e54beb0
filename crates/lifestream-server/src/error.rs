//! Error types for the server binary.
//!
//! [`AppError`] wraps every failure mode of startup and shutdown so that
//! `main` can propagate with `?`.

/// Top-level error for the server binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lifestream_core::ConfigError,
    },

    /// Grid dimensions or genesis cells were rejected.
    #[error("grid error: {source}")]
    Grid {
        /// The underlying geometry error.
        #[from]
        source: lifestream_types::GridError,
    },

    /// Building the initial population failed.
    #[error("seeding error: {source}")]
    Seed {
        /// The underlying seeding error.
        #[from]
        source: lifestream_core::SeedError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: lifestream_hub::ServerError,
    },

    /// Installing the Ctrl-C handler failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A background task panicked or was cancelled.
    #[error("task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}
