//! Error types for the overlay binary.
//!
//! [`OverlayError`] wraps every failure mode of startup and the frame
//! loop so that `main` can propagate with `?`.

/// Top-level error for the overlay binary.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: breach_core::config::ConfigError,
    },

    /// The frame loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: breach_core::runner::RunnerError,
    },

    /// The `simulation` section of the config could not be used.
    #[error("simulation config error: {message}")]
    Simulation {
        /// Description of the problem.
        message: String,
    },

    /// Installing the log subscriber failed.
    #[error("logging setup failed: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
