//! Errors raised while setting up lanes.
//!
//! The runtime itself has no error channel: failures inside effects are
//! turned into messages by the effect. Only lane construction can fail.

use thiserror::Error;

/// Failure to set up a [`Lane`](crate::Lane).
#[derive(Debug, Error)]
pub enum LaneError {
    /// The OS refused to start a lane worker thread.
    #[error("failed to spawn lane worker `{label}`")]
    Spawn {
        /// Name of the thread that could not be started.
        label: String,
        /// Error returned by the OS.
        #[source]
        source: std::io::Error,
    },
}
