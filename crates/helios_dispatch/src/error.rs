//! Error taxonomy for the dispatcher.
//!
//! Configuration errors are fatal and reported before any worker
//! spawns. Client errors are recoverable (the affected rows are
//! reassigned locally). Worker faults are scoped to one worker's rows.
//! Cancellation is not an error at all.

use std::io;

use helios_core::RenderFault;
use thiserror::Error;

/// Fatal problems detected before a session transitions to Rendering.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("image dimensions must be non-zero (got {width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("a render session is already in progress")]
    AlreadyRendering,

    #[error("failed to build renderer for worker {ordinal}: {source}")]
    Factory {
        ordinal: u32,
        source: RenderFault,
    },

    #[error("failed to spawn supervisor thread: {source}")]
    Spawn { source: io::Error },
}

/// Remote dispatch failures. Never fatal for the session: the master
/// reassigns the row range to a local worker and records the failure.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect to {address}: {source}")]
    Connect {
        address: String,
        source: io::Error,
    },

    #[error("client i/o: {0}")]
    Io(#[from] io::Error),

    #[error("client timed out")]
    Timeout,

    #[error("malformed response: {reason}")]
    Malformed { reason: String },

    #[error("client reported failure: {reason}")]
    Remote { reason: String },
}

/// Point-cloud export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot export while a render session is in progress")]
    RenderActive,

    #[error("point cloud is empty")]
    Empty,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failures of the session machinery itself.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("render supervisor thread panicked")]
    SupervisorPanicked,
}
