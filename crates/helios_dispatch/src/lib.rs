//! Helios dispatch - the render master and everything it shares with
//! its workers.
//!
//! This crate provides:
//!
//! - **Work partitioning**: row-interleaved assignments (`WorkAssignment`)
//! - **Session state**: progress/cancel flag and elapsed clock (`Progress`)
//! - **Statistics**: concurrent counters (`Statistics`, `StatsSnapshot`)
//! - **Point cloud**: concurrent sample collector with PLY export
//! - **Remote dispatch**: the render-client protocol and TCP proxy
//! - **The master**: `Master::start_render` / cancel / join
//!
//! The actual pixel math lives behind `helios_core::RowRenderer`; the
//! dispatcher only schedules it.

pub mod client;
pub mod error;
pub mod master;
pub mod partition;
pub mod point_cloud;
pub mod progress;
pub mod session;
pub mod stats;

mod worker;

pub use client::{
    serve_connection, ClientReply, RenderClient, RenderClientDescriptor, RenderedRow,
    RowRangeRequest, TcpRenderClient,
};
pub use error::{ClientError, ConfigError, ExportError, SessionError};
pub use master::{ExportHooks, Master, SessionHandle};
pub use partition::WorkAssignment;
pub use point_cloud::PointCloud;
pub use progress::Progress;
pub use session::{
    ClientFailure, ProgressReport, SessionConfig, SessionOutcome, SessionResult, WorkerFault,
};
pub use stats::{Statistics, StatsSnapshot};
