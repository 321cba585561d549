//! Session configuration, shared state and results.

use std::sync::Arc;
use std::time::Duration;

use helios_core::{RasterBuffer, RenderFault, RenderOptions};

use crate::error::ClientError;
use crate::point_cloud::PointCloud;
use crate::progress::Progress;
use crate::stats::{Statistics, StatsSnapshot};

/// Parameters for one render invocation.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub width: u32,
    pub height: u32,
    /// Total worker slots (local threads plus remote dispatches).
    pub workers: u32,
    /// Collect point-cloud samples during this session.
    pub point_cloud: bool,
    /// Renderer capabilities; forwarded to remote clients so both
    /// sides render with the same configuration.
    pub options: RenderOptions,
}

impl SessionConfig {
    pub fn new(width: u32, height: u32, workers: u32) -> Self {
        Self {
            width,
            height,
            workers,
            point_cloud: false,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.point_cloud = options.point_cloud;
        self.options = options;
        self
    }
}

/// State shared by the master, its workers and progress readers.
pub(crate) struct SessionShared {
    pub progress: Progress,
    pub stats: Statistics,
    pub point_cloud: Arc<PointCloud>,
    pub collect_points: bool,
}

/// Terminal state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Cancelled,
}

/// A recorded remote dispatch failure; the rows were re-rendered
/// locally.
#[derive(Debug)]
pub struct ClientFailure {
    pub label: String,
    pub error: ClientError,
    pub reassigned_rows: u32,
}

/// A recorded local renderer fault; only that worker's remaining rows
/// were lost.
#[derive(Debug)]
pub struct WorkerFault {
    pub ordinal: u32,
    pub row: Option<u32>,
    pub fault: RenderFault,
}

/// Everything a finished session hands back to the caller.
#[derive(Debug)]
pub struct SessionResult {
    pub outcome: SessionOutcome,
    pub elapsed: Duration,
    /// The output image; fully populated on clean completion, only
    /// whole rows on cancellation or faults.
    pub raster: RasterBuffer,
    /// Consistent totals - read after every worker has joined.
    pub stats: StatsSnapshot,
    pub rows_rendered: u32,
    pub client_failures: Vec<ClientFailure>,
    pub worker_faults: Vec<WorkerFault>,
}

impl SessionResult {
    /// Completed with no reassignments and no faults.
    pub fn is_clean(&self) -> bool {
        self.outcome == SessionOutcome::Completed
            && self.client_failures.is_empty()
            && self.worker_faults.is_empty()
    }
}

/// A live progress read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressReport {
    /// False once cancellation has been requested.
    pub continuing: bool,
    pub elapsed: Duration,
    /// How often readers should poll.
    pub sync_interval: Duration,
}
