//! The render master: session lifecycle, worker spawning, remote
//! dispatch and finalization.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use helios_core::{RasterBuffer, RenderFault, RenderOptions, Rgb8, RowRenderer, WorkerFactory};

use crate::client::{RenderClient, RenderedRow, RowRangeRequest};
use crate::error::{ClientError, ConfigError, ExportError, SessionError};
use crate::partition::WorkAssignment;
use crate::point_cloud::PointCloud;
use crate::progress::Progress;
use crate::session::{
    ClientFailure, ProgressReport, SessionConfig, SessionOutcome, SessionResult, SessionShared,
    WorkerFault,
};
use crate::stats::{Statistics, StatsSnapshot};
use crate::worker;

/// Callbacks around a point-cloud export, used by a front end to
/// disable conflicting triggers while the file is written.
pub struct ExportHooks {
    pub on_start: Box<dyn Fn() + Send + Sync>,
    pub on_end: Box<dyn Fn() + Send + Sync>,
}

/// Owns the render lifecycle. At most one session is active per
/// master: `Idle -> Rendering -> {Completed, Cancelled} -> Idle`.
///
/// There is no process-wide instance; callers hold the master and
/// thread the `SessionHandle` through cancel/progress/join.
pub struct Master {
    rendering: Arc<AtomicBool>,
    point_cloud: Arc<PointCloud>,
    export_hooks: Option<ExportHooks>,
}

impl Master {
    pub fn new() -> Self {
        Self {
            rendering: Arc::new(AtomicBool::new(false)),
            point_cloud: Arc::new(PointCloud::new()),
            export_hooks: None,
        }
    }

    pub fn with_export_hooks(mut self, hooks: ExportHooks) -> Self {
        self.export_hooks = Some(hooks);
        self
    }

    /// The point cloud gathered by the most recent collecting session.
    pub fn point_cloud(&self) -> &Arc<PointCloud> {
        &self.point_cloud
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::SeqCst)
    }

    /// Start a render session.
    ///
    /// Builds one renderer clone per local slot before any thread
    /// spawns, so configuration errors never leave a half-started
    /// session. The first `min(clients, workers)` slots of the
    /// interleave are dispatched to the given remote clients; the rest
    /// run locally.
    pub fn start_render(
        &self,
        config: SessionConfig,
        factory: Arc<dyn WorkerFactory>,
        clients: Vec<Box<dyn RenderClient>>,
    ) -> Result<SessionHandle, ConfigError> {
        if config.width == 0 || config.height == 0 {
            return Err(ConfigError::ZeroDimensions {
                width: config.width,
                height: config.height,
            });
        }
        if config.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self
            .rendering
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ConfigError::AlreadyRendering);
        }

        // Any failure from here on must hand the master back to Idle.
        match self.spawn_session(config, factory, clients) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                self.rendering.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn spawn_session(
        &self,
        config: SessionConfig,
        factory: Arc<dyn WorkerFactory>,
        mut clients: Vec<Box<dyn RenderClient>>,
    ) -> Result<SessionHandle, ConfigError> {
        let total = config.workers;
        if clients.len() as u32 > total {
            log::warn!(
                "{} render clients registered but only {} worker slots; ignoring the surplus",
                clients.len(),
                total
            );
            clients.truncate(total as usize);
        }
        let client_slots = clients.len() as u32;

        let mut local_renderers = Vec::with_capacity((total - client_slots) as usize);
        for ordinal in client_slots..total {
            let renderer = factory
                .build(ordinal)
                .map_err(|source| ConfigError::Factory { ordinal, source })?;
            local_renderers.push(renderer);
        }

        let shared = Arc::new(SessionShared {
            progress: Progress::new(),
            stats: Statistics::new(),
            point_cloud: self.point_cloud.clone(),
            collect_points: config.point_cloud,
        });
        shared
            .progress
            .reset(Progress::sync_interval_for(config.width, config.height));
        shared.stats.reset();
        if config.point_cloud {
            shared.point_cloud.clear();
        }

        log::info!(
            "render session: {}x{}, {} local workers, {} remote clients, point cloud {}",
            config.width,
            config.height,
            total - client_slots,
            client_slots,
            if config.point_cloud { "on" } else { "off" }
        );

        let session_shared = shared.clone();
        let supervisor = thread::Builder::new()
            .name("helios-master".into())
            .spawn(move || run_session(config, session_shared, local_renderers, clients, factory))
            .map_err(|source| ConfigError::Spawn { source })?;

        Ok(SessionHandle {
            shared,
            supervisor,
            rendering: self.rendering.clone(),
        })
    }

    /// Export the collected point cloud as PLY.
    ///
    /// Rendering and exporting are mutually exclusive; this fails
    /// while a session is active.
    pub fn export_point_cloud(&self, path: &Path) -> Result<usize, ExportError> {
        if self.is_rendering() {
            return Err(ExportError::RenderActive);
        }
        if let Some(hooks) = &self.export_hooks {
            (hooks.on_start)();
        }
        let result = self.point_cloud.export_ply(path);
        if let Some(hooks) = &self.export_hooks {
            (hooks.on_end)();
        }
        result
    }
}

impl Default for Master {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to an in-flight render session.
pub struct SessionHandle {
    shared: Arc<SessionShared>,
    supervisor: JoinHandle<SessionResult>,
    rendering: Arc<AtomicBool>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

impl SessionHandle {
    /// Request cooperative cancellation. Workers observe the flag at
    /// scanline granularity; none are forcibly terminated.
    pub fn cancel(&self) {
        log::info!("cancellation requested");
        self.shared.progress.request_stop();
    }

    /// Live progress read.
    pub fn progress(&self) -> ProgressReport {
        ProgressReport {
            continuing: self.shared.progress.should_continue(),
            elapsed: self.shared.progress.elapsed(),
            sync_interval: self.shared.progress.sync_interval(),
        }
    }

    /// Live statistics read. Each counter is individually accurate but
    /// the four are only mutually consistent after `join`.
    pub fn statistics(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Block until every worker and remote dispatch has returned, then
    /// finalize and hand back the session result. The master returns
    /// to Idle.
    pub fn join(self) -> Result<SessionResult, SessionError> {
        let result = self.supervisor.join();
        self.rendering.store(false, Ordering::SeqCst);
        result.map_err(|_| SessionError::SupervisorPanicked)
    }
}

enum SlotReport {
    Local {
        rows: u32,
        fault: Option<(u32, RenderFault)>,
    },
    Remote {
        label: String,
        rows: u32,
        failure: Option<(ClientError, u32)>,
        fault: Option<(u32, RenderFault)>,
    },
}

/// Supervisor body: spawn one thread per slot, wait for all of them,
/// finalize.
fn run_session(
    config: SessionConfig,
    shared: Arc<SessionShared>,
    local_renderers: Vec<Box<dyn RowRenderer>>,
    clients: Vec<Box<dyn RenderClient>>,
    factory: Arc<dyn WorkerFactory>,
) -> SessionResult {
    let total = config.workers;
    let client_slots = clients.len() as u32;
    let mut raster = RasterBuffer::new(config.width, config.height);

    let reports: Vec<(u32, thread::Result<SlotReport>)> = {
        let shared_ref: &SessionShared = &shared;
        let mut sets = raster.interleaved_rows_mut(total).into_iter();

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(total as usize);

            for (i, mut client) in clients.into_iter().enumerate() {
                let ordinal = i as u32;
                let Some(mut rows) = sets.next() else { break };
                let assignment = WorkAssignment::new(ordinal, total);
                debug_assert!(rows.iter().all(|(y, _)| assignment.owns_row(*y)));
                let factory = factory.clone();
                let options = config.options.clone();
                let (width, height) = (config.width, config.height);
                let handle = scope.spawn(move || {
                    dispatch_remote(
                        client.as_mut(),
                        ordinal,
                        &mut rows,
                        width,
                        height,
                        options,
                        factory.as_ref(),
                        shared_ref,
                    )
                });
                handles.push((ordinal, handle));
            }

            for (i, mut renderer) in local_renderers.into_iter().enumerate() {
                let ordinal = client_slots + i as u32;
                let Some(mut rows) = sets.next() else { break };
                let assignment = WorkAssignment::new(ordinal, total);
                debug_assert!(rows.iter().all(|(y, _)| assignment.owns_row(*y)));
                let handle = scope.spawn(move || {
                    let output = worker::render_rows(renderer.as_mut(), &mut rows, shared_ref);
                    SlotReport::Local {
                        rows: output.rows_rendered,
                        fault: output.fault,
                    }
                });
                handles.push((ordinal, handle));
            }

            handles
                .into_iter()
                .map(|(ordinal, handle)| (ordinal, handle.join()))
                .collect()
        })
    };

    let mut rows_rendered = 0;
    let mut client_failures = Vec::new();
    let mut worker_faults = Vec::new();
    for (ordinal, joined) in reports {
        match joined {
            Ok(SlotReport::Local { rows, fault }) => {
                rows_rendered += rows;
                if let Some((row, fault)) = fault {
                    log::warn!("worker {ordinal} faulted at row {row}: {fault}");
                    worker_faults.push(WorkerFault {
                        ordinal,
                        row: Some(row),
                        fault,
                    });
                }
            }
            Ok(SlotReport::Remote {
                label,
                rows,
                failure,
                fault,
            }) => {
                rows_rendered += rows;
                if let Some((error, reassigned_rows)) = failure {
                    client_failures.push(ClientFailure {
                        label,
                        error,
                        reassigned_rows,
                    });
                }
                if let Some((row, fault)) = fault {
                    worker_faults.push(WorkerFault {
                        ordinal,
                        row: Some(row),
                        fault,
                    });
                }
            }
            Err(_) => {
                log::error!("worker {ordinal} panicked");
                worker_faults.push(WorkerFault {
                    ordinal,
                    row: None,
                    fault: RenderFault::new("worker thread panicked"),
                });
            }
        }
    }

    let elapsed = shared.progress.freeze();
    let outcome = if shared.progress.should_continue() {
        SessionOutcome::Completed
    } else {
        SessionOutcome::Cancelled
    };
    let stats = shared.stats.snapshot();

    log::info!(
        "render {}: {:.1}s [ {}x{}, mt{}, {} ]",
        match outcome {
            SessionOutcome::Completed => "finished",
            SessionOutcome::Cancelled => "cancelled",
        },
        elapsed.as_secs_f64(),
        config.width,
        config.height,
        total,
        stats
    );

    SessionResult {
        outcome,
        elapsed,
        raster,
        stats,
        rows_rendered,
        client_failures,
        worker_faults,
    }
}

/// Drive one remote client; on any failure re-render the range with a
/// locally built renderer (fallback-to-local policy).
#[allow(clippy::too_many_arguments)]
fn dispatch_remote(
    client: &mut dyn RenderClient,
    ordinal: u32,
    rows: &mut [(u32, &mut [Rgb8])],
    width: u32,
    height: u32,
    options: RenderOptions,
    factory: &dyn WorkerFactory,
    shared: &SessionShared,
) -> SlotReport {
    let label = client.label();
    if !shared.progress.should_continue() {
        return SlotReport::Remote {
            label,
            rows: 0,
            failure: None,
            fault: None,
        };
    }

    let request = RowRangeRequest {
        width,
        height,
        rows: rows.iter().map(|(y, _)| *y).collect(),
        options,
    };

    let outcome = client
        .render_rows(&request)
        .and_then(|returned| apply_rendered_rows(rows, returned, width));

    match outcome {
        Ok(count) => {
            log::debug!("client {label} rendered {count} rows");
            SlotReport::Remote {
                label,
                rows: count,
                failure: None,
                fault: None,
            }
        }
        Err(error) => {
            let reassigned = rows.len() as u32;
            log::warn!("client {label} failed ({error}); reassigning {reassigned} rows locally");
            match factory.build(ordinal) {
                Ok(mut renderer) => {
                    let output = worker::render_rows(renderer.as_mut(), rows, shared);
                    SlotReport::Remote {
                        label,
                        rows: output.rows_rendered,
                        failure: Some((error, reassigned)),
                        fault: output.fault,
                    }
                }
                Err(fault) => SlotReport::Remote {
                    label,
                    rows: 0,
                    failure: Some((error, reassigned)),
                    fault: rows.first().map(|(y, _)| (*y, fault)),
                },
            }
        }
    }
}

/// Copy a client reply into the raster, insisting it covers exactly
/// the requested rows at full width.
fn apply_rendered_rows(
    rows: &mut [(u32, &mut [Rgb8])],
    returned: Vec<RenderedRow>,
    width: u32,
) -> Result<u32, ClientError> {
    let mut by_row: HashMap<u32, Vec<Rgb8>> = HashMap::with_capacity(returned.len());
    for rendered in returned {
        if by_row.insert(rendered.y, rendered.pixels).is_some() {
            return Err(ClientError::Malformed {
                reason: format!("duplicate row {} in reply", rendered.y),
            });
        }
    }

    for (y, slice) in rows.iter_mut() {
        let pixels = by_row.remove(y).ok_or_else(|| ClientError::Malformed {
            reason: format!("reply is missing row {y}"),
        })?;
        if pixels.len() != width as usize {
            return Err(ClientError::Malformed {
                reason: format!("row {y} has {} pixels, expected {width}", pixels.len()),
            });
        }
        slice.copy_from_slice(&pixels);
    }

    if let Some(y) = by_row.keys().next() {
        return Err(ClientError::Malformed {
            reason: format!("reply contains unrequested row {y}"),
        });
    }
    Ok(rows.len() as u32)
}
