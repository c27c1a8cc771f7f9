mod locks;

pub use locks::{RangeGuard, RangeLocks};

use parking_lot::RwLock;
use sched_core::{ScheduleError, WeekOptimizer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use utoipa::ToSchema;
use uuid::Uuid;

/// How long a finished job stays queryable.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done {
        #[serde(rename = "lessonsChanged")]
        lessons_changed: usize,
    },
    NoPlanning,
    Failed { message: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

struct JobEntry {
    status: JobStatus,
    finished_at: Option<Instant>,
}

type JobTable = Arc<RwLock<HashMap<String, JobEntry>>>;

/// Background week optimizations, tracked in memory. Finished jobs are
/// dropped once they are older than the retention period.
#[derive(Clone)]
pub struct InMemJobs<O: WeekOptimizer> {
    inner: JobTable,
    optimizer: Arc<O>,
    retention: Duration,
}

impl<O: WeekOptimizer> InMemJobs<O> {
    pub fn new(optimizer: Arc<O>) -> Self {
        Self {
            inner: Default::default(),
            optimizer,
            retention: DEFAULT_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn enqueue(&self, week: u32, year: i32) -> JobId {
        self.evict_expired();
        let id = Uuid::new_v4().to_string();
        set_status(&self.inner, &id, JobStatus::Queued);

        let map = self.inner.clone();
        let optimizer = self.optimizer.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            set_status(&map, &id_for_task, JobStatus::Running);
            let status = match optimizer.optimize_week(week, year).await {
                Ok(result) => {
                    info!(job = %id_for_task, week, year, changed = result.lessons_changed, "optimization job done");
                    JobStatus::Done {
                        lessons_changed: result.lessons_changed,
                    }
                }
                Err(ScheduleError::NoPlanningFound { .. }) => JobStatus::NoPlanning,
                Err(e) => {
                    error!(job = %id_for_task, week, year, error = %e, "optimization job failed");
                    JobStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            set_status(&map, &id_for_task, status);
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.evict_expired();
        self.inner.read().get(id).map(|e| e.status.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_expired(&self) {
        let retention = self.retention;
        let mut map = self.inner.write();
        let before = map.len();
        map.retain(|_, e| e.finished_at.map_or(true, |t| t.elapsed() < retention));
        if map.len() < before {
            debug!(evicted = before - map.len(), "finished jobs expired");
        }
    }
}

fn set_status(map: &JobTable, id: &str, status: JobStatus) {
    let finished_at = status.is_finished().then(Instant::now);
    map.write().insert(id.to_string(), JobEntry { status, finished_at });
}
