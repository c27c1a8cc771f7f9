use crate::comfort::HttpComfortSource;
use crate::config::Config;
use anyhow::{Context, Result};
use jobs::{InMemJobs, RangeLocks};
use planning::memory::InMemoryStore;
use planning::{Collaborators, LessonEditService, PlanningSettings, WeeklyPlanningService};
use sched_core::ports::{ComfortSource, NoComfortData};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub planning: Arc<WeeklyPlanningService>,
    pub edits: Arc<LessonEditService>,
    pub jobs: Arc<InMemJobs<WeeklyPlanningService>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = match &config.data.seed_path {
            Some(path) => InMemoryStore::from_json_file(path)
                .with_context(|| format!("failed to load seed data from {}", path.display()))?,
            None => InMemoryStore::default(),
        };
        let comfort: Arc<dyn ComfortSource> = match &config.comfort.base_url {
            Some(url) => Arc::new(HttpComfortSource::new(url.clone(), config.comfort.timeout())?),
            None => Arc::new(NoComfortData),
        };
        let (day_start, day_end) = config.planning.day_window()?;
        let settings = PlanningSettings {
            day_start,
            day_end,
            comfort_timeout: config.comfort.timeout(),
        };
        Ok(Self::new(
            Collaborators::in_memory(Arc::new(store), comfort),
            config,
            settings,
        ))
    }

    pub fn new(repos: Collaborators, config: &Config, settings: PlanningSettings) -> Self {
        let planning = Arc::new(WeeklyPlanningService::new(
            repos.clone(),
            config.planning.week_strategy.strategy(),
            RangeLocks::new(),
            settings,
        ));
        let edits = Arc::new(LessonEditService::new(repos, planning.clone()));
        let jobs = Arc::new(InMemJobs::new(planning.clone()).with_retention(config.jobs.retention()));
        Self { planning, edits, jobs }
    }
}
