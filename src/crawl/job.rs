//! Crawl job lifecycle and job store.
//!
//! `Pending → Processing → {Completed | Failed}`. Per-page failures never
//! fail a job; only a renderer that cannot start does. Job state lives
//! behind the `JobStore` trait so host processes choose their own storage —
//! the engine itself holds no global state.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

use crate::config::CrawlLimits;
use crate::crawl::frontier::Frontier;
use crate::crawl::robots::fetch_policy;
use crate::error::Result;
use crate::extraction::PageExtractor;
use crate::renderer::Renderer;
use crate::synthesis::{build_brand_kit, TextGenerator};
use crate::types::BrandKit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Parameters for one brand discovery job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub seed: Url,
    pub brand_hint: Option<String>,
    pub industry_hint: Option<String>,
}

/// One brand discovery job and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandJob {
    pub id: String,
    pub seed_url: String,
    pub brand_hint: Option<String>,
    pub industry_hint: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<BrandKit>,
    pub error: Option<String>,
}

impl BrandJob {
    pub fn new(request: &JobRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            seed_url: request.seed.to_string(),
            brand_hint: request.brand_hint.clone(),
            industry_hint: request.industry_hint.clone(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
        }
    }

    fn transition(&mut self, status: JobStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Storage for job state, owned by the host process.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: BrandJob);
    async fn update(&self, job: BrandJob);
    async fn get(&self, id: &str) -> Option<BrandJob>;
    async fn list(&self) -> Vec<BrandJob>;
}

/// In-memory job store, suitable for a single host process.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, BrandJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: BrandJob) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    async fn update(&self, job: BrandJob) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    async fn get(&self, id: &str) -> Option<BrandJob> {
        self.jobs.read().await.get(id).cloned()
    }

    async fn list(&self) -> Vec<BrandJob> {
        let mut jobs: Vec<BrandJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        jobs
    }
}

/// Run one job end to end: robots fetch, bounded crawl, kit synthesis.
///
/// The job is tracked in `store` throughout. Returns the kit on success; the
/// only error path is a renderer that could not produce contexts.
pub async fn run_job(
    store: &dyn JobStore,
    renderer: &dyn Renderer,
    generator: &dyn TextGenerator,
    limits: &CrawlLimits,
    request: JobRequest,
) -> Result<BrandKit> {
    let mut job = BrandJob::new(&request);
    let job_id = job.id.clone();
    store.insert(job.clone()).await;
    info!(%job_id, seed = %request.seed, "job created");

    job.transition(JobStatus::Processing);
    store.update(job.clone()).await;

    let client = reqwest::Client::new();
    let robots = fetch_policy(&client, &request.seed, &limits.user_agent).await;

    let extractor = PageExtractor::new(request.brand_hint.clone());
    let frontier = Frontier::new(renderer, limits, robots, extractor);

    let pages = match frontier.crawl(&request.seed).await {
        Ok(pages) => pages,
        Err(e) => {
            error!(%job_id, error = %e, "job failed");
            job.error = Some(e.to_string());
            job.transition(JobStatus::Failed);
            store.update(job).await;
            return Err(e);
        }
    };

    let kit = build_brand_kit(
        &pages,
        request.brand_hint.as_deref(),
        request.industry_hint.as_deref(),
        generator,
    )
    .await;

    job.result = Some(kit.clone());
    job.transition(JobStatus::Completed);
    store.update(job).await;
    info!(%job_id, pages = pages.len(), "job completed");

    Ok(kit)
}
