//! Crawl orchestration: robots.txt evaluation, the bounded-BFS frontier, and
//! the job lifecycle.

pub mod frontier;
pub mod job;
pub mod robots;

pub use frontier::Frontier;
pub use job::{run_job, BrandJob, InMemoryJobStore, JobRequest, JobStatus, JobStore};
pub use robots::RobotsPolicy;
