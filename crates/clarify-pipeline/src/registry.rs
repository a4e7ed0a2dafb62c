//! In-memory job records.

use std::collections::HashMap;

use tokio::sync::RwLock;

use clarify_models::{Job, JobId};

/// Shared view of every job this process has handled.
///
/// Records live for the life of the process. The staging tree, not this
/// registry, is the durable resumption ledger; losing these records
/// loses reporting, never work.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for a job.
    pub async fn upsert(&self, job: Job) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    /// Apply `f` to the record for `id`, returning the updated record.
    pub async fn update<F>(&self, id: &JobId, f: F) -> Option<Job>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(id)?;
        f(job);
        Some(job.clone())
    }

    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Every record, newest first.
    pub async fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarify_models::{JobState, MediaKind};

    fn job(id: &str) -> Job {
        Job::new(JobId::from_string(id), MediaKind::Audio, "in.wav")
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let registry = JobRegistry::new();
        registry.upsert(job("a")).await;

        let found = registry.get(&JobId::from_string("a")).await.unwrap();
        assert_eq!(found.state, JobState::Pending);
        assert!(registry.get(&JobId::from_string("b")).await.is_none());
    }

    #[tokio::test]
    async fn test_update_mutates_in_place() {
        let registry = JobRegistry::new();
        let id = JobId::from_string("a");
        registry.upsert(job("a")).await;

        let updated = registry
            .update(&id, |j| j.advance(JobState::Segmenting))
            .await
            .unwrap();
        assert_eq!(updated.state, JobState::Segmenting);
        assert_eq!(
            registry.get(&id).await.unwrap().state,
            JobState::Segmenting
        );

        // Unknown ids are a no-op.
        assert!(registry
            .update(&JobId::from_string("nope"), |j| j.fail("x"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let registry = JobRegistry::new();
        let mut older = job("older");
        older.created_at -= chrono::Duration::seconds(10);
        registry.upsert(older).await;
        registry.upsert(job("newer")).await;

        let jobs = registry.list().await;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id.as_str(), "newer");
        assert_eq!(jobs[1].id.as_str(), "older");
    }
}
