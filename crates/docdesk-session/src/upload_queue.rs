//! Upload Queue Manager
//!
//! Each accepted file becomes an [`UploadJob`] that uploads on its own task
//! with no queue-wide concurrency limit. Tasks report progress and the final
//! outcome through the event channel; the queue applies them in order, so a
//! job's progress updates never land after its terminal transition.
//!
//! Lifecycle per job: `pending -> uploading -> completed | error`. Completed
//! jobs are evicted after a delay; completed and failed jobs may also be
//! removed by hand. In-flight jobs cannot be removed.

use chrono::{DateTime, Utc};
use docdesk_api_client::{DocumentStore, ProgressFn, UploadFile};
use docdesk_core::constants::UPLOAD_FAILED;
use docdesk_core::{Document, StoreResult};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::QueueError;
use crate::events::{DeskEvent, EventSender};

/// Local job identity: creation time, a per-queue sequence number and the
/// original filename. Never shared with the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    fn new(created_at: DateTime<Utc>, seq: u64, filename: &str) -> Self {
        Self(format!(
            "{}-{}-{}",
            created_at.timestamp_millis(),
            seq,
            filename
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Uploading,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Uploading => "uploading",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

#[derive(Debug, Clone)]
enum JobState {
    Pending,
    Uploading { progress: u8 },
    Completed { document: Document },
    Failed { progress: u8, message: String },
}

#[derive(Debug, Clone)]
pub struct UploadJob {
    id: JobId,
    file: UploadFile,
    created_at: DateTime<Utc>,
    state: JobState,
}

impl UploadJob {
    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.file.filename
    }

    pub fn size(&self) -> u64 {
        self.file.size()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> JobStatus {
        match self.state {
            JobState::Pending => JobStatus::Pending,
            JobState::Uploading { .. } => JobStatus::Uploading,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Error,
        }
    }

    /// Percentage uploaded. Always 100 once completed; a failed job keeps
    /// its last reported value.
    pub fn progress(&self) -> u8 {
        match self.state {
            JobState::Pending => 0,
            JobState::Uploading { progress } | JobState::Failed { progress, .. } => progress,
            JobState::Completed { .. } => 100,
        }
    }

    /// Failure message, present only in the error state.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.state {
            JobState::Completed { document } => Some(document),
            _ => None,
        }
    }
}

pub struct UploadQueue {
    jobs: Vec<UploadJob>,
    store: Arc<dyn DocumentStore>,
    events: EventSender,
    evict_delay: Duration,
    next_seq: u64,
}

impl UploadQueue {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventSender, evict_delay: Duration) -> Self {
        Self {
            jobs: Vec::new(),
            store,
            events,
            evict_delay,
            next_seq: 0,
        }
    }

    /// Jobs in enqueue order.
    pub fn jobs(&self) -> &[UploadJob] {
        &self.jobs
    }

    pub fn get(&self, id: &JobId) -> Option<&UploadJob> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Accept files: one pending job per file, each started immediately.
    pub fn enqueue(&mut self, files: Vec<UploadFile>) -> Vec<JobId> {
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let created_at = Utc::now();
            let id = JobId::new(created_at, self.next_seq, &file.filename);
            self.next_seq += 1;

            info!(job_id = %id, filename = %file.filename, size = file.size(), "Upload job created");
            self.jobs.push(UploadJob {
                id: id.clone(),
                file,
                created_at,
                state: JobState::Pending,
            });
            ids.push(id);
        }

        for id in &ids {
            self.start(id);
        }
        ids
    }

    fn start(&mut self, id: &JobId) {
        let Some(job) = self.jobs.iter_mut().find(|job| &job.id == id) else {
            return;
        };
        job.state = JobState::Uploading { progress: 0 };

        let file = job.file.clone();
        let job_id = job.id.clone();
        let store = self.store.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            run_upload(store, events, job_id, file).await;
        });
    }

    /// Record a progress report. Ignored unless the job is uploading; never
    /// lowers the stored value.
    pub fn apply_progress(&mut self, id: &JobId, percent: u8) -> bool {
        let Some(job) = self.jobs.iter_mut().find(|job| &job.id == id) else {
            return false;
        };
        match &mut job.state {
            JobState::Uploading { progress } => {
                let next = (*progress).max(percent.min(100));
                let changed = next != *progress;
                *progress = next;
                changed
            }
            _ => false,
        }
    }

    /// Apply the outcome of a job's upload. Returns the created document on
    /// success, after scheduling the job's eviction.
    pub fn apply_finished(&mut self, id: &JobId, outcome: StoreResult<Document>) -> Option<Document> {
        let Some(job) = self.jobs.iter_mut().find(|job| &job.id == id) else {
            debug!(job_id = %id, "Upload finished for a job no longer in the queue");
            return None;
        };
        let JobState::Uploading { progress } = job.state else {
            warn!(job_id = %id, status = job.status().as_str(), "Ignoring upload outcome for job not uploading");
            return None;
        };

        match outcome {
            Ok(document) => {
                info!(job_id = %id, document_id = %document.id, "Upload completed");
                job.state = JobState::Completed {
                    document: document.clone(),
                };
                self.schedule_eviction(id.clone());
                Some(document)
            }
            Err(e) => {
                let message = e.detail().unwrap_or(UPLOAD_FAILED).to_string();
                warn!(job_id = %id, error = %e, progress, "Upload failed");
                job.state = JobState::Failed { progress, message };
                None
            }
        }
    }

    fn schedule_eviction(&self, job_id: JobId) {
        let events = self.events.clone();
        let delay = self.evict_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(DeskEvent::EvictJob { job_id }).is_err() {
                debug!("Event channel closed before eviction");
            }
        });
    }

    /// Remove a job once its eviction delay has passed. A job that is
    /// already gone is a no-op.
    pub fn evict(&mut self, id: &JobId) -> bool {
        match self.jobs.iter().position(|job| &job.id == id) {
            Some(index) => {
                self.jobs.remove(index);
                debug!(job_id = %id, "Evicted upload job");
                true
            }
            None => {
                debug!(job_id = %id, "Eviction for job already removed");
                false
            }
        }
    }

    /// Remove a completed or failed job by hand.
    pub fn remove(&mut self, id: &JobId) -> Result<UploadJob, QueueError> {
        let index = self
            .jobs
            .iter()
            .position(|job| &job.id == id)
            .ok_or_else(|| QueueError::UnknownJob(id.clone()))?;

        if !self.jobs[index].status().is_terminal() {
            return Err(QueueError::InFlight(id.clone()));
        }
        Ok(self.jobs.remove(index))
    }
}

#[instrument(skip(store, events, file), fields(job_id = %job_id, filename = %file.filename))]
async fn run_upload(
    store: Arc<dyn DocumentStore>,
    events: EventSender,
    job_id: JobId,
    file: UploadFile,
) {
    let progress_events = events.clone();
    let progress_job = job_id.clone();
    let on_progress: ProgressFn = Arc::new(move |percent: u8| {
        let _ = progress_events.send(DeskEvent::UploadProgress {
            job_id: progress_job.clone(),
            percent,
        });
    });

    let outcome = store.upload_document(file, on_progress).await;
    if events
        .send(DeskEvent::UploadFinished { job_id, outcome })
        .is_err()
    {
        debug!("Event channel closed before upload finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{self, EventReceiver};
    use crate::test_helpers::MockStore;
    use docdesk_core::StoreError;

    fn queue_with(store: MockStore) -> (UploadQueue, EventReceiver) {
        let (tx, rx) = events::channel();
        let queue = UploadQueue::new(Arc::new(store), tx, Duration::from_secs(3));
        (queue, rx)
    }

    /// Apply events until the given job reaches a terminal state.
    async fn drive(queue: &mut UploadQueue, rx: &mut EventReceiver, id: &JobId) -> Vec<u8> {
        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                DeskEvent::UploadProgress { job_id, percent } => {
                    queue.apply_progress(&job_id, percent);
                    if &job_id == id {
                        seen.push(queue.get(id).map(|j| j.progress()).unwrap_or_default());
                    }
                }
                DeskEvent::UploadFinished { job_id, outcome } => {
                    queue.apply_finished(&job_id, outcome);
                    if &job_id == id {
                        break;
                    }
                }
                _ => {}
            }
        }
        seen
    }

    #[tokio::test]
    async fn test_enqueue_starts_every_job() {
        let (mut queue, _rx) = queue_with(MockStore::new());
        let ids = queue.enqueue(vec![
            UploadFile::new("a.txt", "a"),
            UploadFile::new("b.txt", "b"),
        ]);

        assert_eq!(ids.len(), 2);
        for id in &ids {
            let job = queue.get(id).unwrap();
            assert_eq!(job.status(), JobStatus::Uploading);
            assert_eq!(job.progress(), 0);
            assert_eq!(job.error(), None);
            let millis = job.created_at().timestamp_millis().to_string();
            assert!(id.as_str().starts_with(&millis));
            assert!(id.as_str().ends_with(job.filename()));
        }
    }

    #[tokio::test]
    async fn test_same_filename_jobs_are_independent() {
        let store = MockStore::new();
        store.fail_upload("dup.txt", StoreError::Validation("Duplicate".to_string()));
        let (mut queue, _rx) = queue_with(store);

        let ids = queue.enqueue(vec![
            UploadFile::new("dup.txt", "one"),
            UploadFile::new("dup.txt", "two"),
        ]);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(queue.len(), 2);

        queue.apply_progress(&ids[0], 40);
        assert_eq!(queue.get(&ids[0]).unwrap().progress(), 40);
        assert_eq!(queue.get(&ids[1]).unwrap().progress(), 0);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_forced_to_100() {
        let store = MockStore::new().with_progress_steps(vec![10, 35, 20, 80]);
        let (mut queue, mut rx) = queue_with(store);
        let id = queue.enqueue(vec![UploadFile::new("report.pdf", vec![0u8; 2048])])[0].clone();

        let seen = drive(&mut queue, &mut rx, &id).await;
        assert_eq!(seen, vec![10, 35, 35, 80]);

        let job = queue.get(&id).unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.progress(), 100);
        assert_eq!(job.document().map(|d| d.id.as_str()), Some("report.pdf"));
    }

    #[tokio::test]
    async fn test_failure_keeps_progress_and_server_text() {
        let store = MockStore::new().with_progress_steps(vec![15, 60]);
        store.fail_upload(
            "setup.exe",
            StoreError::Validation("Unsupported file type".to_string()),
        );
        let (mut queue, mut rx) = queue_with(store);
        let id = queue.enqueue(vec![UploadFile::new("setup.exe", "MZ")])[0].clone();

        drive(&mut queue, &mut rx, &id).await;

        let job = queue.get(&id).unwrap();
        assert_eq!(job.status(), JobStatus::Error);
        assert_eq!(job.progress(), 60);
        assert_eq!(job.error(), Some("Unsupported file type"));
    }

    #[tokio::test]
    async fn test_failure_without_text_uses_generic_message() {
        let store = MockStore::new();
        store.fail_upload(
            "big.pdf",
            StoreError::Transport("connection reset".to_string()),
        );
        let (mut queue, mut rx) = queue_with(store);
        let id = queue.enqueue(vec![UploadFile::new("big.pdf", "x")])[0].clone();

        drive(&mut queue, &mut rx, &id).await;
        assert_eq!(queue.get(&id).unwrap().error(), Some("Upload failed"));
    }

    #[tokio::test]
    async fn test_manual_removal_rules() {
        let store = MockStore::new();
        let gate = store.hold_uploads();
        let (mut queue, mut rx) = queue_with(store);
        let id = queue.enqueue(vec![UploadFile::new("notes.md", "# hi")])[0].clone();

        assert!(matches!(queue.remove(&id), Err(QueueError::InFlight(_))));

        gate.add_permits(1);
        drive(&mut queue, &mut rx, &id).await;

        let removed = queue.remove(&id).unwrap();
        assert_eq!(removed.status(), JobStatus::Completed);
        assert!(queue.is_empty());
        assert!(matches!(queue.remove(&id), Err(QueueError::UnknownJob(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_job_is_evicted_after_delay() {
        let (mut queue, mut rx) = queue_with(MockStore::new());
        let id = queue.enqueue(vec![UploadFile::new("report.pdf", vec![0u8; 2 * 1024 * 1024])])[0]
            .clone();
        drive(&mut queue, &mut rx, &id).await;
        let completed_at = tokio::time::Instant::now();

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(queue.get(&id).unwrap().status(), JobStatus::Completed);

        match rx.recv().await {
            Some(DeskEvent::EvictJob { job_id }) => assert!(queue.evict(&job_id)),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(completed_at.elapsed() >= Duration::from_secs(3));
        assert!(queue.get(&id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_after_manual_removal_is_noop() {
        let (mut queue, mut rx) = queue_with(MockStore::new());
        let id = queue.enqueue(vec![UploadFile::new("a.txt", "a")])[0].clone();
        drive(&mut queue, &mut rx, &id).await;

        queue.remove(&id).unwrap();
        match rx.recv().await {
            Some(DeskEvent::EvictJob { job_id }) => assert!(!queue.evict(&job_id)),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_late_outcome_is_ignored_after_terminal_state() {
        let (mut queue, _rx) = queue_with(MockStore::new());
        let id = queue.enqueue(vec![UploadFile::new("a.txt", "a")])[0].clone();

        queue.apply_finished(&id, Err(StoreError::Transport("reset".to_string())));
        assert!(queue
            .apply_finished(&id, Ok(Document::new("a.txt", "a.txt")))
            .is_none());
        assert!(!queue.apply_progress(&id, 90));
        assert_eq!(queue.get(&id).unwrap().status(), JobStatus::Error);
    }
}
