//! Shared helpers for the docdesk binary: tracing setup, table rendering and
//! the loops that drive a [`Desk`] until an operation settles.

use docdesk_core::constants::ACCEPTED_UPLOAD_EXTENSIONS;
use docdesk_core::models::extension_of;
use docdesk_core::{format_file_size, truncate_string, Document};
use docdesk_session::viewer::ViewerPhase;
use docdesk_session::{Desk, JobId, JobStatus, UploadJob};
use std::collections::HashMap;

const NAME_WIDTH: usize = 40;
const BAR_WIDTH: usize = 20;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Whether the file picker would have offered this file. Advisory only.
pub fn is_accepted_upload(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ACCEPTED_UPLOAD_EXTENSIONS.contains(&ext.as_str()))
}

pub fn document_row(document: &Document, selected: bool) -> String {
    let size = document
        .size_bytes
        .map(format_file_size)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} {:<width$}  {:>10}  {}",
        if selected { "*" } else { " " },
        truncate_string(document.display_name(), NAME_WIDTH),
        size,
        document.display_date(),
        width = NAME_WIDTH
    )
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn job_line(job: &UploadJob) -> String {
    let name = truncate_string(job.filename(), NAME_WIDTH);
    let size = format_file_size(job.size());
    match job.status() {
        JobStatus::Error => format!(
            "{:<width$}  {:>10}  error: {}",
            name,
            size,
            job.error().unwrap_or_default(),
            width = NAME_WIDTH
        ),
        status => format!(
            "{:<width$}  {:>10}  {} {:>3}% {}",
            name,
            size,
            progress_bar(job.progress()),
            job.progress(),
            status.as_str(),
            width = NAME_WIDTH
        ),
    }
}

/// Apply desk events until every listed job is completed or failed. `report`
/// sees each job whenever its status or progress changes. Returns the jobs
/// in their terminal state, in the order given.
pub async fn run_uploads<F>(desk: &mut Desk, ids: &[JobId], mut report: F) -> Vec<UploadJob>
where
    F: FnMut(&UploadJob),
{
    let mut last_seen: HashMap<JobId, (JobStatus, u8)> = HashMap::new();
    let mut finished: HashMap<JobId, UploadJob> = HashMap::new();

    loop {
        for id in ids {
            if finished.contains_key(id) {
                continue;
            }
            let Some(job) = desk.uploads().get(id) else {
                continue;
            };
            let seen = (job.status(), job.progress());
            if last_seen.get(id) != Some(&seen) {
                last_seen.insert(id.clone(), seen);
                report(job);
            }
            if job.status().is_terminal() {
                finished.insert(id.clone(), job.clone());
            }
        }

        if finished.len() == ids.len() || !desk.process_next().await {
            break;
        }
    }

    ids.iter().filter_map(|id| finished.remove(id)).collect()
}

/// Apply desk events until the viewer leaves the loading phase.
pub async fn settle_viewer(desk: &mut Desk) -> ViewerPhase {
    while desk.viewer().phase() == ViewerPhase::Loading {
        if !desk.process_next().await {
            break;
        }
    }
    desk.viewer().phase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdesk_api_client::UploadFile;
    use docdesk_core::StoreError;
    use docdesk_session::test_helpers::MockStore;
    use docdesk_session::MemoryObjectUrls;
    use std::sync::Arc;
    use std::time::Duration;

    fn desk_with(store: MockStore) -> Desk {
        Desk::new(
            Arc::new(store),
            Arc::new(MemoryObjectUrls::new()),
            Duration::from_secs(3),
        )
    }

    #[test]
    fn test_accepted_upload_hint() {
        assert!(is_accepted_upload("Thesis.PDF"));
        assert!(is_accepted_upload("notes.md"));
        assert!(!is_accepted_upload("photo.png"));
        assert!(!is_accepted_upload("Makefile"));
    }

    #[test]
    fn test_document_row_fallbacks() {
        let mut document = Document::new("x", "");
        document.size_bytes = Some(1536);
        let row = document_row(&document, true);
        assert!(row.starts_with("* Untitled"));
        assert!(row.contains("1.5 KB"));
        assert!(row.ends_with("Unknown"));
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(50), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(20)));
    }

    #[tokio::test]
    async fn test_run_uploads_reports_until_terminal() {
        let store = MockStore::new().with_progress_steps(vec![25, 75]);
        store.fail_upload("bad.exe", StoreError::Validation("Unsupported file type".to_string()));
        let mut desk = desk_with(store);

        let ids = desk.upload(vec![
            UploadFile::new("good.txt", "hello"),
            UploadFile::new("bad.exe", "MZ"),
        ]);

        let mut lines = Vec::new();
        let jobs = run_uploads(&mut desk, &ids, |job| lines.push(job_line(job))).await;

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].status(), JobStatus::Completed);
        assert_eq!(jobs[1].status(), JobStatus::Error);
        assert!(lines.iter().any(|l| l.contains("100% completed")));
        assert!(lines.iter().any(|l| l.contains("error: Unsupported file type")));
    }
}
