//! End-to-end verification jobs driven through the public runner and a
//! snapshot-backed directory.

mod common {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use bar_verify::workflows::verification::{
        ApiCredential, CleaningFailure, CleaningRequest, DirectorySnapshot, NameCleaner,
        ProfileDetails, SnapshotEntry,
    };

    /// Cleaner that answers from a fixed table and fails on anything else.
    pub(super) struct FixedCleaner(pub(super) HashMap<&'static str, &'static str>);

    #[async_trait]
    impl NameCleaner for FixedCleaner {
        async fn clean(
            &self,
            request: CleaningRequest<'_>,
            _credential: &ApiCredential,
        ) -> Result<String, CleaningFailure> {
            self.0
                .get(request.raw_first_name)
                .map(|name| name.to_string())
                .ok_or_else(|| CleaningFailure::Transport("service unreachable".to_string()))
        }
    }

    pub(super) fn cleaner() -> FixedCleaner {
        FixedCleaner(HashMap::from([("W. Michael", "Michael"), ("Dr. Sarah", "Sarah")]))
    }

    fn entry(url: &str, first: &str, last: &str, period: &str, admitted: &str) -> SnapshotEntry {
        SnapshotEntry {
            url: url.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            listed_period: Some(period.to_string()),
            profile: ProfileDetails {
                status: "Active".to_string(),
                discipline: String::new(),
                admit_date_text: admitted.to_string(),
            },
        }
    }

    pub(super) fn snapshot() -> DirectorySnapshot {
        DirectorySnapshot {
            georgia: vec![
                entry("https://ga.example/1", "Michael", "Smith", "February 2010", "02/01/2010"),
                entry("https://ga.example/2", "Michael", "Smith", "January 2010", "January 15, 2010"),
            ],
            california: vec![
                entry("https://ca.example/1", "Michael", "Smith", "February 2010", "02/01/2010"),
                entry("https://ca.example/2", "Michael", "Smith", "January 2010", "01/15/2010"),
                entry("https://ca.example/3", "Sarah", "Jones", "March 2001", "03/03/2001"),
            ],
        }
    }
}

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bar_verify::workflows::verification::{
    ingest, ApiCredential, ColumnMapping, InMemoryJobStore, Jurisdiction, JobRunner,
    JobSubmission, SnapshotDirectory,
};

const INPUT: &str = "First Name,Last Name,Admit Date\n\
W. Michael,Smith,01/15/2010\n\
,,\n\
Dr. Sarah,Jones,03/03/2001\n\
Pat,Nobody,not a date\n";

fn runner(directory: SnapshotDirectory) -> JobRunner<InMemoryJobStore> {
    JobRunner::new(
        Arc::new(InMemoryJobStore::default()),
        Arc::new(directory),
        Arc::new(common::cleaner()),
        Duration::from_secs(5),
    )
}

fn submission(jurisdiction: Jurisdiction) -> JobSubmission {
    let records = ingest::parse_records(Cursor::new(INPUT), &ColumnMapping::default())
        .expect("input parses");
    JobSubmission {
        jurisdiction,
        records,
        credential: ApiCredential::new("integration-key"),
    }
}

#[tokio::test]
async fn california_job_filters_by_period_and_labels_blank_discipline() {
    let runner = runner(SnapshotDirectory::from_snapshot(common::snapshot()));
    let handle = runner
        .submit(submission(Jurisdiction::California))
        .expect("submitted");
    let id = handle.id();
    handle.wait().await.expect("job completes");

    let view = runner.poll(&id).expect("job exists");
    assert_eq!(view.state, "finished");
    let rows = view.results.expect("results");
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].status, "Active");
    assert_eq!(rows[0].discipline, "No discipline found");
    assert_eq!(rows[0].profile_links, "https://ca.example/2");
    assert_eq!(rows[0].unmatched_profile_links, "");

    assert_eq!(rows[1].first_name, "Dr. Sarah");
    assert_eq!(rows[1].profile_links, "https://ca.example/3");

    assert_eq!(rows[2].status, "Invalid Input Date Format");

    let summary = view.summary.expect("summary");
    assert_eq!(summary.total, 3);
    assert_eq!(summary.matched, 2);
}

#[tokio::test]
async fn georgia_job_compares_calendar_dates_and_reports_fallback() {
    let runner = runner(SnapshotDirectory::from_snapshot(common::snapshot()));
    let handle = runner
        .submit(submission(Jurisdiction::Georgia))
        .expect("submitted");
    let id = handle.id();
    handle.wait().await.expect("job completes");

    let view = runner.poll(&id).expect("job exists");
    let rows = view.results.expect("results");

    assert_eq!(rows[0].status, "Active");
    assert_eq!(rows[0].discipline, "");
    assert_eq!(rows[0].profile_links, "https://ga.example/2");
    assert_eq!(rows[0].unmatched_profile_links, "https://ga.example/1");

    assert_eq!(rows[1].status, "Not Found");
    assert_eq!(rows[2].status, "Error - Invalid Date Format");

    assert!(view
        .logs
        .iter()
        .any(|line| line.contains("WARNING") && line.contains("Using basic cleaning")));
}

#[tokio::test]
async fn missing_snapshot_file_fails_the_job() {
    let path = std::env::temp_dir().join(format!("bar-verify-missing-{}.json", uuid::Uuid::new_v4()));
    let runner = runner(SnapshotDirectory::from_path(&path));
    let handle = runner
        .submit(submission(Jurisdiction::Georgia))
        .expect("submitted");
    let id = handle.id();
    handle.wait().await.expect("job completes");

    let view = runner.poll(&id).expect("job exists");
    assert_eq!(view.state, "failed");
    assert!(view.results.is_none());
    assert!(view.error.expect("error").contains("cannot read"));
}

#[tokio::test]
async fn snapshot_file_is_loaded_from_disk() {
    let path = std::env::temp_dir().join(format!("bar-verify-snapshot-{}.json", uuid::Uuid::new_v4()));
    let raw = serde_json::to_string(&common::snapshot()).expect("snapshot serializes");
    std::fs::write(&path, raw).expect("snapshot written");

    let runner = runner(SnapshotDirectory::from_path(&path));
    let handle = runner
        .submit(submission(Jurisdiction::California))
        .expect("submitted");
    let id = handle.id();
    handle.wait().await.expect("job completes");
    let _ = std::fs::remove_file(&path);

    let view = runner.poll(&id).expect("job exists");
    assert_eq!(view.state, "finished");
    assert_eq!(view.summary.expect("summary").matched, 2);
}
