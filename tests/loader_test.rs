//! Integration tests for DimensionLoader: fetching, caching and failure handling.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use skillmix::application::services::DimensionLoader;
use skillmix::application::{ApplicationError, LoadFailure};
use skillmix::domain::{DimensionDocument, DomainError};
use skillmix::infrastructure::traits::{DirectorySource, DocumentSource, RealFileSystem};
use skillmix::util::testing::init_test_setup;

const THREE_ITEMS: &str = r#"{
    "dimension": "chain",
    "items": [
        {"id": "a", "name": "A", "depth": 0, "children_ids": ["b"]},
        {"id": "b", "name": "B", "depth": 1, "parent_id": "a", "children_ids": ["c"]},
        {"id": "c", "name": "C", "depth": 2, "parent_id": "b"}
    ]
}"#;

/// In-memory source counting fetches per location.
struct CountingSource {
    documents: Mutex<HashMap<String, io::Result<String>>>,
    fetches: AtomicUsize,
    delay: Duration,
}

impl CountingSource {
    fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn serve(&self, location: &str, text: &str) {
        self.documents
            .lock()
            .unwrap()
            .insert(location.to_string(), Ok(text.to_string()));
    }

    fn fail(&self, location: &str, kind: io::ErrorKind) {
        self.documents
            .lock()
            .unwrap()
            .insert(location.to_string(), Err(io::Error::new(kind, "scripted failure")));
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DocumentSource for CountingSource {
    fn fetch(&self, location: &str) -> io::Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        match self.documents.lock().unwrap().get(location) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(e)) => Err(io::Error::new(e.kind(), e.to_string())),
            None => Err(io::Error::new(io::ErrorKind::NotFound, location.to_string())),
        }
    }

    fn describe(&self, location: &str) -> String {
        format!("mem://{location}")
    }

    fn list(&self, _category: &str) -> io::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources")
}

fn fixture_loader() -> DimensionLoader {
    DimensionLoader::new(
        Arc::new(DirectorySource::new(fixtures_root())),
        "clinical-skill-mix",
        16,
    )
}

#[test]
fn given_three_item_chain_when_loading_then_statistics_match() {
    init_test_setup();
    // Arrange
    let source = Arc::new(CountingSource::new());
    source.serve("cat/chain.json", THREE_ITEMS);
    let loader = DimensionLoader::new(source.clone(), "cat", 4);

    // Act
    let loaded = loader.load("chain").unwrap();

    // Assert
    assert_eq!(loaded.statistics.total_items, 3);
    assert_eq!(loaded.statistics.leaf_nodes, 1);
    assert_eq!(loaded.statistics.max_children, 1);
    assert_eq!(loaded.statistics.average_children_per_parent, "1.0");
    assert_eq!(loaded.max_depth, 2);
}

#[test]
fn given_cached_dimension_when_loading_again_then_no_second_fetch() {
    let source = Arc::new(CountingSource::new());
    source.serve("cat/chain.json", THREE_ITEMS);
    let loader = DimensionLoader::new(source.clone(), "cat", 4);

    let first = loader.load("chain").unwrap();
    let second = loader.load("chain").unwrap();

    assert_eq!(source.fetches(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(loader.is_cached("chain"));
}

#[test]
fn given_invalidated_dimension_when_loading_then_fetches_again() {
    let source = Arc::new(CountingSource::new());
    source.serve("cat/chain.json", THREE_ITEMS);
    let loader = DimensionLoader::new(source.clone(), "cat", 4);
    loader.load("chain").unwrap();

    loader.invalidate("chain");
    loader.load("chain").unwrap();

    assert_eq!(source.fetches(), 2);
}

#[test]
fn given_concurrent_loads_of_same_name_when_loading_then_single_fetch() {
    // Arrange
    let source = Arc::new(CountingSource::new().with_delay(Duration::from_millis(50)));
    source.serve("cat/chain.json", THREE_ITEMS);
    let loader = Arc::new(DimensionLoader::new(source.clone(), "cat", 4));
    let barrier = Arc::new(Barrier::new(4));

    // Act
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let loader = Arc::clone(&loader);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                loader.load("chain").map(|l| l.statistics.total_items)
            })
        })
        .collect();
    let totals: Vec<usize> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    // Assert
    assert_eq!(totals, vec![3, 3, 3, 3]);
    assert_eq!(source.fetches(), 1);
}

#[test]
fn given_missing_document_when_loading_then_not_found_failure() {
    let source = Arc::new(CountingSource::new());
    let loader = DimensionLoader::new(source, "cat", 4);

    let err = loader.load("absent").unwrap_err();

    match err {
        ApplicationError::LoadFailed { dimension, reason } => {
            assert_eq!(dimension, "absent");
            assert_eq!(
                *reason,
                LoadFailure::NotFound {
                    location: "mem://cat/absent.json".into()
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn given_timed_out_fetch_when_loading_then_timeout_failure() {
    let source = Arc::new(CountingSource::new());
    source.fail("cat/slow.json", io::ErrorKind::TimedOut);
    let loader = DimensionLoader::new(source, "cat", 4);

    let err = loader.load("slow").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::LoadFailed { ref reason, .. }
            if matches!(**reason, LoadFailure::Timeout { .. })
    ));
}

#[test]
fn given_failed_load_when_retrying_after_fix_then_succeeds() {
    // Arrange: the first response is malformed
    let source = Arc::new(CountingSource::new());
    source.serve("cat/chain.json", "{ not json");
    let loader = DimensionLoader::new(source.clone(), "cat", 4);
    assert!(loader.load("chain").is_err());
    assert!(!loader.is_cached("chain"));

    // Act: the file is fixed and loaded again
    source.serve("cat/chain.json", THREE_ITEMS);
    let loaded = loader.load("chain").unwrap();

    // Assert: failures are not cached
    assert_eq!(loaded.statistics.total_items, 3);
    assert_eq!(source.fetches(), 2);
}

#[test]
fn given_unsafe_name_when_loading_then_rejected_without_fetch() {
    let source = Arc::new(CountingSource::new());
    let loader = DimensionLoader::new(source.clone(), "cat", 4);

    let err = loader.load("../etc/passwd").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidDimensionName(_))
    ));
    assert_eq!(source.fetches(), 0);
}

#[test]
fn given_fixture_directory_when_loading_then_parses_reference_and_levels() {
    let loader = fixture_loader();

    let loaded = loader.load("task").unwrap();

    assert_eq!(loaded.statistics.total_items, 5);
    assert_eq!(loaded.document.hierarchy.levels.label(2), Some("subtask"));
    let reference = loaded.document.reference.as_ref().unwrap();
    assert_eq!(reference.sources.len(), 2);
}

#[test]
fn given_malformed_fixture_when_loading_then_parse_failure() {
    let loader = fixture_loader();

    let err = loader.load("broken").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::LoadFailed { ref reason, .. }
            if matches!(**reason, LoadFailure::Parse { .. })
    ));
}

#[test]
fn given_fixture_directory_when_listing_then_includes_cube_files() {
    let loader = fixture_loader();

    let names = loader.available().unwrap();

    assert!(names.contains(&"care_phases".to_string()));
    assert!(names.contains(&"task".to_string()));
    assert!(names.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn given_loaded_dimension_when_exporting_then_reparsed_document_equals_cached() {
    // Arrange
    let out = TempDir::new().unwrap();
    let loader = fixture_loader();
    let loaded = loader.load("task").unwrap();

    // Act
    let path = loader
        .export(&RealFileSystem, &loaded, &out.path().join("exports"))
        .unwrap();

    // Assert
    assert!(path.ends_with("exports/task-dimension.json"));
    let text = std::fs::read_to_string(&path).unwrap();
    let reparsed = DimensionDocument::from_json(&text).unwrap();
    assert_eq!(reparsed, loaded.document);
}
