mod common;

use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

use common::{credentials, employee, factory, Harness, MockDirectory, MockRemoteFiles};
use personio_source::app::diagnostics::{CollectingDiagnostics, Diagnostic};
use personio_source::app::ports::{CachePort, NodeFactory, NodeStorePort};
use personio_source::config::SyncConfig;
use personio_source::infra::cache_store::SqliteCache;
use personio_source::infra::node_store::InMemoryNodeStore;
use personio_source::{SourceError, SourceNodesUseCase, SourcePorts};

fn use_case(harness: &Harness) -> SourceNodesUseCase {
    SourceNodesUseCase::new(harness.ports(), Some(credentials()), SyncConfig::default())
}

#[tokio::test]
async fn test_single_employee_end_to_end() {
    let harness = Harness::new(MockDirectory::returning(json!({
        "data": [{"attributes": {
            "id": {"value": 1},
            "first_name": {"value": "Ada"},
            "profile_picture": {"value": "https://x/1.png"}
        }}]
    })));

    let report = use_case(&harness).run().await.unwrap();

    assert_eq!(report.records_received, 1);
    assert_eq!(report.nodes_created, 1);
    assert_eq!(report.attachments_downloaded, 1);
    assert_eq!(harness.files.calls(), 1);

    let node_id = factory().make_node_id("employee-1");
    let employee = harness.store.get_node(&node_id).await.unwrap();
    assert_eq!(employee.internal.node_type, "Employee");
    assert_eq!(employee.content["first_name"], "Ada");
    assert_eq!(employee.content["profile_picture"], "https://x/1.png");
    assert_eq!(employee.content["employee_id"], "1");

    let cache = harness.cache.snapshot();
    assert_eq!(cache.len(), 1);
    let artifact_id = &cache[&format!("profile-picture-{}", node_id)];
    assert_eq!(harness.store.children_of(&node_id), vec![artifact_id.clone()]);

    // the directory was called with the token from the auth step
    assert_eq!(
        harness.directory.seen_headers.lock().unwrap()[0].as_deref(),
        Some("Bearer token-0")
    );
}

#[tokio::test]
async fn test_missing_credentials_is_fatal_and_creates_nothing() {
    let harness = Harness::new(MockDirectory::returning(json!({
        "data": [employee(json!(1), "Ada", Some("https://x/1.png"))]
    })));
    let use_case = SourceNodesUseCase::new(harness.ports(), None, SyncConfig::default());

    let result = use_case.run().await;

    assert!(matches!(result, Err(SourceError::Config(_))));
    assert!(harness.store.is_empty());
    assert_eq!(harness.auth.calls(), 0);
    assert_eq!(harness.directory.calls(), 0);
    assert_eq!(harness.files.calls(), 0);
    assert_eq!(
        harness
            .diagnostics
            .count_where(|d| matches!(d, Diagnostic::MissingCredentials)),
        1
    );
}

#[tokio::test]
async fn test_failed_employee_list_degrades_to_empty_run() {
    let harness = Harness::new(MockDirectory::failing());

    let report = use_case(&harness).run().await.unwrap();

    assert_eq!(report.records_received, 0);
    assert_eq!(report.nodes_created, 0);
    assert!(harness.store.is_empty());
    assert_eq!(
        harness
            .diagnostics
            .count_where(|d| matches!(d, Diagnostic::EmployeeListFailed { .. })),
        1
    );
}

#[tokio::test]
async fn test_response_without_data_is_zero_records() {
    let harness = Harness::new(MockDirectory::returning(json!({
        "success": false,
        "error": {"message": "token expired"}
    })));

    let report = use_case(&harness).run().await.unwrap();

    assert_eq!(report.records_received, 0);
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_auth_failure_still_lists_without_header() {
    let mut harness = Harness::new(MockDirectory::returning(json!({
        "data": [employee(json!(2), "Grace", None)]
    })));
    harness.auth = Arc::new(common::MockAuth::failing());

    let report = use_case(&harness).run().await.unwrap();

    assert_eq!(report.nodes_created, 1);
    assert_eq!(harness.directory.seen_headers.lock().unwrap()[0], None);
}

#[tokio::test]
async fn test_bad_records_are_skipped_and_the_rest_continue() {
    let harness = Harness::new(MockDirectory::returning(json!({
        "data": [
            {"attributes": {"first_name": {"value": "Nobody"}}},
            {"type": "Employee"},
            employee(json!(3), "Linus", Some("https://x/3.png")),
            employee(json!(null), "Null Id", None),
        ]
    })));

    let report = use_case(&harness).run().await.unwrap();

    assert_eq!(report.records_received, 4);
    assert_eq!(report.records_skipped, 3);
    assert_eq!(report.nodes_created, 1);
    assert_eq!(report.attachments_downloaded, 1);
}

#[tokio::test]
async fn test_partial_download_failure_completes_batch() {
    let store = Arc::new(InMemoryNodeStore::new());
    let mut harness = Harness::new(MockDirectory::returning(json!({
        "data": [
            employee(json!(10), "A", Some("https://x/a.png")),
            employee(json!(11), "B", Some("https://x/b.png")),
        ]
    })));
    harness.store = store.clone();
    harness.files = Arc::new(MockRemoteFiles::new(store.clone()).failing_on("https://x/a.png"));

    let report = use_case(&harness).run().await.unwrap();

    assert_eq!(report.nodes_created, 2);
    assert_eq!(report.attachments_downloaded, 1);
    assert_eq!(report.attachments_failed, 1);
    let b_id = factory().make_node_id("employee-11");
    let a_id = factory().make_node_id("employee-10");
    assert_eq!(store.children_of(&b_id).len(), 1);
    assert!(store.children_of(&a_id).is_empty());
}

#[tokio::test]
async fn test_incremental_builds_reuse_persisted_artifacts() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("nodes.json");
    let cache_path = dir.path().join("cache.db");
    let response = json!({
        "data": [
            employee(json!(1), "Ada", Some("https://x/1.png")),
            employee(json!(2), "Grace", Some("https://x/2.png")),
        ]
    });

    let mut downloads = Vec::new();
    for _build in 0..2 {
        let store = Arc::new(InMemoryNodeStore::load(&snapshot).unwrap());
        let files = Arc::new(MockRemoteFiles::new(store.clone()));
        let ports = SourcePorts {
            auth: Arc::new(common::MockAuth::ok()),
            directory: Arc::new(MockDirectory::returning(response.clone())),
            store: store.clone(),
            factory: factory(),
            cache: Arc::new(SqliteCache::open(&cache_path).unwrap()),
            files: files.clone(),
            diagnostics: Arc::new(CollectingDiagnostics::new()),
        };

        let report = SourceNodesUseCase::new(ports, Some(credentials()), SyncConfig::default())
            .run()
            .await
            .unwrap();
        assert_eq!(report.nodes_created, 2);
        assert_eq!(report.attachments_failed, 0);

        assert_eq!(store.collect_garbage(), 0);
        assert_eq!(store.nodes_of_type("File").len(), 2);
        store.save(&snapshot).unwrap();
        downloads.push(files.calls());
    }

    assert_eq!(downloads, vec![2, 0]);

    let cache = SqliteCache::open(&cache_path).unwrap();
    assert_eq!(cache.len().unwrap(), 2);
    let key = format!("profile-picture-{}", factory().make_node_id("employee-1"));
    assert!(cache.get(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn test_custom_node_type_and_attachment_field() {
    let harness = Harness::new(MockDirectory::returning(json!({
        "data": [{"attributes": {
            "id": {"value": "abc"},
            "avatar": {"label": "Avatar", "value": "https://x/abc.png"},
            "profile_picture": {"value": "https://x/ignored.png"}
        }}]
    })));
    let sync = SyncConfig {
        node_type: "TeamMember".into(),
        attachment_field: "Avatar".into(),
    };

    let report = SourceNodesUseCase::new(harness.ports(), Some(credentials()), sync)
        .run()
        .await
        .unwrap();

    assert_eq!(report.attachments_downloaded, 1);
    assert_eq!(harness.files.requests()[0].url, "https://x/abc.png");
    assert_eq!(harness.store.nodes_of_type("TeamMember").len(), 1);
}
