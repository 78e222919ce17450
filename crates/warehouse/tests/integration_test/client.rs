use std::sync::atomic::Ordering;

use serde_json::json;

use querygate_warehouse::{BigQueryClient, Warehouse, WarehouseConfig, WarehouseError};

use crate::mock::{self, MockBigQuery, JOB_ID};

#[tokio::test]
async fn select_one_returns_single_row() {
    let (addr, mock) = mock::spawn(MockBigQuery::with_rows(
        json!([{"name": "x", "type": "INTEGER", "mode": "NULLABLE"}]),
        vec![vec![json!({"f": [{"v": "1"}]})]],
    ))
    .await;

    let client = BigQueryClient::connect(mock::config_for(addr)).await.unwrap();
    let result = client.query("SELECT 1 AS x").await.unwrap();

    assert_eq!(result.row_count(), 1);
    assert_eq!(serde_json::to_value(&result.rows).unwrap(), json!([{"x": 1}]));
    assert_eq!(result.metadata.job_id, JOB_ID);
    assert_eq!(result.metadata.bytes_processed, 4096);

    let submitted = mock.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0]["query"], "SELECT 1 AS x");
    assert_eq!(submitted[0]["useLegacySql"], false);
    assert_eq!(submitted[0]["formatOptions"]["useInt64Timestamp"], true);

    let auths = mock.authorizations.lock().unwrap();
    assert_eq!(auths[0], "Bearer static-token");
}

#[tokio::test]
async fn query_text_is_forwarded_verbatim() {
    let (addr, mock) = mock::spawn(MockBigQuery::with_rows(mock::schema_x_name(), vec![vec![]])).await;
    let client = BigQueryClient::connect(mock::config_for(addr)).await.unwrap();

    let sql = "  select x, name\n  FROM `p.d.t` -- trailing comment\n";
    client.query(sql).await.unwrap();

    assert_eq!(mock.submitted.lock().unwrap()[0]["query"], sql);
}

#[tokio::test]
async fn polls_until_job_completes() {
    let mock = MockBigQuery::with_rows(mock::schema_x_name(), vec![vec![mock::wire_row(7, "seven")]]);
    mock.incomplete_polls.store(2, Ordering::SeqCst);
    let (addr, mock) = mock::spawn(mock).await;

    let client = BigQueryClient::connect(mock::config_for(addr)).await.unwrap();
    let result = client.query("SELECT x, name FROM t").await.unwrap();

    assert_eq!(serde_json::to_value(&result.rows).unwrap(), json!([{"x": 7, "name": "seven"}]));

    // Two incomplete polls plus the completing one.
    let requests = mock.result_requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].get("location").map(String::as_str), Some("US"));
    assert!(requests.iter().all(|r| !r.contains_key("pageToken")));
}

#[tokio::test]
async fn fetches_every_page_in_order() {
    let (addr, mock) = mock::spawn(MockBigQuery::with_rows(
        mock::schema_x_name(),
        vec![
            vec![mock::wire_row(1, "a"), mock::wire_row(2, "b")],
            vec![mock::wire_row(3, "c")],
            vec![mock::wire_row(4, "d")],
        ],
    ))
    .await;

    let client = BigQueryClient::connect(mock::config_for(addr)).await.unwrap();
    let result = client.query("SELECT x, name FROM t ORDER BY x").await.unwrap();

    let xs: Vec<i64> = result.rows.iter().map(|r| r["x"].as_i64().unwrap()).collect();
    assert_eq!(xs, vec![1, 2, 3, 4]);
    assert_eq!(result.metadata.pages, 3);
    assert_eq!(result.metadata.total_rows, 4);

    let tokens: Vec<String> = mock
        .result_requests
        .lock()
        .unwrap()
        .iter()
        .filter_map(|r| r.get("pageToken").cloned())
        .collect();
    assert_eq!(tokens, vec!["page-1", "page-2"]);
}

#[tokio::test]
async fn api_error_exposes_engine_messages() {
    let mut mock = MockBigQuery::default();
    mock.fail_with = Some((
        400,
        json!({
            "error": {
                "code": 400,
                "message": "Unrecognized name: nope at [1:8]",
                "errors": [{"message": "Unrecognized name: nope at [1:8]", "domain": "global", "reason": "invalidQuery"}],
                "status": "INVALID_ARGUMENT"
            }
        }),
    ));
    let (addr, _mock) = mock::spawn(mock).await;

    let client = BigQueryClient::connect(mock::config_for(addr)).await.unwrap();
    let err = client.query("SELECT nope").await.unwrap_err();

    assert!(err.is_engine_error());
    assert_eq!(err.messages(), vec!["Unrecognized name: nope at [1:8]"]);
    match err {
        WarehouseError::Api { status, .. } => assert_eq!(status, 400),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn job_timeout_cancels_job() {
    let mock = MockBigQuery::with_rows(mock::schema_x_name(), vec![vec![]]);
    mock.incomplete_polls.store(usize::MAX, Ordering::SeqCst);
    let (addr, mock) = mock::spawn(mock).await;

    let config = WarehouseConfig {
        job_timeout_seconds: 1,
        ..mock::config_for(addr)
    };
    let client = BigQueryClient::connect(config).await.unwrap();
    let err = client.query("SELECT x, name FROM slow").await.unwrap_err();

    assert!(matches!(err, WarehouseError::JobTimeout { seconds: 1, .. }));
    assert_eq!(*mock.cancelled.lock().unwrap(), vec![JOB_ID.to_string()]);
}

#[tokio::test]
async fn malformed_rows_are_decode_errors() {
    let (addr, _mock) = mock::spawn(MockBigQuery::with_rows(
        mock::schema_x_name(),
        vec![vec![json!({"f": [{"v": "1"}]})]],
    ))
    .await;

    let client = BigQueryClient::connect(mock::config_for(addr)).await.unwrap();
    let err = client.query("SELECT x, name FROM t").await.unwrap_err();

    assert!(matches!(err, WarehouseError::Decode(_)));
    assert!(!err.is_engine_error());
}

#[tokio::test]
async fn metadata_server_token_is_used_and_cached() {
    let (addr, mock) = mock::spawn(MockBigQuery::with_rows(
        mock::schema_x_name(),
        vec![vec![mock::wire_row(1, "a")]],
    ))
    .await;

    let config = WarehouseConfig {
        access_token: None,
        ..mock::config_for(addr)
    };
    let client = BigQueryClient::connect(config).await.unwrap();
    client.query("SELECT 1").await.unwrap();
    client.query("SELECT 2").await.unwrap();

    // One token request at construction; the token is then reused.
    assert_eq!(mock.token_requests.load(Ordering::SeqCst), 1);
    assert!(mock
        .authorizations
        .lock()
        .unwrap()
        .iter()
        .all(|a| a == "Bearer metadata-token"));
}

#[tokio::test]
async fn short_lived_metadata_token_is_refreshed() {
    let mut mock = MockBigQuery::with_rows(mock::schema_x_name(), vec![vec![mock::wire_row(1, "a")]]);
    mock.token_expires_in = Some(30);
    let (addr, mock) = mock::spawn(mock).await;

    let config = WarehouseConfig {
        access_token: None,
        ..mock::config_for(addr)
    };
    let client = BigQueryClient::connect(config).await.unwrap();
    assert_eq!(mock.token_requests.load(Ordering::SeqCst), 1);

    // A token expiring within the refresh margin is renewed before each call.
    client.query("SELECT 1").await.unwrap();
    assert_eq!(mock.token_requests.load(Ordering::SeqCst), 2);
    client.query("SELECT 2").await.unwrap();
    assert_eq!(mock.token_requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn long_polls_fit_inside_request_timeout() {
    let mut mock = MockBigQuery::with_rows(mock::schema_x_name(), vec![vec![mock::wire_row(5, "five")]]);
    mock.long_poll = true;
    mock.incomplete_polls.store(1, Ordering::SeqCst);
    let (addr, mock) = mock::spawn(mock).await;

    let config = WarehouseConfig {
        request_timeout_seconds: 2,
        ..mock::config_for(addr)
    };
    let client = BigQueryClient::connect(config).await.unwrap();
    let result = client.query("SELECT x, name FROM slow").await.unwrap();

    assert_eq!(serde_json::to_value(&result.rows).unwrap(), json!([{"x": 5, "name": "five"}]));
    let waits = mock.server_waits.lock().unwrap();
    assert_eq!(waits.len(), 3);
    assert!(waits.iter().all(|&w| w == 1_000), "{waits:?}");
}

#[tokio::test]
async fn unreachable_engine_is_transport_error() {
    let config = WarehouseConfig {
        project_id: "test-project".into(),
        api_base_url: "http://127.0.0.1:1/bigquery/v2".into(),
        access_token: Some("t".into()),
        ..WarehouseConfig::default()
    };
    let client = BigQueryClient::connect(config).await.unwrap();
    let err = client.query("SELECT 1").await.unwrap_err();

    assert!(matches!(err, WarehouseError::Transport(_)));
    assert!(err.is_engine_error());
}

/// Requires real credentials and network access.
///
/// Run with: `cargo test real_bigquery_select -- --ignored`
/// after setting `GCP_PROJECT_ID` and `BQ_ACCESS_TOKEN` (or running on GCP).
#[tokio::test]
#[ignore]
async fn real_bigquery_select() {
    let client = BigQueryClient::connect(WarehouseConfig::from_env_profiled(""))
        .await
        .expect("Failed to create BigQueryClient");

    let result = client.query("SELECT 1 AS test_column").await.expect("query failed");
    assert_eq!(serde_json::to_value(&result.rows).unwrap(), json!([{"test_column": 1}]));
}
