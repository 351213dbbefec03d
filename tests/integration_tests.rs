//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML job file → paged HTTP requests → JSON/Parquet output

use civic_harvest::cli::{harvest, JobStatus, RunOptions};
use civic_harvest::loader::load_jobs_from_str;
use civic_harvest::output::OutputFormat;
use civic_harvest::{HttpClient, HttpClientConfig, PaginationDriver, RequestSpec, ResponseShape};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job_file(server: &MockServer, jobs: &str) -> String {
    format!(
        r#"
http:
  timeout_secs: 5
  max_retries: 2
  backoff: constant
  initial_backoff_ms: 1
  rate_limit: null
jobs:
{}
"#,
        jobs.replace("{uri}", &server.uri())
    )
}

fn options(dir: &TempDir) -> RunOptions {
    RunOptions {
        out_dir: dir.path().to_path_buf(),
        ..RunOptions::default()
    }
}

fn read_json(path: impl AsRef<std::path::Path>) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

async fn mount_soda_pages(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param_is_missing("$offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "A", "kind": "Graffiti Removal", "extra": 1},
            {"id": "B", "kind": "Pothole", "extra": 2}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("$offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "B", "kind": "Pothole", "extra": 2},
            {"id": "C", "kind": "Illegal Dumping", "extra": 3}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("$offset", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

// ============================================================================
// Driver over HTTP
// ============================================================================

#[tokio::test]
async fn test_driver_drains_overlapping_soda_pages() {
    let server = MockServer::start().await;
    mount_soda_pages(&server, "/resource/abcd-1234.json").await;

    let config = HttpClientConfig::builder().no_rate_limit().build();
    let client = Arc::new(HttpClient::with_config(config).unwrap());
    let driver = PaginationDriver::new(client, ResponseShape::Flat.extractor());

    let spec = RequestSpec::new(
        format!("{}/resource/abcd-1234.json", server.uri()),
        "$offset",
        ["id", "kind"],
    )
    .param("$limit", "2");
    let outcome = driver.drain(spec).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.stats.pages_fetched, 3);
    let result = outcome.into_result().unwrap().unwrap();
    let ids: Vec<_> = result.rows().iter().map(|r| r[0].clone()).collect();
    assert_eq!(ids, vec![json!("A"), json!("B"), json!("C")]);
}

// ============================================================================
// Harvest: job file to output files
// ============================================================================

#[tokio::test]
async fn test_harvest_soda_job_to_json() {
    let server = MockServer::start().await;
    mount_soda_pages(&server, "/resource/abcd-1234.json").await;
    let dir = TempDir::new().unwrap();

    let yaml = job_file(
        &server,
        r#"
  - name: chicago
    url: "{uri}/resource/abcd-1234.json"
    params:
      $limit: 2
    offset_param: $offset
    columns: [id, kind]
    output: chicago.json
"#,
    );
    let file = load_jobs_from_str(&yaml).unwrap();

    let summaries = harvest(&file, &options(&dir)).await.unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].status, JobStatus::Complete);
    assert_eq!(summaries[0].rows, 3);
    assert_eq!(summaries[0].pages, 3);

    let written = read_json(dir.path().join("chicago.json"));
    assert_eq!(
        written,
        json!([
            {"id": "A", "kind": "Graffiti Removal"},
            {"id": "B", "kind": "Pothole"},
            {"id": "C", "kind": "Illegal Dumping"}
        ])
    );

    let manifest = read_json(dir.path().join("chicago.json.manifest.json"));
    assert_eq!(manifest["complete"], json!(true));
    assert_eq!(manifest["stop_reason"], json!("empty_page"));
    assert_eq!(manifest["duplicates"], json!(1));
}

#[tokio::test]
async fn test_harvest_arcgis_and_nested_geo_concurrently_to_parquet() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/arcgis/query"))
        .and(query_param("resultOffset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "features": [
                {"attributes": {"crash_id": 10, "year": 2019}},
                {"attributes": {"crash_id": 11, "year": 2020}}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/arcgis/query"))
        .and(query_param("resultOffset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"features": []})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/resource/la.json"))
        .and(query_param_is_missing("$offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"dr_no": "1", "location_1": {"latitude": "34.05", "longitude": "-118.24"}}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resource/la.json"))
        .and(query_param("$offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let yaml = job_file(
        &server,
        r#"
  - name: detroit
    url: "{uri}/arcgis/query"
    params:
      f: json
      resultOffset: 0
    offset_param: resultOffset
    columns: [crash_id, year]
    shape:
      type: enveloped
    output: detroit.json
  - name: la
    url: "{uri}/resource/la.json"
    offset_param: $offset
    columns: [dr_no, latitude, longitude]
    shape:
      type: nested_geo
      field: location_1
    output: la.json
"#,
    );
    let file = load_jobs_from_str(&yaml).unwrap();
    let opts = RunOptions {
        format: OutputFormat::Parquet,
        concurrency: 2,
        ..options(&dir)
    };

    let summaries = harvest(&file, &opts).await.unwrap();

    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|s| s.status == JobStatus::Complete));
    assert!(dir.path().join("detroit.parquet").exists());
    assert!(dir.path().join("la.parquet").exists());

    let la = summaries.iter().find(|s| s.job == "la").unwrap();
    assert_eq!(la.rows, 1);
}

#[tokio::test]
async fn test_existing_output_is_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resource/x.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let yaml = job_file(
        &server,
        r#"
  - name: x
    url: "{uri}/resource/x.json"
    offset_param: $offset
    columns: [id]
    output: x.json
"#,
    );
    let file = load_jobs_from_str(&yaml).unwrap();

    let first = harvest(&file, &options(&dir)).await.unwrap();
    assert_eq!(first[0].status, JobStatus::Complete);
    // Empty first page still produces an (empty) output file
    assert_eq!(read_json(dir.path().join("x.json")), json!([]));

    let second = harvest(&file, &options(&dir)).await.unwrap();
    assert_eq!(second[0].status, JobStatus::Skipped);
}

#[tokio::test]
async fn test_client_error_fails_job_without_output() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resource/bad.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": true,
            "message": "Invalid SoQL query"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let yaml = job_file(
        &server,
        r#"
  - name: bad
    url: "{uri}/resource/bad.json"
    offset_param: $offset
    columns: [id]
    output: bad.json
"#,
    );
    let file = load_jobs_from_str(&yaml).unwrap();

    let summaries = harvest(&file, &options(&dir)).await.unwrap();

    assert_eq!(summaries[0].status, JobStatus::Failed);
    assert!(summaries[0].error.as_ref().unwrap().contains("400"));
    assert!(!dir.path().join("bad.json").exists());

    let manifest = read_json(dir.path().join("bad.json.manifest.json"));
    assert_eq!(manifest["complete"], json!(false));
    assert_eq!(manifest["stop_reason"], json!("failed"));
}

#[tokio::test]
async fn test_transform_failure_writes_manifest_without_output() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resource/ph.json"))
        .and(query_param_is_missing("$offset"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "A", "lat": "not dms"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resource/ph.json"))
        .and(query_param("$offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let yaml = job_file(
        &server,
        r#"
  - name: ph
    url: "{uri}/resource/ph.json"
    offset_param: $offset
    columns: [id, lat]
    transform:
      dms:
        - column: lat
    output: ph.json
"#,
    );
    let file = load_jobs_from_str(&yaml).unwrap();

    let summaries = harvest(&file, &options(&dir)).await.unwrap();

    assert_eq!(summaries[0].status, JobStatus::Failed);
    assert!(summaries[0]
        .error
        .as_ref()
        .unwrap()
        .starts_with("Transform failed: row 0, column 'lat'"));
    assert!(!dir.path().join("ph.json").exists());
    assert!(!dir.path().join("ph.json.partial").exists());

    let manifest = read_json(dir.path().join("ph.json.manifest.json"));
    assert_eq!(manifest["complete"], json!(false));
    assert_eq!(manifest["rows"], json!(1));
    assert_eq!(manifest["rows_written"], json!(0));
    assert!(manifest["error"]
        .as_str()
        .unwrap()
        .contains("'not dms' is not 'deg min:sec'"));
}

#[tokio::test]
async fn test_transient_failure_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resource/flaky.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resource/flaky.json"))
        .and(query_param_is_missing("$offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resource/flaky.json"))
        .and(query_param("$offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let yaml = job_file(
        &server,
        r#"
  - name: flaky
    url: "{uri}/resource/flaky.json"
    offset_param: $offset
    columns: [id]
    output: flaky.json
"#,
    );
    let file = load_jobs_from_str(&yaml).unwrap();

    let summaries = harvest(&file, &options(&dir)).await.unwrap();

    assert_eq!(summaries[0].status, JobStatus::Complete);
    let manifest = read_json(dir.path().join("flaky.json.manifest.json"));
    assert_eq!(manifest["retries"], json!(1));
    assert_eq!(read_json(dir.path().join("flaky.json")), json!([{"id": 1}]));
}

#[tokio::test]
async fn test_page_cap_fails_job() {
    let server = MockServer::start().await;
    mount_soda_pages(&server, "/resource/capped.json").await;

    let dir = TempDir::new().unwrap();
    let yaml = job_file(
        &server,
        r#"
  - name: capped
    url: "{uri}/resource/capped.json"
    offset_param: $offset
    columns: [id]
    output: capped.json
"#,
    );
    let file = load_jobs_from_str(&yaml).unwrap();
    let opts = RunOptions {
        max_pages: Some(1),
        ..options(&dir)
    };

    let summaries = harvest(&file, &opts).await.unwrap();

    assert_eq!(summaries[0].status, JobStatus::Failed);
    assert_eq!(summaries[0].pages, 1);
    let manifest = read_json(dir.path().join("capped.json.manifest.json"));
    assert_eq!(manifest["stop_reason"], json!("page_limit"));
    assert_eq!(manifest["rows"], json!(2));
}

#[tokio::test]
async fn test_relevant_filter_applied_before_write() {
    let server = MockServer::start().await;
    mount_soda_pages(&server, "/resource/311.json").await;

    let dir = TempDir::new().unwrap();
    let yaml = job_file(
        &server,
        r#"
  - name: la
    url: "{uri}/resource/311.json"
    offset_param: $offset
    columns: [id, kind]
    transform:
      relevant:
        column: kind
        terms: [graffiti, dumping]
    output: la.jsonl
"#,
    );
    let file = load_jobs_from_str(&yaml).unwrap();
    let opts = RunOptions {
        format: OutputFormat::Jsonl,
        ..options(&dir)
    };

    let summaries = harvest(&file, &opts).await.unwrap();

    assert_eq!(summaries[0].rows, 2);
    let text = fs::read_to_string(dir.path().join("la.jsonl")).unwrap();
    let ids: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap()["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("A"), json!("C")]);

    let manifest = read_json(dir.path().join("la.jsonl.manifest.json"));
    assert_eq!(manifest["rows"], json!(3));
    assert_eq!(manifest["rows_written"], json!(2));
}

#[tokio::test]
async fn test_only_runs_selected_jobs() {
    let server = MockServer::start().await;
    mount_soda_pages(&server, "/resource/a.json").await;

    let dir = TempDir::new().unwrap();
    let yaml = job_file(
        &server,
        r#"
  - name: a
    url: "{uri}/resource/a.json"
    offset_param: $offset
    columns: [id]
    output: a.json
  - name: b
    url: "{uri}/resource/never-called.json"
    offset_param: $offset
    columns: [id]
    output: b.json
"#,
    );
    let file = load_jobs_from_str(&yaml).unwrap();
    let opts = RunOptions {
        only: vec!["a".to_string()],
        ..options(&dir)
    };

    let summaries = harvest(&file, &opts).await.unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].job, "a");
    assert!(!dir.path().join("b.json").exists());
}
