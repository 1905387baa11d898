use connectors::{
    error::ConnectorError,
    rest::{RestClient, ScopeFilter, StoreConfig, TableStore},
};
use model::records::row::RowData;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> RestClient {
    RestClient::new(StoreConfig::new(&server.uri(), "service-key")).unwrap()
}

fn rows() -> Vec<RowData> {
    vec![
        RowData::new("aumet_customers")
            .with("aumet_id", 1_i64)
            .with("name", "Nahdi"),
        RowData::new("aumet_customers")
            .with("aumet_id", 2_i64)
            .with("name", "Dawaa"),
    ]
}

#[tokio::test]
async fn clear_sends_scoped_delete_with_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/aumet_customers"))
        .and(query_param("aumet_id", "neq.0"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .clear("aumet_customers", &ScopeFilter::all_rows("aumet_id"))
        .await
        .unwrap();
}

#[tokio::test]
async fn insert_posts_json_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/aumet_customers"))
        .and(header("prefer", "return=minimal"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .insert("aumet_customers", &rows())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        json!([
            {"aumet_id": 1, "name": "Nahdi"},
            {"aumet_id": 2, "name": "Dawaa"}
        ])
    );
}

#[tokio::test]
async fn upsert_merges_on_conflict_column() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/aumet_customers"))
        .and(query_param("on_conflict", "aumet_id"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .upsert("aumet_customers", &rows(), "aumet_id")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let prefer = requests[0].headers.get("prefer").unwrap().to_str().unwrap();
    assert_eq!(prefer, "resolution=merge-duplicates,return=minimal");
}

#[tokio::test]
async fn rejected_insert_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("column \"foo\" does not exist"))
        .mount(&server)
        .await;

    let err = client(&server)
        .insert("aumet_customers", &rows())
        .await
        .unwrap_err();

    match err {
        ConnectorError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("does not exist"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn row_count_reads_content_range() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/aumet_products"))
        .and(header("prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "0-999/4321"))
        .mount(&server)
        .await;

    let count = client(&server).row_count("aumet_products").await.unwrap();
    assert_eq!(count, 4321);
}

#[tokio::test]
async fn empty_insert_makes_no_request() {
    let server = MockServer::start().await;

    client(&server).insert("aumet_customers", &[]).await.unwrap();

    assert!(server.received_requests().await.unwrap().is_empty());
}
