//! HTTP-level tests for RecommendationClient.
//!
//! Each test runs the client against a local mockito server standing in
//! for the hosted service.

use std::io::Write;

use mockito::{Matcher, Server};
use reco_client::{BuildStatus, ImportKind, RecoError, RecommendationClient, RecommendedItem};

const EMAIL: &str = "demo@example.com";
const ACCOUNT_KEY: &str = "s3cret";
// base64("demo@example.com:s3cret")
const AUTHORIZATION: &str = "Basic ZGVtb0BleGFtcGxlLmNvbTpzM2NyZXQ=";

// ============================================================================
// Fixtures
// ============================================================================

fn entry(properties: &str) -> String {
    format!(
        r#"<entry><content type="application/xml"><m:properties>{properties}</m:properties></content></entry>"#
    )
}

fn feed(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"
      xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices">
  <title type="text" />
  {}
</feed>"#,
        entries.join("\n  ")
    )
}

fn api_version() -> Matcher {
    Matcher::UrlEncoded("apiVersion".into(), "'1.0'".into())
}

fn client_for(server: &Server) -> RecommendationClient {
    RecommendationClient::with_base_url(&server.url(), EMAIL, ACCOUNT_KEY).unwrap()
}

// ============================================================================
// CreateModel
// ============================================================================

#[tokio::test]
async fn test_create_model_returns_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/CreateModel")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("modelName".into(), "'demomodel'".into()),
            api_version(),
        ]))
        .match_header("authorization", AUTHORIZATION)
        .with_status(200)
        .with_header("content-type", "application/atom+xml")
        .with_body(feed(&[entry(
            "<d:Id>a658c626-2baa-43a7-ac98-f6ee26120a12</d:Id><d:Name>demomodel</d:Name>",
        )]))
        .create_async()
        .await;

    let client = client_for(&server);
    let model_id = client.create_model("demomodel").await.unwrap();

    assert_eq!(model_id, "a658c626-2baa-43a7-ac98-f6ee26120a12");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_model_without_id_is_parse_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/CreateModel")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(feed(&[entry("<d:Name>demomodel</d:Name>")]))
        .create_async()
        .await;

    let err = client_for(&server).create_model("demomodel").await.unwrap_err();
    assert!(matches!(err, RecoError::Parse { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_service_error_carries_status_reason_and_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/CreateModel")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body("Model name already exists")
        .create_async()
        .await;

    let err = client_for(&server).create_model("demomodel").await.unwrap_err();
    match &err {
        RecoError::Service {
            status,
            context,
            detail,
        } => {
            assert_eq!(*status, 400);
            assert!(context.contains("demomodel"));
            assert_eq!(detail, "Bad Request->Model name already exists");
        }
        other => panic!("Expected Service error, got: {other:?}"),
    }
    assert!(err.to_string().contains("Error 400"));
}

#[tokio::test]
async fn test_service_error_without_body_uses_reason_only() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/CreateModel")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let err = client_for(&server).create_model("demomodel").await.unwrap_err();
    match err {
        RecoError::Service { status, detail, .. } => {
            assert_eq!(status, 503);
            assert_eq!(detail, "Service Unavailable");
        }
        other => panic!("Expected Service error, got: {other:?}"),
    }
}

// ============================================================================
// ImportFile
// ============================================================================

#[tokio::test]
async fn test_import_file_streams_body_and_reads_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.txt");
    let contents = "1,Halogen Headlights,Lighting\n8,Wheel Tire Combo,Wheels\n";
    std::fs::File::create(&path)
        .unwrap()
        .write_all(contents.as_bytes())
        .unwrap();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/ImportCatalogFile")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("modelId".into(), "'m1'".into()),
            Matcher::UrlEncoded("filename".into(), "'catalog.txt'".into()),
            api_version(),
        ]))
        .match_header("authorization", AUTHORIZATION)
        .match_body(contents)
        .with_status(200)
        .with_body(feed(&[entry(
            "<d:LineCount>2</d:LineCount><d:ErrorCount>0</d:ErrorCount>",
        )]))
        .create_async()
        .await;

    let report = client_for(&server)
        .import_file("m1", &path, ImportKind::Catalog)
        .await
        .unwrap();

    assert_eq!(report.info, "catalog.txt");
    assert_eq!(report.line_count, 2);
    assert_eq!(report.error_count, 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_import_usage_uses_usage_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.txt");
    std::fs::write(&path, "user1,1\nuser1,8\nuser2,8\n").unwrap();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/ImportUsageFile")
        .match_query(Matcher::UrlEncoded("filename".into(), "'usage.txt'".into()))
        .with_status(200)
        .with_body(feed(&[entry(
            "<d:LineCount>3</d:LineCount><d:ErrorCount>1</d:ErrorCount>",
        )]))
        .create_async()
        .await;

    let report = client_for(&server)
        .import_file("m1", &path, ImportKind::Usage)
        .await
        .unwrap();

    assert_eq!(report.to_string(), "successfully imported 2/3 lines for usage.txt");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_import_missing_file_is_io_error_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = client_for(&server)
        .import_file("m1", &dir.path().join("missing.txt"), ImportKind::Catalog)
        .await
        .unwrap_err();

    assert!(matches!(err, RecoError::Io { .. }), "got {err:?}");
    mock.assert_async().await;
}

// ============================================================================
// BuildModel / GetBuildStatus
// ============================================================================

#[tokio::test]
async fn test_build_model_posts_parameters_and_ignores_echo() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/BuildModel")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("modelId".into(), "'m1'".into()),
            Matcher::UrlEncoded("userDescription".into(), "'build of 20261019120000'".into()),
            api_version(),
        ]))
        .match_header("content-type", "application/xml")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<NumberOfModelIterations>10</NumberOfModelIterations>".into()),
            Matcher::Regex("<NumberOfModelDimensions>20</NumberOfModelDimensions>".into()),
            Matcher::Regex("<ItemCutOffLowerBound>1</ItemCutOffLowerBound>".into()),
            Matcher::Regex("<AllowColdItemPlacement>true</AllowColdItemPlacement>".into()),
        ]))
        .with_status(200)
        .with_body(feed(&[entry(
            "<d:Id>1000653</d:Id><d:NumberOfModelIterations>40</d:NumberOfModelIterations><d:Status>Create</d:Status>",
        )]))
        .create_async()
        .await;

    let build_id = client_for(&server)
        .build_model("m1", "build of 20261019120000")
        .await
        .unwrap();

    assert_eq!(build_id, "1000653");
    mock.assert_async().await;
}

fn status_feed() -> String {
    feed(&[
        entry("<d:UserName>demo</d:UserName><d:ModelId>m1</d:ModelId><d:BuildId>1000652</d:BuildId><d:Status>Success</d:Status>"),
        entry("<d:UserName>demo</d:UserName><d:ModelId>m1</d:ModelId><d:BuildId>1000653</d:BuildId><d:Status>Building</d:Status>"),
        entry("<d:BuildId>1000654</d:BuildId><d:Status>Frobnicating</d:Status>"),
    ])
}

#[tokio::test]
async fn test_build_status_selects_matching_build() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/GetModelBuildsStatus")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("modelId".into(), "'m1'".into()),
            Matcher::UrlEncoded("onlyLastBuild".into(), "false".into()),
            api_version(),
        ]))
        .with_status(200)
        .with_body(status_feed())
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.get_build_status("m1", "1000653").await.unwrap(),
        BuildStatus::Building
    );
    assert_eq!(
        client.get_build_status("m1", "1000652").await.unwrap(),
        BuildStatus::Success
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_build_status_unknown_or_missing_is_parse_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/GetModelBuildsStatus")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(status_feed())
        .create_async()
        .await;

    let client = client_for(&server);
    let unknown = client.get_build_status("m1", "1000654").await.unwrap_err();
    assert!(matches!(unknown, RecoError::Parse { .. }), "got {unknown:?}");

    let missing = client.get_build_status("m1", "999").await.unwrap_err();
    assert!(matches!(missing, RecoError::Parse { .. }), "got {missing:?}");
}

// ============================================================================
// GetRecommendation
// ============================================================================

#[tokio::test]
async fn test_recommendations_preserve_order_and_ignore_unknown_children() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/ItemRecommend")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("modelId".into(), "'m1'".into()),
            Matcher::UrlEncoded("itemIds".into(), "'1,8'".into()),
            Matcher::UrlEncoded("numberOfResults".into(), "5".into()),
            Matcher::UrlEncoded("includeMetadata".into(), "false".into()),
            api_version(),
        ]))
        .with_status(200)
        .with_body(feed(&[
            entry("<d:Id>12</d:Id><d:Name>Fog Lamps</d:Name><d:Rating>0.61</d:Rating><d:Reasoning>Frequently bought together</d:Reasoning><d:Metadata>x</d:Metadata>"),
            entry("<d:Popularity>3</d:Popularity><d:Id>4</d:Id><d:Name>Roof Rack</d:Name><d:Rating>0.42</d:Rating><d:Reasoning>Similar customers</d:Reasoning>"),
        ]))
        .create_async()
        .await;

    let items = client_for(&server)
        .get_recommendation("m1", &["1", "8"], 5)
        .await
        .unwrap();

    assert_eq!(
        items,
        vec![
            RecommendedItem {
                id: "12".to_string(),
                name: "Fog Lamps".to_string(),
                rating: "0.61".to_string(),
                reasoning: "Frequently bought together".to_string(),
            },
            RecommendedItem {
                id: "4".to_string(),
                name: "Roof Rack".to_string(),
                rating: "0.42".to_string(),
                reasoning: "Similar customers".to_string(),
            },
        ]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_recommendations_with_metadata_flag() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/ItemRecommend")
        .match_query(Matcher::UrlEncoded("includeMetadata".into(), "true".into()))
        .with_status(200)
        .with_body(feed(&[]))
        .create_async()
        .await;

    let items = client_for(&server)
        .get_recommendation_with("m1", &["1".to_string()], 3, true)
        .await
        .unwrap();

    assert!(items.is_empty());
    mock.assert_async().await;
}

// ============================================================================
// DeleteModel / transport
// ============================================================================

#[tokio::test]
async fn test_delete_model() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/DeleteModel")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "'m1'".into()),
            api_version(),
        ]))
        .match_header("authorization", AUTHORIZATION)
        .with_status(200)
        .create_async()
        .await;

    client_for(&server).delete_model("m1").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_unknown_model_is_service_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/DeleteModel")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("Model 'nope' does not exist")
        .create_async()
        .await;

    let err = client_for(&server).delete_model("nope").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("Failed to delete model nope"));
    assert!(err.to_string().contains("Not Found->Model 'nope' does not exist"));
}

#[tokio::test]
async fn test_every_request_carries_the_same_credential() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/CreateModel")
        .match_query(Matcher::Any)
        .match_header("authorization", AUTHORIZATION)
        .with_status(200)
        .with_body(feed(&[entry("<d:Id>m1</d:Id>")]))
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/DeleteModel")
        .match_query(Matcher::Any)
        .match_header("authorization", AUTHORIZATION)
        .with_status(200)
        .create_async()
        .await;

    let client = client_for(&server);
    let model_id = client.create_model("demomodel").await.unwrap();
    client.delete_model(&model_id).await.unwrap();

    create.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Port 9 (discard) is not expected to be listening on loopback
    let client = RecommendationClient::with_base_url("http://127.0.0.1:9/", EMAIL, ACCOUNT_KEY).unwrap();
    let err = client.delete_model("m1").await.unwrap_err();
    assert!(matches!(err, RecoError::Transport { .. }), "got {err:?}");
}
