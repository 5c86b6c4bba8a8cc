/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for HTTP client
[POS]:    Integration tests - document endpoints
[UPDATE]: When HTTP endpoints change
*/

mod common;

use common::{TEST_API_KEY, client_for, document_json, setup_mock_server};
use cocobase::{ClientConfig, CocobaseClient, CocobaseError, QueryBuilder};
use serde::Deserialize;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Post {
    title: String,
    views: u32,
}

#[test]
fn test_client_creation() {
    let client = assert_ok!(CocobaseClient::new(TEST_API_KEY));
    assert_eq!(client.base_url(), "https://api.cocobase.com");
    assert_eq!(client.api_key(), Some(TEST_API_KEY));
    assert!(!client.is_authenticated());
}

#[test]
fn test_client_with_config() {
    let config = ClientConfig::default().with_base_url("http://localhost:3000/");
    let client = assert_ok!(CocobaseClient::with_config(config));
    assert_eq!(client.base_url(), "http://localhost:3000");
    assert!(client.api_key().is_none());
}

#[test]
fn test_invalid_base_url() {
    let err = CocobaseClient::with_config(ClientConfig::new("k").with_base_url("not a url"))
        .unwrap_err();
    assert!(matches!(err, CocobaseError::UrlParse(_)));
}

#[tokio::test]
async fn test_document_lifecycle() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/collections/documents"))
        .and(query_param("collection", "posts"))
        .and(body_json(json!({"data": {"title": "Hello", "views": 0}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(document_json(
            "p1",
            "posts",
            json!({"title": "Hello", "views": 0}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/collections/posts/documents/p1"))
        .and(body_json(json!({"data": {"views": 10}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json(
            "p1",
            "posts",
            json!({"title": "Hello", "views": 10}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/collections/posts/documents/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let created = assert_ok!(
        client
            .create_document("posts", &json!({"title": "Hello", "views": 0}))
            .await
    );
    assert_eq!(created.id, "p1");
    assert_eq!(created.collection, "posts");
    assert!(created.created_at.is_some());

    let updated = assert_ok!(client.update_document("posts", "p1", &json!({"views": 10})).await);
    let post: Post = assert_ok!(updated.data_as());
    assert_eq!(
        post,
        Post {
            title: "Hello".to_string(),
            views: 10,
        }
    );

    assert_ok!(client.delete_document("posts", "p1").await);
}

#[tokio::test]
async fn test_list_with_composed_query() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/collections/posts/documents"))
        .and(query_param("views_gte", "100"))
        .and(query_param("[or:tags]tag", "rust"))
        .and(query_param("deletedAt_isnull", "true"))
        .and(query_param("sort", "created_at"))
        .and(query_param("order", "desc"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            document_json("p1", "posts", json!({"title": "One", "views": 120})),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = QueryBuilder::new()
        .gte("views", 100)
        .or_group("tags")
        .eq("tag", "rust")
        .eq("tag", "go")
        .done()
        .active()
        .recent()
        .page(2, 20);

    let docs = assert_ok!(client_for(&server).list_documents("posts", Some(&query)).await);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].data["views"], 120);
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/collections/notes/documents/n1"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json(
            "n1",
            "notes",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_ok!(client.set_token("session-token").await);
    assert_ok!(client.get_document("notes", "n1").await);
}

#[tokio::test]
async fn test_no_api_key_header_without_key() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/collections/notes/documents"))
        .and(header_exists("x-api-key"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/notes/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = assert_ok!(CocobaseClient::with_config(
        ClientConfig::default().with_base_url(server.uri())
    ));
    let docs = assert_ok!(client.list_documents("notes", None).await);
    assert!(docs.is_empty());
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/collections/posts/documents"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .query_documents("posts", "status=draft")
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.status(), Some(429));
    let message = err.to_string();
    assert!(message.contains("(status: 429)"));
    assert!(message.contains("Body: slow down"));
    assert!(message.contains("rate limit"));
}
