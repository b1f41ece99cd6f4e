#![allow(clippy::unwrap_used)]
// Contract tests for `ApiClient` against a wiremock backend.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use folio_api::{
    Anonymous, ApiClient, BlogPostDraft, BlogPostPatch, Error, ProjectDraft, ProjectPatch,
    StaticToken,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        &format!("{}/api", server.uri()),
        Arc::new(StaticToken(SecretString::from("tok-123"))),
    )
    .unwrap();
    (server, client)
}

fn project_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "title": name,
        "description": "<p>desc</p>",
        "technologies": ["rust"],
        "createdAt": [2024, 1, 2, 3, 4, 5],
        "updatedAt": "2024-01-02T03:04:05Z"
    })
}

fn post_json(id: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "content": "body",
        "authorId": "admin",
        "createdAt": "2024-02-01T00:00:00",
        "updatedAt": [2024, 2, 1, 0, 0, 0]
    })
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_projects_under_base_prefix() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([project_json(1, "Alpha"), project_json(2, "Beta")])),
        )
        .mount(&server)
        .await;

    let projects = client.list_projects().await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].name, "Alpha");
    assert_eq!(projects[0].created_at, projects[0].updated_at);
}

#[tokio::test]
async fn test_reads_do_not_send_authorization() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/blog-posts/4"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/blog-posts/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(4, "Hello")))
        .mount(&server)
        .await;

    let post = client.get_blog_post(4).await.unwrap();
    assert_eq!(post.title, "Hello");
    assert_eq!(post.author_id, "admin");
}

#[tokio::test]
async fn test_users_endpoints() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "username": "ada", "email": "ada@example.com" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": 1, "username": "ada", "email": "ada@example.com" })),
        )
        .mount(&server)
        .await;

    let users = client.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    let user = client.get_user(1).await.unwrap();
    assert_eq!(user.username, "ada");
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_project_sends_bearer_and_title_mirror() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .and(header("authorization", "Bearer tok-123"))
        .and(body_json(json!({
            "name": "Alpha",
            "title": "Alpha",
            "description": "d",
            "technologies": ["rust", "tokio"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(project_json(42, "Alpha")))
        .expect(1)
        .mount(&server)
        .await;

    let draft = ProjectDraft {
        name: "Alpha".into(),
        description: "d".into(),
        technologies: vec!["rust".into(), "tokio".into()],
        ..ProjectDraft::default()
    };
    let created = client.create_project(&draft).await.unwrap();
    assert_eq!(created.id, 42);
}

#[tokio::test]
async fn test_update_sends_only_present_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/blog-posts/7"))
        .and(body_json(json!({ "title": "new" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(7, "new")))
        .expect(1)
        .mount(&server)
        .await;

    let patch = BlogPostPatch {
        title: Some("new".into()),
        ..BlogPostPatch::default()
    };
    let updated = client.update_blog_post(7, &patch).await.unwrap();
    assert_eq!(updated.title, "new");
    assert_eq!(updated.content, "body");
}

#[tokio::test]
async fn test_update_project_renames_title_too() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/projects/3"))
        .and(body_json(json!({ "name": "Gamma", "title": "Gamma" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json(3, "Gamma")))
        .expect(1)
        .mount(&server)
        .await;

    let patch = ProjectPatch {
        name: Some("Gamma".into()),
        ..ProjectPatch::default()
    };
    client.update_project(3, &patch).await.unwrap();
}

#[tokio::test]
async fn test_delete_with_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/3"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_project(3).await.unwrap();
}

#[tokio::test]
async fn test_anonymous_mutation_sends_empty_bearer() {
    let server = MockServer::start().await;
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        &server.uri(),
        Arc::new(Anonymous),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/blog-posts"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(401).set_body_string("missing token"))
        .mount(&server)
        .await;

    let result = client.create_blog_post(&BlogPostDraft::default()).await;
    let err = result.unwrap_err();
    assert!(err.is_unauthorized(), "got {err:?}");
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_non_2xx_carries_status_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/blog-posts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client
        .create_blog_post(&BlogPostDraft::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, .. }), "got {err:?}");
    assert_eq!(err.to_string(), "API error 500: boom");
}

#[tokio::test]
async fn test_delete_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/blog-posts/3"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such post"))
        .mount(&server)
        .await;

    let err = client.delete_blog_post(3).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_malformed_body_keeps_raw_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    match client.get_project(1).await {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "{not json"),
        other => panic!("expected Deserialization error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_list_body_is_empty_vec() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(client.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client =
        ApiClient::with_client(reqwest::Client::new(), &uri, Arc::new(Anonymous)).unwrap();
    let err = client.list_blog_posts().await.unwrap_err();
    assert!(err.is_network(), "got {err:?}");
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "username": "admin", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "T1" })))
        .mount(&server)
        .await;

    let token = client
        .login("admin", &SecretString::from("pw"))
        .await
        .unwrap();
    assert_eq!(token.expose_secret(), "T1");
}

#[tokio::test]
async fn test_login_without_token_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "" })))
        .mount(&server)
        .await;

    let result = client.login("admin", &SecretString::from("pw")).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let err = client
        .login("admin", &SecretString::from("wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_register_accepts_empty_response() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .register("newbie", &SecretString::from("pw"))
        .await
        .unwrap();
}
