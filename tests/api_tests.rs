// tests/api_tests.rs

mod support;

use axum::{Router, routing::get};
use serde_json::{Value, json};
use threadline::{
    Snapshot,
    config::Config,
    handlers::comments,
    models::user::AuthorIdentity,
    routes,
    state::AppState,
    store::CommentStore,
};

struct TestApp {
    address: String,
    store: CommentStore,
    _db: support::TestDb,
}

/// Serves `app` on a random port and returns its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn test_state(store: CommentStore) -> AppState {
    let config = Config {
        rust_log: "error".to_string(),
        ..Config::default()
    };
    AppState { store, config }
}

/// Spawns the app on a fresh store seeded with one user and the open page `apples`.
async fn spawn_app() -> TestApp {
    let db = support::open_store().await;
    let store = db.store.clone();

    store
        .ensure_user(&AuthorIdentity::new("a@z.com", "github"), Some("A Z"))
        .await
        .expect("Failed to seed user");
    store
        .create_page("apples", Some(0))
        .await
        .expect("Failed to seed page");

    let address = serve(routes::create_router(test_state(store.clone()))).await;

    TestApp {
        address,
        store,
        _db: db,
    }
}

async fn post_comment(
    client: &reqwest::Client,
    app: &TestApp,
    content: &str,
    parent_id: Option<i64>,
) -> reqwest::Response {
    client
        .post(format!("{}/api/comments", app.address))
        .json(&json!({
            "page_url": "apples",
            "email": "a@z.com",
            "provider": "github",
            "content": content,
            "parent_id": parent_id,
        }))
        .send()
        .await
        .expect("Failed to execute request")
}

async fn created_id(response: reqwest::Response) -> i64 {
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("json body");
    body["id"].as_i64().expect("id in body")
}

#[tokio::test]
async fn unknown_route_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn missing_page_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for path in ["/api/pages/comments?url=nowhere", "/api/pages/404/comments"] {
        let response = client
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 404, "{path}");

        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().is_some());
    }
}

#[tokio::test]
async fn posted_thread_is_nested() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let root = created_id(post_comment(&client, &app, "pie", None).await).await;
    let reply = created_id(post_comment(&client, &app, "with cream", Some(root)).await).await;
    let nested = created_id(post_comment(&client, &app, "and custard", Some(reply)).await).await;

    let response = client
        .get(format!("{}/api/pages/comments?url=apples", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["page"]["url"], "apples");
    assert_eq!(body["page"]["open"], true);
    assert_eq!(body["total"], 3);
    assert!(body["now"].as_i64().is_some());

    let thread = &body["comments"][0];
    assert_eq!(thread["id"], root);
    assert_eq!(thread["content"], "pie");
    assert_eq!(thread["child_count"], 1);
    assert_eq!(thread["descendant_count"], 2);
    assert_eq!(thread["replies"][0]["id"], reply);
    assert_eq!(thread["replies"][0]["replies"][0]["id"], nested);

    // the same page by id
    let by_id: Value = client
        .get(format!("{}/api/pages/1/comments", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_id["comments"], body["comments"]);
}

#[tokio::test]
async fn children_with_and_without_depth() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let root = created_id(post_comment(&client, &app, "pie", None).await).await;
    let reply = created_id(post_comment(&client, &app, "with cream", Some(root)).await).await;
    created_id(post_comment(&client, &app, "and custard", Some(reply)).await).await;

    let direct: Value = client
        .get(format!("{}/api/comments/{}/children", app.address, root))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(direct["total"], 1);
    assert_eq!(direct["replies"][0]["id"], reply);
    assert_eq!(direct["replies"][0]["replies"], json!([]));

    let deep: Value = client
        .get(format!("{}/api/comments/{}/children?depth=2", app.address, root))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deep["total"], 2);
    assert_eq!(deep["replies"][0]["replies"][0]["content"], "and custard");

    let response = client
        .get(format!("{}/api/comments/999/children?depth=2", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn root_listing_sorts_and_pages() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for content in ["one", "two", "three"] {
        created_id(post_comment(&client, &app, content, None).await).await;
    }

    let roots: Value = client
        .get(format!(
            "{}/api/pages/roots?url=apples&desc=true&limit=2",
            app.address
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = roots
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 2]);

    let unlimited: Value = client
        .get(format!("{}/api/pages/roots?url=apples&limit=0", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unlimited.as_array().unwrap().len(), 3);

    let response = client
        .get(format!("{}/api/pages/roots?url=apples&offset=5", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.json::<Value>().await.unwrap(), json!([]));
}

#[tokio::test]
async fn invalid_posts_are_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // empty content fails validation
    let response = post_comment(&client, &app, "", None).await;
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(format!("{}/api/comments", app.address))
        .json(&json!({
            "page_url": "bananas",
            "email": "a@z.com",
            "provider": "github",
            "content": "hello",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = post_comment(&client, &app, "orphan", Some(42)).await;
    assert_eq!(response.status().as_u16(), 400);

    assert_eq!(support::count_rows(&app.store, "Comments").await, 0);
}

#[tokio::test]
async fn hide_and_delete() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let id = created_id(post_comment(&client, &app, "pie", None).await).await;

    let response = client
        .post(format!("{}/api/comments/{}/hide", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    let hidden = app.store.get_comment_by_id(id, Snapshot::MAX).await.unwrap();
    assert!(hidden.hidden);

    let response = client
        .post(format!("{}/api/comments/{}/unhide", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    assert!(!app.store.get_comment_by_id(id, Snapshot::MAX).await.unwrap().hidden);

    let response = client
        .delete(format!("{}/api/comments/{}", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let body: Value = client
        .get(format!("{}/api/comments/{}", app.address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["content"], "");

    for request in [
        client.post(format!("{}/api/comments/77/hide", app.address)),
        client.post(format!("{}/api/comments/77/unhide", app.address)),
        client.delete(format!("{}/api/comments/77", app.address)),
        client.get(format!("{}/api/comments/77", app.address)),
    ] {
        let response = request.send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }
}

#[tokio::test]
async fn handler_without_snapshot_is_500() {
    let db = support::single_comment().await;
    let app = Router::new()
        .route("/api/comments/{id}", get(comments::get_comment))
        .with_state(test_state(db.store.clone()));
    let address = serve(app).await;

    let response = reqwest::get(format!("{}/api/comments/1", address))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);
}
