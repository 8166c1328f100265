//! HTTP surface: envelope, session login and the auth gate

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{setup, PASSWORD};
use partner_match::error::{CODE_NOT_LOGIN, CODE_PARAMS_ERROR, CODE_SUCCESS};
use partner_match::routes::create_router;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, body)
}

fn post_json(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_and_login(app: &Router, account: &str) -> String {
    let (_, _, body) = send(
        app,
        post_json(
            "/api/user/register",
            None,
            json!({
                "userAccount": account,
                "userPassword": PASSWORD,
                "checkPassword": PASSWORD,
                "tags": ["Rust"],
            }),
        ),
    )
    .await;
    assert_eq!(body["code"], CODE_SUCCESS);

    let (status, cookie, body) = send(
        app,
        post_json(
            "/api/user/login",
            None,
            json!({ "userAccount": account, "userPassword": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], CODE_SUCCESS);
    assert_eq!(body["date"]["userAccount"], account);
    assert!(body["date"].get("password").is_none());
    cookie.expect("login should set a session cookie")
}

#[tokio::test]
async fn test_health_is_public() {
    let app = create_router(setup().await);
    let (status, _, body) = send(&app, get("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], CODE_SUCCESS);
}

#[tokio::test]
async fn test_protected_routes_require_login() {
    let app = create_router(setup().await);

    let (status, _, body) = send(
        &app,
        post_json("/api/team/join", None, json!({ "teamId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], CODE_NOT_LOGIN);
    assert!(body["date"].is_null());

    let (_, _, body) = send(&app, get("/api/user/current", None)).await;
    assert_eq!(body["code"], CODE_NOT_LOGIN);

    // Browsing teams stays open to anonymous callers
    let (_, _, body) = send(&app, get("/api/team/list", None)).await;
    assert_eq!(body["code"], CODE_SUCCESS);
    assert_eq!(body["date"], json!([]));
}

#[tokio::test]
async fn test_session_flow_through_teams() {
    let app = create_router(setup().await);
    let owner = register_and_login(&app, "owner").await;
    let member = register_and_login(&app, "member").await;

    let (_, _, body) = send(&app, get("/api/user/current", Some(&owner))).await;
    assert_eq!(body["code"], CODE_SUCCESS);
    assert_eq!(body["date"]["userAccount"], "owner");

    let (_, _, body) = send(
        &app,
        post_json(
            "/api/team/add",
            Some(&owner),
            json!({
                "name": "Rust study",
                "description": "weekly",
                "maxNum": 3,
                "status": 2,
                "password": "x",
            }),
        ),
    )
    .await;
    assert_eq!(body["code"], CODE_SUCCESS);
    assert_eq!(body["date"]["hasJoinNum"], 1);
    let team_id = body["date"]["id"].as_i64().unwrap();

    let (status, _, body) = send(
        &app,
        post_json(
            "/api/team/join",
            Some(&member),
            json!({ "teamId": team_id, "password": "nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], CODE_PARAMS_ERROR);
    assert_eq!(body["message"], "密码错误");

    let (_, _, body) = send(
        &app,
        post_json(
            "/api/team/join",
            Some(&member),
            json!({ "teamId": team_id, "password": "x" }),
        ),
    )
    .await;
    assert_eq!(body["code"], CODE_SUCCESS);
    assert_eq!(body["date"], true);

    let (_, _, body) = send(&app, get("/api/team/list/my/join", Some(&member))).await;
    assert_eq!(body["date"][0]["id"], team_id);
    assert_eq!(body["date"][0]["hasJoin"], true);
    assert_eq!(body["date"][0]["hasJoinNum"], 2);

    let (_, _, body) = send(&app, get("/api/team/list?status=2", None)).await;
    assert_eq!(body["date"][0]["hasJoin"], false);
    assert_eq!(body["date"][0]["createUser"]["userAccount"], "owner");

    let uri = format!("/api/team/get?id={}", team_id);
    let (_, _, body) = send(&app, get(&uri, Some(&member))).await;
    assert_eq!(body["code"], CODE_PARAMS_ERROR);

    let (_, _, body) = send(
        &app,
        post_json("/api/team/delete", Some(&owner), json!({ "id": team_id })),
    )
    .await;
    assert_eq!(body["code"], CODE_SUCCESS);

    let (_, _, body) = send(&app, get("/api/team/list/my/join", Some(&member))).await;
    assert_eq!(body["date"], json!([]));
}

#[tokio::test]
async fn test_bad_input_gets_the_envelope() {
    let app = create_router(setup().await);
    let owner = register_and_login(&app, "owner").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/team/add")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &owner)
        .body(Body::from(r#"{"name": "broken""#))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], CODE_PARAMS_ERROR);
    assert!(body["date"].is_null());
    assert!(body["message"].as_str().unwrap().starts_with("请求参数错误"));

    let (status, _, body) = send(
        &app,
        post_json("/api/team/add", Some(&owner), json!({ "description": "no name" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], CODE_PARAMS_ERROR);

    let (status, _, body) = send(&app, get("/api/team/list?status=", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], CODE_PARAMS_ERROR);
    assert!(body["date"].is_null());

    let (_, _, body) = send(&app, get("/api/user/recommend?pageNum=abc", Some(&owner))).await;
    assert_eq!(body["code"], CODE_PARAMS_ERROR);
}

#[tokio::test]
async fn test_numeric_strings_are_accepted_for_team_fields() {
    let app = create_router(setup().await);
    let owner = register_and_login(&app, "owner").await;

    let (_, _, body) = send(
        &app,
        post_json(
            "/api/team/add",
            Some(&owner),
            json!({ "name": "strings", "maxNum": "5", "status": "0" }),
        ),
    )
    .await;
    assert_eq!(body["code"], CODE_SUCCESS);
    assert_eq!(body["date"]["maxNum"], 5);
    assert_eq!(body["date"]["status"], 0);

    let (_, _, body) = send(
        &app,
        post_json(
            "/api/team/add",
            Some(&owner),
            json!({ "name": "too big", "maxNum": "11" }),
        ),
    )
    .await;
    assert_eq!(body["code"], CODE_PARAMS_ERROR);
    assert_eq!(body["message"], "队伍人数必须在3-10人之间");
}

#[tokio::test]
async fn test_tag_search_and_logout() {
    let app = create_router(setup().await);
    let cookie = register_and_login(&app, "alice").await;

    let (_, _, body) = send(&app, get("/api/user/search/tags?tagNameList=Rust", None)).await;
    assert_eq!(body["code"], CODE_SUCCESS);
    assert_eq!(body["date"][0]["userAccount"], "alice");

    let (_, _, body) = send(&app, get("/api/user/search/tags", None)).await;
    assert_eq!(body["message"], "标签参数为空");

    let (_, _, body) = send(&app, post_json("/api/user/logout", Some(&cookie), json!({}))).await;
    assert_eq!(body["code"], CODE_SUCCESS);

    let (_, _, body) = send(&app, get("/api/user/current", Some(&cookie))).await;
    assert_eq!(body["code"], CODE_NOT_LOGIN);
}
