//! Registration, login, profile edits and the three user lookups

mod common;

use common::{register, setup, PASSWORD};
use partner_match::error::AppError;
use partner_match::services::user::{RegisterRequest, UpdateUserRequest, DEFAULT_AVATAR_URL};

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_register_and_login() {
    let state = setup().await;

    assert!(!state.users.account_exists("alice").await.unwrap());
    let alice = register(&state, "alice", 1, &["Rust", " Rust ", "", "Go"]).await;
    assert!(state.users.account_exists("alice").await.unwrap());

    let found = state.users.login("alice", PASSWORD).await.unwrap();
    assert_eq!(found.id, alice.id);
    assert_ne!(found.password, PASSWORD);
    assert_eq!(found.avatar_url, DEFAULT_AVATAR_URL);
    assert_eq!(found.tag_list(), strings(&["Rust", "Go"]));

    let err = state.users.login("alice", "wrong-password").await.unwrap_err();
    assert_eq!(err.message(), "密码错误");

    let err = state.users.login("nobody", PASSWORD).await.unwrap_err();
    assert_eq!(err.message(), "用户不存在");

    let me = state.users.current(&alice).await.unwrap();
    assert_eq!(me.user_account, "alice");
    assert_eq!(me.username, "alice");
    assert_eq!(me.gender, 1);
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let state = setup().await;
    register(&state, "taken", 0, &[]).await;

    let err = state
        .users
        .register(RegisterRequest {
            user_account: "taken".to_string(),
            user_password: PASSWORD.to_string(),
            check_password: PASSWORD.to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = state
        .users
        .register(RegisterRequest {
            user_account: "fresh".to_string(),
            user_password: PASSWORD.to_string(),
            check_password: "different".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.message(), "两次输入的密码不一致");

    let err = state
        .users
        .register(RegisterRequest {
            user_account: "   ".to_string(),
            user_password: PASSWORD.to_string(),
            check_password: PASSWORD.to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = state
        .users
        .register(RegisterRequest {
            user_account: "fresh".to_string(),
            user_password: PASSWORD.to_string(),
            check_password: PASSWORD.to_string(),
            gender: Some(5),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.message(), "性别不合法");
}

#[tokio::test]
async fn test_update_own_profile_only() {
    let state = setup().await;
    let alice = register(&state, "alice", 0, &[]).await;
    let bob = register(&state, "bob", 0, &[]).await;

    state
        .users
        .update(
            &alice,
            UpdateUserRequest {
                id: alice.id,
                username: Some("Alice".to_string()),
                tags: Some(strings(&["Rust", "Rust", "AI"])),
                profile: Some("hello".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let me = state.users.current(&alice).await.unwrap();
    assert_eq!(me.username, "Alice");
    assert_eq!(me.tags, strings(&["Rust", "AI"]));
    assert_eq!(me.profile.as_deref(), Some("hello"));

    let err = state
        .users
        .update(
            &bob,
            UpdateUserRequest {
                id: alice.id,
                username: Some("pwned".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = state
        .users
        .update(
            &alice,
            UpdateUserRequest {
                id: alice.id,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.message(), "未更新任何字段");

    let err = state
        .users
        .update(
            &alice,
            UpdateUserRequest {
                id: 9999,
                username: Some("ghost".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_recommend_pages_newest_first() {
    let state = setup().await;
    let me = register(&state, "me", 0, &[]).await;
    for i in 0..5 {
        register(&state, &format!("user{}", i), 0, &[]).await;
    }

    let first = state.users.recommend(&me, 1, 2).await.unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(first.pages, 3);
    assert_eq!(first.current, 1);
    let accounts: Vec<&str> = first.records.iter().map(|u| u.user_account.as_str()).collect();
    assert_eq!(accounts, vec!["user4", "user3"]);

    let last = state.users.recommend(&me, 3, 2).await.unwrap();
    assert_eq!(last.records.len(), 1);
    assert_eq!(last.records[0].user_account, "user0");

    let beyond = state.users.recommend(&me, 4, 2).await.unwrap();
    assert!(beyond.records.is_empty());

    assert!(state.users.recommend(&me, 0, 2).await.is_err());
    assert!(state.users.recommend(&me, 1, 0).await.is_err());
}

#[tokio::test]
async fn test_match_by_shared_tags() {
    let state = setup().await;
    let me = register(&state, "me", 0, &["Python", "AI"]).await;
    register(&state, "designer", 1, &["AI", "Design"]).await;
    register(&state, "javaist", 0, &["Java"]).await;
    register(&state, "blank", 0, &[]).await;

    let matched = state.users.match_users(&me, 10).await.unwrap();
    let accounts: Vec<&str> = matched.iter().map(|u| u.user_account.as_str()).collect();
    assert_eq!(accounts, vec!["designer"]);

    let err = state.users.match_users(&me, 0).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(state.users.match_users(&me, 101).await.is_err());
}

#[tokio::test]
async fn test_match_without_tags_returns_random_others() {
    let state = setup().await;
    let me = register(&state, "me", 0, &[]).await;
    for i in 0..4 {
        register(&state, &format!("user{}", i), 0, &["Rust"]).await;
    }

    let matched = state.users.match_users(&me, 3).await.unwrap();
    assert_eq!(matched.len(), 3);
    assert!(matched.iter().all(|u| u.id != me.id));

    let all = state.users.match_users(&me, 10).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_search_by_tags_requires_every_token() {
    let state = setup().await;
    register(&state, "rust_m", 0, &["Rust", "AI"]).await;
    register(&state, "rust_f", 1, &["Rust"]).await;
    register(&state, "go_f", 1, &["Go"]).await;

    let accounts = |users: Vec<partner_match::entity::user::UserResponse>| -> Vec<String> {
        users.into_iter().map(|u| u.user_account).collect()
    };

    let found = state.users.search_by_tags(strings(&["Rust"])).await.unwrap();
    assert_eq!(accounts(found), strings(&["rust_f", "rust_m"]));

    let found = state
        .users
        .search_by_tags(strings(&["Rust", "AI"]))
        .await
        .unwrap();
    assert_eq!(accounts(found), strings(&["rust_m"]));

    let found = state.users.search_by_tags(strings(&["女"])).await.unwrap();
    assert_eq!(accounts(found), strings(&["go_f", "rust_f"]));

    let found = state
        .users
        .search_by_tags(strings(&["男", "Rust"]))
        .await
        .unwrap();
    assert_eq!(accounts(found), strings(&["rust_m"]));

    let found = state.users.search_by_tags(strings(&["Haskell"])).await.unwrap();
    assert!(found.is_empty());

    let found = state.users.search_by_tags(strings(&[" ", ""])).await.unwrap();
    assert!(found.is_empty());
}
