//! Shared fixtures: an in-memory SQLite database and registered users

#![allow(dead_code)]

use partner_match::entity::user;
use partner_match::middleware::CurrentUser;
use partner_match::services::user::RegisterRequest;
use partner_match::{db, AppState, Config};
use sea_orm::EntityTrait;

pub const PASSWORD: &str = "12345678";

/// Defaults with the cheapest bcrypt cost so tests stay fast
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.security.bcrypt_cost = 4;
    config
}

pub async fn setup() -> AppState {
    let conn = db::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db::auto_migrate(&conn).await.expect("Failed to run migrations");
    AppState::new(conn, test_config())
}

/// Register an account and return it as a caller
pub async fn register(state: &AppState, account: &str, gender: i32, tags: &[&str]) -> CurrentUser {
    let id = state
        .users
        .register(RegisterRequest {
            user_account: account.to_string(),
            user_password: PASSWORD.to_string(),
            check_password: PASSWORD.to_string(),
            gender: Some(gender),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            ..Default::default()
        })
        .await
        .expect("register failed");

    let model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .unwrap()
        .expect("registered user missing");
    CurrentUser::from(&model)
}
