use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::services::{team::TeamService, user::UserService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Application configuration
    pub config: Arc<Config>,
    /// User directory: profiles, login, matching
    pub users: UserService,
    /// Team registry: teams and memberships
    pub teams: TeamService,
}

impl AppState {
    /// Create new application state
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let users = UserService::new(db.clone(), config.security.bcrypt_cost);
        let teams = TeamService::new(db.clone(), config.team.clone(), config.security.bcrypt_cost);

        Self {
            db,
            config: Arc::new(config),
            users,
            teams,
        }
    }
}
