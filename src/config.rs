use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Team size and membership limits
    #[serde(default)]
    pub team: TeamConfig,
    /// Password hashing settings
    #[serde(default)]
    pub security: SecurityConfig,
    /// Session cookie settings
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database type (postgres or sqlite)
    #[serde(default = "default_db_type", rename = "type")]
    pub db_type: String,
    /// Database host
    #[serde(default = "default_db_host")]
    pub host: String,
    /// Database port
    #[serde(default = "default_db_port")]
    pub port: u16,
    /// Database name
    #[serde(default = "default_db_name", rename = "database")]
    pub name: String,
    /// Database user
    #[serde(default = "default_db_user", rename = "username")]
    pub user: String,
    /// Database password
    #[serde(default)]
    pub password: String,
    /// SQLite file path; ":memory:" for a throwaway database
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamConfig {
    /// Smallest allowed team capacity
    #[serde(default = "default_min_members")]
    pub min_members: i32,
    /// Largest allowed team capacity
    #[serde(default = "default_max_members")]
    pub max_members: i32,
    /// How many teams one user may be an active member of
    #[serde(default = "default_max_joined_teams")]
    pub max_joined_teams: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityConfig {
    /// bcrypt cost used for user and team passwords
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Mark the session cookie as Secure (requires HTTPS)
    #[serde(default)]
    pub secure: bool,
}

// Default value functions
fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_db_type() -> String {
    "postgres".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "partner_match".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/partner-match.db")
}

fn default_min_members() -> i32 {
    3
}

fn default_max_members() -> i32 {
    10
}

fn default_max_joined_teams() -> u64 {
    5
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            log: LogConfig::default(),
            database: DatabaseConfig::default(),
            team: TeamConfig::default(),
            security: SecurityConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: default_db_type(),
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            user: default_db_user(),
            password: String::new(),
            path: default_db_path(),
        }
    }
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            min_members: default_min_members(),
            max_members: default_max_members(),
            max_joined_teams: default_max_joined_teams(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl DatabaseConfig {
    /// Whether this configuration points at SQLite
    pub fn is_sqlite(&self) -> bool {
        self.db_type.eq_ignore_ascii_case("sqlite")
    }

    /// Generate database connection URL
    pub fn connection_url(&self) -> String {
        if self.is_sqlite() {
            let path = self.path.to_string_lossy();
            if path == ":memory:" {
                return "sqlite::memory:".to_string();
            }
            return format!("sqlite://{}?mode=rwc", path);
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;

        if config.team.min_members > config.team.max_members {
            anyhow::bail!(
                "team.min_members ({}) is greater than team.max_members ({})",
                config.team.min_members,
                config.team.max_members
            );
        }

        Ok(config)
    }
}
