//! Server configuration loaded from environment variables

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MIN_PLAYERS: usize = 4;
pub const DEFAULT_CATEGORIES_FILE: &str = "categories.json";
pub const DEFAULT_STATIC_DIR: &str = "client/dist";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Players required before the host may start a game
    pub min_players: usize,
    /// Allowed CORS origins (empty = any origin)
    pub allowed_origins: Vec<String>,
    pub categories_file: PathBuf,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            min_players: DEFAULT_MIN_PLAYERS,
            allowed_origins: Vec::new(),
            categories_file: PathBuf::from(DEFAULT_CATEGORIES_FILE),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let min_players = std::env::var("MIN_PLAYERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MIN_PLAYERS)
            .max(1);

        // ORIGIN is the older name of the same setting
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .or_else(|_| std::env::var("ORIGIN"))
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        let categories_file = std::env::var("CATEGORIES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATEGORIES_FILE));

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR));

        tracing::info!(
            port,
            min_players,
            ?allowed_origins,
            categories_file = %categories_file.display(),
            static_dir = %static_dir.display(),
            "Server config loaded"
        );

        Self {
            port,
            min_players,
            allowed_origins,
            categories_file,
            static_dir,
        }
    }
}

/// Split a comma separated origin list; `*` means any origin
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}
