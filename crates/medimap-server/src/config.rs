use clap::Parser;

/// Server configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug, Clone)]
#[command(name = "medimap-server")]
#[command(author, version, about = "REST API server for MediMap drug-consumption statistics")]
pub struct ServerConfig {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Server port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Allowed CORS origins, comma-separated, or "*" for any
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Requests per second allowed per client IP (0 disables rate limiting)
    #[arg(long, env = "RATE_LIMIT_RPS", default_value = "0")]
    pub rate_limit_rps: u32,

    /// Burst size for rate limiting
    #[arg(long, env = "RATE_LIMIT_BURST", default_value = "20")]
    pub rate_limit_burst: u32,

    /// Maximum database pool connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value = "10")]
    pub db_max_connections: u32,

    /// Year used when a request omits `year`
    #[arg(long, env = "DEFAULT_YEAR", default_value_t = medimap_core::DEFAULT_YEAR)]
    pub default_year: i32,
}

impl ServerConfig {
    /// Configuration for tests and embedding: local defaults, rate limiting off.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            port: 3000,
            host: "127.0.0.1".to_string(),
            cors_origins: "*".to_string(),
            rate_limit_rps: 0,
            rate_limit_burst: 20,
            db_max_connections: 10,
            default_year: medimap_core::DEFAULT_YEAR,
        }
    }
}
