//! Service configuration, from command-line flags or the environment

use crate::auth::jwt::DEFAULT_TOKEN_TTL_HOURS;
use crate::auth::password::DEFAULT_BCRYPT_COST;
use clap::Parser;
use tracing::warn;

pub const DEV_JWT_SECRET: &str = "dev-only-change-me";

#[derive(Parser, Debug, Clone)]
#[command(name = "store-rating")]
#[command(about = "Store rating API - accounts, stores and 1-5 star ratings")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long = "bind", env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind_addr: String,

    /// SQLite database file
    #[arg(long, env = "DB_PATH", default_value = "store-rating.db")]
    pub db_path: String,

    /// HMAC secret for signing tokens
    #[arg(long, env = "JWT_SECRET", default_value = DEV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// bcrypt work factor for new password hashes
    #[arg(long, env = "BCRYPT_COST", default_value_t = DEFAULT_BCRYPT_COST,
          value_parser = clap::value_parser!(u32).range(4..=31))]
    pub bcrypt_cost: u32,

    /// Token lifetime in hours
    #[arg(long, env = "TOKEN_TTL_HOURS", default_value_t = DEFAULT_TOKEN_TTL_HOURS,
          value_parser = clap::value_parser!(i64).range(1..))]
    pub token_ttl_hours: i64,
}

impl Config {
    /// Warn about settings that are unsafe outside development
    pub fn check(&self) {
        if self.jwt_secret == DEV_JWT_SECRET {
            warn!("JWT_SECRET not set, using the development default; tokens are forgeable");
        }
    }
}
