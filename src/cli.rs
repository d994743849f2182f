//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS, TokenLifetimes};
use crate::rate_limit::DEFAULT_AUTH_ATTEMPTS_PER_MINUTE;
use crate::roster::Roster;
use clap::Parser;
use std::num::NonZeroU32;
use tracing::{error, info, warn};

const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Upper bound for either token lifetime: ten years.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rollcall",
    about = "Attendance and grades portal for students and lecturers"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "rollcall.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_ACCESS_TTL_SECS, value_parser = clap::value_parser!(u64).range(1..=MAX_TTL_SECS))]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_REFRESH_TTL_SECS, value_parser = clap::value_parser!(u64).range(1..=MAX_TTL_SECS))]
    pub refresh_ttl_secs: u64,

    /// Student IDs allowed to sign up (comma separated)
    #[arg(long, env = "ROLLCALL_STUDENT_IDS", value_delimiter = ',', default_value = "S1001,S1002,S1003")]
    pub student_ids: Vec<String>,

    /// Lecturer IDs allowed to sign up (comma separated)
    #[arg(long, env = "ROLLCALL_LECTURER_IDS", value_delimiter = ',', default_value = "L2001,L2002")]
    pub lecturer_ids: Vec<String>,

    /// Set the Secure flag on session cookies (use when served over HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Key rate limits on the first X-Forwarded-For hop (only behind a trusted proxy)
    #[arg(long)]
    pub trust_forwarded_for: bool,

    /// Signup and login submissions allowed per minute per client IP
    #[arg(long, default_value_t = NonZeroU32::new(DEFAULT_AUTH_ATTEMPTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN))]
    pub auth_attempts_per_minute: NonZeroU32,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build the signup allow-lists, warning about IDs listed under both roles.
pub fn build_roster(student_ids: &[String], lecturer_ids: &[String]) -> Roster {
    let roster = Roster::new(student_ids.iter().cloned(), lecturer_ids.iter().cloned());

    let overlap = roster.overlap();
    if !overlap.is_empty() {
        warn!(
            ids = ?overlap,
            "IDs listed for both roles; whichever role signs up first claims them"
        );
    }

    roster
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, jwt_secret: String) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        token_lifetimes: TokenLifetimes {
            access_secs: args.access_ttl_secs,
            refresh_secs: args.refresh_ttl_secs,
        },
        roster: build_roster(&args.student_ids, &args.lecturer_ids),
        secure_cookies: args.secure_cookies,
        trust_forwarded_for: args.trust_forwarded_for,
        auth_attempts_per_minute: args.auth_attempts_per_minute,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
