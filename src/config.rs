//! Env-driven configuration for the service, the CLI and the library.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Everything except the API key has a default.
use std::env;

use crate::error::{AppError, AppResult};

pub const DEFAULT_REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";
/// remove.bg free tier upload limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub remove_bg_url: String,
    pub max_upload_bytes: u64,
    pub output_dir: String,
    pub share_command: Option<String>,
    pub api_host: String,
    pub api_port: String,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    /// Fails only when `REMOVE_BG_API_KEY` is missing or blank.
    pub fn new() -> AppResult<Self> {
        Ok(Config {
            api_key: require_api_key(env::var("REMOVE_BG_API_KEY").ok())?,
            remove_bg_url: env::var("REMOVE_BG_URL").unwrap_or_else(|_| DEFAULT_REMOVE_BG_URL.to_string()),
            max_upload_bytes: parse_upload_limit(env::var("MAX_UPLOAD_BYTES").ok().as_deref()),
            output_dir: env::var("OUTPUT_DIR").unwrap_or_else(|_| ".".to_string()),
            share_command: env::var("SHARE_COMMAND").ok().filter(|c| !c.trim().is_empty()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "8190".to_string()),
        })
    }

    pub fn print_env_vars() {
        let key = env::var("REMOVE_BG_API_KEY").map(|k| mask(&k)).unwrap_or_else(|_| "<unset>".to_string());
        println!("REMOVE_BG_API_KEY: {}", key);
        println!("REMOVE_BG_URL: {}", env::var("REMOVE_BG_URL").unwrap_or_else(|_| "<unset>".to_string()));
        println!("MAX_UPLOAD_BYTES: {}", env::var("MAX_UPLOAD_BYTES").unwrap_or_else(|_| "<unset>".to_string()));
        println!("OUTPUT_DIR: {}", env::var("OUTPUT_DIR").unwrap_or_else(|_| "<unset>".to_string()));
        println!("SHARE_COMMAND: {}", env::var("SHARE_COMMAND").unwrap_or_else(|_| "<unset>".to_string()));
        println!("API_HOST: {}", env::var("API_HOST").unwrap_or_else(|_| "<unset>".to_string()));
        println!("API_PORT: {}", env::var("API_PORT").unwrap_or_else(|_| "<unset>".to_string()));
    }
}

fn require_api_key(raw: Option<String>) -> AppResult<String> {
    raw.filter(|key| !key.trim().is_empty())
        .ok_or_else(|| AppError::Config("REMOVE_BG_API_KEY is not set".to_string()))
}

fn parse_upload_limit(raw: Option<&str>) -> u64 {
    match raw {
        None => DEFAULT_MAX_UPLOAD_BYTES,
        Some(value) => match value.trim().parse::<u64>() {
            Ok(limit) if limit > 0 => limit,
            _ => {
                tracing::warn!("Invalid MAX_UPLOAD_BYTES '{}', falling back to {}", value, DEFAULT_MAX_UPLOAD_BYTES);
                DEFAULT_MAX_UPLOAD_BYTES
            }
        },
    }
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}****", visible)
}
