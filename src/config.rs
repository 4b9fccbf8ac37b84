use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub generation_timeout_secs: u64,
    pub form_script_url: Option<String>,
    pub max_questions: usize,
    pub generation_requests_per_minute: u32,
    pub max_upload_bytes: usize,
    pub gazetteer_path: Option<String>,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let gemini_base_url = get_env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL);
        check_url("GEMINI_BASE_URL", &gemini_base_url)?;

        let form_script_url = get_env_opt("FORM_SCRIPT_URL");
        if let Some(ref url) = form_script_url {
            check_url("FORM_SCRIPT_URL", url)?;
        }

        let log_format = match get_env_opt("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("text") | None => LogFormat::Text,
            Some(other) => {
                return Err(Error::Config(format!(
                    "Invalid value for LOG_FORMAT: {} (expected 'text' or 'json')",
                    other
                )))
            }
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            gemini_api_key: get_env("GEMINI_API_KEY")?,
            gemini_model: get_env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_base_url,
            generation_timeout_secs: get_env_parse_or("GENERATION_TIMEOUT_SECS", 60)?,
            form_script_url,
            max_questions: get_env_parse_or("MAX_QUESTIONS", 20)?,
            generation_requests_per_minute: get_env_parse_or("GENERATION_REQUESTS_PER_MINUTE", 6)?,
            max_upload_bytes: get_env_parse_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            gazetteer_path: get_env_opt("GAZETTEER_PATH"),
            log_format,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

fn check_url(name: &str, raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| Error::Config(format!("Invalid URL in {}: {}", name, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::Config(format!(
            "{} must be an http(s) URL, got scheme '{}'",
            name,
            parsed.scheme()
        )));
    }
    Ok(())
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
