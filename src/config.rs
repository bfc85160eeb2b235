use std::{path::PathBuf, str::FromStr};

use anyhow::Context;

pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub media_dir: PathBuf,
    pub session_idle: time::Duration,
    pub password_memory_kib: u32,
    pub password_iterations: u32,
}

impl Config {
    /// Reads configuration from the process environment, after loading `.env` if one exists.
    pub fn from_env() -> anyhow::Result<Config> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: dotenv::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            bind_addr: dotenv::var("BIND_ADDR").unwrap_or("0.0.0.0:8080".to_owned()),
            media_dir: PathBuf::from(dotenv::var("MEDIA_DIR").unwrap_or("media".to_owned())),
            session_idle: time::Duration::minutes(parse_or("SESSION_IDLE_MINUTES", 60)?),
            password_memory_kib: parse_or("PASSWORD_MEMORY_KIB", 19 * 1024)?,
            password_iterations: parse_or("PASSWORD_ITERATIONS", 2)?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenv::var(key) {
        Ok(value) => value.trim().parse().with_context(|| format!("{key} is not valid: {value:?}")),
        Err(_) => Ok(default),
    }
}
