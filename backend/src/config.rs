//! Server settings read from the environment at startup.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::features::CategoryPolicy;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MODEL_PATH: &str = "models/insurance_model.json";
pub const DEFAULT_STATIC_DIR: &str = "./static";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub model_path: PathBuf,
    pub static_dir: PathBuf,
    pub category_policy: CategoryPolicy,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };

        let workers = match lookup("WORKERS") {
            Some(raw) => {
                let workers: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("WORKERS must be a positive integer, got {raw:?}"))?;
                if workers == 0 {
                    bail!("WORKERS must be at least 1");
                }
                workers
            }
            None => num_cpus::get(),
        };

        let strict = match lookup("STRICT_CATEGORIES") {
            Some(raw) => parse_flag(&raw)?,
            None => false,
        };
        let category_policy = if strict {
            CategoryPolicy::Strict
        } else {
            CategoryPolicy::Lenient
        };

        Ok(ServerConfig {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            workers,
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            category_policy,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Origins allowed to call the JSON API from a browser.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![format!("http://{}", self.bind_address())];
        for alias in ["localhost", "127.0.0.1"] {
            let origin = format!("http://{}:{}", alias, self.port);
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        origins
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => bail!("STRICT_CATEGORIES must be true or false, got {raw:?}"),
    }
}
