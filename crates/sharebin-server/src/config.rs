use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use rand::RngCore;
use tracing::warn;

/// Secrets that ship in sample `.env` files and must never sign real tokens.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub admin: Option<AdminSeed>,
}

/// Credentials for the admin account created at startup if missing.
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = get("SHAREBIN_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("SHAREBIN_HOST must be an IP address")?;

        let db_path = get("SHAREBIN_DB_PATH")
            .unwrap_or_else(|| "sharebin.db".into())
            .into();

        let jwt_secret = match get("SHAREBIN_JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) if PLACEHOLDER_SECRETS.contains(&secret.as_str()) => {
                bail!("SHAREBIN_JWT_SECRET is still a placeholder; set a random value")
            }
            Some(secret) => secret,
            None => {
                warn!("SHAREBIN_JWT_SECRET unset; using a per-process secret, tokens will not survive a restart");
                random_secret()
            }
        };

        let admin = match (get("SHAREBIN_ADMIN_USERNAME"), get("SHAREBIN_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminSeed {
                    username,
                    email: get("SHAREBIN_ADMIN_EMAIL").unwrap_or_default(),
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            addr,
            db_path,
            jwt_secret,
            admin,
        })
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    B64.encode(bytes)
}
