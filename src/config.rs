use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
        })
    }
}

/// Settings for the cart view-model when it talks to a running server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub storage_dir: PathBuf,
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let api_url =
            env::var("CART_API_URL").unwrap_or_else(|_| "http://127.0.0.1:3000/api".to_string());
        let storage_dir = env::var("CART_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".cart-storage"));
        let token = env::var("CART_API_TOKEN").ok().filter(|t| !t.is_empty());
        Self {
            api_url,
            storage_dir,
            token,
        }
    }
}
