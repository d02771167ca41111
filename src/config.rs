use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("JWT secret must not be empty")]
    EmptySecret,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Overrides the scheme and host used in image URLs.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        let ttl_minutes = match lookup("JWT_TTL_MINUTES") {
            Some(v) => match v.parse::<i64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "JWT_TTL_MINUTES",
                        value: v,
                    })
                }
            },
            None => 60,
        };

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "bulltradex".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "bulltradex-users".into()),
            ttl_minutes,
        };

        let port = match lookup("PORT").or_else(|| lookup("APP_PORT")) {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value: v })?,
            None => 5000,
        };

        let uploads = UploadConfig {
            dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public/uploads/profile_images")),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        };

        Ok(Self {
            database_url,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
            uploads,
        })
    }
}
