use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Account created at startup with the `admin` role.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
    pub admin: Option<AdminSeed>,
    pub seed_facilities: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match var("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("unknown STORE_BACKEND {other:?}"),
        };

        let database_url = var("DATABASE_URL").filter(|v| !v.is_empty());
        if store == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set for the postgres backend");
        }

        let secret = var("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .context("JWT_SECRET must be set")?;
        let jwt = JwtConfig {
            secret,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "ecometrics".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "ecometrics-users".into()),
            ttl_minutes: var("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|m| *m > 0)
                .unwrap_or(60 * 24),
        };

        let port = match var("APP_PORT") {
            Some(p) => p.parse::<u16>().with_context(|| format!("invalid APP_PORT {p:?}"))?,
            None => 8080,
        };

        let admin = match (var("ADMIN_USERNAME"), var("ADMIN_EMAIL"), var("ADMIN_SECRET")) {
            (Some(username), Some(email), Some(secret)) => Some(AdminSeed {
                username,
                email,
                secret,
            }),
            (None, None, None) => None,
            _ => bail!("ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_SECRET must be set together"),
        };

        let seed_facilities = var("SEED_FACILITIES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            store,
            database_url,
            jwt,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            admin,
            seed_facilities,
        })
    }
}
