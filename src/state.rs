use crate::auth::{
    jwt::JwtKeys,
    memory::MemoryUserStore,
    repo::{PgUserStore, UserStore},
};
use crate::config::{AppConfig, StoreBackend};
use crate::metrics::{
    memory::MemoryMetricStore,
    repo::{MetricStore, PgMetricStore},
};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<JwtKeys>,
    pub users: Arc<dyn UserStore>,
    pub metrics: Arc<dyn MetricStore>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let (users, metrics) = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set for the postgres backend")?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                // Run migrations if present
                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    warn!(error = %e, "migration failed; continuing");
                }

                info!("using postgres store");
                (
                    Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>,
                    Arc::new(PgMetricStore::new(db)) as Arc<dyn MetricStore>,
                )
            }
            StoreBackend::Memory => {
                info!(
                    facilities = config.seed_facilities.len(),
                    "using in-memory store; data is lost on exit"
                );
                (
                    Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>,
                    Arc::new(MemoryMetricStore::with_facilities(
                        config.seed_facilities.iter().cloned(),
                    )) as Arc<dyn MetricStore>,
                )
            }
        };

        Ok(Self::from_parts(config, users, metrics))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        metrics: Arc<dyn MetricStore>,
    ) -> Self {
        let keys = Arc::new(JwtKeys::new(&config.jwt));
        Self {
            config,
            keys,
            users,
            metrics,
        }
    }

    /// In-memory state for tests, with the given facilities seeded.
    #[cfg(test)]
    pub fn fake(facilities: &[&str]) -> Self {
        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            host: "127.0.0.1".into(),
            port: 0,
            admin: None,
            seed_facilities: facilities.iter().map(|f| f.to_string()).collect(),
        });
        let users = Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>;
        let metrics = Arc::new(MemoryMetricStore::with_facilities(facilities.iter().copied()))
            as Arc<dyn MetricStore>;
        Self::from_parts(config, users, metrics)
    }
}
