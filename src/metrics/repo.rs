use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::StoreError,
    metrics::repo_types::{Facility, MetricKey, MetricRecord, MetricValues},
};

/// Keyed metric persistence. `upsert` must be one atomic insert-or-overwrite on the
/// (facility, year) key; callers never check existence first.
#[async_trait]
pub trait MetricStore: Send + Sync {
    async fn list_facilities(&self) -> Result<Vec<Facility>, StoreError>;
    async fn get(&self, key: MetricKey) -> Result<Option<MetricRecord>, StoreError>;
    async fn upsert(&self, key: MetricKey, values: MetricValues) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgMetricStore {
    db: PgPool,
}

impl PgMetricStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetricStore for PgMetricStore {
    async fn list_facilities(&self) -> Result<Vec<Facility>, StoreError> {
        let rows = sqlx::query_as::<_, Facility>(
            r#"
            SELECT id, name
              FROM facilities
             ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, key: MetricKey) -> Result<Option<MetricRecord>, StoreError> {
        let row = sqlx::query_as::<_, MetricRecord>(
            r#"
            SELECT facility_id, year, carbon_emission, water_consumption, waste_water,
                   solid_waste, trees_plantation, carbon_absorption
              FROM metric_records
             WHERE facility_id = $1 AND year = $2
            "#,
        )
        .bind(key.facility_id)
        .bind(key.year)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn upsert(&self, key: MetricKey, v: MetricValues) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO metric_records (facility_id, year, carbon_emission, water_consumption,
                                        waste_water, solid_waste, trees_plantation,
                                        carbon_absorption)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (facility_id, year) DO UPDATE SET
                carbon_emission   = EXCLUDED.carbon_emission,
                water_consumption = EXCLUDED.water_consumption,
                waste_water       = EXCLUDED.waste_water,
                solid_waste       = EXCLUDED.solid_waste,
                trees_plantation  = EXCLUDED.trees_plantation,
                carbon_absorption = EXCLUDED.carbon_absorption,
                updated_at        = now()
            "#,
        )
        .bind(key.facility_id)
        .bind(key.year)
        .bind(v.carbon_emission)
        .bind(v.water_consumption)
        .bind(v.waste_water)
        .bind(v.solid_waste)
        .bind(v.trees_plantation)
        .bind(v.carbon_absorption)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
