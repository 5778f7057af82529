use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A plant whose metrics are tracked. Created out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Facility {
    pub id: i64,
    pub name: String,
}

/// Natural key of a metric record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub facility_id: i64,
    pub year: i32,
}

/// One complete submission; every upsert overwrites all six values together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricValues {
    pub carbon_emission: f64,
    pub water_consumption: f64,
    pub waste_water: f64,
    pub solid_waste: f64,
    pub trees_plantation: f64,
    pub carbon_absorption: f64,
}

impl MetricValues {
    pub fn is_finite(&self) -> bool {
        [
            self.carbon_emission,
            self.water_consumption,
            self.waste_water,
            self.solid_waste,
            self.trees_plantation,
            self.carbon_absorption,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Stored row. A `None` value was never recorded.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub facility_id: i64,
    pub year: i32,
    pub carbon_emission: Option<f64>,
    pub water_consumption: Option<f64>,
    pub waste_water: Option<f64>,
    pub solid_waste: Option<f64>,
    pub trees_plantation: Option<f64>,
    pub carbon_absorption: Option<f64>,
}

impl MetricRecord {
    pub fn new(key: MetricKey, v: MetricValues) -> Self {
        Self {
            facility_id: key.facility_id,
            year: key.year,
            carbon_emission: Some(v.carbon_emission),
            water_consumption: Some(v.water_consumption),
            waste_water: Some(v.waste_water),
            solid_waste: Some(v.solid_waste),
            trees_plantation: Some(v.trees_plantation),
            carbon_absorption: Some(v.carbon_absorption),
        }
    }
}
