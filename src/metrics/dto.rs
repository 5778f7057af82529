use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::metrics::repo_types::{MetricKey, MetricValues};

/// Body of `POST /data`. Every metric is required; nothing is defaulted.
///
/// Numbers may also arrive as numeric strings, which is what HTML form clients send.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSubmission {
    #[serde(alias = "plant_id", alias = "facility_id")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub facility_id: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub year: i32,
    #[serde(alias = "carbon_emission")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub carbon_emission: f64,
    #[serde(alias = "water_consumption")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub water_consumption: f64,
    #[serde(alias = "waste_water")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub waste_water: f64,
    #[serde(alias = "solid_waste")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub solid_waste: f64,
    #[serde(alias = "trees_plantation")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub trees_plantation: f64,
    #[serde(alias = "carbon_absorption")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub carbon_absorption: f64,
}

impl MetricSubmission {
    pub fn into_parts(self) -> (MetricKey, MetricValues) {
        (
            MetricKey {
                facility_id: self.facility_id,
                year: self.year,
            },
            MetricValues {
                carbon_emission: self.carbon_emission,
                water_consumption: self.water_consumption,
                waste_water: self.waste_water,
                solid_waste: self.solid_waste,
                trees_plantation: self.trees_plantation,
                carbon_absorption: self.carbon_absorption,
            },
        )
    }
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_camel_and_snake_case() {
        let camel: MetricSubmission = serde_json::from_value(json!({
            "facilityId": 1, "year": 2024, "carbonEmission": 100,
            "waterConsumption": 1.5, "wasteWater": 0, "solidWaste": 2,
            "treesPlantation": 3, "carbonAbsorption": 4
        }))
        .unwrap();
        let snake: MetricSubmission = serde_json::from_value(json!({
            "plant_id": 1, "year": 2024, "carbon_emission": 100,
            "water_consumption": 1.5, "waste_water": 0, "solid_waste": 2,
            "trees_plantation": 3, "carbon_absorption": 4
        }))
        .unwrap();
        assert_eq!(camel.into_parts(), snake.into_parts());
    }

    #[test]
    fn form_strings_parse_like_numbers() {
        // Shape posted by the admin dashboard form: every value is a string.
        let form: MetricSubmission = serde_json::from_value(json!({
            "plant_id": "1", "year": "2024", "carbon_emission": "100",
            "water_consumption": "1.5", "waste_water": "0", "solid_waste": "2",
            "trees_plantation": "3", "carbon_absorption": "4"
        }))
        .unwrap();
        let numeric: MetricSubmission = serde_json::from_value(json!({
            "facilityId": 1, "year": 2024, "carbonEmission": 100,
            "waterConsumption": 1.5, "wasteWater": 0, "solidWaste": 2,
            "treesPlantation": 3, "carbonAbsorption": 4
        }))
        .unwrap();
        assert_eq!(form.into_parts(), numeric.into_parts());
    }

    #[test]
    fn empty_or_non_numeric_strings_are_errors() {
        for bad in ["", "abc", "1,5"] {
            let res: Result<MetricSubmission, _> = serde_json::from_value(json!({
                "plant_id": "1", "year": "2024", "carbon_emission": bad,
                "water_consumption": "1", "waste_water": "0", "solid_waste": "2",
                "trees_plantation": "3", "carbon_absorption": "4"
            }));
            assert!(res.is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn missing_metric_is_an_error() {
        let res: Result<MetricSubmission, _> = serde_json::from_value(json!({
            "facilityId": 1, "year": 2024, "carbonEmission": 100
        }));
        assert!(res.is_err());
    }
}
