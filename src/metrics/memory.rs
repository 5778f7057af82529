use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::{
    error::StoreError,
    metrics::{
        repo::MetricStore,
        repo_types::{Facility, MetricKey, MetricRecord, MetricValues},
    },
};

/// Process-local metric store. Records live in a sharded map, so an upsert is one
/// `insert` under the key's shard lock and different keys rarely contend.
#[derive(Default)]
pub struct MemoryMetricStore {
    facilities: RwLock<BTreeMap<i64, Facility>>,
    records: DashMap<MetricKey, MetricRecord>,
}

impl MemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds facilities named `names`, with ids starting at 1.
    pub fn with_facilities<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let store = Self::new();
        {
            let mut facilities = store.facilities.write();
            for (idx, name) in names.into_iter().enumerate() {
                let id = idx as i64 + 1;
                facilities.insert(
                    id,
                    Facility {
                        id,
                        name: name.into(),
                    },
                );
            }
        }
        store
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl MetricStore for MemoryMetricStore {
    async fn list_facilities(&self) -> Result<Vec<Facility>, StoreError> {
        let mut list: Vec<Facility> = self.facilities.read().values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn get(&self, key: MetricKey) -> Result<Option<MetricRecord>, StoreError> {
        Ok(self.records.get(&key).map(|r| r.value().clone()))
    }

    async fn upsert(&self, key: MetricKey, values: MetricValues) -> Result<(), StoreError> {
        if !self.facilities.read().contains_key(&key.facility_id) {
            return Err(StoreError::UnknownFacility);
        }
        self.records.insert(key, MetricRecord::new(key, values));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn values(carbon: f64) -> MetricValues {
        MetricValues {
            carbon_emission: carbon,
            water_consumption: 10.0,
            waste_water: 0.0,
            solid_waste: -1.5,
            trees_plantation: 12.0,
            carbon_absorption: 3.25,
        }
    }

    fn key(facility_id: i64, year: i32) -> MetricKey {
        MetricKey { facility_id, year }
    }

    #[tokio::test]
    async fn missing_pair_is_none() {
        let store = MemoryMetricStore::with_facilities(["North Plant"]);
        assert!(store.get(key(1, 2024)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_upsert_overwrites_first() {
        let store = MemoryMetricStore::with_facilities(["North Plant"]);
        store.upsert(key(1, 2024), values(100.0)).await.unwrap();
        store.upsert(key(1, 2024), values(150.0)).await.unwrap();
        assert_eq!(store.len(), 1);
        let rec = store.get(key(1, 2024)).await.unwrap().unwrap();
        assert_eq!(rec, MetricRecord::new(key(1, 2024), values(150.0)));
    }

    #[tokio::test]
    async fn zero_and_negative_values_are_kept() {
        let store = MemoryMetricStore::with_facilities(["North Plant"]);
        store.upsert(key(1, 2023), values(0.0)).await.unwrap();
        let rec = store.get(key(1, 2023)).await.unwrap().unwrap();
        assert_eq!(rec.carbon_emission, Some(0.0));
        assert_eq!(rec.solid_waste, Some(-1.5));
    }

    #[tokio::test]
    async fn different_keys_are_independent() {
        let store = MemoryMetricStore::with_facilities(["North Plant", "South Plant"]);
        store.upsert(key(1, 2024), values(1.0)).await.unwrap();
        store.upsert(key(2, 2024), values(2.0)).await.unwrap();
        store.upsert(key(1, 2025), values(3.0)).await.unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.get(key(2, 2024)).await.unwrap().unwrap().carbon_emission,
            Some(2.0)
        );
    }

    #[tokio::test]
    async fn unknown_facility_is_rejected() {
        let store = MemoryMetricStore::with_facilities(["North Plant"]);
        let err = store.upsert(key(7, 2024), values(1.0)).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownFacility));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn facilities_are_sorted_by_name() {
        let store = MemoryMetricStore::with_facilities(["Zeta Works", "Alpha Mill"]);
        let names: Vec<String> = store
            .list_facilities()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Alpha Mill", "Zeta Works"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_to_one_key_leave_one_record() {
        let store = Arc::new(MemoryMetricStore::with_facilities(["North Plant"]));
        let mut tasks = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.upsert(key(1, 2024), values(i as f64)).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(store.len(), 1);
        let rec = store.get(key(1, 2024)).await.unwrap().unwrap();
        let carbon = rec.carbon_emission.unwrap();
        assert!((0.0..64.0).contains(&carbon));
        // Never a merge: every other field still matches the winning payload.
        assert_eq!(rec, MetricRecord::new(key(1, 2024), values(carbon)));
    }
}
