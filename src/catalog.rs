// Read side: room browsing, the add-on service list, and profile management.

use crate::cache::{CacheConfig, CacheStatsReport, ReferenceCache};
use crate::domain::{
    AdditionalService, ProfileUpdate, Room, RoomStatus, UserProfile, PROFILES_TABLE, ROOMS_TABLE,
    SERVICES_TABLE,
};
use crate::store::{decode_row, decode_rows, SelectQuery, StoreError, TableStore};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Rooms currently open for booking, cheapest first.
pub async fn list_available_rooms(store: &dyn TableStore) -> Result<Vec<Room>, StoreError> {
    let rows = store
        .select(
            ROOMS_TABLE,
            SelectQuery::new()
                .eq("status", RoomStatus::Available.as_str())
                .order_asc("price_per_night"),
        )
        .await?;
    decode_rows(rows)
}

pub async fn get_room(store: &dyn TableStore, room_id: &str) -> Result<Room, StoreError> {
    let row = store
        .select_single(ROOMS_TABLE, SelectQuery::new().eq("id", room_id))
        .await?;
    decode_row(row)
}

/// Add-on services currently offered to guests.
pub async fn list_active_services(
    store: &dyn TableStore,
) -> Result<Vec<AdditionalService>, StoreError> {
    let rows = store
        .select(
            SERVICES_TABLE,
            SelectQuery::new().eq("active", "true").order_asc("name"),
        )
        .await?;
    decode_rows(rows)
}

/// Fetch the selected services by id, active ones only. An empty selection
/// resolves to an empty list without a round trip.
pub async fn resolve_services(
    store: &dyn TableStore,
    service_ids: &BTreeSet<String>,
) -> Result<Vec<AdditionalService>, StoreError> {
    if service_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = store
        .select(
            SERVICES_TABLE,
            SelectQuery::new()
                .is_in("id", service_ids.iter().cloned())
                .eq("active", "true"),
        )
        .await?;
    decode_rows(rows)
}

pub async fn fetch_profile(
    store: &dyn TableStore,
    user_id: &str,
) -> Result<UserProfile, StoreError> {
    let row = store
        .select_single(PROFILES_TABLE, SelectQuery::new().eq("id", user_id))
        .await?;
    decode_row(row)
}

pub async fn update_profile(
    store: &dyn TableStore,
    user_id: &str,
    patch: ProfileUpdate,
) -> Result<UserProfile, StoreError> {
    let patch = serde_json::to_value(&patch).map_err(|e| StoreError::Decode(e.to_string()))?;
    let mut rows = store
        .update(PROFILES_TABLE, SelectQuery::new().eq("id", user_id), patch)
        .await?;

    if rows.is_empty() {
        return Err(StoreError::EmptyResult {
            table: PROFILES_TABLE.to_string(),
        });
    }
    decode_row(rows.remove(0))
}

const ROOMS_KEY: &str = "rooms:available";
const SERVICES_KEY: &str = "services:active";

/// Cached front over the reference listings. The remote rows barely change
/// between page loads, so repeated views are served from memory.
pub struct CatalogCache {
    cache: ReferenceCache,
}

impl CatalogCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: ReferenceCache::new(config),
        }
    }

    pub async fn available_rooms(&self, store: &dyn TableStore) -> Result<Vec<Room>, StoreError> {
        if let Some(cached) = self.cache.get(ROOMS_KEY) {
            debug!("room listing served from cache");
            return decode_cached(cached);
        }

        let rooms = list_available_rooms(store).await?;
        if let Ok(value) = serde_json::to_value(&rooms) {
            self.cache.store(ROOMS_KEY, value, None);
        }
        Ok(rooms)
    }

    pub async fn active_services(
        &self,
        store: &dyn TableStore,
    ) -> Result<Vec<AdditionalService>, StoreError> {
        if let Some(cached) = self.cache.get(SERVICES_KEY) {
            debug!("service listing served from cache");
            return decode_cached(cached);
        }

        let services = list_active_services(store).await?;
        if let Ok(value) = serde_json::to_value(&services) {
            self.cache.store(SERVICES_KEY, value, None);
        }
        Ok(services)
    }

    pub fn invalidate_rooms(&self) -> usize {
        self.cache.invalidate_prefix("rooms:")
    }

    pub fn invalidate_services(&self) -> usize {
        self.cache.invalidate_prefix("services:")
    }

    pub fn stats(&self) -> CacheStatsReport {
        self.cache.stats()
    }
}

fn decode_cached<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
}
