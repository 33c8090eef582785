use moka::future::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

use crate::model::office::{OFFICE_CONFIG_KEY, OfficeConfig};

/// Office geofence keyed by its settings key. Read on every clock-in/out,
/// written only by an admin save, which invalidates the entry.
static OFFICE_CACHE: Lazy<Cache<&'static str, OfficeConfig>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(16)
        .time_to_live(Duration::from_secs(60))
        .build()
});

pub async fn get() -> Option<OfficeConfig> {
    OFFICE_CACHE.get(&OFFICE_CONFIG_KEY).await
}

pub async fn put(config: OfficeConfig) {
    OFFICE_CACHE.insert(OFFICE_CONFIG_KEY, config).await;
}

pub async fn invalidate() {
    OFFICE_CACHE.invalidate(&OFFICE_CONFIG_KEY).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn put_get_and_invalidate() {
        let mut config = OfficeConfig::default();
        config.radius_meters = 321.0;

        put(config.clone()).await;
        assert_eq!(get().await, Some(config));

        invalidate().await;
        assert_eq!(get().await, None);
    }
}
