use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::LocalCart;

/// Store key for the local cart
pub const CART_KEY: &str = "cart";

/// Store key for the cart badge count
pub const CART_COUNT_KEY: &str = "cartItemsCount";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Flat JSON-file key-value store. A missing file means a missing key.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedData<T>>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read store key: {}", key))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse store key: {}", key))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.key_path(key), contents)
            .with_context(|| format!("Failed to write store key: {}", key))?;
        debug!(key = key, "Store key written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove store key: {}", key))?;
            debug!(key = key, "Store key removed");
        }
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.key_path(key).exists()
    }

    // ===== Cart =====

    pub fn load_cart(&self) -> Result<Option<LocalCart>> {
        Ok(self.load::<LocalCart>(CART_KEY)?.map(|c| c.data))
    }

    pub fn save_cart(&self, cart: &LocalCart) -> Result<()> {
        self.save(CART_KEY, cart)
    }

    pub fn remove_cart(&self) -> Result<()> {
        self.remove(CART_KEY)
    }

    /// How long ago the local cart was last written, for display
    pub fn cart_age(&self) -> Option<String> {
        match self.load::<LocalCart>(CART_KEY) {
            Ok(cached) => cached.map(|c| c.age_display()),
            Err(e) => {
                debug!(error = %e, "Failed to load cart for age display");
                None
            }
        }
    }

    // ===== Cart Count =====

    pub fn load_cart_count(&self) -> Result<Option<i32>> {
        Ok(self.load::<i32>(CART_COUNT_KEY)?.map(|c| c.data))
    }

    pub fn save_cart_count(&self, count: i32) -> Result<()> {
        self.save(CART_COUNT_KEY, &count)
    }
}

// ============================================================================
// Tests
// ============================================================================
