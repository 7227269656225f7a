use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Identifies one cached embedding: normalized text hashed together with the
/// model id, so switching embedding models never serves a stale vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmbeddingCacheKey(String);

impl EmbeddingCacheKey {
    pub fn new(normalized_text: &str, model_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(model_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(normalized_text.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize, Deserialize)]
struct DiskEntry {
    vector: Vec<f32>,
}

/// Two-tier embedding cache: an in-memory `moka` cache backed by one JSON
/// file per key under `dir`. Memory tier absorbs repeat lookups within a
/// process; disk tier survives restarts without requiring an embedded
/// database dependency.
pub struct EmbeddingCache {
    memory: moka::sync::Cache<String, Vec<f32>>,
    dir: PathBuf,
    max_memory_entries: u64,
    total_requests: AtomicU64,
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(dir: PathBuf, max_memory_entries: u64) -> Self {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("failed to create embedding cache dir {}: {}", dir.display(), e);
        }
        Self {
            memory: moka::sync::Cache::builder()
                .max_capacity(max_memory_entries)
                .time_to_idle(Duration::from_secs(60 * 60))
                .build(),
            dir,
            max_memory_entries,
            total_requests: AtomicU64::new(0),
            memory_hits: AtomicU64::new(0),
            disk_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn disk_path(&self, key: &EmbeddingCacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    pub fn get(&self, key: &EmbeddingCacheKey) -> Option<Vec<f32>> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        if let Some(v) = self.memory.get(key.as_str()) {
            self.memory_hits.fetch_add(1, Ordering::Relaxed);
            return Some(v);
        }
        let path = self.disk_path(key);
        let Some(contents) = std::fs::read_to_string(&path).ok() else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        let Some(entry) = serde_json::from_str::<DiskEntry>(&contents).ok() else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
        self.memory.insert(key.as_str().to_string(), entry.vector.clone());
        Some(entry.vector)
    }

    pub fn put(&self, key: &EmbeddingCacheKey, vector: Vec<f32>) -> Result<()> {
        self.memory.insert(key.as_str().to_string(), vector.clone());
        let entry = DiskEntry { vector };
        let serialized = serde_json::to_string(&entry).context("failed to serialize cache entry")?;
        std::fs::write(self.disk_path(key), serialized).with_context(|| {
            format!("failed to write cache entry to {}", self.dir.display())
        })?;
        Ok(())
    }

    /// Drop every cached embedding, memory and disk alike, and reset the hit/miss counters.
    pub fn clear(&self) -> Result<usize> {
        self.memory.invalidate_all();
        self.total_requests.store(0, Ordering::Relaxed);
        self.memory_hits.store(0, Ordering::Relaxed);
        self.disk_hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);

        let mut removed = 0usize;
        if self.dir.exists() {
            for entry in std::fs::read_dir(&self.dir)
                .with_context(|| format!("failed to read cache dir {}", self.dir.display()))?
            {
                let entry = entry?;
                if entry.path().extension().map(|e| e == "json").unwrap_or(false) {
                    std::fs::remove_file(entry.path())?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Occupancy plus the running hit/miss counters required by `stats_cache`.
    pub fn stats(&self) -> CacheStats {
        self.memory.run_pending_tasks();
        let memory_cache_size = self.memory.entry_count();
        let disk_entries = count_json_files(&self.dir);

        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let memory_hits = self.memory_hits.load(Ordering::Relaxed);
        let disk_hits = self.disk_hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate_pct = if total_requests == 0 {
            0.0
        } else {
            (memory_hits + disk_hits) as f64 / total_requests as f64 * 100.0
        };

        CacheStats {
            memory_cache_size,
            disk_entries,
            max_memory_size: self.max_memory_entries,
            total_requests,
            memory_hits,
            disk_hits,
            misses,
            hit_rate_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub memory_cache_size: u64,
    pub disk_entries: u64,
    pub max_memory_size: u64,
    pub total_requests: u64,
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
    pub hit_rate_pct: f64,
}

fn count_json_files(dir: &Path) -> u64 {
    std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter(|e| e.path().extension().map(|x| x == "json").unwrap_or(false))
                .count() as u64
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_changes_with_model_id() {
        let a = EmbeddingCacheKey::new("hello", "model-a");
        let b = EmbeddingCacheKey::new("hello", "model-b");
        assert_ne!(a, b);
    }

    #[test]
    fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path().to_path_buf(), 100);
        let key = EmbeddingCacheKey::new("hello world", "model-a");
        cache.put(&key, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(cache.get(&key), Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn disk_tier_survives_new_cache_instance() {
        let dir = tempfile::tempdir().unwrap();
        let key = EmbeddingCacheKey::new("persisted", "model-a");
        {
            let cache = EmbeddingCache::new(dir.path().to_path_buf(), 100);
            cache.put(&key, vec![0.5, 0.5]).unwrap();
        }
        let cache2 = EmbeddingCache::new(dir.path().to_path_buf(), 100);
        assert_eq!(cache2.get(&key), Some(vec![0.5, 0.5]));
    }

    #[test]
    fn clear_removes_disk_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path().to_path_buf(), 100);
        let key = EmbeddingCacheKey::new("x", "model-a");
        cache.put(&key, vec![1.0]).unwrap();
        let removed = cache.clear().unwrap();
        assert_eq!(removed, 1);
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn clear_resets_counters_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path().to_path_buf(), 100);
        let key = EmbeddingCacheKey::new("x", "model-a");
        cache.put(&key, vec![1.0]).unwrap();
        cache.get(&key);
        cache.clear().unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.memory_hits, 0);
        assert_eq!(stats.disk_hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.memory_cache_size, 0);
    }

    #[test]
    fn repeat_get_counts_one_miss_then_one_memory_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path().to_path_buf(), 100);
        let key = EmbeddingCacheKey::new("x", "model-a");

        assert_eq!(cache.get(&key), None);
        cache.put(&key, vec![1.0]).unwrap();
        assert_eq!(cache.get(&key), Some(vec![1.0]));

        let stats = cache.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.memory_hits + stats.disk_hits, 1);
    }
}
