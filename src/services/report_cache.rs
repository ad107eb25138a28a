use std::collections::HashMap;
use std::sync::RwLock;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, FixedOffset};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::task::TaskRecord;

const FIELD_SEPARATOR: &[u8] = &[0x1f];
const RECORD_SEPARATOR: &[u8] = &[0x1e];

/// Computations whose results are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOperation {
    Report,
    PeriodAnalysis,
}

impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheOperation::Report => "report",
            CacheOperation::PeriodAnalysis => "period",
        }
    }
}

/// Content fingerprint of a record collection plus the parameters of the
/// computation. Records with the same length but different content hash
/// differently.
pub fn fingerprint(records: &[TaskRecord], context: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((records.len() as u64).to_le_bytes());
    for record in records {
        hasher.update(record.id.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(record.title.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(record.description.as_deref().unwrap_or_default().as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update([u8::from(record.completed)]);
        hasher.update(record.create_time.to_rfc3339().as_bytes());
        hasher.update(FIELD_SEPARATOR);
        if let Some(updated) = record.update_time {
            hasher.update(updated.to_rfc3339().as_bytes());
        }
        hasher.update(RECORD_SEPARATOR);
    }
    hasher.update(context.as_bytes());
    STANDARD_NO_PAD.encode(hasher.finalize())
}

/// Cache identity constructed from operation + fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    operation: CacheOperation,
    fingerprint: String,
}

impl CacheKey {
    pub fn new(operation: CacheOperation, fingerprint: impl Into<String>) -> Self {
        Self {
            operation,
            fingerprint: fingerprint.into(),
        }
    }

    pub fn operation(&self) -> CacheOperation {
        self.operation
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.operation.as_str(), self.fingerprint)
    }
}

impl From<&CacheKey> for String {
    fn from(value: &CacheKey) -> Self {
        value.cache_key()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when `now + ttl` lies beyond the representable range.
    expires_at: Option<DateTime<FixedOffset>>,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: DateTime<FixedOffset>) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Key → (value, expiry) map. Stale entries are dropped when a lookup finds
/// them; nothing sweeps in the background.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &CacheKey, now: DateTime<FixedOffset>) -> Option<V> {
        let cache_key = key.cache_key();
        let expires_at = {
            let guard = self.entries.read().ok()?;
            let entry = guard.get(&cache_key)?;
            if entry.is_fresh(now) {
                debug!(
                    target: "app::analytics::cache",
                    operation = key.operation().as_str(),
                    "cache hit"
                );
                return Some(entry.value.clone());
            }
            entry.expires_at
        };

        if let Ok(mut guard) = self.entries.write() {
            // Another caller may have refreshed the entry in between.
            if guard
                .get(&cache_key)
                .map_or(false, |entry| !entry.is_fresh(now))
            {
                guard.remove(&cache_key);
                debug!(
                    target: "app::analytics::cache",
                    operation = key.operation().as_str(),
                    expired_at = ?expires_at,
                    "evicted stale cache entry"
                );
            }
        }
        None
    }

    /// Stores `value` until `now + ttl` and returns that expiry, or `None`
    /// when the entry never expires.
    pub fn insert(
        &self,
        key: &CacheKey,
        value: V,
        now: DateTime<FixedOffset>,
    ) -> Option<DateTime<FixedOffset>> {
        let expires_at = now.checked_add_signed(self.ttl);
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(key.cache_key(), CacheEntry { value, expires_at });
            debug!(
                target: "app::analytics::cache",
                operation = key.operation().as_str(),
                expires_at = ?expires_at,
                "cached analytics result"
            );
        }
        expires_at
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.entries.write() {
            guard.clear();
        }
    }

    /// Entry count, including stale entries not yet looked up.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
