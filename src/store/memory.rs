use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::{KeyValueStore, TTL_MISSING, TTL_PERSISTENT};
use crate::error::{AppError, AppResult};

/// 时间来源，测试中可替换为手动时钟
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动推进的时钟
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst))
            .unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// 进程内存储
///
/// 过期键在访问时惰性清除。所有操作都在同一把锁内完成，保证与 Redis 相同的单键原子性。
/// 重启后数据丢失。
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    fn live_entry<'a>(
        entries: &'a mut HashMap<String, Entry>,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<&'a mut Entry> {
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
            return None;
        }
        entries.get_mut(key)
    }

    fn expiry_from(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
        now + Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX / 1000))
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(Self::live_entry(&mut entries, key, now).map(|e| e.value.clone()))
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Self::expiry_from(now, ttl_seconds)),
            },
        );
        Ok(())
    }

    async fn increment(&self, key: &str) -> AppResult<i64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        match Self::live_entry(&mut entries, key, now) {
            Some(entry) => {
                let current: i64 = entry.value.parse().map_err(|_| {
                    AppError::InternalError(format!("Value at {key} is not an integer"))
                })?;
                let next = current + 1;
                entry.value = next.to_string();
                Ok(next)
            }
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: "1".to_string(),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn set_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<bool> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match Self::live_entry(&mut entries, key, now) {
            Some(entry) => {
                entry.expires_at = Some(Self::expiry_from(now, ttl_seconds));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn time_to_live(&self, key: &str) -> AppResult<i64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let ttl = match Self::live_entry(&mut entries, key, now) {
            None => TTL_MISSING,
            Some(Entry {
                expires_at: None, ..
            }) => TTL_PERSISTENT,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => (*at - now).num_seconds().max(0),
        };
        Ok(ttl)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_clock() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        (MemoryStore::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_set_and_get_until_expiry() {
        let (store, clock) = store_with_clock();
        store.set_with_expiry("otp:a@b.com", "123456", 60).await.unwrap();
        assert_eq!(
            store.get("otp:a@b.com").await.unwrap().as_deref(),
            Some("123456")
        );

        clock.advance(Duration::seconds(59));
        assert!(store.get("otp:a@b.com").await.unwrap().is_some());

        clock.advance(Duration::seconds(1));
        assert!(store.get("otp:a@b.com").await.unwrap().is_none());
        assert_eq!(store.time_to_live("otp:a@b.com").await.unwrap(), TTL_MISSING);
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let (store, clock) = store_with_clock();
        store.set_with_expiry("k", "old", 100).await.unwrap();
        clock.advance(Duration::seconds(90));
        store.set_with_expiry("k", "new", 100).await.unwrap();
        clock.advance(Duration::seconds(50));
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
        assert_eq!(store.time_to_live("k").await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_increment_keeps_expiry() {
        let (store, clock) = store_with_clock();
        assert_eq!(store.increment("count").await.unwrap(), 1);
        assert_eq!(store.time_to_live("count").await.unwrap(), TTL_PERSISTENT);

        assert!(store.set_expiry("count", 3600).await.unwrap());
        assert_eq!(store.increment("count").await.unwrap(), 2);
        assert_eq!(store.time_to_live("count").await.unwrap(), 3600);

        clock.advance(Duration::seconds(3600));
        assert_eq!(store.increment("count").await.unwrap(), 1);
        assert_eq!(store.time_to_live("count").await.unwrap(), TTL_PERSISTENT);
    }

    #[tokio::test]
    async fn test_increment_non_integer_fails() {
        let (store, _) = store_with_clock();
        store.set_with_expiry("k", "abc", 10).await.unwrap();
        assert!(store.increment("k").await.is_err());
    }

    #[tokio::test]
    async fn test_set_expiry_on_missing_key() {
        let (store, _) = store_with_clock();
        assert!(!store.set_expiry("missing", 10).await.unwrap());
        assert_eq!(store.time_to_live("missing").await.unwrap(), TTL_MISSING);
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _) = store_with_clock();
        store.set_with_expiry("k", "v", 10).await.unwrap();
        store.delete("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = MemoryStore::new();
        let mut tasks = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.increment("counter").await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(store.get("counter").await.unwrap().as_deref(), Some("50"));
    }
}
