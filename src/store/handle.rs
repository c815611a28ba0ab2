use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{KeyValueStore, MemoryStore, RedisStore};
use crate::config::RedisConfig;
use crate::error::{AppError, AppResult};

/// 进程级存储句柄
///
/// 首次观察到主存储失败后切换到进程内存储，并在进程生命周期内不再切回。
/// 触发切换的那次操作会直接在进程内存储上重做。
pub struct StoreHandle<P = RedisStore> {
    primary: Option<Arc<P>>,
    fallback: MemoryStore,
    degraded: Arc<AtomicBool>,
}

impl<P> Clone for StoreHandle<P> {
    fn clone(&self) -> Self {
        Self {
            primary: self.primary.clone(),
            fallback: self.fallback.clone(),
            degraded: self.degraded.clone(),
        }
    }
}

impl StoreHandle<RedisStore> {
    /// 按配置构建；未配置或连接失败时直接进入降级状态
    pub async fn from_config(config: &RedisConfig) -> Self {
        let Some(url) = config.url.as_deref() else {
            log::info!("No REDIS_URL configured, using in-memory store");
            return Self::in_memory(MemoryStore::new());
        };

        match RedisStore::connect(url, Duration::from_millis(config.timeout_ms)).await {
            Ok(redis) => {
                log::info!("Redis store connected");
                Self::with_primary(redis, MemoryStore::new())
            }
            Err(e) => {
                log::warn!(
                    "Redis unavailable, using in-memory store (OTPs won't persist across restarts): {e}"
                );
                Self::in_memory(MemoryStore::new())
            }
        }
    }
}

impl<P: KeyValueStore> StoreHandle<P> {
    pub fn with_primary(primary: P, fallback: MemoryStore) -> Self {
        Self {
            primary: Some(Arc::new(primary)),
            fallback,
            degraded: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn in_memory(fallback: MemoryStore) -> Self {
        Self {
            primary: None,
            fallback,
            degraded: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    fn active_primary(&self) -> Option<&P> {
        if self.is_degraded() {
            return None;
        }
        self.primary.as_deref()
    }

    fn degrade(&self, op: &str, err: &AppError) {
        if !self.degraded.swap(true, Ordering::SeqCst) {
            log::warn!("Redis {op} failed, switching to in-memory store: {err}");
        }
    }
}

impl<P: KeyValueStore> KeyValueStore for StoreHandle<P> {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        if let Some(primary) = self.active_primary() {
            match primary.get(key).await {
                Ok(v) => return Ok(v),
                Err(e) => self.degrade("get", &e),
            }
        }
        self.fallback.get(key).await
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        if let Some(primary) = self.active_primary() {
            match primary.set_with_expiry(key, value, ttl_seconds).await {
                Ok(()) => return Ok(()),
                Err(e) => self.degrade("setex", &e),
            }
        }
        self.fallback.set_with_expiry(key, value, ttl_seconds).await
    }

    async fn increment(&self, key: &str) -> AppResult<i64> {
        if let Some(primary) = self.active_primary() {
            match primary.increment(key).await {
                Ok(v) => return Ok(v),
                Err(e) => self.degrade("incr", &e),
            }
        }
        self.fallback.increment(key).await
    }

    async fn set_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<bool> {
        if let Some(primary) = self.active_primary() {
            match primary.set_expiry(key, ttl_seconds).await {
                Ok(v) => return Ok(v),
                Err(e) => self.degrade("expire", &e),
            }
        }
        self.fallback.set_expiry(key, ttl_seconds).await
    }

    async fn time_to_live(&self, key: &str) -> AppResult<i64> {
        if let Some(primary) = self.active_primary() {
            match primary.time_to_live(key).await {
                Ok(v) => return Ok(v),
                Err(e) => self.degrade("ttl", &e),
            }
        }
        self.fallback.time_to_live(key).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        if let Some(primary) = self.active_primary() {
            match primary.delete(key).await {
                Ok(()) => return Ok(()),
                Err(e) => self.degrade("del", &e),
            }
        }
        self.fallback.delete(key).await
    }
}
