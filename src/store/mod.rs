//! 键值存储抽象
//!
//! OTP 流程只依赖这里的六个单键原语；单键操作的原子性由具体存储保证
//! （Redis 命令本身，或进程内存储的互斥锁）。

pub mod handle;
pub mod memory;
pub mod redis_store;

use std::future::Future;

use crate::error::AppResult;

pub use handle::StoreHandle;
pub use memory::{Clock, ManualClock, MemoryStore, SystemClock};
pub use redis_store::RedisStore;

/// `time_to_live` 对不存在的键返回该值
pub const TTL_MISSING: i64 = -2;
/// `time_to_live` 对没有过期时间的键返回该值
pub const TTL_PERSISTENT: i64 = -1;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = AppResult<Option<String>>> + Send;

    /// 写入并设置过期时间，覆盖已有值与过期时间
    fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> impl Future<Output = AppResult<()>> + Send;

    /// 原子自增，键不存在时从 0 开始；保留原有过期时间
    fn increment(&self, key: &str) -> impl Future<Output = AppResult<i64>> + Send;

    /// 键存在时返回 true
    fn set_expiry(&self, key: &str, ttl_seconds: u64)
    -> impl Future<Output = AppResult<bool>> + Send;

    /// 剩余秒数；无过期时间为 [`TTL_PERSISTENT`]，键不存在为 [`TTL_MISSING`]
    fn time_to_live(&self, key: &str) -> impl Future<Output = AppResult<i64>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = AppResult<()>> + Send;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::KeyValueStore;
    use crate::error::{AppError, AppResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 所有操作都失败的存储，模拟后端不可达
    #[derive(Default)]
    pub struct UnavailableStore {
        pub calls: AtomicUsize,
    }

    impl UnavailableStore {
        fn fail<T>(&self) -> AppResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::StoreUnavailable("connection refused".to_string()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl KeyValueStore for UnavailableStore {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            self.fail()
        }

        async fn set_with_expiry(&self, _key: &str, _value: &str, _ttl: u64) -> AppResult<()> {
            self.fail()
        }

        async fn increment(&self, _key: &str) -> AppResult<i64> {
            self.fail()
        }

        async fn set_expiry(&self, _key: &str, _ttl: u64) -> AppResult<bool> {
            self.fail()
        }

        async fn time_to_live(&self, _key: &str) -> AppResult<i64> {
            self.fail()
        }

        async fn delete(&self, _key: &str) -> AppResult<()> {
            self.fail()
        }
    }
}
