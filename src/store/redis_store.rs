use std::future::Future;
use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, RedisResult};
use tokio::time::timeout;

use super::KeyValueStore;
use crate::error::{AppError, AppResult};

/// Redis 存储，每次调用都带超时；任何失败都报告为 `StoreUnavailable`
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    pub async fn connect(url: &str, op_timeout: Duration) -> AppResult<Self> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(op_timeout)
            .set_response_timeout(op_timeout);

        let client = Client::open(url)?;
        let conn = timeout(op_timeout, client.get_connection_manager_with_config(config))
            .await
            .map_err(|_| AppError::StoreUnavailable("redis connect timeout".to_string()))?
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

        Ok(Self {
            conn,
            timeout: op_timeout,
        })
    }

    async fn bounded<T>(&self, op: impl Future<Output = RedisResult<T>>) -> AppResult<T> {
        match timeout(self.timeout, op).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(AppError::StoreUnavailable(e.to_string())),
            Err(_) => Err(AppError::StoreUnavailable("redis timeout".to_string())),
        }
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        self.bounded(conn.set_ex::<_, _, ()>(key, value, ttl_seconds))
            .await
    }

    async fn increment(&self, key: &str) -> AppResult<i64> {
        let mut conn = self.conn.clone();
        self.bounded(conn.incr::<_, _, i64>(key, 1_i64)).await
    }

    async fn set_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let seconds = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        self.bounded(conn.expire::<_, bool>(key, seconds)).await
    }

    async fn time_to_live(&self, key: &str) -> AppResult<i64> {
        let mut conn = self.conn.clone();
        self.bounded(conn.ttl::<_, i64>(key)).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        self.bounded(conn.del::<_, ()>(key)).await
    }
}
