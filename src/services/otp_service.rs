use crate::error::{AppError, AppResult};
use crate::store::{KeyValueStore, StoreHandle, TTL_MISSING, TTL_PERSISTENT};
use crate::utils::generate_six_digit_code;

/// OTP 发放与校验参数
#[derive(Debug, Clone, Copy)]
pub struct OtpPolicy {
    /// 验证码有效期（秒）
    pub code_ttl_secs: u64,
    /// 限流窗口长度（秒）
    pub window_secs: u64,
    /// 每个窗口内允许发放的次数
    pub max_per_window: i64,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            code_ttl_secs: 3600,
            window_secs: 3600,
            max_per_window: 3,
        }
    }
}

fn otp_key(email: &str) -> String {
    format!("otp:{email}")
}

fn count_key(email: &str) -> String {
    format!("otp_count:{email}")
}

/// 邮箱一次性验证码
///
/// 每个邮箱同一时间至多一个有效验证码，重新发放会覆盖旧码；校验成功即删除。
/// 存储不可用时，发放路径放行（不限流直接生成），校验路径拒绝（返回 false）。
///
/// 限流是“先查后增”，并发请求可能同时通过检查，属于已知的软上限。
#[derive(Clone)]
pub struct OtpService<S = StoreHandle> {
    store: S,
    policy: OtpPolicy,
}

impl<S: KeyValueStore> OtpService<S> {
    pub fn new(store: S, policy: OtpPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> OtpPolicy {
        self.policy
    }

    /// 发放验证码，返回给调用方投递
    pub async fn request_otp(&self, email: &str) -> AppResult<String> {
        match self.issue(email).await {
            Ok(code) => Ok(code),
            Err(AppError::StoreUnavailable(e)) => {
                log::warn!("OTP store error for {email}, issuing without rate limit: {e}");
                Ok(generate_six_digit_code())
            }
            Err(e) => Err(e),
        }
    }

    async fn issue(&self, email: &str) -> AppResult<String> {
        let count_key = count_key(email);

        let mut issued = match self.store.get(&count_key).await? {
            Some(raw) => match raw.parse::<i64>() {
                Ok(count) => Some(count),
                Err(_) => {
                    // 计数器损坏时重置，重新开窗而不是跳过限流
                    log::warn!("Corrupt OTP counter for {email}: {raw:?}, resetting window");
                    self.store.delete(&count_key).await?;
                    None
                }
            },
            None => None,
        };

        if let Some(count) = issued
            && count >= self.policy.max_per_window
        {
            match self.store.time_to_live(&count_key).await? {
                // 读计数和查 TTL 之间窗口刚好过期
                TTL_MISSING => issued = None,
                TTL_PERSISTENT => {
                    // 计数器丢了过期时间会永久锁死该邮箱，补上窗口
                    self.store
                        .set_expiry(&count_key, self.policy.window_secs)
                        .await?;
                    return Err(AppError::RateLimited {
                        retry_after_minutes: self.policy.window_secs as i64 / 60,
                    });
                }
                ttl => {
                    return Err(AppError::RateLimited {
                        retry_after_minutes: ttl.max(0) / 60,
                    });
                }
            }
        }

        let code = generate_six_digit_code();
        self.store
            .set_with_expiry(&otp_key(email), &code, self.policy.code_ttl_secs)
            .await?;

        self.store.increment(&count_key).await?;
        if issued.is_none() {
            self.store
                .set_expiry(&count_key, self.policy.window_secs)
                .await?;
        }

        log::debug!("Issued OTP for {email}");
        Ok(code)
    }

    /// 校验验证码；匹配即消费，不匹配保留以便在有效期内重试
    pub async fn verify_otp(&self, email: &str, submitted: &str) -> bool {
        match self.check_and_consume(email, submitted).await {
            Ok(valid) => valid,
            Err(e) => {
                log::warn!("OTP store error while verifying {email}, rejecting: {e}");
                false
            }
        }
    }

    async fn check_and_consume(&self, email: &str, submitted: &str) -> AppResult<bool> {
        let key = otp_key(email);

        let Some(saved) = self.store.get(&key).await? else {
            log::info!("No live OTP for {email}");
            return Ok(false);
        };

        // TODO: 改为常量时间比较
        if saved.trim() != submitted.trim() {
            log::info!("OTP mismatch for {email}");
            return Ok(false);
        }

        self.store.delete(&key).await?;
        log::info!("OTP verified for {email}");
        Ok(true)
    }
}
