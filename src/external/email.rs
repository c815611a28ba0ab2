use std::future::Future;

use crate::config::EmailConfig;
use crate::error::AppResult;

/// 邮件投递接口
pub trait EmailTransport: Send + Sync {
    fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = AppResult<()>> + Send;
}

/// 只记日志的投递实现（不做真实发送）
#[derive(Clone)]
pub struct LogTransport {
    sender: String,
}

impl LogTransport {
    pub fn new(cfg: &EmailConfig) -> Self {
        let sender = if cfg.sender_address.is_empty() {
            cfg.sender_name.clone()
        } else {
            format!("{} <{}>", cfg.sender_name, cfg.sender_address)
        };
        Self { sender }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }
}

impl EmailTransport for LogTransport {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> AppResult<()> {
        log::info!(
            "Email queued: from={} to={} subject={:?} bytes={}",
            self.sender,
            recipient,
            subject,
            body.len()
        );
        log::debug!("Email body for {recipient}: {body}");
        Ok(())
    }
}
