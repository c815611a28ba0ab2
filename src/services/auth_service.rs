use crate::error::{AppError, AppResult};
use crate::external::{EmailTransport, LogTransport};
use crate::models::*;
use crate::services::{OtpService, UserService};
use crate::store::{KeyValueStore, StoreHandle};
use crate::utils::*;

/// 邮箱验证码登录：仅对已注册账户发码，校验通过后签发带角色的访问令牌
#[derive(Clone)]
pub struct AuthService<T = LogTransport, S = StoreHandle> {
    user_service: UserService,
    otp_service: OtpService<S>,
    jwt_service: JwtService,
    mailer: T,
}

impl<T: EmailTransport, S: KeyValueStore> AuthService<T, S> {
    pub fn new(
        user_service: UserService,
        otp_service: OtpService<S>,
        jwt_service: JwtService,
        mailer: T,
    ) -> Self {
        Self {
            user_service,
            otp_service,
            jwt_service,
            mailer,
        }
    }

    pub async fn send_email_code(&self, email: &str) -> AppResult<SendOtpResponse> {
        let email = normalize_email(email)?;
        if self.user_service.find_by_email(&email).await?.is_none() {
            return Err(AppError::ValidationError("Account does not exist!".to_string()));
        }

        let code = self.otp_service.request_otp(&email).await?;

        let ttl = self.otp_service.policy().code_ttl_secs;
        let body = format!(
            "Your OTP is: {code}. It will expire in {} minutes.",
            ttl / 60
        );

        // 投递失败不影响已发放的验证码
        self.mailer
            .send(&email, "Your AgriCare OTP", &body)
            .await
            .map_err(|e| {
                log::error!("Failed to send OTP email to {email}: {e}");
                AppError::ExternalApiError(format!("Failed to send OTP email: {e}"))
            })?;

        Ok(SendOtpResponse { expires_in: ttl })
    }

    pub async fn verify_email_code(&self, email: &str, otp: &str) -> AppResult<AuthResponse> {
        let email = normalize_email(email)?;

        if !self.otp_service.verify_otp(&email, otp).await {
            return Err(AppError::AuthError("Invalid or expired OTP.".to_string()));
        }

        let user = self
            .user_service
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::AuthError("Account does not exist!".to_string()))?;

        let access_token = self.jwt_service.generate_access_token(&user)?;
        Ok(AuthResponse {
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: user.into(),
        })
    }
}
