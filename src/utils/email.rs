use crate::error::{AppError, AppResult};
use regex::Regex;

/// 规范化邮箱（去空白、转小写）并校验格式，结果用作 OTP 的身份键
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email_regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let normalized = email.trim().to_ascii_lowercase();
    if normalized.len() > 254 || !email_regex.is_match(&normalized) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }

    Ok(normalized)
}
