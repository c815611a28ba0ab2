use rand::Rng;

/// 验证码长度
pub const OTP_LENGTH: usize = 6;

/// 生成6位数字验证码（允许前导零）
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(0..=999_999u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_six_digit_code() {
        let code = generate_six_digit_code();
        assert_eq!(code.len(), OTP_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_many_codes_keep_length() {
        for _ in 0..1000 {
            assert_eq!(generate_six_digit_code().len(), OTP_LENGTH);
        }
    }
}
