use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?\d{6,15}$").unwrap());

/// 规范化邮箱: 去空白并转小写（邮箱去重不区分大小写）
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if !EMAIL_REGEX.is_match(&email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(email)
}

/// 规范化手机号: 去掉空格、点、横线、括号等排版字符，其余保持原样
pub fn normalize_phone(phone: &str) -> AppResult<String> {
    let phone: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '.' | '-' | '(' | ')'))
        .collect();
    if !PHONE_REGEX.is_match(&phone) {
        return Err(AppError::ValidationError("Invalid phone number".to_string()));
    }
    Ok(phone)
}
