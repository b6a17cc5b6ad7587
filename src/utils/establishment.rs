use crate::error::{AppError, AppResult};

/// 商户ID最大长度（与数据库列宽一致）
pub const MAX_ESTABLISHMENT_ID_LEN: usize = 64;

/// 商户ID不能为空，且不超过列宽
pub fn validate_establishment_id(establishment_id: &str) -> AppResult<()> {
    if establishment_id.is_empty() {
        return Err(AppError::ValidationError(
            "Establishment id is required".to_string(),
        ));
    }
    if establishment_id.chars().count() > MAX_ESTABLISHMENT_ID_LEN {
        return Err(AppError::ValidationError(format!(
            "Establishment id must be at most {MAX_ESTABLISHMENT_ID_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_establishment_id() {
        assert!(validate_establishment_id("E1").is_ok());
        assert!(validate_establishment_id(&"é".repeat(MAX_ESTABLISHMENT_ID_LEN)).is_ok());
        assert!(validate_establishment_id("").is_err());
        assert!(validate_establishment_id(&"x".repeat(MAX_ESTABLISHMENT_ID_LEN + 1)).is_err());
    }
}
