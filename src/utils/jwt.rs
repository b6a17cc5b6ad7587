use crate::error::{AppError, AppResult};
use crate::utils::validate_establishment_id;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// 店员令牌声明，establishment_id 即当前操作所属商户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffClaims {
    pub sub: String, // staff user id
    pub establishment_id: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access"
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
        }
    }

    /// 令牌签发由账号系统负责，这里仅用于运维脚本与测试
    pub fn generate_access_token(&self, staff_id: &str, establishment_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expires_in);

        let claims = StaffClaims {
            sub: staff_id.to_string(),
            establishment_id: establishment_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: "access".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<StaffClaims> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<StaffClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)?;

        if claims.token_type != "access" {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }
        if validate_establishment_id(&claims.establishment_id).is_err() {
            return Err(AppError::AuthError(
                "Token is not bound to a valid establishment".to_string(),
            ));
        }

        Ok(claims)
    }
}
