//! 兑奖二维码载荷
//!
//! 格式: `kadeeo:prize:{establishment_id}:{participant_id}`，UTF-8 文本，
//! 直接作为二维码内容。前两段为固定字面量，用于识别本系统的兑奖码，
//! 避免误处理扫描到的其它内容。

use crate::error::AppError;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const TOKEN_NAMESPACE: &str = "kadeeo";
pub const TOKEN_KIND: &str = "prize";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionToken {
    pub establishment_id: String,
    pub participant_id: Uuid,
}

impl RedemptionToken {
    pub fn new(establishment_id: impl Into<String>, participant_id: Uuid) -> Self {
        Self {
            establishment_id: establishment_id.into(),
            participant_id,
        }
    }
}

impl fmt::Display for RedemptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{TOKEN_NAMESPACE}:{TOKEN_KIND}:{}:{}",
            self.establishment_id, self.participant_id
        )
    }
}

impl FromStr for RedemptionToken {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split(':').collect();
        let [namespace, kind, establishment_id, participant_id] = fields.as_slice() else {
            return Err(AppError::MalformedToken(format!(
                "expected 4 fields, got {}",
                fields.len()
            )));
        };

        if *namespace != TOKEN_NAMESPACE || *kind != TOKEN_KIND {
            return Err(AppError::MalformedToken(
                "not a prize redemption code".to_string(),
            ));
        }
        if establishment_id.is_empty() {
            return Err(AppError::MalformedToken(
                "missing establishment id".to_string(),
            ));
        }
        let participant_id = Uuid::parse_str(participant_id)
            .map_err(|_| AppError::MalformedToken("invalid participant id".to_string()))?;

        Ok(Self {
            establishment_id: establishment_id.to_string(),
            participant_id,
        })
    }
}
