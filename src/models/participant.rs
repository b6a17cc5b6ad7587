use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::participant_entity;
use crate::error::{AppError, AppResult};
use crate::models::{PaginatedResponse, Prize, WonPrize};
use crate::utils::{RedemptionToken, normalize_email, normalize_phone};

/// 参与者身份（邮箱 / 手机号，至少其一）
///
/// 邮箱已转小写，手机号已去掉排版字符，比较时直接相等即可。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    email: Option<String>,
    phone: Option<String>,
}

impl Identity {
    pub fn new(email: Option<&str>, phone: Option<&str>) -> AppResult<Self> {
        let email = email
            .filter(|e| !e.trim().is_empty())
            .map(normalize_email)
            .transpose()?;
        let phone = phone
            .filter(|p| !p.trim().is_empty())
            .map(normalize_phone)
            .transpose()?;

        if email.is_none() && phone.is_none() {
            return Err(AppError::ValidationError(
                "An email or a phone number is required".to_string(),
            ));
        }
        Ok(Self { email, phone })
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// 邮箱或手机号任一相同即视为同一人
    pub fn matches(&self, other: &Identity) -> bool {
        let same_email = matches!((&self.email, &other.email), (Some(a), Some(b)) if a == b);
        let same_phone = matches!((&self.phone, &other.phone), (Some(a), Some(b)) if a == b);
        same_email || same_phone
    }
}

/// 参与记录（一次抽奖结果 + 兑奖状态）
///
/// redeemed_at 仅在 redeemed 为 true 时存在，只能通过 [`ParticipantEntry::set_redeemed`] 修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParticipantEntry {
    pub id: Uuid,
    pub establishment_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub participated_at: DateTime<Utc>,
    pub prize_id: Uuid,
    pub prize_name: String,
    pub prize_code: String,
    pub redeemed: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl ParticipantEntry {
    pub fn new(identity: &Identity, prize: &Prize, prize_code: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            establishment_id: prize.establishment_id.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
            participated_at: Utc::now(),
            prize_id: prize.id,
            prize_name: prize.name.clone(),
            prize_code,
            redeemed: false,
            redeemed_at: None,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn set_redeemed(&mut self, redeemed: bool, now: DateTime<Utc>) {
        self.redeemed = redeemed;
        self.redeemed_at = redeemed.then_some(now);
    }

    /// 二维码载荷
    pub fn redemption_token(&self) -> RedemptionToken {
        RedemptionToken::new(self.establishment_id.clone(), self.id)
    }
}

impl From<participant_entity::Model> for ParticipantEntry {
    fn from(m: participant_entity::Model) -> Self {
        ParticipantEntry {
            id: m.id,
            establishment_id: m.establishment_id,
            email: m.email,
            phone: m.phone,
            participated_at: m.participated_at,
            prize_id: m.prize_id,
            prize_name: m.prize_name,
            prize_code: m.prize_code,
            redeemed: m.redeemed,
            redeemed_at: if m.redeemed { m.redeemed_at } else { None },
        }
    }
}

/// 抽奖请求（公开接口）
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PlayRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// 抽奖响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayResponse {
    /// 获得的奖品
    pub prize: WonPrize,
    /// 参与记录（含奖品码）
    pub entry: ParticipantEntry,
    /// 二维码载荷
    pub token: String,
}

/// 扫码 / 兑奖请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RedeemRequest {
    pub token: String,
}

/// 二维码载荷响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedemptionTokenResponse {
    pub token: String,
}

/// 参与记录查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ParticipantQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}

pub type ParticipantPageResponse = PaginatedResponse<ParticipantEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_requires_email_or_phone() {
        assert!(Identity::new(None, None).is_err());
        assert!(Identity::new(Some("  "), Some("")).is_err());
        assert!(Identity::new(Some("a@x.com"), None).is_ok());
        assert!(Identity::new(None, Some("0612345678")).is_ok());
    }

    #[test]
    fn test_identity_match_policy() {
        let a = Identity::new(Some("A@X.com"), Some("0611111111")).unwrap();
        let same_email = Identity::new(Some("a@x.COM"), Some("0622222222")).unwrap();
        let same_phone = Identity::new(Some("b@x.com"), Some("06 11 11 11 11")).unwrap();
        let stranger = Identity::new(Some("c@x.com"), Some("0633333333")).unwrap();
        let email_only = Identity::new(Some("d@x.com"), None).unwrap();
        let phone_only = Identity::new(None, Some("0644444444")).unwrap();

        assert!(a.matches(&same_email));
        assert!(a.matches(&same_phone));
        assert!(!a.matches(&stranger));
        assert!(!email_only.matches(&phone_only));
    }

    #[test]
    fn test_set_redeemed_keeps_timestamp_in_sync() {
        let prize = Prize::new("est-1", "Coffee", 1, 1.0, 0).unwrap();
        let identity = Identity::new(Some("a@x.com"), None).unwrap();
        let mut entry = ParticipantEntry::new(&identity, &prize, "ABCD1234".into());
        assert!(!entry.redeemed);
        assert!(entry.redeemed_at.is_none());

        let now = Utc::now();
        entry.set_redeemed(true, now);
        assert_eq!(entry.redeemed_at, Some(now));

        entry.set_redeemed(false, now);
        assert!(entry.redeemed_at.is_none());
    }

    #[test]
    fn test_redemption_token_points_at_entry() {
        let prize = Prize::new("est-1", "Coffee", 1, 1.0, 0).unwrap();
        let identity = Identity::new(None, Some("0612345678")).unwrap();
        let entry = ParticipantEntry::new(&identity, &prize, "ABCD1234".into());
        assert_eq!(
            entry.redemption_token().to_string(),
            format!("kadeeo:prize:est-1:{}", entry.id)
        );
    }
}
