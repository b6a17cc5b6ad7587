use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::ParticipantEntry;
use crate::services::ParticipationLedger;
use crate::utils::RedemptionToken;

/// 扫码兑奖
///
/// - redeem: 校验后将 Won -> Redeemed，已兑奖时拒绝
/// - toggle_redeemed: 店员纠错用，无条件翻转状态
#[derive(Clone)]
pub struct RedemptionService {
    ledger: ParticipationLedger,
}

impl RedemptionService {
    pub fn new(ledger: ParticipationLedger) -> Self {
        Self { ledger }
    }

    /// 扫码预览：与 redeem 相同的校验，但不修改状态
    pub async fn inspect(
        &self,
        scanned_token: &str,
        acting_establishment_id: &str,
    ) -> AppResult<ParticipantEntry> {
        let token = Self::authorize(scanned_token, acting_establishment_id)?;
        let entry = self.load(&token).await?;
        if entry.redeemed {
            return Err(AppError::AlreadyRedeemed);
        }
        Ok(entry)
    }

    /// 兑奖
    ///
    /// 校验顺序: 载荷格式 -> 商户归属 -> 记录存在 -> 未兑奖
    pub async fn redeem(
        &self,
        scanned_token: &str,
        acting_establishment_id: &str,
    ) -> AppResult<ParticipantEntry> {
        let token = Self::authorize(scanned_token, acting_establishment_id)?;

        let _guard = self.ledger.locks().lock(&token.establishment_id).await;
        let entry = self.load(&token).await?;
        if entry.redeemed {
            return Err(AppError::AlreadyRedeemed);
        }
        let entry = self.ledger.set_redeemed_locked(entry, true).await?;

        log::info!(
            "Prize {} ({}) redeemed for participant {} at establishment {}",
            entry.prize_code,
            entry.prize_name,
            entry.id,
            entry.establishment_id
        );
        Ok(entry)
    }

    /// 店员纠错：翻转兑奖状态，不做兑奖校验
    pub async fn toggle_redeemed(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
    ) -> AppResult<ParticipantEntry> {
        let _guard = self.ledger.locks().lock(establishment_id).await;
        let entry = self
            .ledger
            .find(establishment_id, participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
        let target = !entry.redeemed;
        let entry = self.ledger.set_redeemed_locked(entry, target).await?;

        log::info!(
            "Participant {} redeemed state toggled to {} at establishment {}",
            entry.id,
            entry.redeemed,
            establishment_id
        );
        Ok(entry)
    }

    fn authorize(scanned_token: &str, acting_establishment_id: &str) -> AppResult<RedemptionToken> {
        let token: RedemptionToken = scanned_token.parse()?;
        if token.establishment_id != acting_establishment_id {
            log::warn!(
                "Establishment {} tried to use a prize code of establishment {}",
                acting_establishment_id,
                token.establishment_id
            );
            return Err(AppError::EstablishmentMismatch);
        }
        Ok(token)
    }

    async fn load(&self, token: &RedemptionToken) -> AppResult<ParticipantEntry> {
        self.ledger
            .find(&token.establishment_id, token.participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))
    }
}
