use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::{EstablishmentLocks, GameStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    Identity, PaginatedResponse, PaginationParams, ParticipantEntry, ParticipantPageResponse,
    ParticipantQuery, Prize,
};

/// 参与记录账本
///
/// 同一商户内每个身份只能参与一次；所有写操作都在商户锁内执行。
/// 以 `_locked` 结尾的方法要求调用方已经持有该商户的锁。
#[derive(Clone)]
pub struct ParticipationLedger {
    store: Arc<dyn GameStore>,
    locks: EstablishmentLocks,
}

impl ParticipationLedger {
    pub fn new(store: Arc<dyn GameStore>, locks: EstablishmentLocks) -> Self {
        Self { store, locks }
    }

    pub fn locks(&self) -> &EstablishmentLocks {
        &self.locks
    }

    /// 邮箱（不区分大小写）或手机号任一匹配即视为已参与
    pub async fn has_participated(
        &self,
        establishment_id: &str,
        identity: &Identity,
    ) -> AppResult<bool> {
        Ok(self
            .store
            .find_by_identity(establishment_id, identity)
            .await?
            .is_some())
    }

    /// 写入一条参与记录（查重与写入在同一把锁内）
    pub async fn record(&self, entry: ParticipantEntry) -> AppResult<ParticipantEntry> {
        let _guard = self.locks.lock(&entry.establishment_id).await;
        if self
            .has_participated(&entry.establishment_id, &entry.identity())
            .await?
        {
            return Err(AppError::DuplicateParticipation);
        }
        self.store.insert_participant(&entry).await?;
        Ok(entry)
    }

    /// 抽奖提交：扣减后的奖品与参与记录一起原子落库
    pub(crate) async fn record_draw_locked(
        &self,
        prize: &Prize,
        entry: &ParticipantEntry,
    ) -> AppResult<()> {
        self.store.commit_draw(prize, entry).await
    }

    pub async fn find(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
    ) -> AppResult<Option<ParticipantEntry>> {
        self.store
            .find_participant(establishment_id, participant_id)
            .await
    }

    pub async fn set_redeemed(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
        redeemed: bool,
    ) -> AppResult<ParticipantEntry> {
        let _guard = self.locks.lock(establishment_id).await;
        let entry = self
            .find(establishment_id, participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
        self.set_redeemed_locked(entry, redeemed).await
    }

    /// 状态未变化时不写库，保留原有 redeemed_at
    pub(crate) async fn set_redeemed_locked(
        &self,
        mut entry: ParticipantEntry,
        redeemed: bool,
    ) -> AppResult<ParticipantEntry> {
        if entry.redeemed == redeemed {
            return Ok(entry);
        }
        entry.set_redeemed(redeemed, Utc::now());
        self.store.update_redemption(&entry).await?;
        Ok(entry)
    }

    /// 管理员删除参与记录，对应奖品库存加回 1
    pub async fn remove(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
    ) -> AppResult<ParticipantEntry> {
        let _guard = self.locks.lock(establishment_id).await;
        let removed = self
            .store
            .delete_participant(establishment_id, participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
        log::info!(
            "Participant {} removed from establishment {}, prize {} restocked",
            removed.id,
            establishment_id,
            removed.prize_id
        );
        Ok(removed)
    }

    /// 分页获取参与记录（倒序）
    pub async fn list(
        &self,
        establishment_id: &str,
        query: &ParticipantQuery,
    ) -> AppResult<ParticipantPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);
        let (items, total) = self
            .store
            .page_participants(establishment_id, params.get_offset(), params.get_limit())
            .await?;
        Ok(PaginatedResponse::new(items, &params, total))
    }
}
