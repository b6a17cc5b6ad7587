use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Identity, ParticipantEntry, Prize};

/// 奖品 / 参与记录存储，所有查询都按商户划分
///
/// `commit_draw` 与 `delete_participant` 必须原子完成：库存变动与参与记录要么都落库，要么都不落库。
#[async_trait]
pub trait GameStore: Send + Sync {
    /// 商户全部奖品，按创建顺序
    async fn list_prizes(&self, establishment_id: &str) -> AppResult<Vec<Prize>>;

    async fn find_prize(&self, establishment_id: &str, prize_id: Uuid)
    -> AppResult<Option<Prize>>;

    async fn insert_prize(&self, prize: &Prize) -> AppResult<()>;

    /// 店员修改奖品（含 quantity / remaining_quantity），不存在时返回 NotFound
    async fn update_prize(&self, prize: &Prize) -> AppResult<()>;

    async fn delete_prize(&self, establishment_id: &str, prize_id: Uuid) -> AppResult<bool>;

    /// 商户全部参与记录，按参与时间倒序
    async fn list_participants(&self, establishment_id: &str) -> AppResult<Vec<ParticipantEntry>>;

    /// 分页参与记录（倒序）与总数
    async fn page_participants(
        &self,
        establishment_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<ParticipantEntry>, u64)>;

    async fn find_participant(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
    ) -> AppResult<Option<ParticipantEntry>>;

    /// 邮箱或手机号任一匹配的记录
    async fn find_by_identity(
        &self,
        establishment_id: &str,
        identity: &Identity,
    ) -> AppResult<Option<ParticipantEntry>>;

    async fn prize_code_exists(&self, establishment_id: &str, prize_code: &str) -> AppResult<bool>;

    /// 仅写参与记录，身份重复时返回 DuplicateParticipation
    async fn insert_participant(&self, entry: &ParticipantEntry) -> AppResult<()>;

    /// 原子提交一次抽奖：`prize` 为扣减后的奖品快照，存储中的剩余数量必须恰好比它多 1，
    /// 否则返回 InventoryError；同时写入 `entry`。
    async fn commit_draw(&self, prize: &Prize, entry: &ParticipantEntry) -> AppResult<()>;

    /// 写回兑奖状态，不存在时返回 NotFound
    async fn update_redemption(&self, entry: &ParticipantEntry) -> AppResult<()>;

    /// 删除参与记录并把对应奖品库存加回 1（奖品仍存在时）
    async fn delete_participant(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
    ) -> AppResult<Option<ParticipantEntry>>;
}
