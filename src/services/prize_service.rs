use std::sync::Arc;
use uuid::Uuid;

use crate::database::{EstablishmentLocks, GameStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreatePrizeRequest, EstablishmentStats, Prize, PublicPrizeResponse, UpdatePrizeRequest,
};
use crate::services::inventory;
use crate::utils::validate_establishment_id;

/// 商户奖品管理
#[derive(Clone)]
pub struct PrizeService {
    store: Arc<dyn GameStore>,
    locks: EstablishmentLocks,
}

impl PrizeService {
    pub fn new(store: Arc<dyn GameStore>, locks: EstablishmentLocks) -> Self {
        Self { store, locks }
    }

    pub async fn list_prizes(&self, establishment_id: &str) -> AppResult<Vec<Prize>> {
        self.store.list_prizes(establishment_id).await
    }

    /// 游戏页奖品列表：仅展示有库存且启用的奖品及其中奖概率
    pub async fn public_board(&self, establishment_id: &str) -> AppResult<Vec<PublicPrizeResponse>> {
        validate_establishment_id(establishment_id)?;
        let prizes = self.store.list_prizes(establishment_id).await?;
        let available: Vec<Prize> = inventory::list_available(&prizes)
            .into_iter()
            .filter(Prize::is_active)
            .collect();
        let total: f64 = available.iter().map(|p| p.weight).sum();

        Ok(available
            .iter()
            .map(|p| PublicPrizeResponse {
                id: p.id,
                name: p.name.clone(),
                chance_percent: if total > 0.0 {
                    (p.weight / total * 10000.0).round() / 100.0
                } else {
                    0.0
                },
            })
            .collect())
    }

    pub async fn create_prize(
        &self,
        establishment_id: &str,
        request: CreatePrizeRequest,
    ) -> AppResult<Prize> {
        let prize = Prize::new(
            establishment_id,
            &request.name,
            request.quantity,
            request.weight.unwrap_or(1.0),
            request.cost_cents.unwrap_or(0),
        )?;

        let _guard = self.locks.lock(establishment_id).await;
        self.store.insert_prize(&prize).await?;

        log::info!(
            "Prize {} ({}) created at establishment {} with {} units",
            prize.id,
            prize.name,
            establishment_id,
            prize.quantity
        );
        Ok(prize)
    }

    /// 修改奖品，调整数量时已抽中的件数保持不变
    pub async fn update_prize(
        &self,
        establishment_id: &str,
        prize_id: Uuid,
        request: UpdatePrizeRequest,
    ) -> AppResult<Prize> {
        let _guard = self.locks.lock(establishment_id).await;
        let current = self.find_locked(establishment_id, prize_id).await?;

        let mut updated = match request.quantity {
            Some(quantity) => current.with_quantity(quantity)?,
            None => current,
        };
        if let Some(name) = request.name {
            updated.name = name.trim().to_string();
        }
        if let Some(weight) = request.weight {
            updated.weight = weight;
        }
        if let Some(cost_cents) = request.cost_cents {
            updated.cost_cents = cost_cents;
        }
        updated.validate()?;

        self.store.update_prize(&updated).await?;
        log::info!(
            "Prize {} updated at establishment {}: {}/{} left",
            updated.id,
            establishment_id,
            updated.remaining_quantity,
            updated.quantity
        );
        Ok(updated)
    }

    /// 删除奖品；已有人抽中的奖品不可删除
    pub async fn delete_prize(&self, establishment_id: &str, prize_id: Uuid) -> AppResult<()> {
        let _guard = self.locks.lock(establishment_id).await;
        let current = self.find_locked(establishment_id, prize_id).await?;
        if current.distributed() > 0 {
            return Err(AppError::ValidationError(format!(
                "{} units of this prize have already been won",
                current.distributed()
            )));
        }

        if !self.store.delete_prize(establishment_id, prize_id).await? {
            return Err(AppError::NotFound("Prize not found".to_string()));
        }
        log::info!("Prize {prize_id} deleted at establishment {establishment_id}");
        Ok(())
    }

    pub async fn stats(&self, establishment_id: &str) -> AppResult<EstablishmentStats> {
        let prizes = self.store.list_prizes(establishment_id).await?;
        let entries = self.store.list_participants(establishment_id).await?;
        Ok(EstablishmentStats::compute(&prizes, &entries))
    }

    async fn find_locked(&self, establishment_id: &str, prize_id: Uuid) -> AppResult<Prize> {
        self.store
            .find_prize(establishment_id, prize_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Prize not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::Identity;
    use crate::services::{DrawService, ParticipationLedger, RedemptionService};

    struct Fixture {
        prizes: PrizeService,
        draws: DrawService,
        gate: RedemptionService,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
        let locks = EstablishmentLocks::new();
        let ledger = ParticipationLedger::new(store.clone(), locks.clone());
        Fixture {
            prizes: PrizeService::new(store.clone(), locks),
            draws: DrawService::new(store, ledger.clone(), 8),
            gate: RedemptionService::new(ledger),
        }
    }

    fn create(name: &str, quantity: i64, weight: f64, cost_cents: i64) -> CreatePrizeRequest {
        CreatePrizeRequest {
            name: name.to_string(),
            quantity,
            weight: Some(weight),
            cost_cents: Some(cost_cents),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let f = fixture();
        let prize = f.prizes.create_prize("E1", create("Coffee", 5, 2.0, 150)).await.unwrap();
        assert_eq!(prize.remaining_quantity, 5);

        let listed = f.prizes.list_prizes("E1").await.unwrap();
        assert_eq!(listed, vec![prize]);
        assert!(f.prizes.list_prizes("E2").await.unwrap().is_empty());

        let err = f.prizes.create_prize("E1", create("Bad", 5, 0.0, 0)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_public_board_chances() {
        let f = fixture();
        f.prizes.create_prize("E1", create("A", 5, 1.0, 0)).await.unwrap();
        f.prizes.create_prize("E1", create("B", 5, 3.0, 0)).await.unwrap();
        f.prizes.create_prize("E1", create("Empty", 0, 10.0, 0)).await.unwrap();

        let board = f.prizes.public_board("E1").await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].name, "A");
        assert_eq!(board[0].chance_percent, 25.0);
        assert_eq!(board[1].chance_percent, 75.0);
    }

    #[tokio::test]
    async fn test_update_quantity_keeps_won_units() {
        let f = fixture();
        let prize = f.prizes.create_prize("E1", create("Cake", 2, 1.0, 0)).await.unwrap();
        f.draws
            .play("E1", Identity::new(Some("a@x.com"), None).unwrap())
            .await
            .unwrap();

        let updated = f
            .prizes
            .update_prize(
                "E1",
                prize.id,
                UpdatePrizeRequest {
                    quantity: Some(4),
                    name: Some(" Big cake ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Big cake");
        assert_eq!(updated.quantity, 4);
        assert_eq!(updated.remaining_quantity, 3);

        let err = f
            .prizes
            .update_prize(
                "E1",
                prize.id,
                UpdatePrizeRequest {
                    quantity: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = f
            .prizes
            .update_prize("E2", prize.id, UpdatePrizeRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_rejected_once_won() {
        let f = fixture();
        let won = f.prizes.create_prize("E1", create("Won", 1, 1.0, 0)).await.unwrap();
        f.draws
            .play("E1", Identity::new(Some("a@x.com"), None).unwrap())
            .await
            .unwrap();
        let spare = f.prizes.create_prize("E1", create("Spare", 1, 1.0, 0)).await.unwrap();

        let err = f.prizes.delete_prize("E1", won.id).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        f.prizes.delete_prize("E1", spare.id).await.unwrap();
        let err = f.prizes.delete_prize("E1", spare.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stats_follow_draws_and_redemptions() {
        let f = fixture();
        f.prizes.create_prize("E1", create("Coffee", 3, 1.0, 200)).await.unwrap();

        let outcome = f
            .draws
            .play("E1", Identity::new(None, Some("0611111111")).unwrap())
            .await
            .unwrap();
        f.draws
            .play("E1", Identity::new(Some("b@x.com"), None).unwrap())
            .await
            .unwrap();
        let token = outcome.entry.redemption_token().to_string();
        f.gate.redeem(&token, "E1").await.unwrap();

        let stats = f.prizes.stats("E1").await.unwrap();
        assert_eq!(stats.total_units, 3);
        assert_eq!(stats.remaining_units, 1);
        assert_eq!(stats.distributed_units, 2);
        assert_eq!(stats.participants, 2);
        assert_eq!(stats.redeemed, 1);
        assert_eq!(stats.redemption_rate, 50.0);
        assert_eq!(stats.total_cost_cents, 600);
        assert_eq!(stats.distributed_cost_cents, 400);
    }

    #[tokio::test]
    async fn test_oversized_values_are_rejected() {
        let f = fixture();
        let err = f
            .prizes
            .create_prize("E1", create("Huge", i64::MAX / 2, 1.0, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = f.prizes.public_board(&"E".repeat(65)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(f.prizes.public_board(&"E".repeat(64)).await.unwrap().is_empty());
    }
}
