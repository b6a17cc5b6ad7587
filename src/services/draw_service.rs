use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use crate::database::GameStore;
use crate::error::{AppError, AppResult};
use crate::models::{Identity, ParticipantEntry, Prize};
use crate::services::{ParticipationLedger, inventory, selector};
use crate::utils::{generate_prize_code, validate_establishment_id};

/// 生成奖品码的最大重试次数
const MAX_CODE_ATTEMPTS: usize = 10;

/// 一次抽奖的结果
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    /// 扣减后的奖品快照
    pub prize: Prize,
    pub entry: ParticipantEntry,
}

/// 抽奖流程：库存 -> 查重 -> 按权重抽取 -> 扣减并记账
#[derive(Clone)]
pub struct DrawService {
    store: Arc<dyn GameStore>,
    ledger: ParticipationLedger,
    code_length: usize,
}

impl DrawService {
    pub fn new(store: Arc<dyn GameStore>, ledger: ParticipationLedger, code_length: usize) -> Self {
        Self {
            store,
            ledger,
            code_length,
        }
    }

    pub async fn play(&self, establishment_id: &str, identity: Identity) -> AppResult<DrawOutcome> {
        let mut rng = StdRng::from_entropy();
        self.play_with(&mut rng, establishment_id, identity).await
    }

    /// 使用指定随机源抽奖
    ///
    /// 整个流程持有商户锁；扣减与参与记录由 commit_draw 一起落库。
    pub async fn play_with<R: Rng + Send>(
        &self,
        rng: &mut R,
        establishment_id: &str,
        identity: Identity,
    ) -> AppResult<DrawOutcome> {
        validate_establishment_id(establishment_id)?;
        let _guard = self.ledger.locks().lock(establishment_id).await;

        let prizes = self.store.list_prizes(establishment_id).await?;
        let available = inventory::list_available(&prizes);
        if available.is_empty() {
            return Err(AppError::NoPrizesAvailable);
        }

        if self
            .ledger
            .has_participated(establishment_id, &identity)
            .await?
        {
            return Err(AppError::DuplicateParticipation);
        }

        let selected = match selector::select(rng, &available) {
            Ok(prize) => prize,
            Err(e) => {
                log::warn!("No prize could be selected for establishment {establishment_id}: {e}");
                return Err(AppError::NoPrizesAvailable);
            }
        };

        let taken = inventory::decrement(selected)?;
        let prize_code = self.unique_prize_code(rng, establishment_id).await?;
        let entry = ParticipantEntry::new(&identity, selected, prize_code);

        self.ledger.record_draw_locked(&taken, &entry).await?;

        log::info!(
            "Participant {} won {} ({}) at establishment {}, {} left",
            entry.id,
            taken.name,
            entry.prize_code,
            establishment_id,
            taken.remaining_quantity
        );

        Ok(DrawOutcome {
            prize: taken,
            entry,
        })
    }

    async fn unique_prize_code<R: Rng + Send>(
        &self,
        rng: &mut R,
        establishment_id: &str,
    ) -> AppResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_prize_code(rng, self.code_length);
            if !self.store.prize_code_exists(establishment_id, &code).await? {
                return Ok(code);
            }
            log::debug!("Prize code collision at establishment {establishment_id}, retrying");
        }
        Err(AppError::InternalError(
            "Failed to generate a unique prize code".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{EstablishmentLocks, MemoryStore};
    use crate::models::ParticipantQuery;

    struct Fixture {
        store: Arc<MemoryStore>,
        ledger: ParticipationLedger,
        draws: DrawService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let ledger = ParticipationLedger::new(store.clone(), EstablishmentLocks::new());
        let draws = DrawService::new(store.clone(), ledger.clone(), 8);
        Fixture {
            store,
            ledger,
            draws,
        }
    }

    fn email(address: &str) -> Identity {
        Identity::new(Some(address), None).unwrap()
    }

    async fn seed(store: &MemoryStore, establishment_id: &str, name: &str, qty: i64, remaining: i64) -> Prize {
        let mut prize = Prize::new(establishment_id, name, qty, 1.0, 100).unwrap();
        prize.remaining_quantity = remaining;
        store.insert_prize(&prize).await.unwrap();
        prize
    }

    #[tokio::test]
    async fn test_last_unit_scenario() {
        let f = fixture();
        let p1 = seed(&f.store, "E1", "P1", 1, 1).await;
        seed(&f.store, "E1", "P2", 1, 0).await;

        let available = inventory::list_available(&f.store.list_prizes("E1").await.unwrap());
        assert_eq!(available.iter().map(|p| p.id).collect::<Vec<_>>(), vec![p1.id]);

        let outcome = f.draws.play("E1", email("a@x.com")).await.unwrap();
        assert_eq!(outcome.prize.id, p1.id);
        assert_eq!(outcome.prize.remaining_quantity, 0);
        assert_eq!(outcome.entry.prize_id, p1.id);
        assert_eq!(outcome.entry.prize_code.len(), 8);
        assert!(!outcome.entry.redeemed);

        let prizes = f.store.list_prizes("E1").await.unwrap();
        assert!(inventory::list_available(&prizes).is_empty());

        let err = f.draws.play("E1", email("b@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::NoPrizesAvailable));
    }

    #[tokio::test]
    async fn test_second_play_same_identity_is_rejected() {
        let f = fixture();
        seed(&f.store, "E1", "Coffee", 10, 10).await;

        f.draws.play("E1", email("a@x.com")).await.unwrap();
        let err = f.draws.play("E1", email("A@X.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateParticipation));

        // 拒绝时不扣减库存
        let prize = &f.store.list_prizes("E1").await.unwrap()[0];
        assert_eq!(prize.remaining_quantity, 9);
    }

    #[tokio::test]
    async fn test_empty_establishment_reports_no_prizes_before_duplicate() {
        let f = fixture();
        let err = f.draws.play("E1", email("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::NoPrizesAvailable));
    }

    #[tokio::test]
    async fn test_stock_never_goes_negative() {
        let f = fixture();
        seed(&f.store, "E1", "A", 3, 3).await;
        seed(&f.store, "E1", "B", 2, 2).await;
        let mut rng = StdRng::seed_from_u64(7);

        let mut wins = 0;
        for i in 0..12 {
            match f.draws.play_with(&mut rng, "E1", email(&format!("p{i}@x.com"))).await {
                Ok(_) => wins += 1,
                Err(AppError::NoPrizesAvailable) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(wins, 5);

        let prizes = f.store.list_prizes("E1").await.unwrap();
        assert!(prizes.iter().all(|p| p.remaining_quantity == 0));
        let entries = f.store.list_participants("E1").await.unwrap();
        assert_eq!(entries.len(), 5);
        for prize in &prizes {
            let won = entries.iter().filter(|e| e.prize_id == prize.id).count() as i64;
            assert_eq!(won, prize.distributed());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_plays_for_last_unit() {
        let f = fixture();
        seed(&f.store, "E1", "Last", 1, 1).await;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let draws = f.draws.clone();
                tokio::spawn(async move { draws.play("E1", email(&format!("p{i}@x.com"))).await })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(e) => assert!(matches!(e, AppError::NoPrizesAvailable)),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(f.store.list_prizes("E1").await.unwrap()[0].remaining_quantity, 0);
        assert_eq!(f.store.list_participants("E1").await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_plays_same_identity() {
        let f = fixture();
        seed(&f.store, "E1", "Coffee", 50, 50).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let draws = f.draws.clone();
                tokio::spawn(async move { draws.play("E1", email("same@x.com")).await })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(e) => assert!(matches!(e, AppError::DuplicateParticipation)),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(f.store.list_prizes("E1").await.unwrap()[0].remaining_quantity, 49);
    }

    #[tokio::test]
    async fn test_establishments_are_isolated() {
        let f = fixture();
        seed(&f.store, "E1", "Coffee", 1, 1).await;
        seed(&f.store, "E2", "Tea", 1, 1).await;

        f.draws.play("E1", email("a@x.com")).await.unwrap();
        let outcome = f.draws.play("E2", email("a@x.com")).await.unwrap();
        assert_eq!(outcome.prize.name, "Tea");

        let page = f
            .ledger
            .list("E2", &ParticipantQuery { page: None, per_page: None })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_oversized_establishment_id_is_rejected() {
        let f = fixture();
        let long_id = "E".repeat(65);
        let err = f.draws.play(&long_id, email("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
