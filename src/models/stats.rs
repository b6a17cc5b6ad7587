use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{ParticipantEntry, Prize};

/// 商户统计（后台仪表盘 / 成本测算）
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EstablishmentStats {
    /// 奖品种类数
    pub prize_types: u64,
    /// 累计投放数量
    pub total_units: i64,
    /// 剩余数量
    pub remaining_units: i64,
    /// 已被抽中数量
    pub distributed_units: i64,
    /// 参与人数
    pub participants: u64,
    /// 已兑奖人数
    pub redeemed: u64,
    /// 兑奖率 (0-100)
    pub redemption_rate: f64,
    /// 全部奖品成本(分)
    pub total_cost_cents: i64,
    /// 已抽中奖品成本(分)
    pub distributed_cost_cents: i64,
}

impl EstablishmentStats {
    pub fn compute(prizes: &[Prize], entries: &[ParticipantEntry]) -> Self {
        let participants = entries.len() as u64;
        let redeemed = entries.iter().filter(|e| e.redeemed).count() as u64;
        let redemption_rate = if participants == 0 {
            0.0
        } else {
            redeemed as f64 * 100.0 / participants as f64
        };

        EstablishmentStats {
            prize_types: prizes.len() as u64,
            total_units: saturating_sum(prizes.iter().map(|p| p.quantity)),
            remaining_units: saturating_sum(prizes.iter().map(|p| p.remaining_quantity)),
            distributed_units: saturating_sum(prizes.iter().map(Prize::distributed)),
            participants,
            redeemed,
            redemption_rate,
            total_cost_cents: saturating_sum(
                prizes.iter().map(|p| p.cost_cents.saturating_mul(p.quantity)),
            ),
            distributed_cost_cents: saturating_sum(
                prizes.iter().map(|p| p.cost_cents.saturating_mul(p.distributed())),
            ),
        }
    }
}

/// 累加结果封顶于 i64::MAX
fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    fn prize(quantity: i64, remaining: i64, cost_cents: i64) -> Prize {
        let mut prize = Prize::new("E1", "Coffee", 1, 1.0, 0).unwrap();
        prize.quantity = quantity;
        prize.remaining_quantity = remaining;
        prize.cost_cents = cost_cents;
        prize
    }

    #[test]
    fn test_compute_totals() {
        let coffee = prize(3, 1, 200);
        let tea = prize(2, 2, 50);
        let identity = Identity::new(Some("a@x.com"), None).unwrap();
        let mut won = ParticipantEntry::new(&identity, &coffee, "ABCD1234".into());
        won.set_redeemed(true, chrono::Utc::now());
        let other = Identity::new(Some("b@x.com"), None).unwrap();
        let pending = ParticipantEntry::new(&other, &coffee, "EFGH5678".into());

        let stats = EstablishmentStats::compute(&[coffee, tea], &[won, pending]);
        assert_eq!(stats.prize_types, 2);
        assert_eq!(stats.total_units, 5);
        assert_eq!(stats.remaining_units, 3);
        assert_eq!(stats.distributed_units, 2);
        assert_eq!(stats.redemption_rate, 50.0);
        assert_eq!(stats.total_cost_cents, 700);
        assert_eq!(stats.distributed_cost_cents, 400);
    }

    #[test]
    fn test_compute_saturates_on_unvalidated_rows() {
        let huge = prize(i64::MAX / 2, 0, 10);
        let more = prize(i64::MAX / 2, i64::MAX / 2, 10);
        let stats = EstablishmentStats::compute(&[huge.clone(), more, huge], &[]);

        assert_eq!(stats.total_units, i64::MAX);
        assert_eq!(stats.total_cost_cents, i64::MAX);
        assert_eq!(stats.distributed_cost_cents, i64::MAX);
        assert_eq!(stats.redemption_rate, 0.0);
    }
}
