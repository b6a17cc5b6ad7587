use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::prize_entity;
use crate::error::{AppError, AppResult};
use crate::utils::validate_establishment_id;

/// 单个奖品的投放上限
pub const MAX_PRIZE_QUANTITY: i64 = 1_000_000;
/// 单件成本上限(分)
pub const MAX_PRIZE_COST_CENTS: i64 = 100_000_000;
/// 权重上限（相对值）
pub const MAX_PRIZE_WEIGHT: f64 = 1_000_000.0;

/// 商户配置的奖品
///
/// - quantity: 累计投放数量
/// - remaining_quantity: 尚未被抽中的数量，始终满足 0 <= remaining_quantity <= quantity
/// - weight: 抽中权重，> 0 才参与抽奖
/// - cost_cents: 单件成本(分)，仅用于统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Prize {
    pub id: Uuid,
    pub establishment_id: String,
    pub name: String,
    pub quantity: i64,
    pub remaining_quantity: i64,
    pub weight: f64,
    pub cost_cents: i64,
}

impl Prize {
    /// 新建奖品，剩余数量等于投放数量
    pub fn new(
        establishment_id: &str,
        name: &str,
        quantity: i64,
        weight: f64,
        cost_cents: i64,
    ) -> AppResult<Self> {
        let prize = Self {
            id: Uuid::new_v4(),
            establishment_id: establishment_id.to_string(),
            name: name.trim().to_string(),
            quantity,
            remaining_quantity: quantity,
            weight,
            cost_cents,
        };
        prize.validate()?;
        Ok(prize)
    }

    pub fn validate(&self) -> AppResult<()> {
        validate_establishment_id(&self.establishment_id)?;
        if self.name.is_empty() {
            return Err(AppError::ValidationError("Prize name is required".into()));
        }
        if !(0..=MAX_PRIZE_QUANTITY).contains(&self.quantity) {
            return Err(AppError::ValidationError(format!(
                "Quantity must be between 0 and {MAX_PRIZE_QUANTITY}"
            )));
        }
        if self.remaining_quantity < 0 || self.remaining_quantity > self.quantity {
            return Err(AppError::ValidationError(
                "Remaining quantity must be between 0 and quantity".into(),
            ));
        }
        if !self.is_active() || self.weight > MAX_PRIZE_WEIGHT {
            return Err(AppError::ValidationError(format!(
                "Weight must be a positive number up to {MAX_PRIZE_WEIGHT}"
            )));
        }
        if !(0..=MAX_PRIZE_COST_CENTS).contains(&self.cost_cents) {
            return Err(AppError::ValidationError(format!(
                "Cost must be between 0 and {MAX_PRIZE_COST_CENTS} cents"
            )));
        }
        Ok(())
    }

    /// 是否还有库存
    pub fn is_available(&self) -> bool {
        self.remaining_quantity > 0
    }

    /// 权重为正的奖品才参与抽奖
    pub fn is_active(&self) -> bool {
        self.weight.is_finite() && self.weight > 0.0
    }

    /// 已被抽中的数量
    pub fn distributed(&self) -> i64 {
        self.quantity.saturating_sub(self.remaining_quantity)
    }

    /// 调整投放数量，已抽中的数量保持不变
    pub fn with_quantity(&self, quantity: i64) -> AppResult<Self> {
        let distributed = self.distributed();
        if quantity < distributed {
            return Err(AppError::ValidationError(format!(
                "Quantity cannot be lower than the {distributed} units already won"
            )));
        }
        Ok(Self {
            quantity,
            remaining_quantity: quantity - distributed,
            ..self.clone()
        })
    }
}

impl From<prize_entity::Model> for Prize {
    fn from(m: prize_entity::Model) -> Self {
        Prize {
            id: m.id,
            establishment_id: m.establishment_id,
            name: m.name,
            quantity: m.quantity,
            remaining_quantity: m.remaining_quantity,
            weight: m.weight,
            cost_cents: m.cost_cents,
        }
    }
}

/// 新建奖品请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreatePrizeRequest {
    pub name: String,
    pub quantity: i64,
    /// 权重 (默认 1)
    pub weight: Option<f64>,
    /// 单件成本(分)，默认 0
    pub cost_cents: Option<i64>,
}

/// 修改奖品请求（未提供的字段保持不变）
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdatePrizeRequest {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub weight: Option<f64>,
    pub cost_cents: Option<i64>,
}

/// 游戏页展示的奖品（不暴露库存与成本）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicPrizeResponse {
    pub id: Uuid,
    pub name: String,
    /// 当前中奖概率 (0-100)
    pub chance_percent: f64,
}

/// 抽奖后返回给顾客的奖品
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WonPrize {
    pub id: Uuid,
    pub name: String,
}

impl From<&Prize> for WonPrize {
    fn from(p: &Prize) -> Self {
        WonPrize {
            id: p.id,
            name: p.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_prize_starts_full() {
        let prize = Prize::new("est-1", " Coffee ", 10, 2.0, 150).unwrap();
        assert_eq!(prize.name, "Coffee");
        assert_eq!(prize.remaining_quantity, 10);
        assert_eq!(prize.distributed(), 0);
        assert!(prize.is_available());
    }

    #[test]
    fn test_new_prize_validation() {
        assert!(Prize::new("est-1", "", 1, 1.0, 0).is_err());
        assert!(Prize::new("est-1", "Cake", -1, 1.0, 0).is_err());
        assert!(Prize::new("est-1", "Cake", 1, 0.0, 0).is_err());
        assert!(Prize::new("est-1", "Cake", 1, f64::NAN, 0).is_err());
        assert!(Prize::new("est-1", "Cake", 1, 1.0, -5).is_err());
        assert!(Prize::new("", "Cake", 1, 1.0, 0).is_err());
    }

    #[test]
    fn test_new_prize_upper_bounds() {
        assert!(Prize::new("est-1", "Cake", MAX_PRIZE_QUANTITY, MAX_PRIZE_WEIGHT, MAX_PRIZE_COST_CENTS).is_ok());
        assert!(Prize::new("est-1", "Cake", i64::MAX / 2, 1.0, 10).is_err());
        assert!(Prize::new("est-1", "Cake", 1, 1e308, 0).is_err());
        assert!(Prize::new("est-1", "Cake", 1, 1.0, MAX_PRIZE_COST_CENTS + 1).is_err());
        assert!(Prize::new(&"E".repeat(65), "Cake", 1, 1.0, 0).is_err());
    }

    #[test]
    fn test_with_quantity_keeps_distributed_units() {
        let mut prize = Prize::new("est-1", "Cake", 5, 1.0, 0).unwrap();
        prize.remaining_quantity = 2;

        let grown = prize.with_quantity(8).unwrap();
        assert_eq!(grown.remaining_quantity, 5);
        assert_eq!(grown.distributed(), 3);

        let shrunk = prize.with_quantity(3).unwrap();
        assert_eq!(shrunk.remaining_quantity, 0);

        assert!(prize.with_quantity(2).is_err());
    }
}
