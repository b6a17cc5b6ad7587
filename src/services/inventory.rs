//! 奖品库存

use crate::error::{AppError, AppResult};
use crate::models::Prize;

/// 仍有库存的奖品，保持输入顺序；全部抽完时返回空列表（不是错误）
pub fn list_available(prizes: &[Prize]) -> Vec<Prize> {
    prizes.iter().filter(|p| p.is_available()).cloned().collect()
}

/// 扣减一件库存，返回新的奖品快照
pub fn decrement(prize: &Prize) -> AppResult<Prize> {
    if prize.remaining_quantity <= 0 {
        return Err(AppError::InventoryError(format!(
            "Prize {} is out of stock",
            prize.id
        )));
    }
    Ok(Prize {
        remaining_quantity: prize.remaining_quantity - 1,
        ..prize.clone()
    })
}
