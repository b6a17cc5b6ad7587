//! 按权重抽取奖品
//!
//! 各权重先除以最大权重归一化，total = Σ 归一化权重，r 在 [0, total) 内均匀取值，
//! 按输入顺序依次减去各奖品权重，第一个使 r <= 0 的奖品中奖。
//! 输入顺序只影响浮点边界情况，因此必须固定。

use rand::Rng;

use crate::error::{AppError, AppResult};
use crate::models::Prize;

/// 从候选奖品中抽取一个，返回候选集中的引用
///
/// 权重非正（或非有限数）的奖品视为未启用，不参与抽取；
/// 候选为空或有效总权重为 0 时返回 SelectionError。
pub fn select<'a, R: Rng>(rng: &mut R, candidates: &'a [Prize]) -> AppResult<&'a Prize> {
    if candidates.is_empty() {
        return Err(AppError::SelectionError("No candidate prizes".into()));
    }

    let max_weight = candidates
        .iter()
        .filter(|p| p.is_active())
        .map(|p| p.weight)
        .fold(0.0_f64, f64::max);
    if max_weight <= 0.0 {
        return Err(AppError::SelectionError(
            "Total weight of candidate prizes is zero".into(),
        ));
    }

    // 归一化后总和在 [1, 候选数] 之间，极大权重相加也不会溢出为 inf
    let total_weight: f64 = candidates
        .iter()
        .filter(|p| p.is_active())
        .map(|p| p.weight / max_weight)
        .sum();

    let mut r = rng.gen_range(0.0..total_weight);
    let mut last_active = None;
    for prize in candidates.iter().filter(|p| p.is_active()) {
        r -= prize.weight / max_weight;
        if r <= 0.0 {
            return Ok(prize);
        }
        last_active = Some(prize);
    }

    // 浮点累计误差导致未命中时归最后一个有效奖品
    last_active.ok_or_else(|| AppError::SelectionError("No active candidate prizes".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn prize(name: &str, weight: f64) -> Prize {
        let mut p = Prize::new("E1", name, 100, 1.0, 0).unwrap();
        p.weight = weight;
        p
    }

    #[test]
    fn test_select_always_returns_a_candidate() {
        let mut rng = StdRng::seed_from_u64(1);
        let candidates = vec![prize("A", 0.5), prize("B", 7.0), prize("C", 2.25)];
        for _ in 0..1_000 {
            let winner = select(&mut rng, &candidates).unwrap();
            assert!(candidates.iter().any(|c| std::ptr::eq(c, winner)));
        }
    }

    #[test]
    fn test_single_candidate_always_wins() {
        let mut rng = StdRng::seed_from_u64(2);
        let candidates = vec![prize("P1", 1.0)];
        for _ in 0..100 {
            assert_eq!(select(&mut rng, &candidates).unwrap().name, "P1");
        }
    }

    #[test]
    fn test_weights_one_to_three_converge() {
        let mut rng = StdRng::seed_from_u64(20_240_601);
        let candidates = vec![prize("A", 1.0), prize("B", 3.0)];
        let draws = 20_000;
        let wins_a = (0..draws)
            .filter(|_| select(&mut rng, &candidates).unwrap().name == "A")
            .count();
        let ratio_a = wins_a as f64 / draws as f64;
        assert!((ratio_a - 0.25).abs() < 0.02, "ratio for A was {ratio_a}");
    }

    #[test]
    fn test_empty_candidates_fail() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = select(&mut rng, &[]).unwrap_err();
        assert!(matches!(err, AppError::SelectionError(_)));
    }

    #[test]
    fn test_zero_total_weight_fails() {
        let mut rng = StdRng::seed_from_u64(4);
        let candidates = vec![prize("A", 0.0), prize("B", 0.0)];
        let err = select(&mut rng, &candidates).unwrap_err();
        assert!(matches!(err, AppError::SelectionError(_)));
    }

    #[test]
    fn test_zero_weight_candidate_is_never_picked() {
        let mut rng = StdRng::seed_from_u64(5);
        let candidates = vec![prize("Off", 0.0), prize("On", 1.0), prize("Neg", -3.0)];
        for _ in 0..500 {
            assert_eq!(select(&mut rng, &candidates).unwrap().name, "On");
        }
    }

    #[test]
    fn test_huge_weights_do_not_overflow() {
        let mut rng = StdRng::seed_from_u64(6);
        let candidates = vec![prize("A", 1e308), prize("B", 1e308), prize("C", f64::MAX)];
        let mut seen = [0usize; 3];
        for _ in 0..3_000 {
            let winner = select(&mut rng, &candidates).unwrap();
            let idx = candidates.iter().position(|c| std::ptr::eq(c, winner)).unwrap();
            seen[idx] += 1;
        }
        assert!(seen.iter().all(|&n| n > 0), "{seen:?}");
    }

    #[test]
    fn test_tiny_weights_still_select() {
        let mut rng = StdRng::seed_from_u64(8);
        let candidates = vec![prize("A", f64::MIN_POSITIVE), prize("B", 5e-324)];
        for _ in 0..100 {
            assert!(select(&mut rng, &candidates).is_ok());
        }
    }
}
