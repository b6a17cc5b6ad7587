use rand::Rng;

const PRIZE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 生成奖品码（大写字母 + 数字，便于顾客口述 / 手动输入）
pub fn generate_prize_code<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| PRIZE_CODE_ALPHABET[rng.gen_range(0..PRIZE_CODE_ALPHABET.len())] as char)
        .collect()
}
