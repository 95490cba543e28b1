//! 香农熵计算

/// 计算字符串的香农熵（单位 bit，按字节频率统计）
/// 值域为 [0.0, 8.0]：空串与单一字符为 0，256 种字节均匀分布为 8。
pub fn shannon_entropy(data: &str) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut freq = [0u32; 256];
    for b in data.bytes() {
        freq[b as usize] += 1;
    }

    let len = data.len() as f64;
    let mut entropy = 0.0;
    for &count in freq.iter() {
        if count > 0 {
            let p = count as f64 / len;
            entropy -= p * p.log2();
        }
    }
    entropy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        assert!((shannon_entropy("abab") - 1.0).abs() < 1e-9);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn random_looking_token_scores_high() {
        // 16 个互不相同的字符：log2(16) = 4.0
        assert!((shannon_entropy("a8Xk2pQz7Lm4Rt9W") - 4.0).abs() < 1e-9);
    }
}
