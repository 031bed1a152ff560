//! 相似度原语
//!
//! 编辑距离（Levenshtein）与二元组重叠（Dice），均按 `char` 计算

use std::collections::HashMap;

use strsim::levenshtein;

/// 编辑距离：插入、删除、替换代价均为 1
pub fn edit_distance(a: &str, b: &str) -> usize {
    levenshtein(a, b)
}

/// 编辑相似度：`1 - 距离 / max(len_a, len_b, 1)`
///
/// 两个空串相似度为 1.0
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count()).max(1);
    1.0 - (edit_distance(a, b) as f64 / max_len as f64)
}

/// 二元组 Dice 系数
///
/// - 完全相同 → 1.0
/// - 任一方不足 2 个字符 → 0.0
/// - 否则 `2 * 共享二元组数 / (len_a - 1 + len_b - 1)`，共享数按多重集取最小计数
pub fn bigram_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.len() < 2 || b_chars.len() < 2 {
        return 0.0;
    }

    let mut a_bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a_chars.windows(2) {
        *a_bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut shared = 0usize;
    for pair in b_chars.windows(2) {
        // 每命中一次消耗一个计数，等价于按 bigram 取 min(count_a, count_b)
        if let Some(count) = a_bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    let total = (a_chars.len() - 1) + (b_chars.len() - 1);
    2.0 * shared as f64 / total as f64
}
