//! 发音评估级联
//!
//! 输入 STT 转录与标准答案（原文 + 罗马字），按固定优先级逐级判定，首个命中即返回。
//!
//! ## 判定顺序
//! 1. 空转录 → `none`
//! 2. 原文包含（统一鼻化符号）→ `exact_hindi`
//! 3. 罗马字小写精确/包含 → `exact_roman`
//! 4. 音译表精确查表 → `transliteration`
//! 5. 规范化后精确/包含 → `phonetic_norm`
//! 6. Double Metaphone 音码 + 编辑相似度下限 → `metaphone`
//! 7. 编辑相似度 → `fuzzy_levenshtein`
//! 8. 二元组 Dice 相似度 → `dice_similarity`
//! 9. 单词局部 Dice → `partial_word`
//! 10. 以上均未命中 → `no_match`

mod engine;
mod normalizer;
mod phonetic;
mod policy;
mod similarity;
mod transliteration;
mod types;

pub use engine::Evaluator;
pub use normalizer::{NativeScript, Normalizer};
pub use phonetic::{PhoneticCodes, PhoneticEncoder};
pub use policy::{CascadeOptions, Thresholds};
pub use similarity::{bigram_similarity, edit_distance, edit_similarity};
pub use transliteration::TransliterationTable;
pub use types::{EvaluationInput, EvaluationResult, EvaluationTrace, MatchType, StageRecord};
