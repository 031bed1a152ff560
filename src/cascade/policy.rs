//! 判定策略：各阶段阈值与置信度
//!
//! 这些数值是产品策略而非推导常量，全部可通过配置覆盖

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// 阈值与固定置信度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// 原文包含匹配的置信度
    #[serde(default = "default_exact_native_confidence")]
    pub exact_native_confidence: f64,
    /// 罗马字精确匹配的置信度
    #[serde(default = "default_exact_roman_confidence")]
    pub exact_roman_confidence: f64,
    /// 音译表匹配的置信度
    #[serde(default = "default_transliteration_confidence")]
    pub transliteration_confidence: f64,
    /// 规范化匹配的置信度
    #[serde(default = "default_phonetic_norm_confidence")]
    pub phonetic_norm_confidence: f64,
    /// 音码匹配的置信度
    #[serde(default = "default_metaphone_confidence")]
    pub metaphone_confidence: f64,
    /// 音码匹配要求的最低编辑相似度（抑制音码碰撞误判）
    #[serde(default = "default_metaphone_min_similarity")]
    pub metaphone_min_similarity: f64,
    /// 编辑相似度通过线
    #[serde(default = "default_levenshtein_pass")]
    pub levenshtein_pass: f64,
    /// Dice 相似度通过线
    #[serde(default = "default_dice_pass")]
    pub dice_pass: f64,
    /// 单词局部匹配通过线
    #[serde(default = "default_partial_word_pass")]
    pub partial_word_pass: f64,
    /// 未通过时 "差一点" 文案的分界
    #[serde(default = "default_near_miss")]
    pub near_miss: f64,
}

fn default_exact_native_confidence() -> f64 {
    1.0
}

fn default_exact_roman_confidence() -> f64 {
    0.98
}

fn default_transliteration_confidence() -> f64 {
    0.95
}

fn default_phonetic_norm_confidence() -> f64 {
    0.90
}

fn default_metaphone_confidence() -> f64 {
    0.85
}

fn default_metaphone_min_similarity() -> f64 {
    0.60
}

fn default_levenshtein_pass() -> f64 {
    0.75
}

fn default_dice_pass() -> f64 {
    0.70
}

fn default_partial_word_pass() -> f64 {
    0.80
}

fn default_near_miss() -> f64 {
    0.5
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            exact_native_confidence: default_exact_native_confidence(),
            exact_roman_confidence: default_exact_roman_confidence(),
            transliteration_confidence: default_transliteration_confidence(),
            phonetic_norm_confidence: default_phonetic_norm_confidence(),
            metaphone_confidence: default_metaphone_confidence(),
            metaphone_min_similarity: default_metaphone_min_similarity(),
            levenshtein_pass: default_levenshtein_pass(),
            dice_pass: default_dice_pass(),
            partial_word_pass: default_partial_word_pass(),
            near_miss: default_near_miss(),
        }
    }
}

impl Thresholds {
    /// 所有数值必须在 [0, 1] 内
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("exact_native_confidence", self.exact_native_confidence),
            ("exact_roman_confidence", self.exact_roman_confidence),
            ("transliteration_confidence", self.transliteration_confidence),
            ("phonetic_norm_confidence", self.phonetic_norm_confidence),
            ("metaphone_confidence", self.metaphone_confidence),
            ("metaphone_min_similarity", self.metaphone_min_similarity),
            ("levenshtein_pass", self.levenshtein_pass),
            ("dice_pass", self.dice_pass),
            ("partial_word_pass", self.partial_word_pass),
            ("near_miss", self.near_miss),
        ];

        for (name, value) in fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                anyhow::bail!("阈值 {} 超出 [0, 1] 范围: {}", name, value);
            }
        }

        Ok(())
    }
}

/// 级联开关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeOptions {
    /// 是否执行音码阶段
    #[serde(default = "default_phonetic_enabled")]
    pub phonetic_enabled: bool,
    /// 音码交叉比较是否补上 (备选, 主码) 组合
    #[serde(default)]
    pub symmetric_phonetic_match: bool,
}

fn default_phonetic_enabled() -> bool {
    true
}

impl Default for CascadeOptions {
    fn default() -> Self {
        Self {
            phonetic_enabled: default_phonetic_enabled(),
            symmetric_phonetic_match: false,
        }
    }
}
