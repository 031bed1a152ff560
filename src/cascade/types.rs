//! 级联评估类型定义

use serde::{Deserialize, Serialize};

/// 命中规则标签
///
/// 声明顺序即级联优先级：靠前的规则命中后，后面的规则不再执行
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// 空转录（无语音）
    None,
    /// 天城文原文包含匹配
    ExactHindi,
    /// 罗马字精确/包含匹配
    ExactRoman,
    /// 音译表查表匹配
    Transliteration,
    /// 规范化后匹配
    PhoneticNorm,
    /// Double Metaphone 编码 + 编辑相似度下限
    Metaphone,
    /// 编辑距离相似度
    FuzzyLevenshtein,
    /// 二元组 Dice 相似度
    DiceSimilarity,
    /// 单词局部匹配（转录含多余词）
    PartialWord,
    /// 无规则命中
    NoMatch,
}

impl MatchType {
    /// 是否为通过标签
    pub fn is_pass(&self) -> bool {
        !matches!(self, MatchType::None | MatchType::NoMatch)
    }

    /// 序列化后的标签名
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::None => "none",
            MatchType::ExactHindi => "exact_hindi",
            MatchType::ExactRoman => "exact_roman",
            MatchType::Transliteration => "transliteration",
            MatchType::PhoneticNorm => "phonetic_norm",
            MatchType::Metaphone => "metaphone",
            MatchType::FuzzyLevenshtein => "fuzzy_levenshtein",
            MatchType::DiceSimilarity => "dice_similarity",
            MatchType::PartialWord => "partial_word",
            MatchType::NoMatch => "no_match",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单次评估输入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationInput {
    /// 待判定的 STT 转录文本
    pub transcript: String,
    /// 标准罗马字答案
    pub expected_answer: String,
    /// 标准原文答案（可为空）
    #[serde(default, alias = "expectedHindi")]
    pub expected_native: String,
}

impl EvaluationInput {
    pub fn new(
        transcript: impl Into<String>,
        expected_answer: impl Into<String>,
        expected_native: impl Into<String>,
    ) -> Self {
        Self {
            transcript: transcript.into(),
            expected_answer: expected_answer.into(),
            expected_native: expected_native.into(),
        }
    }
}

/// 评估结果（扁平结构，直接作为响应体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub is_correct: bool,
    /// 置信度 [0.0, 1.0]
    pub confidence: f64,
    /// 展示文案
    pub feedback: String,
    pub match_type: MatchType,
}

impl EvaluationResult {
    /// 通过结果
    pub fn pass(match_type: MatchType, confidence: f64, feedback: impl Into<String>) -> Self {
        Self {
            is_correct: true,
            confidence,
            feedback: feedback.into(),
            match_type,
        }
    }

    /// 未通过结果
    pub fn fail(match_type: MatchType, confidence: f64, feedback: impl Into<String>) -> Self {
        Self {
            is_correct: false,
            confidence,
            feedback: feedback.into(),
            match_type,
        }
    }

    /// 检查结果自身是否满足约束
    ///
    /// - 置信度在 [0, 1] 内
    /// - `is_correct` 与标签一致
    pub fn is_well_formed(&self) -> bool {
        self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
            && self.is_correct == self.match_type.is_pass()
    }
}

/// 级联中一个阶段的记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub stage: MatchType,
    pub passed: bool,
    /// 该阶段计算出的分值（无分值的阶段为 None）
    pub score: Option<f64>,
}

/// 评估过程追踪（诊断用）
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationTrace {
    /// 规范化后的转录
    pub normalized_transcript: String,
    /// 规范化后的答案
    pub normalized_expected: String,
    /// 按执行顺序记录的阶段
    pub stages: Vec<StageRecord>,
    /// 处理耗时（微秒）
    pub elapsed_us: u64,
}

impl EvaluationTrace {
    pub(crate) fn record(&mut self, stage: MatchType, passed: bool, score: Option<f64>) {
        self.stages.push(StageRecord {
            stage,
            passed,
            score,
        });
    }

    /// 实际执行过的阶段
    pub fn stages_reached(&self) -> Vec<MatchType> {
        self.stages.iter().map(|s| s.stage).collect()
    }
}
