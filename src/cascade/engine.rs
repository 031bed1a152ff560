//! 级联评估主引擎
//!
//! 组合规范化、音译表、音码、编辑距离、Dice 相似度，按固定优先级判定

use std::sync::Arc;
use std::time::Instant;

use crate::cascade::normalizer::{NativeScript, Normalizer};
use crate::cascade::phonetic::PhoneticEncoder;
use crate::cascade::policy::{CascadeOptions, Thresholds};
use crate::cascade::similarity::{bigram_similarity, edit_similarity};
use crate::cascade::transliteration::TransliterationTable;
use crate::cascade::types::{EvaluationInput, EvaluationResult, EvaluationTrace, MatchType};

const FEEDBACK_NO_SPEECH: &str = "We didn't catch anything. Tap the mic and try again.";
const FEEDBACK_NEAR_MISS: &str = "So close! Listen once more and try again.";
const FEEDBACK_RETRY: &str = "Not quite. Listen carefully and give it another try.";

/// 通过时的展示文案
fn pass_feedback(match_type: MatchType) -> &'static str {
    match match_type {
        MatchType::ExactHindi => "Perfect! Your pronunciation is spot on.",
        MatchType::ExactRoman => "Excellent! That's exactly right.",
        MatchType::Transliteration => "Great job! That's correct.",
        MatchType::PhoneticNorm => "Great! That sounds right.",
        MatchType::Metaphone => "Good! That sounds very close.",
        MatchType::FuzzyLevenshtein => "Good job! Almost perfect.",
        MatchType::DiceSimilarity => "Nice! Close enough to count.",
        MatchType::PartialWord => "Good! We heard the word in your answer.",
        MatchType::None | MatchType::NoMatch => FEEDBACK_RETRY,
    }
}

/// 级联评估器（无状态，可跨线程共享）
pub struct Evaluator {
    thresholds: Thresholds,
    options: CascadeOptions,
    normalizer: Normalizer,
    table: Arc<TransliterationTable>,
    /// 音码编码器（关闭音码阶段时为 None）
    phonetic: Option<PhoneticEncoder>,
}

impl Evaluator {
    /// 创建评估器
    ///
    /// # Arguments
    /// * `table` - 注入的音译表
    pub fn new(table: Arc<TransliterationTable>) -> Self {
        Self {
            thresholds: Thresholds::default(),
            options: CascadeOptions::default(),
            normalizer: Normalizer::default(),
            table,
            phonetic: Some(PhoneticEncoder::new()),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_options(mut self, options: CascadeOptions) -> Self {
        self.phonetic = if options.phonetic_enabled {
            Some(PhoneticEncoder::new())
        } else {
            None
        };
        self.options = options;
        self
    }

    pub fn with_script(mut self, script: NativeScript) -> Self {
        self.normalizer = Normalizer::new(script);
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn options(&self) -> &CascadeOptions {
        &self.options
    }

    pub fn table(&self) -> &TransliterationTable {
        &self.table
    }

    /// 评估一次发音
    ///
    /// 纯函数，不可失败：所有路径都返回合法结果
    pub fn evaluate(
        &self,
        transcript: &str,
        expected_answer: &str,
        expected_native: &str,
    ) -> EvaluationResult {
        self.evaluate_traced(transcript, expected_answer, expected_native)
            .0
    }

    pub fn evaluate_input(&self, input: &EvaluationInput) -> EvaluationResult {
        self.evaluate(
            &input.transcript,
            &input.expected_answer,
            &input.expected_native,
        )
    }

    /// 评估并返回阶段追踪
    pub fn evaluate_traced(
        &self,
        transcript: &str,
        expected_answer: &str,
        expected_native: &str,
    ) -> (EvaluationResult, EvaluationTrace) {
        let start = Instant::now();
        let mut trace = EvaluationTrace::default();

        let result = self.run_cascade(transcript, expected_answer, expected_native, &mut trace);

        trace.elapsed_us = start.elapsed().as_micros() as u64;
        tracing::debug!(
            "评估完成: match_type={}, confidence={:.3}, 阶段数={}, 耗时={}us",
            result.match_type,
            result.confidence,
            trace.stages.len(),
            trace.elapsed_us
        );

        (result, trace)
    }

    fn run_cascade(
        &self,
        transcript: &str,
        expected_answer: &str,
        expected_native: &str,
        trace: &mut EvaluationTrace,
    ) -> EvaluationResult {
        let t = &self.thresholds;

        // 1. 空转录
        if transcript.trim().is_empty() {
            trace.record(MatchType::None, false, None);
            return EvaluationResult::fail(MatchType::None, 0.0, FEEDBACK_NO_SPEECH);
        }

        // 2. 原文包含匹配（原始文本，仅统一鼻化符号）
        let expected_native = expected_native.trim();
        if !expected_native.is_empty() {
            let folded_transcript = self.normalizer.normalize_native(transcript);
            let folded_expected = self.normalizer.normalize_native(expected_native);
            let passed = folded_transcript.contains(&folded_expected);
            trace.record(MatchType::ExactHindi, passed, None);
            if passed {
                return self.pass(MatchType::ExactHindi, t.exact_native_confidence);
            }
        }

        // 3. 罗马字精确/包含匹配
        let transcript_lower = transcript.trim().to_lowercase();
        let expected_lower = expected_answer.trim().to_lowercase();
        let has_expected = !expected_lower.is_empty();
        let passed = has_expected
            && (transcript_lower == expected_lower || transcript_lower.contains(&expected_lower));
        trace.record(MatchType::ExactRoman, passed, None);
        if passed {
            return self.pass(MatchType::ExactRoman, t.exact_roman_confidence);
        }

        // 4. 音译表查表（原文逐字查表，不做模糊查找）
        let passed = has_expected
            && self
                .table
                .lookup(transcript.trim())
                .map(|roman| roman == expected_lower || roman.contains(&expected_lower))
                .unwrap_or(false);
        trace.record(MatchType::Transliteration, passed, None);
        if passed {
            return self.pass(MatchType::Transliteration, t.transliteration_confidence);
        }

        // 5. 规范化后匹配
        let normalized_transcript = self.normalizer.normalize(transcript);
        let normalized_expected = self.normalizer.normalize(expected_answer);
        trace.normalized_transcript = normalized_transcript.clone();
        trace.normalized_expected = normalized_expected.clone();

        // 答案规范化后为空（纯符号）时，后续相似度阶段无意义，直接判为未命中
        if normalized_expected.is_empty() {
            tracing::warn!("标准答案规范化后为空: {:?}", expected_answer);
            trace.record(MatchType::NoMatch, false, Some(0.0));
            return EvaluationResult::fail(MatchType::NoMatch, 0.0, FEEDBACK_RETRY);
        }

        let passed = normalized_transcript == normalized_expected
            || normalized_transcript.contains(&normalized_expected);
        trace.record(MatchType::PhoneticNorm, passed, None);
        if passed {
            return self.pass(MatchType::PhoneticNorm, t.phonetic_norm_confidence);
        }

        let edit_score = edit_similarity(&normalized_transcript, &normalized_expected);

        // 6. 音码匹配 + 编辑相似度下限
        if let Some(encoder) = &self.phonetic {
            let transcript_codes = encoder.codes(&normalized_transcript);
            let expected_codes = encoder.codes(&normalized_expected);
            let codes_match =
                transcript_codes.matches(&expected_codes, self.options.symmetric_phonetic_match);
            let passed = codes_match && edit_score >= t.metaphone_min_similarity;

            tracing::debug!(
                "音码比较: {:?} vs {:?}, codes_match={}, edit={:.3}",
                transcript_codes,
                expected_codes,
                codes_match,
                edit_score
            );
            trace.record(MatchType::Metaphone, passed, Some(edit_score));
            if passed {
                return self.pass(MatchType::Metaphone, t.metaphone_confidence);
            }
        }

        // 7. 编辑距离
        let passed = edit_score >= t.levenshtein_pass;
        trace.record(MatchType::FuzzyLevenshtein, passed, Some(edit_score));
        if passed {
            return self.pass(MatchType::FuzzyLevenshtein, edit_score);
        }

        // 8. Dice 相似度
        let dice_score = bigram_similarity(&normalized_transcript, &normalized_expected);
        let passed = dice_score >= t.dice_pass;
        trace.record(MatchType::DiceSimilarity, passed, Some(dice_score));
        if passed {
            return self.pass(MatchType::DiceSimilarity, dice_score);
        }

        // 9. 单词局部匹配：转录前后可能夹带语气词
        let partial = normalized_transcript
            .split_whitespace()
            .map(|word| bigram_similarity(word, &normalized_expected))
            .find(|score| *score >= t.partial_word_pass);
        trace.record(MatchType::PartialWord, partial.is_some(), partial);
        if let Some(score) = partial {
            return self.pass(MatchType::PartialWord, score);
        }

        // 10. 未命中：取两项兜底相似度的最大值
        let best = edit_score.max(dice_score);
        trace.record(MatchType::NoMatch, false, Some(best));
        let feedback = if best > t.near_miss {
            FEEDBACK_NEAR_MISS
        } else {
            FEEDBACK_RETRY
        };
        EvaluationResult::fail(MatchType::NoMatch, best, feedback)
    }

    fn pass(&self, match_type: MatchType, confidence: f64) -> EvaluationResult {
        EvaluationResult::pass(
            match_type,
            confidence.clamp(0.0, 1.0),
            pass_feedback(match_type),
        )
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(TransliterationTable::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_transcript() {
        let evaluator = Evaluator::default();

        let result = evaluator.evaluate("", "ka", "क");
        assert!(!result.is_correct);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.match_type, MatchType::None);

        let result = evaluator.evaluate("   \t", "ka", "");
        assert_eq!(result.match_type, MatchType::None);
    }

    #[test]
    fn test_exact_hindi() {
        let evaluator = Evaluator::default();

        let result = evaluator.evaluate("क", "ka", "क");
        assert!(result.is_correct);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.match_type, MatchType::ExactHindi);
    }

    #[test]
    fn test_exact_hindi_wins_over_everything() {
        let evaluator = Evaluator::default();

        // 罗马字字段完全不相关也不影响
        let result = evaluator.evaluate("अच्छा नमस्ते जी", "zzz", "नमस्ते");
        assert_eq!(result.match_type, MatchType::ExactHindi);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_exact_hindi_nasal_fold() {
        let evaluator = Evaluator::default();

        // 月点与随韵互通
        let result = evaluator.evaluate("हँस", "hans", "हंस");
        assert_eq!(result.match_type, MatchType::ExactHindi);
        let result = evaluator.evaluate("हंस", "hans", "हँस");
        assert_eq!(result.match_type, MatchType::ExactHindi);
    }

    #[test]
    fn test_exact_roman() {
        let evaluator = Evaluator::default();

        let result = evaluator.evaluate("ka", "ka", "");
        assert!(result.is_correct);
        assert_eq!(result.confidence, 0.98);
        assert_eq!(result.match_type, MatchType::ExactRoman);

        let result = evaluator.evaluate("  NAMASTE ", "namaste", "");
        assert_eq!(result.match_type, MatchType::ExactRoman);
    }

    #[test]
    fn test_exact_roman_substring_precedes_normalization() {
        let evaluator = Evaluator::default();

        // "kaa" 包含 "ka"，在规范化阶段之前已命中
        let result = evaluator.evaluate("kaa", "ka", "");
        assert_eq!(result.match_type, MatchType::ExactRoman);
        assert_eq!(result.confidence, 0.98);
    }

    #[test]
    fn test_precedence_exact_roman_over_fuzzy() {
        let evaluator = Evaluator::default();

        // 编辑相似度 0.875 也满足模糊规则，但精确规则优先
        let result = evaluator.evaluate("namastey", "namaste", "");
        assert_eq!(result.match_type, MatchType::ExactRoman);
        assert_eq!(result.confidence, 0.98);
    }

    #[test]
    fn test_transliteration() {
        let evaluator = Evaluator::default();

        // 未给出原文答案时，原文转录经音译表匹配
        let result = evaluator.evaluate("नमस्ते", "namaste", "");
        assert!(result.is_correct);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.match_type, MatchType::Transliteration);

        let result = evaluator.evaluate(" धन्यवाद ", "dhanyavaad", "");
        assert_eq!(result.match_type, MatchType::Transliteration);
    }

    #[test]
    fn test_transliteration_is_exact_lookup() {
        let table = Arc::new(TransliterationTable::from_entries([("नमस्ते", "namaste")]));
        let evaluator = Evaluator::new(table);

        // 表中无 "नमस्ते जी" 这一键
        let result = evaluator.evaluate("नमस्ते जी", "namaste", "");
        assert_ne!(result.match_type, MatchType::Transliteration);
    }

    #[test]
    fn test_injected_table() {
        let table = Arc::new(TransliterationTable::from_entries([("নমস্কার", "nomoshkar")]));
        let evaluator = Evaluator::new(table);

        let result = evaluator.evaluate("নমস্কার", "nomoshkar", "");
        assert_eq!(result.match_type, MatchType::Transliteration);
    }

    #[test]
    fn test_phonetic_norm() {
        let evaluator = Evaluator::default();

        let result = evaluator.evaluate("naamaste", "namaste", "");
        assert!(result.is_correct);
        assert_eq!(result.confidence, 0.90);
        assert_eq!(result.match_type, MatchType::PhoneticNorm);

        let result = evaluator.evaluate("Shhanti!", "shanti", "");
        assert_eq!(result.match_type, MatchType::PhoneticNorm);
    }

    #[test]
    fn test_metaphone() {
        let evaluator = Evaluator::default();

        // d/t 音码相同，编辑相似度 6/7 ≥ 0.6
        let result = evaluator.evaluate("namasde", "namaste", "");
        assert!(result.is_correct);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.match_type, MatchType::Metaphone);
    }

    #[test]
    fn test_metaphone_requires_similarity_floor() {
        let evaluator = Evaluator::default();

        // "nmst" 与 "namaste" 音码相同，但编辑相似度 4/7 < 0.6
        let (result, trace) = evaluator.evaluate_traced("nmst", "namaste", "");
        assert_ne!(result.match_type, MatchType::Metaphone);
        assert_eq!(result.match_type, MatchType::NoMatch);
        assert!(approx(result.confidence, 4.0 / 7.0));
        assert_eq!(result.feedback, FEEDBACK_NEAR_MISS);
        assert!(trace
            .stages
            .iter()
            .any(|s| s.stage == MatchType::Metaphone && !s.passed));
    }

    #[test]
    fn test_phonetic_disabled_falls_to_fuzzy() {
        let evaluator = Evaluator::default().with_options(CascadeOptions {
            phonetic_enabled: false,
            symmetric_phonetic_match: false,
        });

        let (result, trace) = evaluator.evaluate_traced("namasde", "namaste", "");
        assert_eq!(result.match_type, MatchType::FuzzyLevenshtein);
        assert!(approx(result.confidence, 6.0 / 7.0));
        assert!(!trace.stages_reached().contains(&MatchType::Metaphone));
    }

    #[test]
    fn test_fuzzy_levenshtein() {
        let evaluator = Evaluator::default();

        // l/t 音码不同，编辑相似度 6/7
        let result = evaluator.evaluate("namasle", "namaste", "");
        assert!(result.is_correct);
        assert_eq!(result.match_type, MatchType::FuzzyLevenshtein);
        assert!(approx(result.confidence, 6.0 / 7.0));
    }

    #[test]
    fn test_dice_similarity() {
        let evaluator = Evaluator::default();

        // 词序颠倒：编辑相似度很低，但二元组重叠 0.8
        let result = evaluator.evaluate("ratri shubh", "shubh ratri", "");
        assert!(result.is_correct);
        assert_eq!(result.match_type, MatchType::DiceSimilarity);
        assert!(approx(result.confidence, 0.8));
    }

    #[test]
    fn test_partial_word() {
        let evaluator = Evaluator::default();

        let result = evaluator.evaluate("so namaskaran okay thanks", "namaskaram", "");
        assert!(result.is_correct);
        assert_eq!(result.match_type, MatchType::PartialWord);
        assert!(approx(result.confidence, 16.0 / 18.0));
    }

    #[test]
    fn test_no_match() {
        let evaluator = Evaluator::default();

        let result = evaluator.evaluate("xyz", "namaste", "");
        assert!(!result.is_correct);
        assert_eq!(result.match_type, MatchType::NoMatch);
        assert!(approx(result.confidence, 0.0));
        assert_eq!(result.feedback, FEEDBACK_RETRY);
    }

    #[test]
    fn test_symbol_only_answer_never_passes() {
        let evaluator = Evaluator::default();

        let (result, trace) = evaluator.evaluate_traced("completely wrong words", "?!", "");
        assert!(!result.is_correct);
        assert_eq!(result.match_type, MatchType::NoMatch);
        assert!(approx(result.confidence, 0.0));
        assert_eq!(result.feedback, FEEDBACK_RETRY);
        assert_eq!(trace.normalized_expected, "");
        assert!(!trace.stages_reached().contains(&MatchType::PhoneticNorm));
    }

    #[test]
    fn test_blank_answer_never_passes() {
        let evaluator = Evaluator::default();

        for transcript in ["namaste", "क", "anything at all"] {
            let result = evaluator.evaluate(transcript, "   ", "");
            assert!(!result.is_correct, "{transcript:?}");
            assert_eq!(result.match_type, MatchType::NoMatch);
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = Thresholds {
            levenshtein_pass: 0.9,
            dice_pass: 0.9,
            partial_word_pass: 0.95,
            ..Thresholds::default()
        };
        let evaluator = Evaluator::default().with_thresholds(strict);

        let result = evaluator.evaluate("namasle", "namaste", "");
        assert_eq!(result.match_type, MatchType::NoMatch);
        assert!(approx(result.confidence, 6.0 / 7.0));
    }

    #[test]
    fn test_trace_stops_at_first_pass() {
        let evaluator = Evaluator::default();

        let (result, trace) = evaluator.evaluate_traced("naamaste", "namaste", "नमस्ते");
        assert_eq!(result.match_type, MatchType::PhoneticNorm);
        assert_eq!(
            trace.stages_reached(),
            vec![
                MatchType::ExactHindi,
                MatchType::ExactRoman,
                MatchType::Transliteration,
                MatchType::PhoneticNorm,
            ]
        );
        assert_eq!(trace.normalized_transcript, "namaste");
    }

    #[test]
    fn test_results_are_well_formed() {
        let evaluator = Evaluator::default();
        let cases = [
            ("", "ka", "क"),
            ("क", "ka", "क"),
            ("ka", "ka", ""),
            ("नमस्ते", "namaste", ""),
            ("naamaste", "namaste", ""),
            ("namasde", "namaste", ""),
            ("namasle", "namaste", ""),
            ("ratri shubh", "shubh ratri", ""),
            ("so namaskaran okay thanks", "namaskaram", ""),
            ("xyz", "namaste", ""),
            ("!!!", "namaste", ""),
            ("नमस्कार दोस्त", "dost", "मित्र"),
        ];

        for (transcript, expected, native) in cases {
            let result = evaluator.evaluate(transcript, expected, native);
            assert!(result.is_well_formed(), "{transcript:?} → {result:?}");
        }
    }

    #[test]
    fn test_builder_settings_visible() {
        let table = Arc::new(TransliterationTable::from_entries([("क", "ka")]));
        let evaluator = Evaluator::new(table)
            .with_thresholds(Thresholds {
                dice_pass: 0.65,
                ..Thresholds::default()
            })
            .with_options(CascadeOptions {
                phonetic_enabled: false,
                symmetric_phonetic_match: true,
            });

        assert_eq!(evaluator.table().len(), 1);
        assert_eq!(evaluator.thresholds().dice_pass, 0.65);
        assert!(!evaluator.options().phonetic_enabled);
        assert!(evaluator.options().symmetric_phonetic_match);
    }

    #[test]
    fn test_evaluator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Evaluator>();
    }
}
