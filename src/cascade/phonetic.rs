//! 音码原语
//!
//! 基于 Double Metaphone，识别 "拼写不同但读音相近" 的罗马字

use std::panic::{catch_unwind, AssertUnwindSafe};

use rphonetic::DoubleMetaphone;
use serde::Serialize;

/// 一个字符串的两种音码
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhoneticCodes {
    pub primary: String,
    pub alternate: String,
}

impl PhoneticCodes {
    pub fn new(primary: impl Into<String>, alternate: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            alternate: alternate.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.alternate.is_empty()
    }

    /// 音码交叉比较
    ///
    /// 默认比较 (t1,e1)、(t2,e2)、(t1,e2)，不比较 (t2,e1)；
    /// `symmetric` 为 true 时补上 (t2,e1)。空音码永不匹配。
    pub fn matches(&self, expected: &PhoneticCodes, symmetric: bool) -> bool {
        let eq = |a: &str, b: &str| !a.is_empty() && a == b;

        eq(&self.primary, &expected.primary)
            || eq(&self.alternate, &expected.alternate)
            || eq(&self.primary, &expected.alternate)
            || (symmetric && eq(&self.alternate, &expected.primary))
    }
}

/// 音码编码器
pub struct PhoneticEncoder {
    encoder: DoubleMetaphone,
}

impl PhoneticEncoder {
    pub fn new() -> Self {
        Self {
            encoder: DoubleMetaphone::default(),
        }
    }

    /// 计算音码
    ///
    /// 输入应为已规范化文本；此处去掉全部空白后编码。
    /// Double Metaphone 只认拉丁字母，原文字符不参与编码。
    pub fn codes(&self, normalized: &str) -> PhoneticCodes {
        let compact: String = normalized
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if compact.is_empty() {
            return PhoneticCodes::default();
        }

        // 编码内部 panic 时兜底为空音码；默认 panic hook 仍会先向 stderr 打印一次，stdout 不受影响
        let encoded = catch_unwind(AssertUnwindSafe(|| {
            let result = self.encoder.double_metaphone(&compact);
            PhoneticCodes::new(result.primary().to_string(), result.alternate().to_string())
        }));

        match encoded {
            Ok(codes) => codes,
            Err(_) => {
                tracing::warn!("DoubleMetaphone 编码异常，输入: {:?}", compact);
                PhoneticCodes::default()
            }
        }
    }
}

impl Default for PhoneticEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_ignore_whitespace() {
        let encoder = PhoneticEncoder::new();
        assert_eq!(encoder.codes("shubh ratri"), encoder.codes("shubhratri"));
    }

    #[test]
    fn test_codes_empty() {
        let encoder = PhoneticEncoder::new();
        assert!(encoder.codes("").is_empty());
        assert!(encoder.codes("   ").is_empty());
        assert!(encoder.codes("नमस्ते").is_empty());
    }

    #[test]
    fn test_sound_alike() {
        let encoder = PhoneticEncoder::new();
        let t = encoder.codes("namasde");
        let e = encoder.codes("namaste");
        assert!(t.matches(&e, false));
    }

    #[test]
    fn test_sound_different() {
        let encoder = PhoneticEncoder::new();
        let t = encoder.codes("xyz");
        let e = encoder.codes("namaste");
        assert!(!t.matches(&e, false));
        assert!(!t.matches(&e, true));
    }

    #[test]
    fn test_cross_match_combinations() {
        let e = PhoneticCodes::new("AB", "CD");
        assert!(PhoneticCodes::new("AB", "XX").matches(&e, false)); // t1 == e1
        assert!(PhoneticCodes::new("XX", "CD").matches(&e, false)); // t2 == e2
        assert!(PhoneticCodes::new("CD", "XX").matches(&e, false)); // t1 == e2
    }

    #[test]
    fn test_alternate_vs_primary_not_checked_by_default() {
        // 仅 t2 == e1：默认不算匹配
        let t = PhoneticCodes::new("XX", "AB");
        let e = PhoneticCodes::new("AB", "CD");
        assert!(!t.matches(&e, false));
        assert!(t.matches(&e, true));
    }

    #[test]
    fn test_empty_codes_never_match() {
        let empty = PhoneticCodes::default();
        assert!(!empty.matches(&PhoneticCodes::default(), true));
        assert!(!empty.matches(&PhoneticCodes::new("AB", ""), true));
    }
}
