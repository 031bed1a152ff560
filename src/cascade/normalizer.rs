//! 文本规范化
//!
//! 吸收 STT 在拼写上的不稳定：大小写、标点、元音长短、`shh`/`sh` 混写

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// 天城文 Unicode 区块
pub const DEVANAGARI_START: u32 = 0x0900;
pub const DEVANAGARI_END: u32 = 0x097F;
/// 月点（candrabindu）
pub const CANDRABINDU: char = '\u{0901}';
/// 随韵（anusvara）
pub const ANUSVARA: char = '\u{0902}';

const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

/// 原文文字配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeScript {
    /// Unicode 区块起点（含）
    #[serde(default = "default_block_start")]
    pub block_start: u32,
    /// Unicode 区块终点（含）
    #[serde(default = "default_block_end")]
    pub block_end: u32,
    /// 需要统一的鼻化符号：(原符号, 规范符号)
    #[serde(default = "default_nasal_fold")]
    pub nasal_fold: (char, char),
}

fn default_block_start() -> u32 {
    DEVANAGARI_START
}

fn default_block_end() -> u32 {
    DEVANAGARI_END
}

fn default_nasal_fold() -> (char, char) {
    (CANDRABINDU, ANUSVARA)
}

impl NativeScript {
    pub fn devanagari() -> Self {
        Self {
            block_start: default_block_start(),
            block_end: default_block_end(),
            nasal_fold: default_nasal_fold(),
        }
    }

    /// 字符是否属于原文区块
    pub fn contains(&self, ch: char) -> bool {
        (self.block_start..=self.block_end).contains(&(ch as u32))
    }
}

impl Default for NativeScript {
    fn default() -> Self {
        Self::devanagari()
    }
}

/// 规范化器（纯函数，可跨线程共享）
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    script: NativeScript,
}

impl Normalizer {
    pub fn new(script: NativeScript) -> Self {
        Self { script }
    }

    /// 罗马字/混合文本规范化
    ///
    /// 顺序固定：
    /// 1. NFC + ASCII 小写
    /// 2. 去除非 ASCII 字母数字、非空白、非原文区块的字符
    /// 3. 空白折叠 + trim
    /// 4. 连续相同元音合并（naamaste → namaste）
    /// 5. `shh` 折叠为 `sh`
    pub fn normalize(&self, text: &str) -> String {
        let mut stripped = String::with_capacity(text.len());
        let mut prev_whitespace = false;

        for ch in text.nfc() {
            if ch.is_whitespace() {
                if !prev_whitespace {
                    stripped.push(' ');
                    prev_whitespace = true;
                }
            } else if ch.is_ascii_alphanumeric() || self.script.contains(ch) {
                stripped.push(ch.to_ascii_lowercase());
                prev_whitespace = false;
            }
        }

        let collapsed = collapse_vowel_runs(stripped.trim());
        fold_shh(&collapsed)
    }

    /// 原文规范化：仅统一鼻化符号，不改大小写、不去符号
    pub fn normalize_native(&self, text: &str) -> String {
        let (from, to) = self.script.nasal_fold;
        text.nfc()
            .map(|ch| if ch == from { to } else { ch })
            .collect()
    }
}

/// 合并连续相同的元音
fn collapse_vowel_runs(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev: Option<char> = None;

    for ch in text.chars() {
        if prev == Some(ch) && VOWELS.contains(&ch) {
            continue;
        }
        result.push(ch);
        prev = Some(ch);
    }

    result
}

/// `s` 后的 2 个及以上 `h` 折叠为单个 `h`
fn fold_shh(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        result.push(ch);
        if ch != 's' || chars.peek() != Some(&'h') {
            continue;
        }

        // 保留一个 h，吞掉后续连续的 h
        result.push('h');
        chars.next();
        while chars.peek() == Some(&'h') {
            chars.next();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::default()
    }

    #[test]
    fn test_lowercase_and_trim() {
        assert_eq!(normalizer().normalize("  NamASte  "), "namaste");
    }

    #[test]
    fn test_strip_punctuation_keeps_devanagari() {
        assert_eq!(normalizer().normalize("Namaste, नमस्ते!"), "namaste नमस्ते");
        assert_eq!(normalizer().normalize("ka?"), "ka");
        assert_eq!(normalizer().normalize("...!"), "");
    }

    #[test]
    fn test_whitespace_fold() {
        assert_eq!(normalizer().normalize("shubh \t  ratri"), "shubh ratri");
        assert_eq!(normalizer().normalize("shubh - ratri"), "shubh ratri");
    }

    #[test]
    fn test_collapse_vowels() {
        assert_eq!(normalizer().normalize("naamaste"), "namaste");
        assert_eq!(normalizer().normalize("kaa"), "ka");
        assert_eq!(normalizer().normalize("bahuuut"), "bahut");
        // 不同元音不合并
        assert_eq!(normalizer().normalize("kaise"), "kaise");
    }

    #[test]
    fn test_collapse_after_strip() {
        // 标点被去掉后，两侧元音连在一起同样合并
        assert_eq!(normalizer().normalize("na.amaste"), "namaste");
    }

    #[test]
    fn test_fold_shh() {
        assert_eq!(normalizer().normalize("shhubh"), "shubh");
        assert_eq!(normalizer().normalize("shhhanti"), "shanti");
        assert_eq!(normalizer().normalize("shubh"), "shubh");
        assert_eq!(normalizer().normalize("sh"), "sh");
        assert_eq!(normalizer().normalize("hh"), "hh");
    }

    #[test]
    fn test_fold_shh_after_strip() {
        assert_eq!(normalizer().normalize("s-hh-anti"), "shanti");
    }

    #[test]
    fn test_normalize_native_nasal() {
        let n = normalizer();
        // हँस (candrabindu) 与 हंस (anusvara) 统一
        assert_eq!(n.normalize_native("हँस"), n.normalize_native("हंस"));
        assert_eq!(n.normalize_native("हँस"), "हंस");
    }

    #[test]
    fn test_normalize_native_keeps_everything_else() {
        assert_eq!(normalizer().normalize_native(" Hi, क! "), " Hi, क! ");
    }

    #[test]
    fn test_custom_script_block() {
        // 孟加拉文区块
        let bengali = NativeScript {
            block_start: 0x0980,
            block_end: 0x09FF,
            nasal_fold: ('\u{0981}', '\u{0982}'),
        };
        let n = Normalizer::new(bengali);
        assert_eq!(n.normalize("নমস্কার क"), "নমস্কার");
    }
}
