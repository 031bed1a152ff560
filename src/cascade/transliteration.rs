//! 音译表
//!
//! 原文词/音节 → 标准罗马字，仅精确查表，不做模糊查找。
//! 内置表随二进制嵌入；可用外部文件覆盖，文件缺失或损坏时回退内置表。

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

const EMBEDDED_TABLE: &str = include_str!("../../data/transliteration.tsv");
pub const MAX_TABLE_BYTES: usize = 2 * 1024 * 1024;
pub const MIN_ENTRY_COUNT: usize = 1;

lazy_static::lazy_static! {
    /// 内置音译表（进程内只解析一次）
    static ref BUILTIN_TABLE: Arc<TransliterationTable> = Arc::new(
        TransliterationTable::parse(EMBEDDED_TABLE).unwrap_or_else(|err| {
            tracing::error!("内置音译表解析失败: {}", err);
            TransliterationTable::default()
        })
    );
}

/// 不可变音译表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransliterationTable {
    entries: HashMap<String, String>,
}

impl TransliterationTable {
    /// 共享的内置表
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_TABLE)
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into().trim().to_lowercase()))
                .collect(),
        }
    }

    /// 解析 `原文<TAB>罗马字` 格式
    ///
    /// 空行与 `#` 注释行跳过；重复键以后出现者为准
    pub fn parse(content: &str) -> Result<Self> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            anyhow::bail!("音译表为空");
        }
        if trimmed.len() > MAX_TABLE_BYTES {
            anyhow::bail!("音译表内容过大");
        }

        let mut entries = HashMap::new();
        for (line_no, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t');
            let (Some(native), Some(roman), None) = (fields.next(), fields.next(), fields.next())
            else {
                anyhow::bail!("音译表第 {} 行格式不合法", line_no + 1);
            };

            let native = native.trim();
            let roman = roman.trim();
            if native.is_empty() || roman.is_empty() || !roman.is_ascii() {
                anyhow::bail!("音译表第 {} 行格式不合法", line_no + 1);
            }

            entries.insert(native.to_string(), roman.to_lowercase());
        }

        if entries.len() < MIN_ENTRY_COUNT {
            anyhow::bail!("音译表有效行数不足");
        }

        Ok(Self { entries })
    }

    /// 从文件加载，失败时回退内置表
    pub fn load_from_path(path: &Path) -> Arc<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("读取音译表 {:?} 失败，回退内置表: {}", path, err);
                return Self::builtin();
            }
        };

        match Self::parse(&content) {
            Ok(table) => {
                tracing::info!("已加载音译表 {:?}，共 {} 条", path, table.len());
                Arc::new(table)
            }
            Err(err) => {
                tracing::warn!("音译表 {:?} 校验失败，回退内置表: {}", path, err);
                Self::builtin()
            }
        }
    }

    /// 合并覆盖项，返回新表
    pub fn with_overrides(&self, overrides: &HashMap<String, String>) -> Self {
        let mut entries = self.entries.clone();
        for (native, roman) in overrides {
            let native = native.trim();
            let roman = roman.trim();
            if native.is_empty() || roman.is_empty() {
                tracing::warn!("忽略无效音译覆盖项: {:?} → {:?}", native, roman);
                continue;
            }
            entries.insert(native.to_string(), roman.to_lowercase());
        }
        Self { entries }
    }

    /// 精确查表
    pub fn lookup(&self, native: &str) -> Option<&str> {
        self.entries.get(native).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
