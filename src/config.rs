// src/config.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::cascade::{CascadeOptions, Evaluator, NativeScript, Thresholds, TransliterationTable};

// ============================================================================
// 全局配置操作锁
// ============================================================================

lazy_static::lazy_static! {
    /// 串行化 load -> modify -> save，见 `load_persisted_config`
    pub static ref CONFIG_LOCK: Mutex<()> = Mutex::new(());
}

pub const APP_DIR_NAME: &str = "PronounceCheck";
pub const CONFIG_FILENAME: &str = "config.json";

// ============================================================================
// 音译表配置
// ============================================================================

/// 音译表配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransliterationConfig {
    /// 外部音译表文件（`原文<TAB>罗马字`），为空时使用内置表
    #[serde(default)]
    pub table_path: Option<PathBuf>,
    /// 追加/覆盖条目，最后合并
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

// ============================================================================
// 远程评估配置
// ============================================================================

/// 远程评估服务配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// 评估接口地址，为空表示仅本地评估
    #[serde(default)]
    pub endpoint: Option<String>,
    /// 请求总超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 连接超时（秒）
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// 是否配置了可用的远程地址
    pub fn is_enabled(&self) -> bool {
        self.endpoint
            .as_deref()
            .map(|e| !e.trim().is_empty())
            .unwrap_or(false)
    }
}

// ============================================================================
// 应用配置
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub cascade: CascadeOptions,
    #[serde(default)]
    pub native_script: NativeScript,
    #[serde(default)]
    pub transliteration: TransliterationConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法获取配置目录"))?;
        let app_dir = config_dir.join(APP_DIR_NAME);
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join(CONFIG_FILENAME))
    }

    /// 加载配置
    ///
    /// 返回 `(配置, 是否发生了恢复)`，调用者可据此决定是否回写
    pub fn load() -> Result<(Self, bool)> {
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<(Self, bool)> {
        tracing::info!("尝试从以下路径加载配置: {:?}", path);

        if !path.exists() {
            tracing::warn!("配置文件不存在，使用默认配置");
            return Ok((Self::new(), false));
        }

        let content = std::fs::read_to_string(path)?;

        // 先解析为 Value，整体反序列化失败时逐段恢复
        let v: serde_json::Value = serde_json::from_str(&content)?;

        match serde_json::from_value::<AppConfig>(v.clone()) {
            Ok(config) => Ok((config, false)),
            Err(e) => {
                tracing::warn!("直接解析配置失败，尝试逐段恢复: {}", e);
                Ok((Self::recover_sections(&v), true))
            }
        }
    }

    /// 从原始 JSON 中提取仍可解析的配置段，其余使用默认值
    fn recover_sections(v: &serde_json::Value) -> Self {
        let mut cfg = AppConfig::new();

        if let Some(thresholds) = v.get("thresholds") {
            if let Ok(t) = serde_json::from_value(thresholds.clone()) {
                tracing::info!("成功恢复 thresholds");
                cfg.thresholds = t;
            }
        }
        if let Some(cascade) = v.get("cascade") {
            if let Ok(c) = serde_json::from_value(cascade.clone()) {
                tracing::info!("成功恢复 cascade");
                cfg.cascade = c;
            }
        }
        if let Some(script) = v.get("native_script") {
            if let Ok(s) = serde_json::from_value(script.clone()) {
                tracing::info!("成功恢复 native_script");
                cfg.native_script = s;
            }
        }
        if let Some(transliteration) = v.get("transliteration") {
            if let Ok(t) = serde_json::from_value(transliteration.clone()) {
                tracing::info!("成功恢复 transliteration");
                cfg.transliteration = t;
            }
        }
        if let Some(remote) = v.get("remote") {
            if let Ok(r) = serde_json::from_value(remote.clone()) {
                tracing::info!("成功恢复 remote");
                cfg.remote = r;
            }
        }

        cfg
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tracing::info!("保存配置到: {:?}", path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        if let Err(e) = std::fs::write(&temp_path, &content) {
            tracing::error!("写入临时文件失败: {}", e);
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        replace_with_backup(&temp_path, path)?;
        tracing::info!("配置保存成功");
        Ok(())
    }

    /// 按配置构建音译表：外部文件（或内置表）+ 覆盖项
    pub fn build_table(&self) -> Arc<TransliterationTable> {
        let base = match &self.transliteration.table_path {
            Some(path) => TransliterationTable::load_from_path(path),
            None => TransliterationTable::builtin(),
        };

        if self.transliteration.overrides.is_empty() {
            base
        } else {
            Arc::new(base.with_overrides(&self.transliteration.overrides))
        }
    }

    /// 按配置构建评估器
    pub fn build_evaluator(&self) -> Result<Evaluator> {
        self.thresholds.validate()?;
        if self.native_script.block_start > self.native_script.block_end {
            anyhow::bail!(
                "原文区块范围不合法: {:#06X}..={:#06X}",
                self.native_script.block_start,
                self.native_script.block_end
            );
        }

        Ok(Evaluator::new(self.build_table())
            .with_thresholds(self.thresholds.clone())
            .with_options(self.cascade.clone())
            .with_script(self.native_script.clone()))
    }
}

/// 用 `staged` 替换 `target`
///
/// 旧文件先挪到 `.bak`，替换失败时挪回；成功后删除备份
fn replace_with_backup(staged: &Path, target: &Path) -> Result<()> {
    let backup = target.with_extension("json.bak");
    let had_target = target.exists();

    if had_target {
        if backup.exists() {
            std::fs::remove_file(&backup)?;
        }
        std::fs::rename(target, &backup)?;
    }

    if let Err(e) = std::fs::rename(staged, target) {
        tracing::error!("替换配置文件失败: {}", e);
        if had_target {
            match std::fs::rename(&backup, target) {
                Ok(_) => tracing::info!("已从备份恢复配置"),
                Err(restore_err) => tracing::error!("恢复备份失败: {}", restore_err),
            }
        }
        return Err(e.into());
    }

    if had_target {
        let _ = std::fs::remove_file(&backup);
    }
    Ok(())
}
