pub mod api;
pub mod cascade;
pub mod config;
pub mod tier;

pub use api::{
    handle_request, EvaluationClient, EvaluationOutcome, EvaluationRequest, EvaluationSource,
    RemoteEvaluator, RequestError,
};
pub use cascade::{EvaluationInput, EvaluationResult, EvaluationTrace, Evaluator, MatchType};
pub use config::{AppConfig, CONFIG_LOCK};
pub use tier::ConfidenceTier;

use tracing_subscriber::EnvFilter;

/// 初始化日志，默认 info，可通过 RUST_LOG 覆盖
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // 日志写到 stderr，stdout 留给结果输出
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 加载持久化配置，发生恢复时回写
pub fn load_persisted_config() -> anyhow::Result<AppConfig> {
    let _guard = CONFIG_LOCK
        .lock()
        .map_err(|e| anyhow::anyhow!("配置锁已损坏: {}", e))?;

    let (config, recovered) = AppConfig::load()?;
    if recovered {
        if let Err(e) = config.save() {
            tracing::warn!("保存恢复后的配置失败: {}", e);
        }
    }
    Ok(config)
}
