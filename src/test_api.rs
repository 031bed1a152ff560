// API 测试工具 - 对比远程评估接口与本地级联的结果
use anyhow::Result;
use std::io::Write;
use std::time::Duration;

use pronounce_check_lib::{
    init_logging, load_persisted_config, AppConfig, EvaluationRequest, Evaluator, RemoteEvaluator,
};

fn prompt(message: &str) -> Result<String> {
    println!("{}", message);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    init_logging();

    println!("=== 发音评估 API 对比工具 ===\n");

    let config = load_persisted_config().unwrap_or_else(|e| {
        tracing::warn!("加载配置失败，使用默认配置: {}", e);
        AppConfig::default()
    });

    // 1. 获取接口地址：环境变量 > 配置 > 手动输入
    let endpoint = match std::env::var("PRONOUNCE_CHECK_ENDPOINT") {
        Ok(endpoint) if !endpoint.trim().is_empty() => endpoint,
        _ => match config.remote.endpoint.clone().filter(|e| !e.trim().is_empty()) {
            Some(endpoint) => endpoint,
            None => prompt("请输入评估接口地址 (如 http://localhost:3000/api/evaluate):")?,
        },
    };

    if endpoint.is_empty() {
        anyhow::bail!("接口地址不能为空");
    }
    println!("✓ 接口地址: {}\n", endpoint);

    let remote = RemoteEvaluator::new(
        endpoint.trim(),
        Duration::from_secs(config.remote.timeout_secs),
        Duration::from_secs(config.remote.connect_timeout_secs),
    );
    let local: Evaluator = config.build_evaluator()?;
    println!(
        "✓ 本地级联: 音译表 {} 条, 音码阶段 {}, 编辑相似度阈值 {:.2}, Dice 阈值 {:.2}\n",
        local.table().len(),
        if local.options().phonetic_enabled { "开启" } else { "关闭" },
        local.thresholds().levenshtein_pass,
        local.thresholds().dice_pass
    );

    // 2. 获取请求内容
    let transcript = prompt("请输入转录文本:")?;
    let expected = prompt("请输入标准答案（罗马字）:")?;
    let native = prompt("请输入标准答案（原文，可留空）:")?;

    let request = EvaluationRequest::new(
        transcript,
        expected,
        Some(native).filter(|n| !n.is_empty()),
    );
    let input = request.validate()?;
    println!("✓ 请求已构建\n");

    // 3. 本地评估
    let (local_result, trace) = local.evaluate_traced(
        &input.transcript,
        &input.expected_answer,
        &input.expected_native,
    );
    println!("本地结果: {}", serde_json::to_string_pretty(&local_result)?);
    println!(
        "经过阶段: {:?} ({}us)\n",
        trace.stages_reached(),
        trace.elapsed_us
    );

    // 4. 远程评估
    println!("正在请求远程接口...");
    let remote_result = match remote.evaluate(&request).await {
        Ok(result) => result,
        Err(e) => {
            println!("✗ 远程评估失败: {}", e);
            println!("  客户端会回退到本地结果");
            return Ok(());
        }
    };
    println!("远程结果: {}\n", serde_json::to_string_pretty(&remote_result)?);

    // 5. 对比
    let same_type = remote_result.match_type == local_result.match_type;
    let confidence_gap = (remote_result.confidence - local_result.confidence).abs();
    if same_type && confidence_gap < 0.01 {
        println!("✓ 远程与本地一致");
    } else {
        println!(
            "⚠ 结果不一致: 远程 {} ({:.3}) vs 本地 {} ({:.3})",
            remote_result.match_type,
            remote_result.confidence,
            local_result.match_type,
            local_result.confidence
        );
        println!("  远程与本地的阈值或音译表可能不同步，请核对本地配置");
    }

    Ok(())
}
