// 发音评估命令行
//
// 用法：
//   pronounce-check --transcript "namasde" --expected "namaste" [--native "नमस्ते"] [--trace]
//   echo '{"transcript":"namasde","expectedAnswer":"namaste"}' | pronounce-check
//
// 每个请求输出一行 JSON

use anyhow::Result;
use serde::Serialize;
use std::io::BufRead;
use std::sync::Arc;

use pronounce_check_lib::{
    init_logging, load_persisted_config, AppConfig, ConfidenceTier, EvaluationClient,
    EvaluationRequest, EvaluationResult, EvaluationSource,
};

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    transcript: Option<String>,
    expected: Option<String>,
    native: Option<String>,
    trace: bool,
}

impl CliArgs {
    fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--transcript" | "-t" => parsed.transcript = Some(next_value(&mut args, &arg)?),
                "--expected" | "-e" => parsed.expected = Some(next_value(&mut args, &arg)?),
                "--native" | "-n" => parsed.native = Some(next_value(&mut args, &arg)?),
                "--trace" => parsed.trace = true,
                other => anyhow::bail!("未知参数: {}", other),
            }
        }

        Ok(parsed)
    }

    /// 命令行给出了单条请求
    fn single_request(&self) -> Option<EvaluationRequest> {
        if self.transcript.is_none() && self.expected.is_none() {
            return None;
        }
        Some(EvaluationRequest {
            transcript: self.transcript.clone(),
            expected_answer: self.expected.clone(),
            expected_native: self.native.clone(),
        })
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("参数 {} 缺少取值", flag))
}

/// 输出行：评估结果 + 展示档位
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CliResponse {
    #[serde(flatten)]
    result: EvaluationResult,
    tier: &'static str,
    source: EvaluationSource,
}

#[derive(Debug, Serialize)]
struct CliError {
    error: String,
}

async fn evaluate_one(client: &EvaluationClient, request: &EvaluationRequest, trace: bool) -> String {
    let line = match client.evaluate(request).await {
        Ok(outcome) => {
            if trace {
                print_trace(client, request);
            }
            let tier = ConfidenceTier::from_confidence(outcome.result.confidence);
            serde_json::to_string(&CliResponse {
                result: outcome.result,
                tier: tier.label(),
                source: outcome.source,
            })
        }
        Err(e) => serde_json::to_string(&CliError {
            error: e.to_string(),
        }),
    };

    line.unwrap_or_else(|e| format!("{{\"error\":\"序列化失败: {}\"}}", e))
}

/// 本地追踪各阶段，输出到 stderr
fn print_trace(client: &EvaluationClient, request: &EvaluationRequest) {
    let Ok(input) = request.validate() else {
        return;
    };
    let (_, trace) = client.local().evaluate_traced(
        &input.transcript,
        &input.expected_answer,
        &input.expected_native,
    );
    match serde_json::to_string_pretty(&trace) {
        Ok(text) => eprintln!("{}", text),
        Err(e) => tracing::warn!("追踪序列化失败: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = CliArgs::parse(std::env::args().skip(1))?;

    let config = load_persisted_config().unwrap_or_else(|e| {
        tracing::warn!("加载配置失败，使用默认配置: {}", e);
        AppConfig::default()
    });
    let evaluator = Arc::new(config.build_evaluator()?);
    let client = EvaluationClient::from_config(evaluator, &config.remote);

    if let Some(request) = args.single_request() {
        println!("{}", evaluate_one(&client, &request, args.trace).await);
        return Ok(());
    }

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let output = match EvaluationRequest::from_json(&line) {
            Ok(request) => evaluate_one(&client, &request, args.trace).await,
            Err(e) => serde_json::to_string(&CliError {
                error: e.to_string(),
            })?,
        };
        println!("{}", output);
    }

    Ok(())
}
