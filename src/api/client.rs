// 评估客户端
//
// 优先调用远程评估接口，任何失败（网络、状态码、响应格式、结果不自洽）
// 都在本地用同一套级联重新评估，调用方始终拿到合法结果

use anyhow::Result;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::request::{EvaluationRequest, RequestError};
use crate::cascade::{EvaluationResult, Evaluator};
use crate::config::RemoteConfig;

// ============================================================================
// HTTP 客户端
// ============================================================================

pub fn create_http_client(timeout: Duration, connect_timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .no_proxy()
        .build()
        .unwrap_or_else(|_| Client::new())
}

// ============================================================================
// 远程评估
// ============================================================================

/// 远程评估接口
#[derive(Clone)]
pub struct RemoteEvaluator {
    endpoint: String,
    client: Client,
}

impl RemoteEvaluator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: create_http_client(timeout, connect_timeout),
        }
    }

    /// 按配置创建，未配置地址时返回 None
    pub fn from_config(config: &RemoteConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        let endpoint = config.endpoint.as_deref()?.trim().to_string();
        Some(Self::new(
            endpoint,
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        ))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST 请求到远程接口并解析结果
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult> {
        tracing::debug!("远程评估请求: endpoint={}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("远程评估请求失败 ({}): {}", status, text);
        }

        let payload: Value = response.json().await?;
        parse_remote_result(payload)
    }
}

/// 解析远程响应，拒绝不自洽的结果
fn parse_remote_result(payload: Value) -> Result<EvaluationResult> {
    let result: EvaluationResult = serde_json::from_value(payload.clone())
        .map_err(|e| anyhow::anyhow!("远程评估返回格式不可解析: {} ({:?})", e, payload))?;

    if !result.is_well_formed() {
        anyhow::bail!("远程评估结果不自洽: {:?}", result);
    }

    Ok(result)
}

// ============================================================================
// 带回退的评估客户端
// ============================================================================

/// 结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    Remote,
    Local,
}

/// 评估结果及其来源
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub result: EvaluationResult,
    pub source: EvaluationSource,
}

#[derive(Clone)]
pub struct EvaluationClient {
    local: Arc<Evaluator>,
    remote: Option<RemoteEvaluator>,
}

impl EvaluationClient {
    pub fn local_only(local: Arc<Evaluator>) -> Self {
        Self {
            local,
            remote: None,
        }
    }

    pub fn with_remote(local: Arc<Evaluator>, remote: RemoteEvaluator) -> Self {
        Self {
            local,
            remote: Some(remote),
        }
    }

    pub fn from_config(local: Arc<Evaluator>, config: &RemoteConfig) -> Self {
        match RemoteEvaluator::from_config(config) {
            Some(remote) => {
                tracing::info!("启用远程评估: {}", remote.endpoint());
                Self::with_remote(local, remote)
            }
            None => Self::local_only(local),
        }
    }

    pub fn local(&self) -> &Evaluator {
        &self.local
    }

    pub fn remote(&self) -> Option<&RemoteEvaluator> {
        self.remote.as_ref()
    }

    /// 评估一次请求
    ///
    /// 请求不完整时直接报错，不会访问远程；其余情况保证返回结果
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationOutcome, RequestError> {
        let input = request.validate()?;

        if let Some(remote) = &self.remote {
            match remote.evaluate(request).await {
                Ok(result) => {
                    return Ok(EvaluationOutcome {
                        result,
                        source: EvaluationSource::Remote,
                    });
                }
                Err(e) => {
                    tracing::warn!("远程评估失败，回退到本地评估: {}", e);
                }
            }
        }

        Ok(EvaluationOutcome {
            result: self.local.evaluate_input(&input),
            source: EvaluationSource::Local,
        })
    }
}
