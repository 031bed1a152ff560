// 评估请求边界校验

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cascade::{EvaluationInput, EvaluationResult, Evaluator};

/// 请求格式错误
///
/// 只在边界产生，级联本身永不失败
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("malformed request: {0}")]
    Malformed(String),
}

/// 评估请求（外部 JSON）
///
/// 字段均可缺省，由 [`EvaluationRequest::validate`] 判定是否完整。
/// 原文答案在线路上沿用 `expectedHindi`，同时接受 `expectedNative`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub expected_answer: Option<String>,
    #[serde(
        default,
        rename = "expectedHindi",
        alias = "expectedNative",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_native: Option<String>,
}

impl EvaluationRequest {
    pub fn new(
        transcript: impl Into<String>,
        expected_answer: impl Into<String>,
        expected_native: Option<String>,
    ) -> Self {
        Self {
            transcript: Some(transcript.into()),
            expected_answer: Some(expected_answer.into()),
            expected_native,
        }
    }

    /// 解析一行 JSON 请求
    pub fn from_json(line: &str) -> Result<Self, RequestError> {
        serde_json::from_str(line).map_err(|e| RequestError::Malformed(e.to_string()))
    }

    /// 校验并转换为级联输入
    ///
    /// - 缺少转录：错误（空白转录合法，级联返回 `none`）
    /// - 缺少、空白或不含任何字母数字的罗马字答案：错误
    /// - 原文答案可缺省
    pub fn validate(&self) -> Result<EvaluationInput, RequestError> {
        let transcript = self
            .transcript
            .as_ref()
            .ok_or(RequestError::MissingField("transcript"))?;

        let expected_answer = self
            .expected_answer
            .as_ref()
            .filter(|answer| answer.chars().any(char::is_alphanumeric))
            .ok_or(RequestError::MissingField("expectedAnswer"))?;

        Ok(EvaluationInput::new(
            transcript.as_str(),
            expected_answer.as_str(),
            self.expected_native.clone().unwrap_or_default(),
        ))
    }
}

/// 校验请求后在本地评估
pub fn handle_request(
    evaluator: &Evaluator,
    request: &EvaluationRequest,
) -> Result<EvaluationResult, RequestError> {
    let input = request.validate()?;
    Ok(evaluator.evaluate_input(&input))
}
