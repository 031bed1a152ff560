// 置信度展示分档
//
// 纯函数：只看置信度，与命中规则无关

use serde::{Deserialize, Serialize};

/// 展示档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Excellent,
    Great,
    Good,
    Close,
    TryAgain,
}

impl ConfidenceTier {
    /// 固定分界：0.95 / 0.85 / 0.75 / 0.60
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.95 {
            ConfidenceTier::Excellent
        } else if confidence >= 0.85 {
            ConfidenceTier::Great
        } else if confidence >= 0.75 {
            ConfidenceTier::Good
        } else if confidence >= 0.60 {
            ConfidenceTier::Close
        } else {
            ConfidenceTier::TryAgain
        }
    }

    /// 获取档位的显示名称
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::Excellent => "Excellent",
            ConfidenceTier::Great => "Great",
            ConfidenceTier::Good => "Good",
            ConfidenceTier::Close => "Close",
            ConfidenceTier::TryAgain => "Try Again",
        }
    }
}
