// 评估接口边界
//
// 请求校验、本地处理，以及带本地回退的远程评估客户端

mod client;
mod request;

pub use client::{
    create_http_client, EvaluationClient, EvaluationOutcome, EvaluationSource, RemoteEvaluator,
};
pub use request::{handle_request, EvaluationRequest, RequestError};
