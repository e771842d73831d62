use reqwest::StatusCode;
use thiserror::Error;

/// 采集客户端的错误
#[derive(Debug, Error)]
pub enum CaptureError {
    /// 服务端明确报告失败，消息原样取自响应的 `error` 字段
    #[error("{message}")]
    Remote {
        message: String,
        suggestion: Option<String>,
    },

    /// 请求未能完成：网络错误、非 2xx 状态或无法解析的响应
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with status {status}{}", body_suffix(.body))]
    Status {
        status: StatusCode,
        body: Option<String>,
    },

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed response: {0}")]
    Malformed(String),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref().map(|b| format!(": {b}")).unwrap_or_default()
}

impl CaptureError {
    #[cfg(test)]
    pub fn remote(message: impl Into<String>) -> Self {
        CaptureError::Remote {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, CaptureError::Remote { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, CaptureError::Transport(_))
    }

    /// 服务端附带的处理建议（如有）
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            CaptureError::Remote { suggestion, .. } => suggestion.as_deref(),
            CaptureError::Transport(_) => None,
        }
    }
}

impl From<reqwest::Error> for CaptureError {
    fn from(err: reqwest::Error) -> Self {
        CaptureError::Transport(TransportError::Request(err))
    }
}
