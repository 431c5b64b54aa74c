use crate::ui::NoticeKind;
use reqwest::StatusCode;
use thiserror::Error;

pub const NETWORK_MESSAGE: &str = "네트워크 연결을 확인해주세요.";
pub const TIMEOUT_MESSAGE: &str = "요청 시간이 초과되었습니다.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{}", NETWORK_MESSAGE)]
    Network(#[source] reqwest::Error),
    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{message}")]
    Api {
        status: StatusCode,
        message: String,
        code: Option<String>,
    },
    #[error("응답을 해석할 수 없습니다: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Builds the error for a non-2xx response, preferring the server's message.
    pub fn from_status(status: StatusCode, message: Option<String>, code: Option<String>) -> Self {
        let message = message
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| default_message(status).to_string());
        if status == StatusCode::UNAUTHORIZED {
            return Self::Unauthorized(message);
        }
        Self::Api {
            status,
            message,
            code,
        }
    }

    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err)
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Only transport failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }

    /// The toast a front end shows for this failure.
    pub fn toast(&self) -> (NoticeKind, String) {
        (NoticeKind::Error, self.to_string())
    }
}

fn default_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "잘못된 요청입니다.",
        401 => "인증이 필요합니다. 다시 로그인해주세요.",
        403 => "접근 권한이 없습니다.",
        404 => "요청한 리소스를 찾을 수 없습니다.",
        500 => "서버 오류가 발생했습니다. 잠시 후 다시 시도해주세요.",
        503 => "서비스를 일시적으로 사용할 수 없습니다.",
        _ => "알 수 없는 오류가 발생했습니다.",
    }
}
