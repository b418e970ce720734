use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_code_and_message() {
        let err = ApiError::new(ErrorCode::NotFound, "task 9 not found");
        assert_eq!(err.to_string(), "NotFound: task 9 not found");
    }

    #[test]
    fn code_serializes_snake_case() {
        let json = serde_json::to_value(ApiError::new(ErrorCode::NotFound, "x")).expect("json");
        assert_eq!(json["code"], "not_found");
    }
}
