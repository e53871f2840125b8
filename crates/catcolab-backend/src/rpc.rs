//! Result envelope of backend operations
//!
//! Every backend call replies `{"tag": "Ok", "content": ...}` or
//! `{"tag": "Err", "code": ..., "message": ...}`. Unwrapping surfaces the
//! message only; the code is kept for callers that classify failures.

use serde::{Deserialize, Serialize};

/// Backend reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum RpcResult<T> {
    /// Success
    Ok {
        /// Payload
        content: T,
    },
    /// Failure
    Err {
        /// Status code (HTTP-like)
        code: u16,
        /// Human-readable message
        message: String,
    },
}

impl<T> RpcResult<T> {
    /// Successful reply
    #[inline]
    #[must_use]
    pub fn ok(content: T) -> Self {
        Self::Ok { content }
    }

    /// Failed reply
    #[inline]
    #[must_use]
    pub fn err(code: u16, message: impl Into<String>) -> Self {
        Self::Err {
            code,
            message: message.into(),
        }
    }

    /// Check if reply is a success
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Payload of a successful reply
    ///
    /// # Errors
    /// Returns an [`RpcError`] displaying exactly the envelope's message
    pub fn unwrap(self) -> Result<T, RpcError> {
        match self {
            Self::Ok { content } => Ok(content),
            Self::Err { code, message } => Err(RpcError { code, message }),
        }
    }

    /// Error of a failed reply
    ///
    /// # Errors
    /// Returns [`UnexpectedOk`] if the reply is a success
    pub fn unwrap_err(self) -> Result<RpcError, UnexpectedOk> {
        match self {
            Self::Ok { .. } => Err(UnexpectedOk),
            Self::Err { code, message } => Ok(RpcError { code, message }),
        }
    }
}

impl<T> From<RpcResult<T>> for Result<T, RpcError> {
    fn from(result: RpcResult<T>) -> Self {
        result.unwrap()
    }
}

/// Failed backend reply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RpcError {
    /// Status code
    pub code: u16,
    /// Message
    pub message: String,
}

impl RpcError {
    /// Create error
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A success reply where a failure was expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected an error reply, got a success")]
pub struct UnexpectedOk;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwrap_ok_returns_content() {
        assert_eq!(RpcResult::ok(5).unwrap(), Ok(5));
    }

    #[test]
    fn unwrap_err_message_is_exact() {
        let err = RpcResult::<i32>::err(404, "nope").unwrap().unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(err.code, 404);
    }

    #[test]
    fn unwrap_err_on_ok_fails() {
        assert_eq!(RpcResult::ok(1).unwrap_err(), Err(UnexpectedOk));
        let err = RpcResult::<()>::err(500, "boom").unwrap_err().unwrap();
        assert_eq!(err, RpcError::new(500, "boom"));
    }

    #[test]
    fn wire_shape() {
        let ok: RpcResult<i32> = serde_json::from_value(json!({"tag": "Ok", "content": 5})).unwrap();
        assert_eq!(ok, RpcResult::ok(5));

        let err: RpcResult<i32> =
            serde_json::from_value(json!({"tag": "Err", "code": 403, "message": "forbidden"}))
                .unwrap();
        assert_eq!(err, RpcResult::err(403, "forbidden"));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"tag": "Err", "code": 403, "message": "forbidden"})
        );
    }
}
