use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// 成功响应中负载所在的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// 负载位于信封的某个字段中，例如 `data`
    Field(&'static str),
    /// 负载字段与 `success` 平铺在同一对象中
    Inline,
}

/// 服务端报告的失败
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Failure {
    pub message: Option<String>,
    pub suggestion: Option<String>,
}

/// 已校验的响应信封
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure(Failure),
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("response body is not JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("response envelope is not a JSON object")]
    NotObject,
    #[error("invalid response envelope: {0}")]
    InvalidHeader(#[source] serde_json::Error),
    #[error("success envelope has no `{0}` payload")]
    MissingPayload(&'static str),
    #[error("invalid response payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

#[derive(Deserialize)]
struct Header {
    // The server's exception handlers reply with a bare `{"error": ...}`.
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default)]
    recommendation: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    pub fn from_slice(body: &[u8], payload: Payload) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_slice(body).map_err(EnvelopeError::NotJson)?;
        Self::from_value(&value, payload)
    }

    pub fn from_value(value: &Value, payload: Payload) -> Result<Self, EnvelopeError> {
        if !value.is_object() {
            return Err(EnvelopeError::NotObject);
        }

        let header = Header::deserialize(value).map_err(EnvelopeError::InvalidHeader)?;
        if !header.success {
            return Ok(Envelope::Failure(Failure {
                message: header.error.or(header.message),
                suggestion: header.suggestion.or(header.recommendation),
            }));
        }

        let payload = match payload {
            Payload::Field(name) => match value.get(name) {
                Some(Value::Null) | None => return Err(EnvelopeError::MissingPayload(name)),
                Some(inner) => inner,
            },
            Payload::Inline => value,
        };

        T::deserialize(payload)
            .map(Envelope::Success)
            .map_err(EnvelopeError::InvalidPayload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CaptureResult, TemplateList};
    use serde_json::json;

    #[test]
    fn test_success_with_data_field() {
        let envelope = Envelope::<CaptureResult>::from_value(
            &json!({"success": true, "data": {"imagen": "abc", "width": 500, "height": 300}}),
            Payload::Field("data"),
        )
        .unwrap();

        assert_eq!(envelope, Envelope::Success(CaptureResult::new("abc", 500, 300)));
    }

    #[test]
    fn test_failure_message() {
        let envelope = Envelope::<CaptureResult>::from_slice(
            br#"{"success": false, "error": "sensor not found"}"#,
            Payload::Field("data"),
        )
        .unwrap();

        assert_eq!(
            envelope,
            Envelope::Failure(Failure {
                message: Some("sensor not found".to_string()),
                suggestion: None,
            })
        );
    }

    #[test]
    fn test_bare_error_is_failure() {
        let envelope = Envelope::<CaptureResult>::from_value(
            &json!({
                "error": "No se pudo inicializar el dispositivo",
                "device_initialized": false,
                "suggestion": "Verifique la conexión del dispositivo"
            }),
            Payload::Field("data"),
        )
        .unwrap();

        let Envelope::Failure(failure) = envelope else {
            panic!("expected failure envelope");
        };
        assert_eq!(
            failure.message.as_deref(),
            Some("No se pudo inicializar el dispositivo")
        );
        assert_eq!(
            failure.suggestion.as_deref(),
            Some("Verifique la conexión del dispositivo")
        );
    }

    #[test]
    fn test_failure_falls_back_to_message() {
        let envelope = Envelope::<CaptureResult>::from_value(
            &json!({"success": false, "message": "Error al reinicializar", "device_ready": false}),
            Payload::Inline,
        )
        .unwrap();

        assert_eq!(
            envelope,
            Envelope::Failure(Failure {
                message: Some("Error al reinicializar".to_string()),
                suggestion: None,
            })
        );
    }

    #[test]
    fn test_recommendation_is_suggestion() {
        let envelope = Envelope::<TemplateList>::from_value(
            &json!({
                "success": false,
                "message": "Los métodos de reset USB programático fallaron",
                "recommendation": "Usar /reset-device primero"
            }),
            Payload::Inline,
        )
        .unwrap();

        assert_eq!(
            envelope,
            Envelope::Failure(Failure {
                message: Some("Los métodos de reset USB programático fallaron".to_string()),
                suggestion: Some("Usar /reset-device primero".to_string()),
            })
        );
    }

    #[test]
    fn test_missing_data() {
        let result =
            Envelope::<CaptureResult>::from_value(&json!({"success": true}), Payload::Field("data"));
        assert!(matches!(result, Err(EnvelopeError::MissingPayload("data"))));

        let result = Envelope::<CaptureResult>::from_value(
            &json!({"success": true, "data": null}),
            Payload::Field("data"),
        );
        assert!(matches!(result, Err(EnvelopeError::MissingPayload("data"))));
    }

    #[test]
    fn test_invalid_payload() {
        let result = Envelope::<CaptureResult>::from_value(
            &json!({"success": true, "data": {"imagen": "abc", "width": "wide"}}),
            Payload::Field("data"),
        );
        assert!(matches!(result, Err(EnvelopeError::InvalidPayload(_))));
    }

    #[test]
    fn test_inline_payload() {
        let envelope = Envelope::<TemplateList>::from_value(
            &json!({"success": true, "templates": ["alice", "bob"], "count": 2}),
            Payload::Inline,
        )
        .unwrap();

        assert_eq!(
            envelope,
            Envelope::Success(TemplateList {
                templates: vec!["alice".to_string(), "bob".to_string()],
                count: 2,
            })
        );
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            Envelope::<TemplateList>::from_slice(b"[1, 2]", Payload::Inline),
            Err(EnvelopeError::NotObject)
        ));
        assert!(matches!(
            Envelope::<TemplateList>::from_slice(b"<html>", Payload::Inline),
            Err(EnvelopeError::NotJson(_))
        ));
    }
}
