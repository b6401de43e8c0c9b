use crate::api::ApiObject;
use crate::errors::ApiCallError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CALL_MESSAGE_TYPE: &str = "scorm-api-call";

#[derive(Debug, Deserialize)]
struct ApiCallMessage {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    args: Vec<Value>,
}

/// Reply posted back to the calling frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeReply {
    #[serde(rename = "scorm-api-response")]
    Response { id: Value, result: String },
    #[serde(rename = "scorm-api-error")]
    Error { id: Value, error: String },
}

/// Relays JSON call messages from frames that cannot reach the API object
/// directly.
#[derive(Clone)]
pub struct MessageBridge {
    api: ApiObject,
}

impl MessageBridge {
    pub fn new(api: ApiObject) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiObject {
        &self.api
    }

    /// Handles one message. Messages that are not API calls yield `None`.
    pub fn handle(&self, message: &Value) -> Option<BridgeReply> {
        if message.get("type").and_then(Value::as_str) != Some(CALL_MESSAGE_TYPE) {
            return None;
        }
        let id = message.get("id").cloned().unwrap_or(Value::Null);
        let reply = match self.dispatch(message) {
            Ok(result) => BridgeReply::Response { id, result },
            Err(error) => {
                tracing::debug!(
                    session_id = self.api.session().id(),
                    %error,
                    "bridge call rejected"
                );
                BridgeReply::Error {
                    id,
                    error: error.to_string(),
                }
            }
        };
        Some(reply)
    }

    fn dispatch(&self, message: &Value) -> Result<String, ApiCallError> {
        let call = ApiCallMessage::deserialize(message)
            .map_err(|error| ApiCallError::Malformed(error.to_string()))?;
        let args = call
            .args
            .iter()
            .map(argument_string)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(id = %call.id, method = %call.method, "bridge call");
        self.api.call(&call.method, &args)
    }

    /// Same as [`MessageBridge::handle`] for a raw JSON string. Unparseable
    /// input is ignored like any other foreign message.
    pub fn handle_str(&self, raw: &str) -> Option<String> {
        let message: Value = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(error) => {
                tracing::debug!(%error, "ignoring non-JSON message");
                return None;
            }
        };
        let reply = self.handle(&message)?;
        match serde_json::to_string(&reply) {
            Ok(encoded) => Some(encoded),
            Err(error) => {
                tracing::warn!(%error, "bridge reply encoding failed");
                None
            }
        }
    }
}

fn argument_string(value: &Value) -> Result<String, ApiCallError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(ApiCallError::Malformed(
            "arguments must be strings, numbers, booleans or null".to_string(),
        )),
    }
}
