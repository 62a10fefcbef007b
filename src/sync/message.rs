//! Messages exchanged between tabs about refresh progress.

use serde::{Deserialize, Serialize};

/// A refresh lifecycle event announced by one tab to its siblings.
///
/// Serialized as JSON with a `type` tag:
///
/// ```json
/// {"type": "refresh_started"}
/// {"type": "refresh_completed", "access_token": "...", "refresh_token": "..."}
/// {"type": "refresh_failed"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncMessage {
    /// The sender began calling the refresh endpoint.
    #[serde(rename = "refresh_started")]
    Started,

    /// The sender's refresh succeeded.
    #[serde(rename = "refresh_completed")]
    Completed {
        access_token: String,
        /// Rotated refresh token, when the backend issued one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refresh_token: Option<String>,
    },

    /// The sender's refresh failed; the session is over.
    #[serde(rename = "refresh_failed")]
    Failed,
}

impl SyncMessage {
    /// Wire tag of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::Started => "refresh_started",
            SyncMessage::Completed { .. } => "refresh_completed",
            SyncMessage::Failed => "refresh_failed",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            SyncMessage::Started.to_json().unwrap(),
            r#"{"type":"refresh_started"}"#
        );
        assert_eq!(
            SyncMessage::Failed.to_json().unwrap(),
            r#"{"type":"refresh_failed"}"#
        );

        let completed = SyncMessage::Completed {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
        };
        let value: serde_json::Value =
            serde_json::from_str(&completed.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "refresh_completed");
        assert_eq!(value["access_token"], "a");
        assert_eq!(value["refresh_token"], "r");
    }

    #[test]
    fn test_completed_without_refresh_token() {
        let msg = SyncMessage::from_json(r#"{"type":"refresh_completed","access_token":"a"}"#)
            .unwrap();
        assert_eq!(
            msg,
            SyncMessage::Completed {
                access_token: "a".to_string(),
                refresh_token: None,
            }
        );
        assert!(!msg.to_json().unwrap().contains("refresh_token"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(SyncMessage::from_json(r#"{"type":"logout"}"#).is_err());
        assert!(SyncMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_kind() {
        assert_eq!(SyncMessage::Started.kind(), "refresh_started");
        assert_eq!(SyncMessage::Failed.kind(), "refresh_failed");
    }
}
