//! Loosely typed enqueue request, as it arrives from an outer surface.

use serde::{Deserialize, Serialize};

use super::errors::QueueError;
use super::priority::Priority;

/// `{ "payload": ..., "priority": "high" }`; priority defaults to normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub payload: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl EnqueueRequest {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            payload,
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Parsed priority; an absent field means normal.
    pub fn priority(&self) -> Result<Priority, QueueError> {
        match self.priority.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Priority::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_priority_is_normal() {
        let request: EnqueueRequest =
            serde_json::from_value(json!({ "payload": { "url": "a" } })).unwrap();
        assert_eq!(request.priority().unwrap(), Priority::Normal);
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let request = EnqueueRequest::new(json!({})).with_priority("urgent");
        assert_eq!(
            request.priority(),
            Err(QueueError::InvalidPriority("urgent".to_string()))
        );
    }
}
