use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::ingest::projector::{project, AnsStory};
use crate::ingest::writer::IndexWriter;

/// Namespace prefix of story lifecycle events on the wire.
pub const STORY_EVENT_PREFIX: &str = "story.";

/// A content lifecycle event as delivered by the content-management system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Update,
    Publish,
    Unpublish,
    Delete,
}

impl EventKind {
    pub fn operation(&self) -> Operation {
        match self {
            EventKind::Update | EventKind::Publish => Operation::Index,
            EventKind::Unpublish | EventKind::Delete => Operation::Delete,
        }
    }
}

impl FromStr for EventKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(STORY_EVENT_PREFIX) {
            Some("update") => Ok(EventKind::Update),
            Some("publish") => Ok(EventKind::Publish),
            Some("unpublish") => Ok(EventKind::Unpublish),
            Some("delete") => Ok(EventKind::Delete),
            _ => Err(AppError::UnsupportedEvent(s.to_string())),
        }
    }
}

/// The index operation an event turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Index,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Index => write!(f, "index"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Result of a successfully routed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub status: String,
    pub operation: Operation,
    pub id: String,
    /// The engine's own outcome token, passed through untouched.
    pub engine_result: String,
}

/// Route one event to exactly one index write.
///
/// The event type and the payload id are checked before anything is sent
/// to the engine. Deletes read only the id. Nothing is retried.
pub async fn route(event: &ContentEvent, writer: &IndexWriter) -> Result<OutcomeRecord, AppError> {
    let kind: EventKind = event.event_type.parse()?;
    let operation = kind.operation();
    let missing_id = || AppError::Validation(format!("missing id for {operation}"));

    let (id, engine_result) = match operation {
        Operation::Index => {
            let story = AnsStory::from_payload(&event.payload)?;
            let id = story.story_id().ok_or_else(missing_id)?.to_string();
            tracing::info!(event_type = %event.event_type, id = %id, "Routing content event");

            let doc = project(&story)?;
            let result = writer.upsert(&doc).await?;
            (id, result)
        }
        Operation::Delete => {
            let id = payload_id(&event.payload).ok_or_else(missing_id)?.to_string();
            tracing::info!(event_type = %event.event_type, id = %id, "Routing content event");

            let result = writer.delete(&id).await?;
            (id, result)
        }
    };

    Ok(OutcomeRecord {
        status: "success".to_string(),
        operation,
        id,
        engine_result,
    })
}

/// The trimmed `_id` of a raw payload, if it is a non-blank string.
fn payload_id(payload: &serde_json::Value) -> Option<&str> {
    payload
        .get("_id")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}
