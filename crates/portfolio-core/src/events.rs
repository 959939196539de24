use serde::{Deserialize, Serialize};

/// Progress events emitted by the AI blog writer.
///
/// Serialized with a `type` tag so that SSE clients can dispatch on
/// `data.type` as well as on the event name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlogEvent {
    /// A generation run advanced to a new step.
    GenerateProgress {
        keyword: String,
        saved: usize,
        total_target: usize,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        current_title: Option<String>,
        status: GenerateStatus,
    },

    /// A generation run finished. `failed` is set when nothing was saved.
    GenerateDone {
        keyword: String,
        saved: usize,
        total_target: usize,
        failed: bool,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<String>,
    },

    /// A rejected AI post was rewritten (or the rewrite failed).
    RegenerateDone { blog_id: i64, success: bool },
}

/// Step within a generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateStatus {
    GeneratingTitles,
    Writing,
    Saved,
}

impl BlogEvent {
    /// SSE event name for this event.
    pub fn kind(&self) -> &'static str {
        match self {
            BlogEvent::GenerateProgress { .. } => "generate_progress",
            BlogEvent::GenerateDone { .. } => "generate_done",
            BlogEvent::RegenerateDone { .. } => "regenerate_done",
        }
    }

    /// JSON payload for the broadcast channel.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "type": self.kind() }))
    }
}
