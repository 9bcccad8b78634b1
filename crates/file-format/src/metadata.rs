use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive data stored next to the aggregation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblageMetadata {
    pub name: String,
    /// Free text, e.g. the parameters a run was made with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl AssemblageMetadata {
    /// Metadata with the given name, created now.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            created: now,
            modified: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark as modified now. Never moves `modified` before `created`.
    pub fn touch(&mut self) {
        self.modified = Utc::now().max(self.created);
    }
}
