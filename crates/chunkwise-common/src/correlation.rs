use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation ID for tying together the log lines of one request or job
///
/// Uses UUID v4. A summarization job reuses its job id as the correlation id
/// so API responses, retry warnings and progress updates share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation ID using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Uuid::try_parse(id).map_or_else(|_| Self(Uuid::new_v4()), Self)
    }
}
