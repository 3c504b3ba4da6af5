//! Outcome status of a generation request.

use serde::{Deserialize, Serialize};

/// Status recorded on every patch record and returned by the API.
///
/// - `Success`       -- non-empty diff that applies cleanly.
/// - `Warning`       -- non-empty diff, but validation was soft or incomplete.
/// - `Failed`        -- synthesis ran but produced nothing usable, or a hard conflict.
/// - `NotGenerated`  -- the analysis contained no file proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    Success,
    Warning,
    Failed,
    NotGenerated,
}

impl PatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Failed => "failed",
            Self::NotGenerated => "not_generated",
        }
    }

    /// Lower `self` to `Warning` when something degraded a successful run.
    pub fn degrade(self) -> Self {
        match self {
            Self::Success => Self::Warning,
            other => other,
        }
    }
}

impl std::fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
