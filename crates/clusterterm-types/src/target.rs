use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

// ============================================================================
// Targets
// ============================================================================

/// Kind of cluster resource a shell can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Task,
    Container,
    Vm,
}

impl TargetKind {
    /// Path segment used in terminal endpoints
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Task => "task",
            TargetKind::Container => "container",
            TargetKind::Vm => "vm",
        }
    }

    /// Collection segment used by the REST listing endpoints
    pub fn collection(&self) -> &'static str {
        match self {
            TargetKind::Task => "tasks",
            TargetKind::Container => "containers",
            TargetKind::Vm => "vms",
        }
    }
}

impl FromStr for TargetKind {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "task" | "tasks" => Ok(TargetKind::Task),
            "container" | "containers" => Ok(TargetKind::Container),
            "vm" | "vms" | "virtual-machine" => Ok(TargetKind::Vm),
            _ => Err(SessionError::InvalidTarget(format!(
                "unknown target kind '{}'. Valid options: 'task', 'container', 'vm'",
                s
            ))),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The task, container or VM a session attaches to.
///
/// The identifier becomes a single URL path segment, so it is validated on
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    kind: TargetKind,
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Target {
    pub fn new(kind: TargetKind, id: impl Into<String>) -> Result<Self, SessionError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SessionError::InvalidTarget(format!(
                "{} identifier is empty",
                kind
            )));
        }
        if id
            .chars()
            .any(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace())
        {
            return Err(SessionError::InvalidTarget(format!(
                "{} identifier '{}' is not a single path segment",
                kind, id
            )));
        }
        Ok(Self { kind, id, name: None })
    }

    /// Attach the human-readable name supplied by the resource listing
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.is_empty()).then_some(name);
        self
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Identity used to enforce one open session per target (ignores the name)
    pub fn key(&self) -> (TargetKind, String) {
        (self.kind, self.id.clone())
    }

    /// `kind/name-or-id`, for status lines and logs
    pub fn label(&self) -> String {
        format!("{}/{}", self.kind, self.name.as_deref().unwrap_or(&self.id))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

// ============================================================================
// Dimensions
// ============================================================================

/// Terminal geometry in character cells. Both values are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDimensions")]
pub struct Dimensions {
    rows: u16,
    cols: u16,
}

#[derive(Deserialize)]
struct RawDimensions {
    rows: u16,
    cols: u16,
}

impl TryFrom<RawDimensions> for Dimensions {
    type Error = SessionError;

    fn try_from(raw: RawDimensions) -> Result<Self, Self::Error> {
        Dimensions::new(raw.rows, raw.cols)
    }
}

impl Dimensions {
    pub fn new(rows: u16, cols: u16) -> Result<Self, SessionError> {
        if rows == 0 || cols == 0 {
            return Err(SessionError::InvalidDimensions { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}
