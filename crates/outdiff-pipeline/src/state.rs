use std::fmt;

/// Where a pipeline run currently stands.
///
/// A run moves strictly forward through
/// `Idle → WorkspacePrepared → CurrentExported → SnapshotRetrieved →
/// CompareExported → Diffed → Done`. Any failure moves it to `Failed`, which
/// like `Done` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    WorkspacePrepared,
    CurrentExported,
    SnapshotRetrieved,
    CompareExported,
    Diffed,
    Done,
    Failed,
}

impl PipelineState {
    /// The state reached when the current step succeeds.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::WorkspacePrepared),
            Self::WorkspacePrepared => Some(Self::CurrentExported),
            Self::CurrentExported => Some(Self::SnapshotRetrieved),
            Self::SnapshotRetrieved => Some(Self::CompareExported),
            Self::CompareExported => Some(Self::Diffed),
            Self::Diffed => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `to` is a legal transition from this state.
    pub fn can_transition_to(self, to: Self) -> bool {
        match to {
            Self::Failed => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::WorkspacePrepared => "workspace-prepared",
            Self::CurrentExported => "current-exported",
            Self::SnapshotRetrieved => "snapshot-retrieved",
            Self::CompareExported => "compare-exported",
            Self::Diffed => "diffed",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
