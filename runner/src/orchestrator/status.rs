/// Run status as reported by the platform, closed over the values the
/// orchestrator branches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    Failed,
    Aborted,
    /// Anything else, including `READY`, `RUNNING`, `TIMING-OUT`, `ABORTING`.
    InProgress(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "ABORTED" => Self::Aborted,
            other => Self::InProgress(other.to_string()),
        }
    }
}
