use crate::core::Statement;

/// A change to the store's contents
///
/// `BatchStarted`/`BatchFinished` bracket a group of changes from one
/// source; they are advisory and carry no locking semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Added { source: String, statements: Vec<Statement>, count: i64 },
    Removed { source: String, statements: Vec<Statement>, count: i64 },
    BatchStarted { source: String },
    BatchFinished { source: String },
}

impl ChangeEvent {
    pub fn added(source: impl Into<String>, statements: Vec<Statement>) -> Self {
        let count = statements.len() as i64;
        ChangeEvent::Added { source: source.into(), statements, count }
    }

    pub fn removed(source: impl Into<String>, statements: Vec<Statement>) -> Self {
        let count = statements.len() as i64;
        ChangeEvent::Removed { source: source.into(), statements, count }
    }

    pub fn source(&self) -> &str {
        match self {
            ChangeEvent::Added { source, .. }
            | ChangeEvent::Removed { source, .. }
            | ChangeEvent::BatchStarted { source }
            | ChangeEvent::BatchFinished { source } => source,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Added { .. } => "added",
            ChangeEvent::Removed { .. } => "removed",
            ChangeEvent::BatchStarted { .. } => "batch_started",
            ChangeEvent::BatchFinished { .. } => "batch_finished",
        }
    }
}
