use crate::core::diagnostics::Severity;

/// A message shown to the designer while editing a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMessage {
    /// An operation was refused or the graph is broken.
    Error(String),
    /// Suspicious but usable.
    Warning(String),
    Note(String),
}

impl LogMessage {
    pub fn severity(&self) -> Severity {
        match self {
            LogMessage::Error(_) => Severity::Error,
            LogMessage::Warning(_) => Severity::Warning,
            LogMessage::Note(_) => Severity::Note,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            LogMessage::Error(text) | LogMessage::Warning(text) | LogMessage::Note(text) => text,
        }
    }
}

/// Editor-side message log of a graph being edited.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    pub messages: Vec<LogMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::error!("{}", msg);
        self.messages.push(LogMessage::Error(msg));
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::warn!("{}", msg);
        self.messages.push(LogMessage::Warning(msg));
    }

    pub fn add_note(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::info!("{}", msg);
        self.messages.push(LogMessage::Note(msg));
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| matches!(m, LogMessage::Error(_)))
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|m| matches!(m, LogMessage::Warning(_)))
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| matches!(m, LogMessage::Error(_)))
            .map(LogMessage::text)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Writes every message to the `log` facade at debug level.
    pub fn log_summary(&self) {
        if self.messages.is_empty() {
            log::debug!("Graph message log is empty");
            return;
        }

        for message in &self.messages {
            log::debug!("{:?}: {}", message.severity(), message.text());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_log_tracks_severity() {
        let mut log = MessageLog::new();
        assert!(!log.has_errors());

        log.add_warning("pin renamed");
        log.add_error("AddOn rejected");
        log.add_note("graph refreshed");

        assert!(log.has_errors());
        assert!(log.has_warnings());
        assert_eq!(log.errors().collect::<Vec<_>>(), vec!["AddOn rejected"]);
        assert_eq!(log.messages[2].severity(), Severity::Note);

        log.clear();
        assert!(log.messages.is_empty());
    }
}
