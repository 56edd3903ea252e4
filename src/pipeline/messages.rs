//! Diagnostics collected during one compilation.

use serde::Serialize;
use strum::{Display, EnumIter};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Syntax,
    Semantic,
    Scheduling,
    Optimization,
    CodeGen,
    Runtime,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub severity: Severity,
    pub category: Category,
    pub text: String,
    pub source: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub suggestion: Option<String>,
}

impl Message {
    pub fn new(severity: Severity, category: Category, text: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            text: text.into(),
            source: None,
            line: None,
            column: None,
            suggestion: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_location(mut self, line: usize, column: Option<usize>) -> Self {
        self.line = Some(line);
        self.column = column;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.category)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        if let Some(line) = self.line {
            match self.column {
                Some(column) => write!(f, " at {}:{}", line, column)?,
                None => write!(f, " at line {}", line)?,
            }
        }
        write!(f, ": {}", self.text)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (hint: {})", suggestion)?;
        }
        Ok(())
    }
}

/// Ordered, append-only sink for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct MessageCollector {
    messages: Vec<Message>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        let source = message.source.as_deref().unwrap_or("core");
        match message.severity {
            Severity::Debug => debug!(source, category = %message.category, "{}", message.text),
            Severity::Info => info!(source, category = %message.category, "{}", message.text),
            Severity::Warning => warn!(source, category = %message.category, "{}", message.text),
            Severity::Error | Severity::Fatal => {
                error!(source, category = %message.category, severity = %message.severity, "{}", message.text)
            }
        }
        self.messages.push(message);
    }

    pub fn debug(&mut self, category: Category, source: &str, text: impl Into<String>) {
        self.push(Message::new(Severity::Debug, category, text).with_source(source));
    }

    pub fn info(&mut self, category: Category, source: &str, text: impl Into<String>) {
        self.push(Message::new(Severity::Info, category, text).with_source(source));
    }

    pub fn warning(&mut self, category: Category, source: &str, text: impl Into<String>) {
        self.push(Message::new(Severity::Warning, category, text).with_source(source));
    }

    pub fn error(&mut self, category: Category, source: &str, text: impl Into<String>) {
        self.push(Message::new(Severity::Error, category, text).with_source(source));
    }

    pub fn fatal(&mut self, category: Category, source: &str, text: impl Into<String>) {
        self.push(Message::new(Severity::Fatal, category, text).with_source(source));
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.push(message);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(Message::is_error)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Warning)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.severity == severity)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_error())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.with_severity(severity).count()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
