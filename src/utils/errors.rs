use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Pl0Error {
    // File and I/O errors
    #[error("File read error: {0}")]
    FileReadError(String),
    #[error("File write error: {0}")]
    FileWriteError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    // Lexical analysis errors
    #[error("Lexer error at line {line}: {message}")]
    LexerError { message: String, line: usize },
    #[error("Unknown token '{token}' at line {line}")]
    UnknownToken { token: char, line: usize },
    #[error("Unterminated comment starting at line {line}")]
    UnterminatedComment { line: usize },
    #[error("Invalid number '{number}' at line {line}")]
    InvalidNumber { number: String, line: usize },

    // Parsing errors
    #[error("Syntax error at line {line}: expected {expected}, found {found}")]
    SyntaxError {
        expected: String,
        found: String,
        line: usize,
    },
    #[error("Unexpected token {token} at line {line}")]
    UnexpectedToken { token: String, line: usize },

    // Semantic analysis errors
    #[error("Symbol '{name}' already defined in scope '{scope}'")]
    SymbolAlreadyDefined { name: String, scope: String },
    #[error("Invalid identifier '{identifier}'")]
    InvalidIdentifier { identifier: String },
    #[error("Cannot drop the global scope")]
    GlobalScopeDrop,

    // Plugin pipeline errors
    #[error("Plugin '{name}' is already registered")]
    DuplicatePlugin { name: String },
    #[error("Unknown plugin '{name}'")]
    UnknownPlugin { name: String },
    #[error("Output '{name}' was already produced by an earlier plugin")]
    DuplicateArtifact { name: String },
    #[error("Plugin '{plugin}' failed: {message}")]
    PluginFailed { plugin: String, message: String },
    #[error("Dependency graph could not be ordered: {0}")]
    SchedulingError(String),

    // Code generation errors
    #[error("Code generation error: {message}")]
    CodeGenError { message: String },
    #[error("Output formatting error")]
    FormatError(#[from] std::fmt::Error),

    // Compilation pipeline errors
    #[error("Compilation error in {stage}: {message}")]
    CompilationError { stage: String, message: String },

    #[error("{0}")]
    GenericError(String),
}

impl Pl0Error {
    /// Create a lexer error with line information
    pub fn lexer_error(message: impl Into<String>, line: usize) -> Self {
        Pl0Error::LexerError {
            message: message.into(),
            line,
        }
    }

    /// Create a syntax error
    pub fn syntax_error(expected: impl Into<String>, found: impl Into<String>, line: usize) -> Self {
        Pl0Error::SyntaxError {
            expected: expected.into(),
            found: found.into(),
            line,
        }
    }

    /// Create a code generation error
    pub fn codegen_error(message: impl Into<String>) -> Self {
        Pl0Error::CodeGenError {
            message: message.into(),
        }
    }

    pub fn plugin_error(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Pl0Error::PluginFailed {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    pub fn compilation_error(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Pl0Error::CompilationError {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Pl0Error::LexerError { line, .. }
            | Pl0Error::UnknownToken { line, .. }
            | Pl0Error::UnterminatedComment { line }
            | Pl0Error::InvalidNumber { line, .. }
            | Pl0Error::SyntaxError { line, .. }
            | Pl0Error::UnexpectedToken { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub fn is_frontend_error(&self) -> bool {
        matches!(
            self,
            Pl0Error::LexerError { .. }
                | Pl0Error::UnknownToken { .. }
                | Pl0Error::UnterminatedComment { .. }
                | Pl0Error::InvalidNumber { .. }
                | Pl0Error::SyntaxError { .. }
                | Pl0Error::UnexpectedToken { .. }
        )
    }
}

impl From<String> for Pl0Error {
    fn from(msg: String) -> Self {
        Pl0Error::GenericError(msg)
    }
}

impl From<&str> for Pl0Error {
    fn from(msg: &str) -> Self {
        Pl0Error::GenericError(msg.to_string())
    }
}

pub type Pl0Result<T> = Result<T, Pl0Error>;
