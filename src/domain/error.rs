//! Domain error types.

/// A grammar violation with the character offset of the offending token.
#[derive(Debug, Clone, thiserror::Error)]
#[error("syntax error at position {position}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub position: usize,
}

impl SyntaxError {
    /// Format the error with a caret under the offending column of the line
    /// it occurred on.
    pub fn display_with_context(&self, input: &str) -> String {
        let position = self.position.min(input.len());
        let line_start = input[..position].rfind('\n').map_or(0, |i| i + 1);
        let line_end = input[line_start..]
            .find('\n')
            .map_or(input.len(), |i| line_start + i);
        let line = &input[line_start..line_end];
        let caret = " ".repeat(position - line_start) + "^";
        format!("{line}\n{caret}\n{err}", err = self)
    }
}

/// The strategy is grammatical but meaningless: unknown indicator, wrong
/// argument count, duplicate ENTRY/EXIT section.
#[derive(Debug, Clone, thiserror::Error)]
#[error("semantic error: {reason}")]
pub struct SemanticError {
    pub reason: String,
}

impl SemanticError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Top-level error type for stratlang.
#[derive(Debug, thiserror::Error)]
pub enum StratlangError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StratlangError> for std::process::ExitCode {
    fn from(err: &StratlangError) -> Self {
        let code: u8 = match err {
            StratlangError::Io(_) => 1,
            StratlangError::ConfigParse { .. }
            | StratlangError::ConfigMissing { .. }
            | StratlangError::ConfigInvalid { .. } => 2,
            StratlangError::Data { .. } | StratlangError::InvalidSeries { .. } => 3,
            StratlangError::Syntax(_) | StratlangError::Semantic(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
