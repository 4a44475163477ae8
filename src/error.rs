use std::path::PathBuf;
use thiserror::Error;

/// The syntax adapter could not tokenize or parse a source file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    /// 1-based.
    pub line: usize,
    /// 1-based, counted in chars.
    pub column: usize,
}

impl ParseError {
    pub(crate) fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self { message: message.into(), line, column }
    }
}

/// Setup mistakes caught while compiling validators, before any candidate is checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A property references a type name with no registered validator.
    #[error("could not find validator for type `{name}` (property `{key}`)")]
    MissingValidator { key: String, name: String },

    /// Keyed validators were requested for a type without properties.
    #[error("type `{name}` is not an object type")]
    NotAnObject { name: String },
}

/// Crate-level error for the file and cache entry points.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid registry: {0}")]
    Registry(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_positions_are_one_based() {
        let src = "type A = string;\ntype B = #;";
        let offset = src.find('#').unwrap();
        let err = ParseError::at(src, offset, "unexpected character `#`");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 10);
        assert_eq!(err.to_string(), "unexpected character `#` at line 2, column 10");
    }

    #[test]
    fn config_error_messages_name_the_type() {
        let err = ConfigError::MissingValidator { key: "id".into(), name: "GUID".into() };
        assert_eq!(err.to_string(), "could not find validator for type `GUID` (property `id`)");
    }
}
