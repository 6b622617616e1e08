use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    IO,
    Format,
    Midi,
}

impl LoadErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            "E1001" => Self::IO,
            "E1002" => Self::Format,
            "E2001" | "E2002" => Self::Midi,

            _ => Self::Format,
        }
    }
}

/// Hard failures only. Malformed records inside a readable source never produce one.
#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct LoadError {
    pub code: &'static str,
    pub kind: LoadErrorKind,
    pub message: String,
    pub file: Option<String>,
}

impl LoadError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: LoadErrorKind::from_code(code),
            message: message.into(),
            file: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl From<midly::Error> for LoadError {
    fn from(e: midly::Error) -> Self {
        LoadError::new("E2001", format!("invalid midi file: {e}"))
    }
}
