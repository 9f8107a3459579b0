use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Closed,
    UnexpectedEof,
    Unseekable,
    BrokenPipe,
    NotOpenForWriting,
    LockViolation,
    IsDir,
    OutOfMemory,
    AccessDenied,
    Unexpected,
    Undocumented(i32),
    NotFound,
    Busy,
    Usage,
}

impl ErrorKind {
    /// True for kinds that originate from the engine's status code table.
    pub fn is_foreign(self) -> bool {
        !matches!(self, ErrorKind::NotFound | ErrorKind::Busy | ErrorKind::Usage)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Closed => "Closed",
            ErrorKind::UnexpectedEof => "UnexpectedEOF",
            ErrorKind::Unseekable => "Unseekable",
            ErrorKind::BrokenPipe => "BrokenPipe",
            ErrorKind::NotOpenForWriting => "NotOpenForWriting",
            ErrorKind::LockViolation => "LockViolation",
            ErrorKind::IsDir => "IsDir",
            ErrorKind::OutOfMemory => "OutOfMemory",
            ErrorKind::AccessDenied => "AccessDenied",
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Undocumented(_) => "Undocumented",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Busy => "Busy",
            ErrorKind::Usage => "Usage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Undocumented(code) => write!(f, "Undocumented({code})"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    code: Option<i32>,
    path: Option<PathBuf>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            code: None,
            path: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Raw engine status code, present only when the error came from the engine.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(code) = self.code {
            write!(f, " (code: {code})")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Unexpected | ErrorKind::Undocumented(_) => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Closed => 4,
        ErrorKind::Busy | ErrorKind::LockViolation => 5,
        ErrorKind::AccessDenied | ErrorKind::NotOpenForWriting => 6,
        ErrorKind::UnexpectedEof => 7,
        ErrorKind::Unseekable | ErrorKind::BrokenPipe | ErrorKind::IsDir => 8,
        ErrorKind::OutOfMemory => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Unexpected, 1),
            (ErrorKind::Undocumented(77), 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::NotFound, 3),
            (ErrorKind::Closed, 4),
            (ErrorKind::Busy, 5),
            (ErrorKind::LockViolation, 5),
            (ErrorKind::AccessDenied, 6),
            (ErrorKind::UnexpectedEof, 7),
            (ErrorKind::IsDir, 8),
            (ErrorKind::OutOfMemory, 9),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context() {
        let err = Error::new(ErrorKind::IsDir)
            .with_message("open /tmp: Is a directory")
            .with_code(54)
            .with_path("/tmp");
        assert_eq!(
            err.to_string(),
            "IsDir: open /tmp: Is a directory (code: 54) (path: /tmp)"
        );
    }

    #[test]
    fn undocumented_kind_shows_raw_code() {
        let err = Error::new(ErrorKind::Undocumented(4242)).with_code(4242);
        assert_eq!(err.to_string(), "Undocumented(4242) (code: 4242)");
        assert_eq!(err.kind().as_str(), "Undocumented");
    }

    #[test]
    fn local_kinds_are_not_foreign() {
        assert!(!ErrorKind::NotFound.is_foreign());
        assert!(!ErrorKind::Busy.is_foreign());
        assert!(!ErrorKind::Usage.is_foreign());
        assert!(ErrorKind::Closed.is_foreign());
        assert!(ErrorKind::Undocumented(100).is_foreign());
    }
}
