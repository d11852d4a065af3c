/// Broad failure categories surfaced to the orchestrating caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad command-line or configuration values.
    Usage,
    /// Filesystem or encoding failures while reading/writing artifacts.
    Io,
    /// A dataset is missing a required column or contains malformed cells.
    DataShape,
    /// Not every reference curve received a candidate.
    Selection,
    /// The test batch could not be classified.
    Classification,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Usage | ErrorKind::Io => 2,
            ErrorKind::DataShape => 3,
            ErrorKind::Selection => 4,
            ErrorKind::Classification => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Usage => "usage error",
            ErrorKind::Io => "i/o error",
            ErrorKind::DataShape => "data shape failure",
            ErrorKind::Selection => "selection failure",
            ErrorKind::Classification => "classification failure",
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataShape, message)
    }

    pub fn selection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Selection, message)
    }

    pub fn classification(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Classification, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
