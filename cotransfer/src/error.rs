use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A transfer was attempted on a channel whose producer has finished.
    ChannelClosed,
    /// A side used the channel out of turn, or read a value that was never sent.
    ProtocolViolation,
    /// The coroutine stack could not be allocated.
    StackAllocation,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error { kind }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::ChannelClosed => write!(f, "Channel closed"),
            ErrorKind::ProtocolViolation => write!(f, "Transfer protocol violation"),
            ErrorKind::StackAllocation => write!(f, "Failed to allocate coroutine stack"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
