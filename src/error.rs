/// A replicore error. Protocol-level outcomes (stale terms, rejected
/// appends, refused votes) are not errors; they are expressed in the RPC
/// response types. Errors are reserved for corrupt or unreadable data and
/// for failures of the underlying storage medium.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Invalid or corrupt data, e.g. an undecodable log entry.
    InvalidData(String),
    /// A storage input/output error.
    IO(String),
}

/// A replicore result returning Error.
pub type Result<T> = std::result::Result<T, Error>;

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::IO(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IO(err.to_string())
    }
}
