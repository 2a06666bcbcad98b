use std::io;
use std::path::PathBuf;

use quick_error::quick_error;

// The error type used throughout this crate.
quick_error! {
    #[derive(Debug)]
    pub enum Error {
        Io(err: String) {
            display("I/O error: {}", err)
        }
        Config(err: String) {
            display("configuration error: {}", err)
        }
        InvalidFormat(err: String) {
            display("invalid format: {}", err)
        }
        Effector(path: PathBuf, err: String) {
            display("filesystem effect failed for {}: {}", path.display(), err)
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(format!("{error}"))
    }
}

impl Error {
    /// Wraps an I/O error with the path on which the effect was attempted.
    pub fn effector(path: impl Into<PathBuf>, source: io::Error) -> Error {
        Error::Effector(path.into(), format!("{source}"))
    }
}

/// The result type used in this crate.
pub type Result<T> = std::result::Result<T, Error>;
