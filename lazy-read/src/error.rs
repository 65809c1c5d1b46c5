use std::fmt;

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    /// The content is not UTF-8; `valid_up_to` bytes of `len` decoded cleanly.
    NotUtf8 { valid_up_to: usize, len: usize },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IO(i) => write!(f, "IO Error: {}", i),
            Error::NotUtf8 { valid_up_to, len } => write!(
                f,
                "UTF8 Error: invalid byte at offset {} of {}",
                valid_up_to, len
            ),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::IO(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
