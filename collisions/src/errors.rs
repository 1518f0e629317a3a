#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// Error coming from the underlying stream
    Io(std::io::Error),
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
    /// An `ITEM:` line with a missing or unknown section name, or a section
    /// appearing where it is not expected
    MalformedHeader {
        /// 1-based line number in the stream
        line: usize,
        message: String,
    },
    /// A token that should be a number could not be converted, or an entry
    /// line does not have the expected shape
    Parse {
        /// 1-based line number in the stream
        line: usize,
        /// timestep of the block being read, if it is already known
        timestep: Option<u64>,
        message: String,
    },
    /// A block ended before the declared number of data lines was read
    TruncatedBlock {
        /// 1-based line number where the block was cut short
        line: usize,
        /// timestep of the truncated block, if it is already known
        timestep: Option<u64>,
        expected: usize,
        found: usize,
    },
    /// Collision detection was requested without a previous pair list to
    /// compare against
    MissingPreviousSnapshot,
}

fn fmt_timestep(timestep: Option<u64>) -> String {
    match timestep {
        Some(timestep) => format!(" (timestep {})", timestep),
        None => String::new(),
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::MalformedHeader { line, message } => {
                write!(f, "malformed header at line {}: {}", line, message)
            }
            Error::Parse { line, timestep, message } => {
                write!(f, "parse error at line {}{}: {}", line, fmt_timestep(*timestep), message)
            }
            Error::TruncatedBlock { line, timestep, expected, found } => write!(f,
                "truncated block at line {}{}: expected {} data lines, got {}",
                line, fmt_timestep(*timestep), expected, found
            ),
            Error::MissingPreviousSnapshot => {
                write!(f, "internal error: no previous pair list to compare against")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::MalformedHeader { .. } |
            Error::Parse { .. } |
            Error::TruncatedBlock { .. } |
            Error::MissingPreviousSnapshot => None,
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::Io(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}
