//! Error taxonomy for the observer engine.
//!
//! Three root causes, composed per call site:
//! - [`TransportError`]: the request/reply exchange itself failed.
//! - [`DecodeError`]: a reply arrived but its payload is malformed.
//! - [`ConsistencyError`]: decoded data contains cross-references that
//!   do not resolve.
//!
//! Topology loading can fail for any of the three ([`LoadError`]) and is
//! fatal to the session; dynamic-layer fetches fail with [`FetchError`]
//! and may be degraded around during steady playback.

use std::fmt;
use std::io;

/// Send/receive failure on the game connection.
#[derive(Debug)]
pub enum TransportError {
    /// Socket-level failure.
    Io(io::Error),
    /// The server answered with a non-OK result code.
    Rejected {
        code: u32,
        detail: String,
    },
    /// The server closed the connection mid-exchange.
    ConnectionClosed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "transport I/O error: {e}"),
            Self::Rejected { code, detail } => {
                write!(f, "server rejected request (code {code}): {detail}")
            }
            Self::ConnectionClosed => write!(f, "connection closed by server"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Malformed or missing data in a reply payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A required field (or top-level array) is absent.
    MissingField { field: &'static str },
    /// A field is present but has the wrong type or an invalid value.
    BadField { field: &'static str, detail: String },
    /// The payload is not valid JSON at all.
    Malformed { detail: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing field `{field}`"),
            Self::BadField { field, detail } => write!(f, "bad field `{field}`: {detail}"),
            Self::Malformed { detail } => write!(f, "malformed payload: {detail}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Cross-references in decoded data that do not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    /// A line's endpoint references a point id that was never loaded.
    UnknownPoint { line: u32, point: u32 },
    /// A coordinate entry references a point id that was never loaded.
    UnknownCoordinatePoint { point: u32 },
    /// The coordinate count differs from the point count.
    CoordinateCount { points: usize, coordinates: usize },
    /// The STATIC and COORDINATES replies describe different maps.
    MapIndexMismatch { static_idx: u32, coordinates_idx: u32 },
    /// A train sits on a line id that is not in the topology.
    UnknownLine { train: u32, line: u32 },
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPoint { line, point } => {
                write!(f, "line {line} references unknown point {point}")
            }
            Self::UnknownCoordinatePoint { point } => {
                write!(f, "coordinates reference unknown point {point}")
            }
            Self::CoordinateCount {
                points,
                coordinates,
            } => write!(
                f,
                "coordinate count mismatch: {points} points, {coordinates} coordinates"
            ),
            Self::MapIndexMismatch {
                static_idx,
                coordinates_idx,
            } => write!(
                f,
                "map index mismatch: static layer {static_idx}, coordinates layer {coordinates_idx}"
            ),
            Self::UnknownLine { train, line } => {
                write!(f, "train {train} sits on unknown line {line}")
            }
        }
    }
}

impl std::error::Error for ConsistencyError {}

/// Static topology load failure. Fatal: there is no partial topology.
#[derive(Debug)]
pub enum LoadError {
    Transport(TransportError),
    Decode(DecodeError),
    Consistency(ConsistencyError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "topology load failed: {e}"),
            Self::Decode(e) => write!(f, "topology load failed: {e}"),
            Self::Consistency(e) => write!(f, "topology load failed: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Consistency(e) => Some(e),
        }
    }
}

impl From<TransportError> for LoadError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<DecodeError> for LoadError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<ConsistencyError> for LoadError {
    fn from(e: ConsistencyError) -> Self {
        Self::Consistency(e)
    }
}

impl From<FetchError> for LoadError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Transport(t) => Self::Transport(t),
            FetchError::Decode(d) => Self::Decode(d),
        }
    }
}

/// Dynamic-layer fetch failure.
#[derive(Debug)]
pub enum FetchError {
    Transport(TransportError),
    Decode(DecodeError),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "snapshot fetch failed: {e}"),
            Self::Decode(e) => write!(f, "snapshot fetch failed: {e}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Decode(e) => Some(e),
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<DecodeError> for FetchError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}
