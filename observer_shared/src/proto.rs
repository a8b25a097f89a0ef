//! Wire protocol constants for the train-game server.
//!
//! Every exchange is a little-endian framed request/reply pair:
//! request `{action: u32, len: u32, json bytes}`, reply
//! `{result: u32, len: u32, json bytes}`.

/// Request kinds the observer sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Login = 1,
    Logout = 2,
    Turn = 5,
    Map = 10,
}

impl Action {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Login),
            2 => Some(Self::Logout),
            5 => Some(Self::Turn),
            10 => Some(Self::Map),
            _ => None,
        }
    }
}

/// Layer selector carried in a `MAP` request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Static,
    Dynamic,
    Coordinates,
}

impl Layer {
    pub fn code(self) -> u32 {
        match self {
            Self::Static => 0,
            Self::Dynamic => 1,
            Self::Coordinates => 10,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Static),
            1 => Some(Self::Dynamic),
            10 => Some(Self::Coordinates),
            _ => None,
        }
    }
}

/// Result code of a reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Okey,
    BadCommand,
    ResourceNotFound,
    InappropriateGameState,
    Timeout,
    AccessDenied,
    InternalServerError,
    /// A code this client does not know about.
    Other(u32),
}

impl Status {
    pub fn code(self) -> u32 {
        match self {
            Self::Okey => 0,
            Self::BadCommand => 1,
            Self::ResourceNotFound => 2,
            Self::InappropriateGameState => 3,
            Self::Timeout => 4,
            Self::AccessDenied => 5,
            Self::InternalServerError => 500,
            Self::Other(code) => code,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Okey,
            1 => Self::BadCommand,
            2 => Self::ResourceNotFound,
            3 => Self::InappropriateGameState,
            4 => Self::Timeout,
            5 => Self::AccessDenied,
            500 => Self::InternalServerError,
            other => Self::Other(other),
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Okey
    }
}
