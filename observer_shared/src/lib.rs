//! `observer_shared`
//!
//! Libraries shared between the observer engine and its test harness.
//!
//! Design goals:
//! - Keep the wire protocol and transport seam in one place.
//! - Typed errors at the component boundaries; `anyhow` only in binaries.
//! - No `unsafe`.

pub mod config;
pub mod error;
pub mod json;
pub mod math;
pub mod net;
pub mod proto;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::math::*;
    pub use crate::net::*;
    pub use crate::proto::*;
}
