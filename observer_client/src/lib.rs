//! `observer_client`
//!
//! Replay/observer engine for the train game. The server owns the
//! simulation; this crate fetches per-turn world snapshots, keeps a
//! rolling previous/current window with one speculative prefetch, and
//! interpolates train poses for any fractional turn the playback clock
//! asks for. Rendering and window chrome are external consumers of
//! [`scene::SceneFrame`].

pub mod colors;
pub mod interp;
pub mod playback;
pub mod scene;
pub mod snapshot;
pub mod topology;
pub mod window;

#[cfg(test)]
pub(crate) mod testutil;
