//! Per-player color assignment for the overlay.
//!
//! Colors are handed out from a fixed palette in join order and stay
//! stable for the life of a session. The allocator is owned by whoever
//! renders players; nothing here is process-global.

use std::collections::HashMap;

use serde::Serialize;

use crate::snapshot::PostKind;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Palette cycled through for players.
pub const PLAYER_PALETTE: [Rgba; 4] = [
    Rgba::new(150, 30, 30),
    Rgba::new(30, 150, 30),
    Rgba::new(30, 30, 150),
    Rgba::new(150, 150, 30),
];

/// Label colors per post kind.
const POST_COLORS: [Rgba; 3] = [
    Rgba::new(210, 145, 20),
    Rgba::new(210, 250, 180),
    Rgba::new(180, 210, 250),
];

pub fn post_color(kind: PostKind) -> Rgba {
    POST_COLORS[(kind.code() - 1) as usize]
}

/// Session-scoped allocator of stable per-player colors.
#[derive(Debug, Default)]
pub struct PlayerColorAllocator {
    assigned: HashMap<String, Rgba>,
    next: usize,
}

impl PlayerColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The player's color, assigning the next palette entry on first
    /// sight.
    pub fn color_of(&mut self, player: &str) -> Rgba {
        if let Some(color) = self.assigned.get(player) {
            return *color;
        }
        let color = PLAYER_PALETTE[self.next % PLAYER_PALETTE.len()];
        self.next += 1;
        self.assigned.insert(player.to_string(), color);
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_stable_per_player() {
        let mut alloc = PlayerColorAllocator::new();
        let a = alloc.color_of("p1");
        let b = alloc.color_of("p2");
        assert_ne!(a, b);
        assert_eq!(alloc.color_of("p1"), a);
        assert_eq!(alloc.color_of("p2"), b);
    }

    #[test]
    fn palette_wraps_after_exhaustion() {
        let mut alloc = PlayerColorAllocator::new();
        for i in 0..PLAYER_PALETTE.len() {
            alloc.color_of(&format!("p{i}"));
        }
        assert_eq!(alloc.color_of("extra"), PLAYER_PALETTE[0]);
    }

    #[test]
    fn post_colors_follow_kind() {
        assert_eq!(post_color(PostKind::City), POST_COLORS[0]);
        assert_eq!(post_color(PostKind::MilitaryStorage), POST_COLORS[2]);
    }
}
