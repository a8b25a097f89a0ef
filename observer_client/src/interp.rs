//! Interpolation of train poses between the two buffered turns.
//!
//! World state is authoritative at integer turns only; the playback
//! clock runs on fractions. A train's pose at a fractional turn blends
//! its previous- and current-turn positions:
//! `pos = cur * factor + prev * (1 - factor)`, written exactly in that
//! form so factors 0.0 and 1.0 reproduce the endpoints bit for bit.
//!
//! Pure functions, no allocation; called once per visible train per
//! rendered frame.

use observer_shared::{error::ConsistencyError, math::Vec3};

use crate::{snapshot::Train, topology::Topology};

/// Maps a grid position onto the world's XZ plane.
pub fn grid_to_world(pos: (i32, i32)) -> Vec3 {
    Vec3::new(pos.0 as f32, 0.0, pos.1 as f32)
}

/// World position and unit direction of a train from one snapshot,
/// without blending. Direction follows the line from its first endpoint
/// to its second, flipped when the train travels backwards.
pub fn train_pose(topology: &Topology, train: &Train) -> Result<(Vec3, Vec3), ConsistencyError> {
    let (line, a, b) = topology
        .endpoints_of(train.line_idx)
        .ok_or(ConsistencyError::UnknownLine {
            train: train.idx,
            line: train.line_idx,
        })?;

    let t = train.position as f32 / line.length.max(1) as f32;
    let p1 = grid_to_world(a.pos);
    let p2 = grid_to_world(b.pos);
    let span = p2 - p1;

    let position = p1 + span * t;
    let mut direction = span.normalized();
    if train.speed < 0 {
        direction = direction * -1.0;
    }
    Ok((position, direction))
}

/// Pose at a fractional turn. `prev` is the same train one turn back,
/// when it existed then; a train absent from the previous snapshot
/// (spawned this turn) is not blended. When the blended positions differ
/// measurably, direction is recomputed from the displacement so a train
/// rounding a corner does not keep last turn's heading.
pub fn blended_train_pose(
    topology: &Topology,
    cur: &Train,
    prev: Option<&Train>,
    factor: f32,
) -> Result<(Vec3, Vec3), ConsistencyError> {
    let (cur_pos, cur_dir) = train_pose(topology, cur)?;
    let Some(prev) = prev else {
        return Ok((cur_pos, cur_dir));
    };

    let (prev_pos, _) = train_pose(topology, prev)?;
    let mut direction = cur_dir;
    if !prev_pos.almost_eq(cur_pos) {
        direction = (cur_pos - prev_pos).normalized();
    }
    let position = cur_pos * factor + prev_pos * (1.0 - factor);
    Ok((position, direction))
}
