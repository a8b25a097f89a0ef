//! Per-frame output for the renderer and overlay.
//!
//! Composes the interpolated world into plain values: train poses with
//! owner names and colors, post markers, and the scoreboard rows. The
//! actual drawing is someone else's job.

use observer_shared::math::Vec3;
use serde::Serialize;
use tracing::warn;

use crate::{
    colors::{post_color, PlayerColorAllocator, Rgba},
    interp,
    snapshot::{Post, Snapshot, Train},
    topology::Topology,
};

/// A train ready to draw: world pose plus overlay data.
#[derive(Debug, Clone, Serialize)]
pub struct TrainView {
    pub train: Train,
    pub position: Vec3,
    pub direction: Vec3,
    pub owner: Option<String>,
    pub color: Rgba,
    pub label: String,
}

/// A post marker at its point's world position.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub post: Post,
    pub position: Vec3,
    pub owner: Option<String>,
    pub color: Rgba,
    pub label: String,
}

/// One scoreboard row.
#[derive(Debug, Clone, Serialize)]
pub struct StandingView {
    pub name: String,
    pub rating: u32,
    pub color: Rgba,
}

/// Everything the renderer consumes for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct SceneFrame {
    pub turn: u32,
    pub factor: f32,
    pub trains: Vec<TrainView>,
    pub posts: Vec<PostView>,
    pub standings: Vec<StandingView>,
}

/// Builds the frame for `current`, blending train poses against
/// `previous` at `factor`. Entities whose topology references do not
/// resolve are skipped with a warning rather than failing the frame.
pub fn compose(
    topology: &Topology,
    current: &Snapshot,
    previous: Option<&Snapshot>,
    factor: f32,
    colors: &mut PlayerColorAllocator,
) -> SceneFrame {
    let mut trains: Vec<TrainView> = Vec::with_capacity(current.trains.len());
    for train in current.trains.values() {
        let prev = previous.and_then(|p| p.trains.get(&train.idx));
        let (position, direction) = match interp::blended_train_pose(topology, train, prev, factor)
        {
            Ok(pose) => pose,
            Err(err) => {
                warn!(train = train.idx, error = %err, "skipping train");
                continue;
            }
        };
        let owner = current
            .players
            .get(&train.player_idx)
            .map(|p| p.name.clone());
        trains.push(TrainView {
            position,
            direction,
            owner: owner.clone(),
            color: colors.color_of(&train.player_idx),
            label: train.summary(owner.as_deref()),
            train: train.clone(),
        });
    }
    trains.sort_by_key(|v| v.train.idx);

    let mut posts: Vec<PostView> = Vec::with_capacity(current.posts.len());
    for post in current.posts.values() {
        let Some(point) = topology.point_for_post(post.idx) else {
            warn!(post = post.idx, "post has no point in the topology; skipping");
            continue;
        };
        let owner = current
            .players
            .get(&post.player_idx)
            .map(|p| p.name.clone());
        posts.push(PostView {
            position: interp::grid_to_world(point.pos),
            label: post.summary(owner.as_deref()),
            color: post_color(post.kind),
            owner,
            post: post.clone(),
        });
    }
    posts.sort_by_key(|v| v.post.idx);

    let mut standings: Vec<StandingView> = current
        .players
        .values()
        .map(|p| StandingView {
            name: p.name.clone(),
            rating: p.rating,
            color: colors.color_of(&p.idx),
        })
        .collect();
    standings.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));

    SceneFrame {
        turn: current.turn,
        factor,
        trains,
        posts,
        standings,
    }
}
