//! Static topology: the immutable point/line graph of the track network.
//!
//! Loaded once at session start from two sequential `MAP` fetches
//! (STATIC metadata, then COORDINATES), cross-linked by id, and never
//! mutated again, so later reads need no locking. Points and lines live
//! in id-keyed arenas and refer to each other by id only.

use std::collections::HashMap;

use observer_shared::{
    error::{ConsistencyError, DecodeError, LoadError},
    json,
    net::{self, Transport},
    proto::Layer,
};
use serde_json::Value;
use tracing::info;

pub type PointId = u32;
pub type LineId = u32;

/// A node of the track graph.
#[derive(Debug, Clone)]
pub struct Point {
    pub idx: PointId,
    /// Id of the post sitting on this point; 0 when the point is bare.
    pub post_idx: u32,
    /// Grid position, filled in by the coordinates fetch.
    pub pos: (i32, i32),
    /// Ids of the lines incident on this point.
    pub lines: Vec<LineId>,
}

/// An edge of the track graph.
#[derive(Debug, Clone)]
pub struct Line {
    pub idx: LineId,
    pub length: u32,
    pub points: [PointId; 2],
}

/// The loaded track network.
#[derive(Debug)]
pub struct Topology {
    pub idx: u32,
    pub name: String,
    /// World extent in grid units.
    pub size: (u32, u32),
    points: HashMap<PointId, Point>,
    lines: HashMap<LineId, Line>,
    post_points: HashMap<u32, PointId>,
}

impl Topology {
    /// Fetches and decodes the static layers. Any failure leaves no
    /// partial topology behind.
    pub async fn load<T: Transport + ?Sized>(transport: &mut T) -> Result<Self, LoadError> {
        let static_body = net::request_layer(transport, Layer::Static).await?;
        let idx = json::get::<u32>(&static_body, "idx")?;
        let name = json::get::<String>(&static_body, "name")?;
        let lines = decode_lines(&static_body)?;
        let mut points = decode_points(&static_body)?;

        let coords_body = net::request_layer(transport, Layer::Coordinates).await?;
        let coords_idx = json::get::<u32>(&coords_body, "idx")?;
        if coords_idx != idx {
            return Err(ConsistencyError::MapIndexMismatch {
                static_idx: idx,
                coordinates_idx: coords_idx,
            }
            .into());
        }
        let size = apply_coordinates(&coords_body, &mut points)?;

        link_lines(&lines, &mut points)?;

        let post_points = points
            .values()
            .filter(|p| p.post_idx != 0)
            .map(|p| (p.post_idx, p.idx))
            .collect();

        info!(
            map = %name,
            points = points.len(),
            lines = lines.len(),
            "static topology loaded"
        );

        Ok(Self {
            idx,
            name,
            size,
            points,
            lines,
            post_points,
        })
    }

    pub fn point(&self, idx: PointId) -> Option<&Point> {
        self.points.get(&idx)
    }

    pub fn line(&self, idx: LineId) -> Option<&Line> {
        self.lines.get(&idx)
    }

    /// The point a post sits on, if the topology knows the post.
    pub fn point_for_post(&self, post_idx: u32) -> Option<&Point> {
        self.post_points
            .get(&post_idx)
            .and_then(|idx| self.points.get(idx))
    }

    /// A line together with its two endpoints. `None` only for ids the
    /// topology never loaded; loaded lines always resolve.
    pub fn endpoints_of(&self, line_idx: LineId) -> Option<(&Line, &Point, &Point)> {
        let line = self.lines.get(&line_idx)?;
        let a = self.points.get(&line.points[0])?;
        let b = self.points.get(&line.points[1])?;
        Some((line, a, b))
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.points.values()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }
}

fn decode_lines(body: &Value) -> Result<HashMap<LineId, Line>, DecodeError> {
    let values = json::get_array(body, "lines")?;
    if values.is_empty() {
        return Err(DecodeError::BadField {
            field: "lines",
            detail: "map has no lines".to_string(),
        });
    }

    let mut lines = HashMap::with_capacity(values.len());
    for value in values {
        let idx = json::get::<u32>(value, "idx")?;
        let length = json::get::<u32>(value, "length")?;
        let points = json::get::<Vec<u32>>(value, "points")?;
        let [a, b] = points[..] else {
            return Err(DecodeError::BadField {
                field: "points",
                detail: format!("line {idx} has {} endpoints, expected 2", points.len()),
            });
        };
        lines.insert(
            idx,
            Line {
                idx,
                length,
                points: [a, b],
            },
        );
    }
    Ok(lines)
}

fn decode_points(body: &Value) -> Result<HashMap<PointId, Point>, DecodeError> {
    let values = json::get_array(body, "points")?;
    if values.is_empty() {
        return Err(DecodeError::BadField {
            field: "points",
            detail: "map has no points".to_string(),
        });
    }

    let mut points = HashMap::with_capacity(values.len());
    for value in values {
        let idx = json::get::<u32>(value, "idx")?;
        let post_idx = json::get::<u32>(value, "post_idx")?;
        points.insert(
            idx,
            Point {
                idx,
                post_idx,
                pos: (0, 0),
                lines: Vec::new(),
            },
        );
    }
    Ok(points)
}

fn apply_coordinates(
    body: &Value,
    points: &mut HashMap<PointId, Point>,
) -> Result<(u32, u32), LoadError> {
    let values = json::get_array(body, "coordinates")?;
    if values.len() != points.len() {
        return Err(ConsistencyError::CoordinateCount {
            points: points.len(),
            coordinates: values.len(),
        }
        .into());
    }

    for value in values {
        let idx = json::get::<u32>(value, "idx")?;
        let x = json::get::<i32>(value, "x")?;
        let y = json::get::<i32>(value, "y")?;
        let point = points
            .get_mut(&idx)
            .ok_or(ConsistencyError::UnknownCoordinatePoint { point: idx })?;
        point.pos = (x, y);
    }

    let size = json::get::<[u32; 2]>(body, "size")?;
    Ok((size[0], size[1]))
}

/// Records each line in both endpoints' incidence lists, failing if an
/// endpoint id does not resolve.
fn link_lines(
    lines: &HashMap<LineId, Line>,
    points: &mut HashMap<PointId, Point>,
) -> Result<(), ConsistencyError> {
    for line in lines.values() {
        for endpoint in line.points {
            let point =
                points
                    .get_mut(&endpoint)
                    .ok_or(ConsistencyError::UnknownPoint {
                        line: line.idx,
                        point: endpoint,
                    })?;
            point.lines.push(line.idx);
        }
    }
    Ok(())
}
