//! In-process stub game server for socket-level tests.
//!
//! Speaks the observer wire protocol over real TCP: little-endian
//! `{code, len, json}` frames, one reply per request. World content is
//! scripted through [`StubWorld`] so tests can predict every train
//! position exactly.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tracing::{debug, warn};

use observer_shared::proto::{Action, Layer, Status};

/// Scripted map and per-turn dynamic state served to every connection.
#[derive(Debug, Clone)]
pub struct StubWorld {
    pub static_body: Value,
    pub coords_body: Value,
    pub max_turn: u32,
}

impl StubWorld {
    /// Two points 10 grid units apart, one line of length 100, one train
    /// advancing 10 units per turn, one city post, one player.
    pub fn two_point_line(max_turn: u32) -> Self {
        Self {
            static_body: json!({
                "idx": 1,
                "name": "stub",
                "lines": [{"idx": 1, "length": 100, "points": [1, 2]}],
                "points": [
                    {"idx": 1, "post_idx": 10},
                    {"idx": 2, "post_idx": 0},
                ],
            }),
            coords_body: json!({
                "idx": 1,
                "size": [30, 30],
                "coordinates": [
                    {"idx": 1, "x": 0, "y": 0},
                    {"idx": 2, "x": 10, "y": 0},
                ],
            }),
            max_turn,
        }
    }

    /// Dynamic layer at a given turn.
    pub fn dynamic(&self, turn: u32) -> Value {
        json!({
            "trains": [{
                "idx": 5, "line_idx": 1,
                "position": (turn * 10).min(100),
                "cooldown": 0, "goods": 0, "goods_capacity": 40,
                "speed": 1, "level": 1, "player_idx": "p1",
            }],
            "posts": [{
                "idx": 10, "type": 1, "armor": 0, "armor_capacity": 200,
                "level": 1, "population": 3, "population_capacity": 20,
                "product": 60, "product_capacity": 200, "name": "Home",
                "player_idx": "p1",
            }],
            "ratings": [{"idx": "p1", "name": "Alice", "rating": turn * 10}],
        })
    }

    /// Where the single train's world X lands at a fractional turn.
    pub fn expected_train_x(&self, turn: f64) -> f32 {
        let at = |t: u32| ((t * 10).min(100) as f32) / 100.0 * 10.0;
        let prev = at(turn.floor() as u32);
        let cur = at(turn.ceil() as u32);
        let factor = (turn - turn.floor()) as f32;
        cur * factor + prev * (1.0 - factor)
    }
}

/// Binds on an ephemeral port and serves connections until the returned
/// handle is aborted or dropped along with the runtime.
pub async fn bind_ephemeral(world: StubWorld) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind stub server")?;
    let addr = listener.local_addr().context("stub server addr")?;

    let handle = tokio::spawn(async move {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };
            debug!(%peer, "connection accepted");
            let world = world.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, world).await {
                    warn!(error = %e, "connection handler failed");
                }
            });
        }
    });

    Ok((addr, handle))
}

async fn serve_connection(mut stream: TcpStream, world: StubWorld) -> Result<()> {
    let mut pending_turn = 0u32;

    loop {
        let mut header = [0u8; 8];
        match stream.read_exact(&mut header).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        let code = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).await.context("request body")?;
        let payload: Value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).context("request json")?
        };

        match Action::from_code(code) {
            Some(Action::Login) => {
                let name = payload.get("name").and_then(Value::as_str).unwrap_or("?");
                debug!(name, "login");
                write_reply(&mut stream, Status::Okey, b"{}").await?;
            }
            Some(Action::Logout) => {
                write_reply(&mut stream, Status::Okey, b"{}").await?;
                return Ok(());
            }
            Some(Action::Turn) => {
                let turn = payload.get("idx").and_then(Value::as_u64).unwrap_or(0) as u32;
                if turn > world.max_turn {
                    write_reply(&mut stream, Status::ResourceNotFound, b"turn out of range")
                        .await?;
                } else {
                    pending_turn = turn;
                    write_reply(&mut stream, Status::Okey, b"{}").await?;
                }
            }
            Some(Action::Map) => {
                let layer = payload
                    .get("layer")
                    .and_then(Value::as_u64)
                    .and_then(|c| Layer::from_code(c as u32));
                match layer {
                    Some(Layer::Static) => {
                        write_json(&mut stream, &world.static_body).await?;
                    }
                    Some(Layer::Coordinates) => {
                        write_json(&mut stream, &world.coords_body).await?;
                    }
                    Some(Layer::Dynamic) => {
                        write_json(&mut stream, &world.dynamic(pending_turn)).await?;
                    }
                    None => {
                        write_reply(&mut stream, Status::BadCommand, b"unknown layer").await?;
                    }
                }
            }
            None => {
                write_reply(&mut stream, Status::BadCommand, b"unknown action").await?;
            }
        }
    }
}

async fn write_json(stream: &mut TcpStream, body: &Value) -> Result<()> {
    let bytes = serde_json::to_vec(body).context("encode reply")?;
    write_reply(stream, Status::Okey, &bytes).await
}

async fn write_reply(stream: &mut TcpStream, status: Status, body: &[u8]) -> Result<()> {
    let mut frame = Vec::with_capacity(8 + body.len());
    frame.extend_from_slice(&status.code().to_le_bytes());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(body);
    stream.write_all(&frame).await.context("write reply")?;
    Ok(())
}
