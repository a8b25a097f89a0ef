//! Dynamic layer: the full mobile/ownership state at one turn.
//!
//! A [`Snapshot`] only exists fully decoded; the fetch either returns a
//! complete one or an error, so the interpolator can never observe a
//! half-populated turn.
//!
//! Empty vs missing: an empty `trains`/`posts`/`ratings` array is a
//! legitimate state (nobody online, everything destroyed); the *key*
//! being absent means the server sent a truncated layer and is a decode
//! failure.

use std::collections::HashMap;

use observer_shared::{
    error::{DecodeError, FetchError},
    json,
    net::{self, Transport},
    proto::{Action, Layer},
};
use serde::Serialize;
use serde_json::Value;

pub type TrainId = u32;
pub type PostId = u32;
pub type PlayerId = String;

/// A train somewhere along a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Train {
    pub idx: TrainId,
    pub line_idx: u32,
    /// Scalar position along the line, `0..=length`.
    pub position: u32,
    pub cooldown: u32,
    pub goods: u32,
    pub goods_capacity: u32,
    /// Sign encodes direction of travel along the line.
    pub speed: i32,
    pub level: i32,
    pub player_idx: PlayerId,
}

impl Train {
    /// Label text for the in-world overlay.
    pub fn summary(&self, owner: Option<&str>) -> String {
        format!(
            "player: {}\ngoods: {}/{}\nlvl: {}",
            owner.unwrap_or(""),
            self.goods,
            self.goods_capacity,
            self.level
        )
    }
}

/// What kind of settlement a post is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostKind {
    City,
    Market,
    MilitaryStorage,
}

impl PostKind {
    pub fn code(self) -> u32 {
        match self {
            Self::City => 1,
            Self::Market => 2,
            Self::MilitaryStorage => 3,
        }
    }

    pub fn from_code(code: u32) -> Result<Self, DecodeError> {
        match code {
            1 => Ok(Self::City),
            2 => Ok(Self::Market),
            3 => Ok(Self::MilitaryStorage),
            other => Err(DecodeError::BadField {
                field: "type",
                detail: format!("unknown post type {other}"),
            }),
        }
    }
}

/// A stationary post on a point of the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub idx: PostId,
    pub kind: PostKind,
    pub armor: u32,
    pub armor_capacity: u32,
    pub level: u32,
    pub population: u32,
    pub population_capacity: u32,
    pub product: u32,
    pub product_capacity: u32,
    pub name: String,
    pub player_idx: PlayerId,
}

impl Post {
    /// Label text for the in-world overlay, per kind.
    pub fn summary(&self, owner: Option<&str>) -> String {
        match self.kind {
            PostKind::City => format!(
                "{}\nplayer: {}\npopulation: {} / {}\nproduct: {} / {}\narmor: {} / {}",
                self.name,
                owner.unwrap_or(""),
                self.population,
                self.population_capacity,
                self.product,
                self.product_capacity,
                self.armor,
                self.armor_capacity
            ),
            PostKind::Market => format!(
                "{}\nproduct: {} / {}",
                self.name, self.product, self.product_capacity
            ),
            PostKind::MilitaryStorage => {
                format!("{}\narmor: {} / {}", self.name, self.armor, self.armor_capacity)
            }
        }
    }
}

/// A participant in the viewed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub idx: PlayerId,
    pub name: String,
    pub rating: u32,
}

/// The dynamic layer at one turn.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub turn: u32,
    pub trains: HashMap<TrainId, Train>,
    pub posts: HashMap<PostId, Post>,
    pub players: HashMap<PlayerId, Player>,
}

/// Fetches the dynamic layer for `turn`: positions the server's turn
/// cursor, then requests the DYNAMIC map layer.
pub async fn fetch<T: Transport + ?Sized>(
    transport: &mut T,
    turn: u32,
) -> Result<Snapshot, FetchError> {
    let payload = serde_json::json!({ "idx": turn });
    transport.send(Action::Turn, Some(&payload)).await?;
    let ack = transport.receive().await?;
    ack.ok()?;

    let body = net::request_layer(transport, Layer::Dynamic).await?;
    Ok(decode_layer(turn, &body)?)
}

/// Decodes a dynamic-layer body into a snapshot tagged with `turn`.
pub fn decode_layer(turn: u32, body: &Value) -> Result<Snapshot, DecodeError> {
    let mut trains = HashMap::new();
    for value in json::get_array(body, "trains")? {
        let train = decode_train(value)?;
        trains.insert(train.idx, train);
    }

    let mut posts = HashMap::new();
    for value in json::get_array(body, "posts")? {
        let post = decode_post(value)?;
        posts.insert(post.idx, post);
    }

    let mut players = HashMap::new();
    for value in json::get_array(body, "ratings")? {
        let player = decode_player(value)?;
        players.insert(player.idx.clone(), player);
    }

    Ok(Snapshot {
        turn,
        trains,
        posts,
        players,
    })
}

fn decode_train(value: &Value) -> Result<Train, DecodeError> {
    Ok(Train {
        idx: json::get(value, "idx")?,
        line_idx: json::get(value, "line_idx")?,
        position: json::get(value, "position")?,
        cooldown: json::get(value, "cooldown")?,
        goods: json::get(value, "goods")?,
        goods_capacity: json::get(value, "goods_capacity")?,
        speed: json::get(value, "speed")?,
        level: json::get(value, "level")?,
        player_idx: json::get(value, "player_idx")?,
    })
}

fn decode_post(value: &Value) -> Result<Post, DecodeError> {
    Ok(Post {
        idx: json::get(value, "idx")?,
        kind: PostKind::from_code(json::get(value, "type")?)?,
        armor: json::get(value, "armor")?,
        armor_capacity: json::get(value, "armor_capacity")?,
        level: json::get(value, "level")?,
        population: json::get(value, "population")?,
        population_capacity: json::get(value, "population_capacity")?,
        product: json::get(value, "product")?,
        product_capacity: json::get(value, "product_capacity")?,
        name: json::get(value, "name")?,
        player_idx: json::get(value, "player_idx")?,
    })
}

fn decode_player(value: &Value) -> Result<Player, DecodeError> {
    Ok(Player {
        idx: json::get(value, "idx")?,
        name: json::get(value, "name")?,
        rating: json::get(value, "rating")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_layer() -> Value {
        json!({
            "trains": [{
                "idx": 5, "line_idx": 1, "position": 50, "cooldown": 0,
                "goods": 3, "goods_capacity": 40, "speed": 1, "level": 1,
                "player_idx": "p1",
            }],
            "posts": [{
                "idx": 10, "type": 1, "armor": 2, "armor_capacity": 200,
                "level": 1, "population": 8, "population_capacity": 20,
                "product": 30, "product_capacity": 200, "name": "Minsk",
                "player_idx": "p1",
            }],
            "ratings": [{"idx": "p1", "name": "Alice", "rating": 120}],
        })
    }

    #[test]
    fn decodes_all_three_entity_kinds() {
        let snap = decode_layer(7, &full_layer()).unwrap();
        assert_eq!(snap.turn, 7);

        let train = &snap.trains[&5];
        assert_eq!(train.line_idx, 1);
        assert_eq!(train.speed, 1);
        assert_eq!(train.player_idx, "p1");

        let post = &snap.posts[&10];
        assert_eq!(post.kind, PostKind::City);
        assert_eq!(post.name, "Minsk");

        assert_eq!(snap.players["p1"].rating, 120);
    }

    #[test]
    fn empty_arrays_are_valid() {
        let body = json!({"trains": [], "posts": [], "ratings": []});
        let snap = decode_layer(0, &body).unwrap();
        assert!(snap.trains.is_empty());
        assert!(snap.posts.is_empty());
        assert!(snap.players.is_empty());
    }

    #[test]
    fn missing_trains_key_is_decode_error() {
        let mut body = full_layer();
        body.as_object_mut().unwrap().remove("trains");
        assert!(matches!(
            decode_layer(0, &body),
            Err(DecodeError::MissingField { field: "trains" })
        ));
    }

    #[test]
    fn missing_posts_key_is_decode_error() {
        let mut body = full_layer();
        body.as_object_mut().unwrap().remove("posts");
        assert!(matches!(
            decode_layer(0, &body),
            Err(DecodeError::MissingField { field: "posts" })
        ));
    }

    #[test]
    fn missing_ratings_key_is_decode_error() {
        let mut body = full_layer();
        body.as_object_mut().unwrap().remove("ratings");
        assert!(matches!(
            decode_layer(0, &body),
            Err(DecodeError::MissingField { field: "ratings" })
        ));
    }

    #[test]
    fn unknown_post_type_is_decode_error() {
        let mut body = full_layer();
        body["posts"][0]["type"] = json!(9);
        assert!(matches!(
            decode_layer(0, &body),
            Err(DecodeError::BadField { field: "type", .. })
        ));
    }

    #[test]
    fn summaries_follow_post_kind() {
        let snap = decode_layer(0, &full_layer()).unwrap();
        let post = &snap.posts[&10];
        let text = post.summary(Some("Alice"));
        assert!(text.contains("Minsk"));
        assert!(text.contains("population: 8 / 20"));

        let market = Post {
            kind: PostKind::Market,
            ..post.clone()
        };
        let text = market.summary(None);
        assert!(text.contains("product: 30 / 200"));
        assert!(!text.contains("population"));
    }
}
