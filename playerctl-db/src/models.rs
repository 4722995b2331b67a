//! Player records

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Player record from database
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Player {
    pub id: i32,
    pub coins: i32,
    pub goods: i32,
}

/// Row to insert. Without an `id` the server assigns one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub coins: i32,
    pub goods: i32,
}

impl NewPlayer {
    pub fn new(coins: i32, goods: i32) -> Self {
        Self {
            id: None,
            coins,
            goods,
        }
    }

    pub fn with_id(id: i32, coins: i32, goods: i32) -> Self {
        Self {
            id: Some(id),
            coins,
            goods,
        }
    }
}

/// Partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerChanges {
    pub coins: Option<i32>,
    pub goods: Option<i32>,
}

impl PlayerChanges {
    pub fn coins(mut self, coins: i32) -> Self {
        self.coins = Some(coins);
        self
    }

    pub fn goods(mut self, goods: i32) -> Self {
        self.goods = Some(goods);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_none() && self.goods.is_none()
    }
}
