//! The players CRUD walkthrough
//!
//! Nine stages run strictly in order. The first failure stops the run;
//! the connection is closed on every path.

use std::fmt;

use anyhow::{ensure, Context, Result};
use playerctl_db::{
    define_players, Comparison, Filter, NewPlayer, PlayerChanges, PlayerField, Session,
};
use tracing::info;

use crate::closing::close_after;

pub const SEED_PLAYERS: [NewPlayer; 5] = [
    NewPlayer { id: Some(1), coins: 100, goods: 100 },
    NewPlayer { id: Some(2), coins: 200, goods: 200 },
    NewPlayer { id: Some(3), coins: 300, goods: 300 },
    NewPlayer { id: Some(4), coins: 400, goods: 400 },
    NewPlayer { id: Some(5), coins: 500, goods: 500 },
];

pub const NEW_PLAYER: NewPlayer = NewPlayer { id: Some(6), coins: 600, goods: 600 };

pub const UPDATED_COINS: i32 = 700;
pub const UPDATED_GOODS: i32 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConnectionInit,
    SchemaBind,
    DestructiveSync,
    SeedInsert,
    Create,
    FilterRead,
    Update,
    Delete,
    ConnectionClose,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::ConnectionInit,
        Stage::SchemaBind,
        Stage::DestructiveSync,
        Stage::SeedInsert,
        Stage::Create,
        Stage::FilterRead,
        Stage::Update,
        Stage::Delete,
        Stage::ConnectionClose,
    ];

    /// 1-based position in the run
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).map_or(0, |i| i + 1)
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::ConnectionInit => "connection init",
            Stage::SchemaBind => "schema bind",
            Stage::DestructiveSync => "destructive sync",
            Stage::SeedInsert => "seed insert",
            Stage::Create => "create",
            Stage::FilterRead => "filter read",
            Stage::Update => "update",
            Stage::Delete => "delete",
            Stage::ConnectionClose => "connection close",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {}/9 ({})", self.number(), self.name())
    }
}

/// The filter used by the read stage: `coins > 300`.
pub fn rich_players() -> Filter {
    Filter::when(PlayerField::Coins, Comparison::Gt, 300)
}

/// Run every stage, closing the session whether or not they succeed.
pub async fn run(session: &mut Session) -> Result<()> {
    let outcome = run_stages(session).await;

    info!(stage = Stage::ConnectionClose.number(), "Closing connection...");
    let result = close_after(session, outcome, Stage::ConnectionClose).await;
    if result.is_ok() {
        info!("Closed connection.");
        info!("Done.");
    }
    result
}

async fn run_stages(session: &mut Session) -> Result<()> {
    let stage = Stage::ConnectionInit;
    info!(stage = stage.number(), "Getting connection...");
    let conn = session
        .connection()
        .await
        .with_context(|| stage.to_string())?;
    info!("Got connection.");

    let stage = Stage::SchemaBind;
    info!(stage = stage.number(), "Getting players model...");
    let mut players = define_players(conn);
    info!("Got players model.");

    let stage = Stage::DestructiveSync;
    info!(stage = stage.number(), "Syncing players model...");
    info!("This creates the table, dropping it first if it already existed");
    players.sync(true).await.with_context(|| stage.to_string())?;
    info!("Synced players model.");

    let stage = Stage::SeedInsert;
    info!(stage = stage.number(), "Initializing players model with some data...");
    let seeded = players
        .bulk_insert(&SEED_PLAYERS)
        .await
        .with_context(|| stage.to_string())?;
    info!(rows = seeded, "Initialized players model with some data.");

    let stage = Stage::Create;
    info!(stage = stage.number(), "Creating a new player...");
    let created = players
        .insert(NEW_PLAYER)
        .await
        .with_context(|| stage.to_string())?;
    let json = serde_json::to_string(&created)?;
    info!(player = %json, "Created a new player.");

    let stage = Stage::FilterRead;
    let filter = rich_players();
    info!(stage = stage.number(), filter = %filter, "Reading all players with coins > 300...");
    let rich = players
        .find_where(&filter)
        .await
        .with_context(|| stage.to_string())?;
    let json = serde_json::to_string(&rich)?;
    info!(count = rich.len(), players = %json, "Read all players with coins > 300.");

    let stage = Stage::Update;
    info!(stage = stage.number(), "Updating the new player...");
    let changes = PlayerChanges::default()
        .coins(UPDATED_COINS)
        .goods(UPDATED_GOODS);
    let updated = players
        .update_by_id(created.id, changes)
        .await
        .with_context(|| stage.to_string())?
        .with_context(|| format!("{}: player {} vanished before update", stage, created.id))?;
    let json = serde_json::to_string(&updated)?;
    info!(player = %json, "Updated the new player.");

    let stage = Stage::Delete;
    info!(stage = stage.number(), "Deleting the new player...");
    players
        .delete_by_id(created.id)
        .await
        .with_context(|| stage.to_string())?;
    let remaining = players
        .find_by_id(created.id)
        .await
        .with_context(|| stage.to_string())?;
    ensure!(
        remaining.is_none(),
        "{}: player {} still present after delete",
        stage,
        created.id
    );
    let json = serde_json::to_string(&remaining)?;
    info!(player = %json, "Deleted the new player.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_numbered_in_order() {
        let numbers: Vec<usize> = Stage::ALL.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, (1..=9).collect::<Vec<_>>());
        assert_eq!(Stage::ConnectionInit.number(), 1);
        assert_eq!(Stage::ConnectionClose.number(), 9);
    }

    #[test]
    fn stage_display_names_position() {
        assert_eq!(Stage::FilterRead.to_string(), "stage 6/9 (filter read)");
    }

    #[test]
    fn seed_rows_are_distinct_and_scaled() {
        for (i, row) in SEED_PLAYERS.iter().enumerate() {
            let id = i as i32 + 1;
            assert_eq!(row.id, Some(id));
            assert_eq!(row.coins, id * 100);
            assert_eq!(row.goods, id * 100);
        }
        assert!(SEED_PLAYERS.iter().all(|row| row.id != NEW_PLAYER.id));
    }

    #[test]
    fn read_stage_selects_ids_above_three() {
        let filter = rich_players();
        let ids: Vec<i32> = SEED_PLAYERS
            .iter()
            .chain(std::iter::once(&NEW_PLAYER))
            .filter_map(|row| {
                let player = playerctl_db::Player {
                    id: row.id?,
                    coins: row.coins,
                    goods: row.goods,
                };
                filter.matches(&player).then_some(player.id)
            })
            .collect();
        assert_eq!(ids, vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn failed_connection_still_reaches_close() {
        let config = playerctl_db::ConnectionConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..Default::default()
        };
        let mut session = Session::new(config);
        let err = run(&mut session).await.unwrap_err();
        assert!(format!("{:#}", err).contains("stage 1/9"));
        assert!(!session.is_open());
    }
}
