//! Declared shape of the `players` table
//!
//! ```sql
//! CREATE TABLE players (
//!     `id` INT NOT NULL AUTO_INCREMENT COMMENT 'The unique ID of the player.',
//!     `coins` INT NOT NULL COMMENT 'The number of coins that the player had.',
//!     `goods` INT NOT NULL COMMENT 'The number of goods that the player had.',
//!     PRIMARY KEY (`id`)
//! );
//! ```

use sqlx::MySqlConnection;

use crate::repo::PlayerRepo;

pub const PLAYERS_TABLE: &str = "players";

/// One declared column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub comment: &'static str,
}

pub const PLAYER_COLUMNS: [ColumnDef; 3] = [
    ColumnDef {
        name: "id",
        sql_type: "INT",
        nullable: false,
        auto_increment: true,
        primary_key: true,
        comment: "The unique ID of the player.",
    },
    ColumnDef {
        name: "coins",
        sql_type: "INT",
        nullable: false,
        auto_increment: false,
        primary_key: false,
        comment: "The number of coins that the player had.",
    },
    ColumnDef {
        name: "goods",
        sql_type: "INT",
        nullable: false,
        auto_increment: false,
        primary_key: false,
        comment: "The number of goods that the player had.",
    },
];

impl ColumnDef {
    fn render(&self) -> String {
        let mut sql = format!("`{}` {}", self.name, self.sql_type);
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql.push_str(&format!(" COMMENT '{}'", self.comment.replace('\'', "''")));
        sql
    }
}

pub fn create_table_sql() -> String {
    let mut lines: Vec<String> = PLAYER_COLUMNS.iter().map(ColumnDef::render).collect();

    let keys: Vec<String> = PLAYER_COLUMNS
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| format!("`{}`", c.name))
        .collect();
    if !keys.is_empty() {
        lines.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS `{}` (\n    {}\n)",
        PLAYERS_TABLE,
        lines.join(",\n    ")
    )
}

pub fn drop_table_sql() -> String {
    format!("DROP TABLE IF EXISTS `{}`", PLAYERS_TABLE)
}

/// Bind the players shape to an open connection.
pub fn define_players(conn: &mut MySqlConnection) -> PlayerRepo<'_> {
    PlayerRepo::new(conn)
}
