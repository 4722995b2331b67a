//! Player repository
//!
//! Plain-data CRUD over a borrowed connection:
//! - rows are returned as `Player` values, never live handles
//! - updates and deletes go through the id
//! - absence is `None`, not an error

use sqlx::{Connection, MySql, MySqlConnection, QueryBuilder};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::filter::Filter;
use crate::models::{NewPlayer, Player, PlayerChanges};
use crate::schema::{create_table_sql, drop_table_sql, PLAYERS_TABLE};

fn insert_prefix() -> String {
    format!("INSERT INTO `{PLAYERS_TABLE}` (id, coins, goods) ")
}

fn select_prefix() -> String {
    format!("SELECT id, coins, goods FROM `{PLAYERS_TABLE}`")
}

/// Column as reported by `information_schema`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub nullable: bool,
}

/// Player repository
pub struct PlayerRepo<'a> {
    conn: &'a mut MySqlConnection,
}

impl<'a> PlayerRepo<'a> {
    pub fn new(conn: &'a mut MySqlConnection) -> Self {
        Self { conn }
    }

    /// Create the table from the declared schema.
    ///
    /// With `reset_existing` the table is dropped first, losing every row.
    pub async fn sync(&mut self, reset_existing: bool) -> DbResult<()> {
        if reset_existing {
            let drop_sql = drop_table_sql();
            debug!(sql = %drop_sql, "dropping players table");
            sqlx::query(&drop_sql)
                .execute(&mut *self.conn)
                .await
                .map_err(|e| DbError::schema("DROP TABLE", e))?;
        }

        let create = create_table_sql();
        debug!(sql = %create, "creating players table");
        sqlx::query(&create)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| DbError::schema("CREATE TABLE", e))?;

        Ok(())
    }

    /// Insert all rows in one statement, all-or-nothing.
    ///
    /// Returns the number of rows written.
    pub async fn bulk_insert(&mut self, rows: &[NewPlayer]) -> DbResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.conn.begin().await?;

        // A NULL id takes the next AUTO_INCREMENT value.
        let mut builder = QueryBuilder::<MySql>::new(insert_prefix());
        builder.push_values(rows.iter().copied(), |mut b, row| {
            b.push_bind(row.id).push_bind(row.coins).push_bind(row.goods);
        });

        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(DbError::from_write)?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Insert one row and return it with its assigned id.
    pub async fn insert(&mut self, row: NewPlayer) -> DbResult<Player> {
        let sql = format!("{}VALUES (?, ?, ?)", insert_prefix());
        let result = sqlx::query(&sql)
            .bind(row.id)
            .bind(row.coins)
            .bind(row.goods)
            .execute(&mut *self.conn)
            .await
            .map_err(DbError::from_write)?;

        let id = match row.id {
            Some(id) => id,
            None => i32::try_from(result.last_insert_id()).map_err(|_| {
                DbError::Query(sqlx::Error::Protocol(format!(
                    "assigned id {} does not fit in INT",
                    result.last_insert_id()
                )))
            })?,
        };

        Ok(Player {
            id,
            coins: row.coins,
            goods: row.goods,
        })
    }

    /// Rows matching `filter`, ordered by id.
    pub async fn find_where(&mut self, filter: &Filter) -> DbResult<Vec<Player>> {
        let mut builder = QueryBuilder::<MySql>::new(select_prefix());
        filter.push_where(&mut builder);
        builder.push(" ORDER BY id");

        let players = builder
            .build_query_as::<Player>()
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(players)
    }

    pub async fn find_by_id(&mut self, id: i32) -> DbResult<Option<Player>> {
        let sql = format!("{} WHERE id = ?", select_prefix());
        let player = sqlx::query_as::<_, Player>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(player)
    }

    /// Apply `changes` and return the row as stored, or `None` if no row has `id`.
    pub async fn update_by_id(
        &mut self,
        id: i32,
        changes: PlayerChanges,
    ) -> DbResult<Option<Player>> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut builder = QueryBuilder::<MySql>::new(format!("UPDATE `{PLAYERS_TABLE}` SET "));
        let mut assignments = builder.separated(", ");
        if let Some(coins) = changes.coins {
            assignments.push("coins = ").push_bind_unseparated(coins);
        }
        if let Some(goods) = changes.goods {
            assignments.push("goods = ").push_bind_unseparated(goods);
        }
        builder.push(" WHERE id = ").push_bind(id);

        builder
            .build()
            .execute(&mut *self.conn)
            .await
            .map_err(DbError::from_write)?;

        // MySQL reports changed rows, not matched rows, so re-read instead.
        self.find_by_id(id).await
    }

    /// Returns whether a row was removed.
    pub async fn delete_by_id(&mut self, id: i32) -> DbResult<bool> {
        let sql = format!("DELETE FROM `{PLAYERS_TABLE}` WHERE id = ?");
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&mut self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM `{PLAYERS_TABLE}`");
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    /// Columns of the live table in declaration order.
    pub async fn describe(&mut self) -> DbResult<Vec<ColumnInfo>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR) AS name,
                CAST(IS_NULLABLE AS CHAR) AS is_nullable
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(PLAYERS_TABLE)
        .fetch_all(&mut *self.conn)
        .await?;

        let columns = rows
            .into_iter()
            .map(|(name, is_nullable)| ColumnInfo {
                name,
                nullable: is_nullable.eq_ignore_ascii_case("YES"),
            })
            .collect();
        Ok(columns)
    }
}
