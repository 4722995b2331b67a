//! Single-connection session management
//!
//! A [`Session`] owns at most one open connection. It is opened lazily on
//! the first [`Session::connection`] call, verified with a ping, and reused
//! until [`Session::close`].

use sqlx::{ConnectOptions, Connection, MySqlConnection};
use tracing::{debug, error, info};

use crate::config::ConnectionConfig;
use crate::error::{DbError, DbResult};

/// Owned holder of the single database connection.
pub struct Session {
    config: ConnectionConfig,
    conn: Option<MySqlConnection>,
}

impl Session {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config, conn: None }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Return the open connection, opening and verifying it first if needed.
    pub async fn connection(&mut self) -> DbResult<&mut MySqlConnection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.open().await?,
        };
        Ok(self.conn.insert(conn))
    }

    async fn open(&self) -> DbResult<MySqlConnection> {
        let target = self.config.display_target();
        debug!(target_db = %target, tls = self.config.tls.enabled, "opening connection");

        // Every failure, including an unreadable CA file, goes through one log line.
        let verified = async {
            let options = self.config.connect_options().await?;
            let mut conn = options.connect().await.map_err(DbError::Connection)?;
            conn.ping().await.map_err(DbError::Connection)?;
            Ok::<_, DbError>(conn)
        }
        .await;

        match verified {
            Ok(conn) => {
                info!(target_db = %target, "Connection has been established successfully.");
                Ok(conn)
            }
            Err(e) => {
                error!(target_db = %target, error = %e, "Unable to connect to the database");
                Err(e)
            }
        }
    }

    /// Server-side id of the open connection (opens one if needed).
    pub async fn connection_id(&mut self) -> DbResult<u64> {
        let conn = self.connection().await?;
        let id: u64 = sqlx::query_scalar("SELECT CONNECTION_ID()")
            .fetch_one(conn)
            .await?;
        Ok(id)
    }

    /// Close the connection if one is open. Does nothing otherwise.
    pub async fn close(&mut self) -> DbResult<()> {
        let Some(conn) = self.conn.take() else {
            debug!("close requested with no open connection");
            return Ok(());
        };
        conn.close().await?;
        info!(target_db = %self.config.display_target(), "Connection closed.");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("is_open", &self.is_open())
            .finish()
    }
}
