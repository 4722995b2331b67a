//! playerctl-db: the `players` table on TiDB
//!
//! - [`Session`] owns the single connection (lazy open, explicit close)
//! - [`define_players`] binds the table shape and returns a [`PlayerRepo`]
//! - [`Filter`] describes `{field, operator, value}` row filters

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod repo;
pub mod schema;
pub mod session;

pub use config::{load_dotenv, ConnectionConfig, TlsConfig};
pub use error::{DbError, DbResult};
pub use filter::{Comparison, Filter, FilterParseError, PlayerField, Predicate};
pub use models::{NewPlayer, Player, PlayerChanges};
pub use repo::{ColumnInfo, PlayerRepo};
pub use schema::{define_players, PLAYERS_TABLE, PLAYER_COLUMNS};
pub use session::Session;
