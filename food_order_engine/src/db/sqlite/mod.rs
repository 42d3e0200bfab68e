//! SQLite backend for the order engine.
//!
//! The free functions in [`orders`], [`status_history`], [`rewards`] and [`reviews`] all take a bare
//! `&mut SqliteConnection`. They are not atomic on their own; [`SqliteDatabase`] composes them inside transactions
//! where the engine needs atomicity.
pub mod db;
mod errors;

pub mod orders;
pub mod reviews;
pub mod rewards;
pub mod status_history;

use std::{env, str::FromStr, time::Duration};

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/food_orders.db";

pub fn db_url() -> String {
    let result = env::var("FOS_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ FOS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
