use anyhow::{Context, Result};
use diesel::{
    SqliteConnection,
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Error as R2d2Error, Pool},
};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

const CREATE_PURCHASES_TABLE: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS purchases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    buyer_id INTEGER NOT NULL,
    buyer_name TEXT NOT NULL,
    payment_reference TEXT NOT NULL UNIQUE,
    amount INTEGER NOT NULL CHECK (amount > 0),
    status TEXT NOT NULL DEFAULT 'pending',
    ticket_number INTEGER UNIQUE CHECK (ticket_number > 0),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    CHECK ((status = 'paid') = (ticket_number IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS purchases_buyer_id_idx ON purchases (buyer_id, id);
"#;

#[derive(Debug, Default)]
struct BusyTimeout;

impl CustomizeConnection<SqliteConnection, R2d2Error> for BusyTimeout {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), R2d2Error> {
        conn.batch_execute(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"))
            .map_err(R2d2Error::QueryError)
    }
}

pub type SqlitePoolSquad = Pool<ConnectionManager<SqliteConnection>>;

/// Opens (or creates) the database file and makes sure the schema exists.
pub fn establish_connection(sqlite_path: &str) -> Result<SqlitePoolSquad> {
    let manager = ConnectionManager::<SqliteConnection>::new(sqlite_path);
    let pool = Pool::builder()
        .connection_customizer(Box::new(BusyTimeout))
        .build(manager)
        .with_context(|| format!("failed to open sqlite database at {sqlite_path}"))?;

    let mut conn = pool.get()?;
    conn.batch_execute(CREATE_PURCHASES_TABLE)
        .context("failed to create purchases table")?;

    Ok(pool)
}
