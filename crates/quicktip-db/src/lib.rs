// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use quicktip_app::{NewTipRecord, StoreChange, SubscriptionId, TipRecord, TipRecordId};
use rusqlite::{Connection, OptionalExtension, params};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::{debug, warn};

pub const APP_NAME: &str = "quicktip";

const DEMO_DAYS: i64 = 14;
const DEMO_BILLS: [f64; 8] = [42.50, 18.75, 63.20, 9.99, 127.40, 35.00, 88.15, 24.60];
const DEMO_PERCENTS: [i32; 6] = [15, 20, 10, 25, 18, 20];

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "tips",
    &["id", "bill_amount", "tip_percent", "tip_amount", "timestamp"],
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[RequiredIndex {
    name: "idx_tips_timestamp",
    create_sql: "CREATE INDEX IF NOT EXISTS idx_tips_timestamp ON tips (timestamp);",
}];

type Observer = Rc<dyn Fn(&StoreChange)>;

// Observers run synchronously on the calling thread after each commit.
pub struct Store {
    conn: Connection,
    observers: RefCell<Vec<(SubscriptionId, Observer)>>,
    next_subscription: Cell<i64>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self::with_connection(conn))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self::with_connection(conn))
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            observers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(1),
        }
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    pub fn subscribe(&self, observer: impl Fn(&StoreChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_subscription.get());
        self.next_subscription.set(id.get() + 1);
        self.observers.borrow_mut().push((id, Rc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    fn notify(&self, change: StoreChange) {
        // Snapshot so observers may subscribe or unsubscribe while running.
        let observers: Vec<Observer> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(&change);
        }
    }

    pub fn append(&self, record: &NewTipRecord) -> Result<TipRecordId> {
        let id = self.insert_tip(&self.conn, record)?;
        debug!(
            id = id.get(),
            bill_amount = record.bill_amount,
            tip_percent = record.tip_percent,
            "recorded tip"
        );
        self.notify(StoreChange::Appended(id));
        Ok(id)
    }

    // All or nothing.
    pub fn append_all(&self, records: &[NewTipRecord]) -> Result<Vec<TipRecordId>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin tip batch")?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(self.insert_tip(&tx, record)?);
        }
        tx.commit().context("commit tip batch")?;

        for id in &ids {
            self.notify(StoreChange::Appended(*id));
        }
        Ok(ids)
    }

    fn insert_tip(&self, conn: &Connection, record: &NewTipRecord) -> Result<TipRecordId> {
        if !record.bill_amount.is_finite() || !record.tip_amount.is_finite() {
            bail!(
                "tip amounts must be finite numbers, got bill {} and tip {}",
                record.bill_amount,
                record.tip_amount
            );
        }

        conn.execute(
            "
            INSERT INTO tips (bill_amount, tip_percent, tip_amount, timestamp)
            VALUES (?, ?, ?, ?)
            ",
            params![
                record.bill_amount,
                record.tip_percent,
                record.tip_amount,
                format_timestamp(record.timestamp)?,
            ],
        )
        .context("insert tip")?;

        Ok(TipRecordId::new(conn.last_insert_rowid()))
    }

    pub fn all(&self) -> Result<Vec<TipRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, bill_amount, tip_percent, tip_amount, timestamp
                FROM tips
                ORDER BY timestamp ASC, id ASC
                ",
            )
            .context("prepare tips query")?;
        let rows = stmt.query_map([], row_to_tip).context("query tips")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect tips")
    }

    pub fn get(&self, id: TipRecordId) -> Result<Option<TipRecord>> {
        self.conn
            .query_row(
                "
                SELECT id, bill_amount, tip_percent, tip_amount, timestamp
                FROM tips
                WHERE id = ?
                ",
                params![id.get()],
                row_to_tip,
            )
            .optional()
            .with_context(|| format!("load tip {}", id.get()))
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tips", [], |row| row.get(0))
            .context("count tips")?;
        usize::try_from(count).context("tip count out of range")
    }

    pub fn delete(&self, id: TipRecordId) -> Result<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM tips WHERE id = ?", params![id.get()])
            .with_context(|| format!("delete tip {}", id.get()))?;
        if rows_affected == 0 {
            warn!(id = id.get(), "tip already deleted");
            return Ok(false);
        }

        debug!(id = id.get(), "deleted tip");
        self.notify(StoreChange::Deleted(id));
        Ok(true)
    }

    pub fn clear(&self) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM tips", [])
            .context("clear tips")?;
        if removed > 0 {
            self.notify(StoreChange::Cleared);
        }
        Ok(removed)
    }

    pub fn seed_demo_data(&self, now: OffsetDateTime) -> Result<usize> {
        if self.count()? > 0 {
            return Ok(0);
        }

        let mut records = Vec::new();
        for day in 0..DEMO_DAYS {
            // Leave a gap every few days so history shows uneven spacing.
            if day % 4 == 3 {
                continue;
            }
            let per_day = 1 + (day as usize * 7) % 3;
            for slot in 0..per_day {
                let sample = (day as usize * 3 + slot) % DEMO_BILLS.len();
                let percent = DEMO_PERCENTS[(day as usize + slot) % DEMO_PERCENTS.len()];
                let timestamp =
                    now - Duration::days(day) - Duration::minutes(45 + 140 * slot as i64);
                records.push(NewTipRecord::new(DEMO_BILLS[sample], percent, timestamp));
            }
        }
        records.sort_by_key(|record| record.timestamp);

        let ids = self.append_all(&records).context("seed demo tips")?;
        debug!(count = ids.len(), "seeded demo tips");
        Ok(ids.len())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("QUICKTIP_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    Ok(data_dir()?.join("quicktip.db"))
}

pub fn default_log_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("quicktip.log"))
}

fn data_dir() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set QUICKTIP_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir)
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn row_to_tip(row: &rusqlite::Row<'_>) -> rusqlite::Result<TipRecord> {
    let timestamp_raw: String = row.get(4)?;
    Ok(TipRecord {
        id: TipRecordId::new(row.get(0)?),
        bill_amount: row.get(1)?,
        tip_percent: row.get(2)?,
        tip_amount: row.get(3)?,
        timestamp: parse_datetime(&timestamp_raw).map_err(to_sql_error)?,
    })
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a quicktip database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; this database was not created by quicktip",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!("database is missing required indexes: {}", missing.join(", "));
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

// Fixed width keeps text order chronological.
fn format_timestamp(value: OffsetDateTime) -> Result<String> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
        ))
        .context("format tip timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, parse_datetime};
    use anyhow::Result;
    use time::macros::datetime;

    #[test]
    fn timestamps_are_fixed_width_utc() -> Result<()> {
        let local = datetime!(2023-03-15 21:30:05.5 +02:00);
        let formatted = format_timestamp(local)?;
        assert_eq!(formatted, "2023-03-15T19:30:05.500000000Z");
        assert_eq!(parse_datetime(&formatted)?, local);
        Ok(())
    }

    #[test]
    fn parse_datetime_accepts_sqlite_style_text() -> Result<()> {
        assert_eq!(
            parse_datetime("2023-03-15 09:00:00")?,
            datetime!(2023-03-15 09:00 UTC)
        );
        assert!(parse_datetime("yesterday").is_err());
        Ok(())
    }
}
