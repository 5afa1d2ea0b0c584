use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};

use crate::resolve::MappingRow;
use crate::util::{ensure_directory, now_utc_string};

pub const MAPPING_TABLE: &str = "ward_mappings";

const COLUMNS: [&str; 7] = [
    "old_province_code",
    "old_district_code",
    "old_ward_code",
    "new_province_code",
    "new_commune_code",
    "note",
    "resolution_ref",
];

/// Renders `rows` as `INSERT` statements of at most `batch_size` tuples each.
pub fn render_insert_sql(rows: &[MappingRow], table: &str, batch_size: usize) -> Result<String> {
    if batch_size == 0 {
        bail!("batch size must be at least 1");
    }
    if table.is_empty() || !table.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        bail!("invalid table name: {table:?}");
    }

    let mut sql = String::new();
    for batch in rows.chunks(batch_size) {
        let tuples = batch
            .iter()
            .map(|row| {
                let values = row_values(row)
                    .iter()
                    .map(|value| sql_literal(value))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("  ({values})")
            })
            .collect::<Vec<_>>()
            .join(",\n");

        sql.push_str(&format!(
            "INSERT INTO {table} ({}) VALUES\n{tuples};\n",
            COLUMNS.join(", ")
        ));
    }

    Ok(sql)
}

fn row_values(row: &MappingRow) -> [&str; 7] {
    [
        &row.old_province_code,
        &row.old_district_code,
        &row.old_ward_code,
        &row.new_province_code,
        &row.new_commune_code,
        &row.note,
        &row.resolution_ref,
    ]
}

fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(path)
        .with_context(|| format!("failed to open sqlite database: {}", path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS ward_mappings (
              old_province_code TEXT NOT NULL,
              old_district_code TEXT NOT NULL,
              old_ward_code TEXT NOT NULL,
              new_province_code TEXT NOT NULL,
              new_commune_code TEXT NOT NULL,
              note TEXT NOT NULL,
              resolution_ref TEXT NOT NULL,
              recorded_at TEXT NOT NULL,
              PRIMARY KEY (old_ward_code, new_commune_code, resolution_ref)
            );

            CREATE INDEX IF NOT EXISTS idx_ward_mappings_new ON ward_mappings(new_commune_code);
            ",
        )
        .context("failed to create ward_mappings schema")?;
    Ok(())
}

/// Upserts `rows` in one transaction. Re-running a document replaces its
/// notes rather than duplicating rows.
pub fn persist_rows(connection: &mut Connection, rows: &[MappingRow]) -> Result<usize> {
    let recorded_at = now_utc_string();
    let tx = connection.transaction()?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO ward_mappings(
              old_province_code, old_district_code, old_ward_code,
              new_province_code, new_commune_code, note, resolution_ref, recorded_at
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(old_ward_code, new_commune_code, resolution_ref) DO UPDATE SET
              old_province_code=excluded.old_province_code,
              old_district_code=excluded.old_district_code,
              new_province_code=excluded.new_province_code,
              note=excluded.note,
              recorded_at=excluded.recorded_at
            ",
        )?;

        for row in rows {
            statement.execute(params![
                &row.old_province_code,
                &row.old_district_code,
                &row.old_ward_code,
                &row.new_province_code,
                &row.new_commune_code,
                &row.note,
                &row.resolution_ref,
                &recorded_at,
            ])?;
        }
    }

    tx.commit()?;
    Ok(rows.len())
}
