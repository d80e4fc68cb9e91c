//! Schema bootstrap and additive migrations
//!
//! The store evolves by adding columns only: an explicit, ordered list
//! of column migrations is replayed idempotently at every startup.
//! Rows written by older builds pick up new columns through their
//! DEFAULT; an existing column whose declared type disagrees with the
//! expected one is a terminal conflict, never silently coerced.

use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// Schema evolution failures
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("column {table}.{column} exists with type {found}, expected {expected}")]
    ColumnConflict {
        table: String,
        column: String,
        expected: String,
        found: String,
    },

    #[error("schema statement failed: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// One additive column migration.
struct ColumnMigration {
    table: &'static str,
    column: &'static str,
    /// SQLite storage type the column must have.
    sql_type: &'static str,
    /// Full declaration used when the column is added.
    declaration: &'static str,
}

/// Ordered migration list. Append-only: entries are never reordered or
/// removed once shipped.
const COLUMN_MIGRATIONS: &[ColumnMigration] = &[
    ColumnMigration { table: "customers", column: "price_eur_per_kwh", sql_type: "REAL", declaration: "REAL NOT NULL DEFAULT 0.2" },
    ColumnMigration { table: "customers", column: "fixed_daily_fee_eur", sql_type: "REAL", declaration: "REAL NOT NULL DEFAULT 0" },
    ColumnMigration { table: "customers", column: "has_smart_meter", sql_type: "INTEGER", declaration: "INTEGER NOT NULL DEFAULT 1" },
    ColumnMigration { table: "customers", column: "home_area_m2", sql_type: "REAL", declaration: "REAL NOT NULL DEFAULT 80" },
    ColumnMigration { table: "customers", column: "household_size", sql_type: "INTEGER", declaration: "INTEGER NOT NULL DEFAULT 2" },
    ColumnMigration { table: "customers", column: "locality_type", sql_type: "TEXT", declaration: "TEXT NOT NULL DEFAULT 'urban'" },
    ColumnMigration { table: "customers", column: "dwelling_type", sql_type: "TEXT", declaration: "TEXT NOT NULL DEFAULT 'apartment'" },
    ColumnMigration { table: "customers", column: "build_year_band", sql_type: "TEXT", declaration: "TEXT NOT NULL DEFAULT '2000-2014'" },
    ColumnMigration { table: "customers", column: "heating_sources", sql_type: "TEXT", declaration: "TEXT NOT NULL DEFAULT ''" },
    ColumnMigration { table: "customers", column: "has_solar", sql_type: "INTEGER", declaration: "INTEGER NOT NULL DEFAULT 0" },
    ColumnMigration { table: "customers", column: "ev_count", sql_type: "INTEGER", declaration: "INTEGER NOT NULL DEFAULT 0" },
    ColumnMigration { table: "customers", column: "alert_sensitivity", sql_type: "TEXT", declaration: "TEXT NOT NULL DEFAULT 'medium'" },
    ColumnMigration { table: "customers", column: "main_appliances", sql_type: "TEXT", declaration: "TEXT NOT NULL DEFAULT ''" },
];

/// Create base tables, apply column migrations, build indexes.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), SchemaError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          segment TEXT NOT NULL,
          city TEXT NOT NULL,
          contracted_power_kva REAL NOT NULL,
          tariff TEXT NOT NULL,
          utility TEXT NOT NULL,
          created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customer_telemetry_15m (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          customer_id TEXT NOT NULL,
          ts TEXT NOT NULL,
          watts REAL NOT NULL,
          cost_eur REAL NOT NULL,
          temp_c REAL,
          is_estimated INTEGER NOT NULL DEFAULT 0,
          FOREIGN KEY(customer_id) REFERENCES customers(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    for migration in COLUMN_MIGRATIONS {
        apply_column_migration(pool, migration).await?;
    }

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_customer_telemetry_15m_customer_ts \
         ON customer_telemetry_15m(customer_id, ts)",
    )
    .execute(pool)
    .await?;

    info!("schema up to date");
    Ok(())
}

async fn apply_column_migration(
    pool: &SqlitePool,
    migration: &ColumnMigration,
) -> Result<(), SchemaError> {
    let existing = existing_column_type(pool, migration.table, migration.column).await?;

    match existing {
        Some(found) if !found.eq_ignore_ascii_case(migration.sql_type) => {
            Err(SchemaError::ColumnConflict {
                table: migration.table.to_string(),
                column: migration.column.to_string(),
                expected: migration.sql_type.to_string(),
                found,
            })
        }
        Some(_) => Ok(()),
        None => {
            debug!(
                table = migration.table,
                column = migration.column,
                "adding missing column"
            );
            sqlx::query(&format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                migration.table, migration.column, migration.declaration
            ))
            .execute(pool)
            .await?;
            Ok(())
        }
    }
}

async fn existing_column_type(
    pool: &SqlitePool,
    table: &str,
    column: &str,
) -> Result<Option<String>, SchemaError> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
        .fetch_all(pool)
        .await?;

    for row in rows {
        let name: String = row.try_get("name")?;
        if name == column {
            let sql_type: String = row.try_get("type")?;
            return Ok(Some(sql_type));
        }
    }
    Ok(None)
}
