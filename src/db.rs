use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

// SQLite's LOWER() and NOCASE only fold ASCII. Every `*_lc` column holds the
// Unicode-lowercased copy of its source column, written by the application on
// insert and update, and is what search and service-name uniqueness compare.
const SCHEMA: [&str; 7] = [
    r#"
    CREATE TABLE IF NOT EXISTS doctors (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      specialization TEXT NOT NULL,
      email TEXT NOT NULL UNIQUE,
      phone TEXT NOT NULL,
      license_number TEXT NOT NULL UNIQUE,
      bio TEXT,
      is_active BOOLEAN NOT NULL DEFAULT 1,
      name_lc TEXT NOT NULL,
      specialization_lc TEXT NOT NULL,
      email_lc TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS patients (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      first_name TEXT NOT NULL,
      last_name TEXT NOT NULL,
      email TEXT NOT NULL UNIQUE,
      phone TEXT NOT NULL,
      date_of_birth DATE NOT NULL,
      address TEXT NOT NULL,
      medical_history TEXT,
      allergies TEXT,
      is_active BOOLEAN NOT NULL DEFAULT 1,
      first_name_lc TEXT NOT NULL,
      last_name_lc TEXT NOT NULL,
      email_lc TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      description TEXT NOT NULL,
      price REAL NOT NULL CHECK (price >= 0),
      duration_minutes INTEGER NOT NULL DEFAULT 30 CHECK (duration_minutes > 0),
      is_available BOOLEAN NOT NULL DEFAULT 1,
      name_lc TEXT NOT NULL UNIQUE,
      description_lc TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      patient_id INTEGER NOT NULL REFERENCES patients(id),
      doctor_id INTEGER NOT NULL REFERENCES doctors(id),
      appointment_date DATETIME NOT NULL,
      duration_minutes INTEGER NOT NULL DEFAULT 30 CHECK (duration_minutes > 0),
      status TEXT NOT NULL DEFAULT 'scheduled'
        CHECK (status IN ('scheduled', 'completed', 'cancelled')),
      notes TEXT,
      created_at DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments (doctor_id)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments (patient_id)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments (appointment_date)",
];

/// Opens a pool against `database_url`. Foreign keys are enforced on every
/// connection; idle connections are kept so `sqlite::memory:` pools survive.
pub async fn connect_sqlite(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Creates every table and index that does not exist yet.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::debug!("schema ready");
    Ok(())
}
