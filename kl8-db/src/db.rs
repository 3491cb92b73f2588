use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::Draw;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    issue    TEXT PRIMARY KEY,
    date     TEXT NOT NULL,
    numbers  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS history_cache (
    issue    TEXT PRIMARY KEY,
    date     TEXT NOT NULL,
    numbers  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS cache_meta (
    key      TEXT PRIMARY KEY,
    value    TEXT NOT NULL
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("kl8.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub(crate) fn encode_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn decode_numbers(raw: &str) -> std::result::Result<Vec<u8>, std::num::ParseIntError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',').map(|s| s.trim().parse::<u8>()).collect()
}

pub(crate) fn row_to_draw(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draw> {
    let raw: String = row.get(2)?;
    let numbers = decode_numbers(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Draw::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?, numbers))
}

/// Retourne `true` si le tirage a été inséré, `false` si l'identifiant existait déjà.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (issue, date, numbers) VALUES (?1, ?2, ?3)",
        rusqlite::params![draw.issue, draw.date, encode_numbers(&draw.numbers)],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

/// Remplace tout le contenu de la table par l'historique donné.
pub fn replace_draws(conn: &Connection, draws: &[Draw]) -> Result<usize> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;
    tx.execute("DELETE FROM draws", [])?;
    let mut inserted = 0;
    for draw in draws {
        if insert_draw(&tx, draw)? {
            inserted += 1;
        }
    }
    tx.commit().context("Échec du commit")?;
    Ok(inserted)
}

pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT issue, date, numbers FROM draws
         ORDER BY CAST(issue AS INTEGER) DESC, issue DESC LIMIT ?1"
    )?;
    let draws = stmt.query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<Draw>> {
    let n = count_draws(conn)?;
    fetch_last_draws(conn, n)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}
