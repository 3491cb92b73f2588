//! Cache de l'historique, indexé par une empreinte de version.
//!
//! Un cache n'est jamais une source d'erreur fatale : `put` retourne une
//! `CacheError` que l'appelant peut ignorer, et `get` ne rend les données que si
//! l'empreinte stockée correspond à celle attendue.

use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

use crate::db::{encode_numbers, row_to_draw};
use crate::models::Draw;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Le préfixe demandé dépasse la capacité du cache.
    #[error("quota du cache dépassé : {requested} tirages demandés, {quota} autorisés")]
    QuotaExceeded { requested: usize, quota: usize },

    #[error("erreur de stockage du cache : {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}

pub trait HistoryCache {
    /// Historique mis en cache, uniquement si son empreinte vaut `fingerprint`.
    fn get(&self, fingerprint: &str) -> Option<Vec<Draw>>;

    fn put(&mut self, fingerprint: &str, draws: &[Draw]) -> Result<(), CacheError>;
}

/// Cache en mémoire avec un quota en nombre de tirages.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    quota: usize,
    entry: Option<(String, Vec<Draw>)>,
}

impl MemoryCache {
    pub fn with_quota(quota: usize) -> Self {
        Self { quota, entry: None }
    }

    pub fn len(&self) -> usize {
        self.entry.as_ref().map(|(_, d)| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_quota(usize::MAX)
    }
}

impl HistoryCache for MemoryCache {
    fn get(&self, fingerprint: &str) -> Option<Vec<Draw>> {
        match &self.entry {
            Some((stored, draws)) if stored == fingerprint => Some(draws.clone()),
            _ => None,
        }
    }

    fn put(&mut self, fingerprint: &str, draws: &[Draw]) -> Result<(), CacheError> {
        if draws.len() > self.quota {
            return Err(CacheError::QuotaExceeded {
                requested: draws.len(),
                quota: self.quota,
            });
        }
        self.entry = Some((fingerprint.to_string(), draws.to_vec()));
        Ok(())
    }
}

const FINGERPRINT_KEY: &str = "db_version";

/// Cache persistant dans les tables `history_cache` / `cache_meta`.
/// La connexion doit avoir été migrée (`db::migrate`).
pub struct SqliteCache<'c> {
    conn: &'c Connection,
    quota: usize,
}

impl<'c> SqliteCache<'c> {
    pub fn new(conn: &'c Connection, quota: usize) -> Self {
        Self { conn, quota }
    }

    fn stored_fingerprint(&self) -> Result<Option<String>, CacheError> {
        let value = self.conn
            .query_row(
                "SELECT value FROM cache_meta WHERE key = ?1",
                [FINGERPRINT_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn load(&self) -> Result<Vec<Draw>, CacheError> {
        let mut stmt = self.conn.prepare(
            "SELECT issue, date, numbers FROM history_cache
             ORDER BY CAST(issue AS INTEGER) DESC, issue DESC"
        )?;
        let draws = stmt.query_map([], row_to_draw)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(draws)
    }
}

impl HistoryCache for SqliteCache<'_> {
    fn get(&self, fingerprint: &str) -> Option<Vec<Draw>> {
        match self.stored_fingerprint() {
            Ok(Some(stored)) if stored == fingerprint => match self.load() {
                Ok(draws) => Some(draws),
                Err(e) => {
                    tracing::warn!(error = %e, "lecture du cache impossible");
                    None
                }
            },
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "empreinte du cache illisible");
                None
            }
        }
    }

    fn put(&mut self, fingerprint: &str, draws: &[Draw]) -> Result<(), CacheError> {
        if draws.len() > self.quota {
            return Err(CacheError::QuotaExceeded {
                requested: draws.len(),
                quota: self.quota,
            });
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM history_cache", [])?;
        for draw in draws {
            tx.execute(
                "INSERT OR IGNORE INTO history_cache (issue, date, numbers) VALUES (?1, ?2, ?3)",
                rusqlite::params![draw.issue, draw.date, encode_numbers(&draw.numbers)],
            )?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO cache_meta (key, value) VALUES (?1, ?2)",
            rusqlite::params![FINGERPRINT_KEY, fingerprint],
        )?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;

    fn sample() -> Vec<Draw> {
        vec![
            Draw::new("2026002", "2026-01-02", vec![4, 5, 6]),
            Draw::new("2026001", "2026-01-01", vec![1, 2, 3]),
        ]
    }

    #[test]
    fn test_memory_cache_roundtrip() {
        let mut cache = MemoryCache::default();
        assert!(cache.get("V1").is_none());
        cache.put("V1", &sample()).unwrap();
        assert_eq!(cache.get("V1"), Some(sample()));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_memory_cache_fingerprint_mismatch() {
        let mut cache = MemoryCache::default();
        cache.put("V1", &sample()).unwrap();
        assert!(cache.get("V2").is_none());
    }

    #[test]
    fn test_memory_cache_quota() {
        let mut cache = MemoryCache::with_quota(1);
        let err = cache.put("V1", &sample()).unwrap_err();
        assert_eq!(err, CacheError::QuotaExceeded { requested: 2, quota: 1 });
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sqlite_cache_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let mut cache = SqliteCache::new(&conn, 1000);

        assert!(cache.get("V1").is_none());
        cache.put("V1", &sample()).unwrap();
        assert_eq!(cache.get("V1"), Some(sample()));
        assert!(cache.get("V0").is_none());
    }

    #[test]
    fn test_sqlite_cache_overwrite() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let mut cache = SqliteCache::new(&conn, 1000);

        cache.put("V1", &sample()).unwrap();
        cache.put("V2", &sample()[..1]).unwrap();
        assert!(cache.get("V1").is_none());
        assert_eq!(cache.get("V2").map(|d| d.len()), Some(1));
    }

    #[test]
    fn test_sqlite_cache_quota() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let mut cache = SqliteCache::new(&conn, 1);
        assert!(matches!(
            cache.put("V1", &sample()),
            Err(CacheError::QuotaExceeded { .. })
        ));
    }
}
