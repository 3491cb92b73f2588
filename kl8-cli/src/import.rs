use anyhow::{Context, Result, bail};
use kl8_db::rusqlite::Connection;
use std::path::Path;

use kl8_db::db::{insert_draw, replace_draws};
use kl8_db::models::{Draw, Pool};

/// Ligne `période;date;n1;…;n20`.
fn parse_record(record: &csv::StringRecord, pool: Pool) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let issue = get(0)?;
    if issue.is_empty() || !issue.chars().all(|c| c.is_ascii_digit()) {
        bail!("Identifiant de période invalide : '{}'", issue);
    }
    let date = parse_date(&get(1)?)?;

    let numbers = (0..pool.pick_count)
        .map(|i| {
            let s = get(2 + i)?;
            s.parse::<u8>()
                .with_context(|| format!("Impossible de parser '{}' (index {})", s, 2 + i))
        })
        .collect::<Result<Vec<u8>>>()?;

    pool.validate_draw(&numbers)
        .with_context(|| format!("Tirage {} invalide", issue))?;

    Ok(Draw::new(issue, date, numbers))
}

/// `jj/mm/aaaa` devient `aaaa-mm-jj` ; une date déjà ISO est conservée.
fn parse_date(raw: &str) -> Result<String> {
    if raw.contains('-') {
        let parts: Vec<&str> = raw.split('-').collect();
        if parts.len() == 3 && parts[0].len() == 4 {
            return Ok(raw.to_string());
        }
        bail!("Format de date invalide: '{}'", raw);
    }
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        bail!("Format de date invalide: '{}'", raw);
    }
    Ok(format!("{}-{:0>2}-{:0>2}", parts[2], parts[1], parts[0]))
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Lit et valide tout le fichier, puis écrit en une transaction.
/// Avec `replace`, la table des tirages est vidée avant l'écriture.
pub fn import_csv(conn: &Connection, path: &Path, pool: Pool, replace: bool) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    let mut draws = Vec::new();
    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => {
                match parse_record(&record, pool) {
                    Ok(draw) => draws.push(draw),
                    Err(e) => {
                        tracing::warn!(line = result.total_records, error = %format!("{:#}", e), "ligne ignorée");
                        result.errors += 1;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(line = result.total_records, error = %e, "lecture impossible");
                result.errors += 1;
            }
        }
    }

    if replace {
        let inserted = replace_draws(conn, &draws)?;
        result.inserted = inserted as u32;
        result.skipped = (draws.len() - inserted) as u32;
        return Ok(result);
    }

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;
    for draw in &draws {
        if insert_draw(&tx, draw)? {
            result.inserted += 1;
        } else {
            result.skipped += 1;
        }
    }
    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kl8_db::db::{count_draws, fetch_all_draws, migrate};
    use std::io::Write;

    fn line(issue: &str, date: &str, numbers: &[u8]) -> String {
        let nums: Vec<String> = numbers.iter().map(|n| n.to_string()).collect();
        format!("{};{};{}\n", issue, date, nums.join(";"))
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("17/01/2026").unwrap(), "2026-01-17");
        assert_eq!(parse_date("1/2/2020").unwrap(), "2020-02-01");
        assert_eq!(parse_date("2026-01-16").unwrap(), "2026-01-16");
        assert!(parse_date("2026.01.16").is_err());
    }

    #[test]
    fn test_import_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draws.csv");
        let valid: Vec<u8> = (1..=20).map(|i| i * 4).collect();
        let mut duplicate = valid.clone();
        duplicate[1] = duplicate[0];

        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(line("2026018", "18/01/2026", &valid).as_bytes()).unwrap();
        file.write_all(line("2026018", "18/01/2026", &valid).as_bytes()).unwrap();
        file.write_all(line("2026019", "19/01/2026", &duplicate).as_bytes()).unwrap();
        file.write_all(line("2026020", "20/01/2026", &valid[..10]).as_bytes()).unwrap();
        drop(file);

        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let result = import_csv(&conn, &path, Pool::KL8, false).unwrap();

        assert_eq!(result.total_records, 4);
        assert_eq!(result.inserted, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 2);
        assert_eq!(count_draws(&conn).unwrap(), 1);

        let stored = fetch_all_draws(&conn).unwrap();
        assert_eq!(stored[0].date, "2026-01-18");
        assert_eq!(stored[0].numbers, valid);

        // Réimport en remplacement : les doublons du fichier comptent comme ignorés
        let result = import_csv(&conn, &path, Pool::KL8, true).unwrap();
        assert_eq!(result.inserted, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_import_missing_file() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert!(import_csv(&conn, Path::new("/nonexistent/draws.csv"), Pool::KL8, false).is_err());
    }
}
