//! Company intelligence store: profiles, director ledger, sponsor history,
//! and per-company filing links.
//!
//! One persistent connection per process. Companies are matched by ticker
//! first (case-insensitive), then by name (case-insensitive).

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::schema::COMPANY_SCHEMA_SQL;
use crate::types::*;
use crate::{normalize_ticker, now_timestamp};
use jaibird_core::{Error, Result};

/// SQLite store for accumulated company intelligence.
pub struct CompanyStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl CompanyStore {
    /// Open or create the company database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 30000;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(COMPANY_SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        info!(
            "CompanyStore initialized: {} companies, path={}",
            store.count_companies()?,
            store.db_path.display()
        );
        Ok(store)
    }

    // ---------------------------------------------------------------
    // Company upsert
    // ---------------------------------------------------------------

    /// Insert or update a company, returning its id.
    ///
    /// Matches on ticker first, then name. Empty or invalid tickers and
    /// empty websites never overwrite stored values.
    pub fn upsert_company(
        &self,
        name: &str,
        jse_code: Option<&str>,
        website: Option<&str>,
    ) -> Result<i64> {
        let code = jse_code.and_then(normalize_ticker);
        let website = website.map(str::trim).filter(|w| !w.is_empty());
        let now = now_timestamp();

        let conn = self.conn.lock();
        let mut existing: Option<i64> = None;
        if let Some(code) = &code {
            existing = conn
                .prepare_cached(
                    "SELECT id FROM companies WHERE LOWER(jse_code) = LOWER(?1) AND jse_code != ''",
                )
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![code], |row| row.get(0))
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;
        }
        if existing.is_none() {
            existing = conn
                .prepare_cached("SELECT id FROM companies WHERE LOWER(name) = LOWER(?1)")
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![name.trim()], |row| row.get(0))
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;
        }

        if let Some(id) = existing {
            conn.execute(
                "UPDATE companies
                 SET jse_code = COALESCE(NULLIF(?1, ''), jse_code),
                     website = COALESCE(NULLIF(?2, ''), website),
                     last_updated = ?3
                 WHERE id = ?4",
                params![code.as_deref().unwrap_or(""), website.unwrap_or(""), now, id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
            return Ok(id);
        }

        let id = conn
            .prepare_cached(
                "INSERT INTO companies (name, jse_code, website, first_seen, last_updated) \
                 VALUES (?1, ?2, ?3, ?4, ?4)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                name.trim(),
                code.as_deref().unwrap_or(""),
                website.unwrap_or(""),
                now
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        debug!("Created company {} ({:?}) id={}", name, code, id);
        Ok(id)
    }

    /// Overwrite the ticker when a valid one is given.
    ///
    /// A ticker already held by another company is never copied onto this
    /// row; the owner's id is returned instead.
    pub fn set_ticker(&self, company_id: i64, jse_code: &str) -> Result<TickerUpdate> {
        let Some(code) = normalize_ticker(jse_code) else {
            return Ok(TickerUpdate::Unchanged);
        };
        let conn = self.conn.lock();
        let owner: Option<i64> = conn
            .prepare_cached(
                "SELECT id FROM companies \
                 WHERE LOWER(jse_code) = LOWER(?1) AND jse_code != '' AND id != ?2 \
                 ORDER BY id LIMIT 1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![code, company_id], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        if let Some(owner) = owner {
            warn!(
                "Ticker {} already belongs to company {}; not assigning it to {}",
                code, owner, company_id
            );
            return Ok(TickerUpdate::OwnedBy(owner));
        }

        let count = conn
            .execute(
                "UPDATE companies SET jse_code = ?1, last_updated = ?2 \
                 WHERE id = ?3 AND jse_code != ?1",
                params![code, now_timestamp(), company_id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(if count > 0 {
            TickerUpdate::Set
        } else {
            TickerUpdate::Unchanged
        })
    }

    // ---------------------------------------------------------------
    // Filing links
    // ---------------------------------------------------------------

    /// Link a filing to the company's activity feed. Idempotent; returns
    /// `false` when the link already existed.
    pub fn link_filing(
        &self,
        company_id: i64,
        sens_number: &str,
        date_published: Option<&str>,
        title: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "INSERT OR IGNORE INTO company_sens (company_id, sens_number, date_published, title) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![company_id, sens_number, date_published, title],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Most recent filings for a company.
    pub fn get_company_sens(&self, company_id: i64, limit: usize) -> Result<Vec<CompanyFiling>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, company_id, sens_number, date_published, title FROM company_sens \
                 WHERE company_id = ?1 ORDER BY date_published DESC LIMIT ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![company_id, limit as i64], |row| {
                Ok(CompanyFiling {
                    id: row.get(0)?,
                    company_id: row.get(1)?,
                    sens_number: row.get(2)?,
                    date_published: row.get(3)?,
                    title: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Sponsor history
    // ---------------------------------------------------------------

    /// Record a sponsor if it differs from the current one.
    ///
    /// History is append-only; the current sponsor is the latest entry.
    /// Returns whether a new history entry was written.
    pub fn set_sponsor(&self, company_id: i64, sponsor: &str, source: &str) -> Result<bool> {
        let sponsor = sponsor.trim();
        if sponsor.is_empty() {
            return Ok(false);
        }

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;

        let current: Option<String> = tx
            .query_row(
                "SELECT sponsor FROM sponsor_history WHERE company_id = ?1 \
                 ORDER BY id DESC LIMIT 1",
                params![company_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        if current.as_deref() == Some(sponsor) {
            return Ok(false);
        }

        let now = now_timestamp();
        tx.execute(
            "INSERT INTO sponsor_history (company_id, sponsor, effective_date, source) \
             VALUES (?1, ?2, ?3, ?4)",
            params![company_id, sponsor, now, source],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        tx.execute(
            "UPDATE companies SET sponsor = ?1, last_updated = ?2 WHERE id = ?3",
            params![sponsor, now, company_id],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;

        info!("Sponsor for company {} set to {} ({})", company_id, sponsor, source);
        Ok(true)
    }

    /// Sponsor history, newest first.
    pub fn get_sponsor_history(&self, company_id: i64) -> Result<Vec<SponsorChange>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, company_id, sponsor, effective_date, source FROM sponsor_history \
                 WHERE company_id = ?1 ORDER BY id DESC",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![company_id], |row| {
                Ok(SponsorChange {
                    id: row.get(0)?,
                    company_id: row.get(1)?,
                    sponsor: row.get(2)?,
                    effective_date: row.get(3)?,
                    source: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Director ledger
    // ---------------------------------------------------------------

    /// Add a director, or update the role of the existing active record
    /// with the same (case-insensitive) name. Returns the record id.
    pub fn add_director(
        &self,
        company_id: i64,
        name: &str,
        role: &str,
        appointed_date: Option<&str>,
        source_sens: &str,
    ) -> Result<i64> {
        let name = name.trim();
        let conn = self.conn.lock();
        let existing: Option<i64> = conn
            .prepare_cached(
                "SELECT id FROM directors \
                 WHERE company_id = ?1 AND LOWER(name) = LOWER(?2) AND is_active = 1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![company_id, name], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        if let Some(id) = existing {
            if !role.trim().is_empty() {
                conn.execute(
                    "UPDATE directors SET role = ?1, source_sens = ?2 WHERE id = ?3",
                    params![role.trim(), source_sens, id],
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            }
            return Ok(id);
        }

        // The same appointment, already resigned by a later filing
        if let Some(date) = appointed_date.filter(|d| !d.trim().is_empty()) {
            let resigned: Option<i64> = conn
                .prepare_cached(
                    "SELECT id FROM directors \
                     WHERE company_id = ?1 AND LOWER(name) = LOWER(?2) AND is_active = 0 \
                     AND appointed_date = ?3 LIMIT 1",
                )
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![company_id, name, date], |row| row.get(0))
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;
            if let Some(id) = resigned {
                return Ok(id);
            }
        }

        let id = conn
            .prepare_cached(
                "INSERT INTO directors (company_id, name, role, appointed_date, source_sens, is_active) \
                 VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![company_id, name, role.trim(), appointed_date, source_sens])
            .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute(
            "UPDATE companies SET last_updated = ?1 WHERE id = ?2",
            params![now_timestamp(), company_id],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// Mark a director as resigned.
    ///
    /// The active record with the same (case-insensitive) name is made
    /// inactive. If the name has no record at all, an inactive one is
    /// inserted so the resignation is still on the ledger; a name that is
    /// already only on the ledger as resigned is left alone.
    pub fn resign_director(
        &self,
        company_id: i64,
        name: &str,
        role: &str,
        resigned_date: Option<&str>,
        source_sens: &str,
    ) -> Result<ResignOutcome> {
        let name = name.trim();
        let now = now_timestamp();
        let resigned_date = resigned_date.map(str::to_string).unwrap_or_else(|| now.clone());

        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE directors SET is_active = 0, resigned_date = ?1, source_sens = ?2 \
                 WHERE company_id = ?3 AND LOWER(name) = LOWER(?4) AND is_active = 1",
                params![resigned_date, source_sens, company_id, name],
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        let outcome = if count > 0 {
            ResignOutcome::MarkedInactive
        } else {
            let resigned: Option<i64> = conn
                .prepare_cached(
                    "SELECT id FROM directors \
                     WHERE company_id = ?1 AND LOWER(name) = LOWER(?2) AND is_active = 0 LIMIT 1",
                )
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![company_id, name], |row| row.get(0))
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;
            if resigned.is_some() {
                return Ok(ResignOutcome::AlreadyResigned);
            }
            conn.execute(
                "INSERT INTO directors (company_id, name, role, resigned_date, source_sens, is_active) \
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![company_id, name, role.trim(), resigned_date, source_sens],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
            ResignOutcome::RecordedNew
        };

        conn.execute(
            "UPDATE companies SET last_updated = ?1 WHERE id = ?2",
            params![now, company_id],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(outcome)
    }

    /// Directors for a company, ordered by name.
    pub fn get_directors(&self, company_id: i64, active_only: bool) -> Result<Vec<Director>> {
        let sql = if active_only {
            "SELECT * FROM directors WHERE company_id = ?1 AND is_active = 1 ORDER BY name"
        } else {
            "SELECT * FROM directors WHERE company_id = ?1 ORDER BY name"
        };
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![company_id], |row| Ok(Self::row_to_director(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Description / sector
    // ---------------------------------------------------------------

    /// Stored description, empty if none.
    pub fn get_description(&self, company_id: i64) -> Result<String> {
        let conn = self.conn.lock();
        let desc: Option<Option<String>> = conn
            .query_row(
                "SELECT description FROM companies WHERE id = ?1",
                params![company_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(desc.flatten().unwrap_or_default())
    }

    pub fn update_description(&self, company_id: i64, description: &str) -> Result<()> {
        let description = description.trim();
        if description.is_empty() {
            return Ok(());
        }
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE companies SET description = ?1, last_updated = ?2 WHERE id = ?3",
            params![description, now_timestamp(), company_id],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Stored sector label, empty if none.
    pub fn get_sector(&self, company_id: i64) -> Result<String> {
        let conn = self.conn.lock();
        let sector: Option<Option<String>> = conn
            .query_row(
                "SELECT sector FROM companies WHERE id = ?1",
                params![company_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(sector.flatten().unwrap_or_default())
    }

    pub fn update_sector(&self, company_id: i64, sector: &str) -> Result<()> {
        let sector = sector.trim();
        if sector.is_empty() {
            return Ok(());
        }
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE companies SET sector = ?1, last_updated = ?2 WHERE id = ?3",
            params![sector, now_timestamp(), company_id],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn get_company(&self, company_id: i64) -> Result<Option<CompanyProfile>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM companies WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![company_id], |row| Ok(Self::row_to_profile(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Look up a company by ticker (case-insensitive).
    pub fn get_company_by_ticker(&self, jse_code: &str) -> Result<Option<CompanyProfile>> {
        let code = jse_code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM companies WHERE LOWER(jse_code) = LOWER(?1)")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![code], |row| Ok(Self::row_to_profile(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Full profile with directors, sponsor history and recent filings.
    pub fn get_company_detail(&self, company_id: i64) -> Result<Option<CompanyDetail>> {
        let Some(profile) = self.get_company(company_id)? else {
            return Ok(None);
        };
        Ok(Some(CompanyDetail {
            profile,
            directors: self.get_directors(company_id, false)?,
            sponsor_history: self.get_sponsor_history(company_id)?,
            recent_sens: self.get_company_sens(company_id, 30)?,
        }))
    }

    /// All companies with director and filing counts, ordered by name.
    pub fn get_all_profiles(&self) -> Result<Vec<CompanySummary>> {
        self.query_summaries("", None)
    }

    /// Substring search across name, ticker, description and sector.
    pub fn search_companies(&self, query: &str) -> Result<Vec<CompanySummary>> {
        let pattern = format!("%{}%", query.trim());
        self.query_summaries(
            "WHERE c.name LIKE ?1 OR c.jse_code LIKE ?1 OR c.description LIKE ?1 OR c.sector LIKE ?1",
            Some(&pattern),
        )
    }

    fn query_summaries(&self, filter: &str, pattern: Option<&str>) -> Result<Vec<CompanySummary>> {
        let sql = format!(
            "SELECT c.*, \
             (SELECT COUNT(*) FROM directors d WHERE d.company_id = c.id AND d.is_active = 1) AS director_count, \
             (SELECT COUNT(*) FROM company_sens s WHERE s.company_id = c.id) AS sens_count \
             FROM companies c {} ORDER BY c.name",
            filter
        );
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows: Vec<CompanySummary> = match pattern {
            Some(p) => stmt
                .query_map(params![p], Self::row_to_summary)
                .map_err(|e| Error::Database(e.to_string()))?
                .filter_map(|r| r.ok())
                .collect(),
            None => stmt
                .query_map([], Self::row_to_summary)
                .map_err(|e| Error::Database(e.to_string()))?
                .filter_map(|r| r.ok())
                .collect(),
        };
        Ok(rows)
    }

    pub fn count_companies(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count)
    }

    // ---------------------------------------------------------------
    // Row mapping
    // ---------------------------------------------------------------

    fn row_to_profile(row: &Row) -> CompanyProfile {
        let text = |col: &str| -> String {
            row.get::<_, Option<String>>(col)
                .ok()
                .flatten()
                .unwrap_or_default()
        };
        let code = text("jse_code");
        CompanyProfile {
            id: row.get("id").unwrap_or(0),
            name: text("name"),
            jse_code: if code.is_empty() { None } else { Some(code) },
            website: text("website"),
            sponsor: text("sponsor"),
            description: text("description"),
            sector: text("sector"),
            first_seen: row.get::<_, Option<String>>("first_seen").ok().flatten(),
            last_updated: row.get::<_, Option<String>>("last_updated").ok().flatten(),
            is_active: row.get::<_, i64>("is_active").unwrap_or(1) != 0,
        }
    }

    fn row_to_summary(row: &Row) -> rusqlite::Result<CompanySummary> {
        Ok(CompanySummary {
            profile: Self::row_to_profile(row),
            director_count: row.get("director_count")?,
            sens_count: row.get("sens_count")?,
        })
    }

    fn row_to_director(row: &Row) -> Director {
        Director {
            id: row.get("id").unwrap_or(0),
            company_id: row.get("company_id").unwrap_or(0),
            name: row.get("name").unwrap_or_default(),
            role: row
                .get::<_, Option<String>>("role")
                .ok()
                .flatten()
                .unwrap_or_default(),
            appointed_date: row.get::<_, Option<String>>("appointed_date").ok().flatten(),
            resigned_date: row.get::<_, Option<String>>("resigned_date").ok().flatten(),
            source_sens: row
                .get::<_, Option<String>>("source_sens")
                .ok()
                .flatten()
                .unwrap_or_default(),
            is_active: row.get::<_, i64>("is_active").unwrap_or(1) != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (CompanyStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = CompanyStore::open(dir.path().join("company_intel.db")).unwrap();
        (store, dir)
    }

    #[test]
    fn test_upsert_same_ticker_is_one_row() {
        let (store, _dir) = test_store();

        let a = store.upsert_company("Naspers Limited", Some("NPN"), None).unwrap();
        let b = store.upsert_company("NASPERS LTD", Some("npn"), None).unwrap();

        assert_eq!(a, b);
        assert_eq!(store.count_companies().unwrap(), 1);
        let profile = store.get_company(a).unwrap().unwrap();
        assert_eq!(profile.name, "Naspers Limited");
        assert_eq!(profile.jse_code.as_deref(), Some("NPN"));
    }

    #[test]
    fn test_upsert_falls_back_to_name() {
        let (store, _dir) = test_store();

        let a = store.upsert_company("Sasol Limited", None, None).unwrap();
        let b = store
            .upsert_company("sasol limited", Some("SOL"), Some("https://www.sasol.com"))
            .unwrap();

        assert_eq!(a, b);
        let profile = store.get_company(a).unwrap().unwrap();
        assert_eq!(profile.jse_code.as_deref(), Some("SOL"));
        assert_eq!(profile.website, "https://www.sasol.com");

        // Empty values never clobber stored ones
        store.upsert_company("Sasol Limited", None, Some("")).unwrap();
        let profile = store.get_company(a).unwrap().unwrap();
        assert_eq!(profile.website, "https://www.sasol.com");
        assert_eq!(profile.jse_code.as_deref(), Some("SOL"));
    }

    #[test]
    fn test_upsert_ignores_overlong_ticker() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Odd Co", Some("TOOLONG"), None).unwrap();
        assert!(store.get_company(id).unwrap().unwrap().jse_code.is_none());
    }

    #[test]
    fn test_link_filing_idempotent() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Acme Ltd", Some("ACM"), None).unwrap();

        assert!(store
            .link_filing(id, "S100", Some("2025-01-02 09:00:00"), "Trading statement")
            .unwrap());
        assert!(!store
            .link_filing(id, "S100", Some("2025-01-02 09:00:00"), "Trading statement")
            .unwrap());

        let filings = store.get_company_sens(id, 10).unwrap();
        assert_eq!(filings.len(), 1);
        assert_eq!(filings[0].sens_number, "S100");
    }

    #[test]
    fn test_sponsor_history_append_only() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Acme Ltd", None, None).unwrap();

        assert!(store.set_sponsor(id, "Java Capital", "SENS:S1").unwrap());
        assert!(!store.set_sponsor(id, "Java Capital", "SENS:S2").unwrap());
        assert!(store.set_sponsor(id, "PSG Capital", "SENS:S3").unwrap());

        let history = store.get_sponsor_history(id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sponsor, "PSG Capital");
        assert_eq!(history[1].sponsor, "Java Capital");
        assert_eq!(store.get_company(id).unwrap().unwrap().sponsor, "PSG Capital");
    }

    #[test]
    fn test_add_director_twice_updates_role() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Acme Ltd", None, None).unwrap();

        let d1 = store
            .add_director(id, "Jane Doe", "Non-executive director", None, "S1")
            .unwrap();
        let d2 = store
            .add_director(id, "JANE DOE", "Chairperson", None, "S2")
            .unwrap();

        assert_eq!(d1, d2);
        let directors = store.get_directors(id, true).unwrap();
        assert_eq!(directors.len(), 1);
        assert_eq!(directors[0].role, "Chairperson");
        assert_eq!(directors[0].source_sens, "S2");
    }

    #[test]
    fn test_resign_marks_existing_inactive() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Acme Ltd", None, None).unwrap();
        store.add_director(id, "John Smith", "CFO", None, "S1").unwrap();

        let outcome = store
            .resign_director(id, "john smith", "", Some("2025-03-01"), "S2")
            .unwrap();
        assert_eq!(outcome, ResignOutcome::MarkedInactive);

        let all = store.get_directors(id, false).unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);
        assert_eq!(all[0].resigned_date.as_deref(), Some("2025-03-01"));
        assert!(store.get_directors(id, true).unwrap().is_empty());
    }

    #[test]
    fn test_resign_unknown_director_records_inactive_row() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Acme Ltd", None, None).unwrap();

        let outcome = store.resign_director(id, "Ann Other", "CEO", None, "S9").unwrap();
        assert_eq!(outcome, ResignOutcome::RecordedNew);

        let all = store.get_directors(id, false).unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);
        assert_eq!(all[0].role, "CEO");
    }

    #[test]
    fn test_repeated_resignation_keeps_one_row() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Acme Ltd", None, None).unwrap();

        let first = store.resign_director(id, "Ann Other", "CEO", None, "S9").unwrap();
        let second = store.resign_director(id, "ANN OTHER", "", None, "S9").unwrap();
        assert_eq!(first, ResignOutcome::RecordedNew);
        assert_eq!(second, ResignOutcome::AlreadyResigned);
        assert_eq!(store.get_directors(id, false).unwrap().len(), 1);

        // Resigning an already-resigned appointee is a no-op too
        store.add_director(id, "Bob Stone", "COO", None, "S1").unwrap();
        store.resign_director(id, "Bob Stone", "", None, "S2").unwrap();
        let again = store.resign_director(id, "bob stone", "", None, "S2").unwrap();
        assert_eq!(again, ResignOutcome::AlreadyResigned);
        assert_eq!(store.get_directors(id, false).unwrap().len(), 2);
    }

    #[test]
    fn test_replayed_appointment_after_resignation() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Acme Ltd", None, None).unwrap();

        let appointed = store
            .add_director(id, "Jane Doe", "CFO", Some("2025-01-10"), "S1")
            .unwrap();
        store.resign_director(id, "Jane Doe", "", Some("2025-06-30"), "S2").unwrap();

        // Reprocessing the appointment filing finds the resigned record
        let replayed = store
            .add_director(id, "jane doe", "CFO", Some("2025-01-10"), "S1")
            .unwrap();
        assert_eq!(replayed, appointed);
        assert_eq!(store.get_directors(id, false).unwrap().len(), 1);
        assert!(store.get_directors(id, true).unwrap().is_empty());

        // A new appointment date is a re-appointment
        store
            .add_director(id, "Jane Doe", "CEO", Some("2026-02-01"), "S3")
            .unwrap();
        assert_eq!(store.get_directors(id, false).unwrap().len(), 2);
        assert_eq!(store.get_directors(id, true).unwrap().len(), 1);
    }

    #[test]
    fn test_set_ticker_never_duplicates_owner() {
        let (store, _dir) = test_store();
        let owner = store.upsert_company("Acme Limited (ACM)", Some("ACM"), None).unwrap();
        let other = store.upsert_company("Acme Ltd", None, None).unwrap();
        assert_ne!(owner, other);

        assert_eq!(store.set_ticker(other, "acm").unwrap(), TickerUpdate::OwnedBy(owner));
        assert_eq!(store.get_company(other).unwrap().unwrap().jse_code, None);
        assert_eq!(store.get_company_by_ticker("ACM").unwrap().unwrap().id, owner);

        assert_eq!(store.set_ticker(owner, "ACM").unwrap(), TickerUpdate::Unchanged);
        assert_eq!(store.set_ticker(other, "ACX").unwrap(), TickerUpdate::Set);
        assert_eq!(store.set_ticker(other, "TOOLONG").unwrap(), TickerUpdate::Unchanged);
        assert_eq!(
            store.get_company(other).unwrap().unwrap().jse_code.as_deref(),
            Some("ACX")
        );
    }

    #[test]
    fn test_description_and_sector() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Acme Ltd", None, None).unwrap();

        assert_eq!(store.get_description(id).unwrap(), "");
        store.update_description(id, "Acme makes anvils.").unwrap();
        store.update_description(id, "   ").unwrap();
        assert_eq!(store.get_description(id).unwrap(), "Acme makes anvils.");

        store.update_sector(id, "Industrial").unwrap();
        store.update_sector(id, "").unwrap();
        assert_eq!(store.get_sector(id).unwrap(), "Industrial");
    }

    #[test]
    fn test_detail_and_search() {
        let (store, _dir) = test_store();
        let id = store.upsert_company("Acme Mining Ltd", Some("ACM"), None).unwrap();
        store.update_sector(id, "Mining").unwrap();
        store.add_director(id, "Jane Doe", "CEO", None, "S1").unwrap();
        store.link_filing(id, "S1", None, "Appointment of CEO").unwrap();
        store.upsert_company("Other Co", None, None).unwrap();

        let detail = store.get_company_detail(id).unwrap().unwrap();
        assert_eq!(detail.directors.len(), 1);
        assert_eq!(detail.recent_sens.len(), 1);

        let hits = store.search_companies("mining").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].director_count, 1);
        assert_eq!(hits[0].sens_count, 1);

        assert_eq!(store.get_all_profiles().unwrap().len(), 2);
        assert!(store.get_company_by_ticker("acm").unwrap().is_some());
        assert!(store.get_company_by_ticker("").unwrap().is_none());
    }
}
