//! Filing table: the announcement records the operator commands work over.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::schema::ANNOUNCEMENT_SCHEMA_SQL;
use crate::{format_timestamp, parse_timestamp};
use jaibird_core::{Announcement, Error, ExtractionMethod, ExtractionStatus, Result};

const SELECT_COLUMNS: &str = "sens_number, company_name, title, pdf_url, local_pdf_path, \
     date_published, date_scraped, is_urgent, urgent_reason, pdf_content, ai_summary, \
     parse_method, parse_status, parsed_at";

/// SQLite store for announcement records.
pub struct AnnouncementStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl AnnouncementStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 30000;")
            .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(ANNOUNCEMENT_SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        debug!("AnnouncementStore opened at {}", db_path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Insert a newly scraped filing. Fails with `DuplicateFiling` if the
    /// filing id is already stored; ids are never reassigned.
    pub fn insert(&self, ann: &Announcement) -> Result<()> {
        let conn = self.conn.lock();
        let exists: Option<i64> = conn
            .prepare_cached("SELECT id FROM sens_announcements WHERE sens_number = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![ann.sens_number], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        if exists.is_some() {
            return Err(Error::DuplicateFiling(ann.sens_number.clone()));
        }

        conn.execute(
            "INSERT INTO sens_announcements (sens_number, company_name, title, pdf_url, \
             local_pdf_path, date_published, date_scraped, is_urgent, urgent_reason, \
             pdf_content, ai_summary, parse_method, parse_status, parsed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                ann.sens_number,
                ann.company_name,
                ann.title,
                ann.pdf_url,
                ann.local_pdf_path,
                ann.date_published.map(format_timestamp),
                ann.date_scraped.map(format_timestamp),
                ann.is_urgent as i64,
                ann.urgent_reason,
                ann.pdf_content,
                ann.ai_summary,
                ann.parse_method.as_str(),
                ann.parse_status.as_str(),
                ann.parsed_at.map(format_timestamp),
            ],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn get(&self, sens_number: &str) -> Result<Option<Announcement>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM sens_announcements WHERE sens_number = ?1",
            SELECT_COLUMNS
        );
        let row = conn
            .prepare_cached(&sql)
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![sens_number], |row| Ok(Self::row_to_announcement(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Filings with a local document that still need (re)extraction.
    pub fn list_unparsed(&self) -> Result<Vec<Announcement>> {
        self.query(
            "WHERE parse_status IN ('pending', 'failed') \
             AND local_pdf_path IS NOT NULL AND local_pdf_path != '' \
             ORDER BY date_published ASC",
        )
    }

    /// Every filing, newest first.
    pub fn list_all(&self) -> Result<Vec<Announcement>> {
        self.query("ORDER BY date_published DESC")
    }

    /// Filings published at or after `since`, newest first.
    pub fn list_since(&self, since: NaiveDateTime) -> Result<Vec<Announcement>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM sens_announcements WHERE date_published >= ?1 \
             ORDER BY date_published DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![format_timestamp(since)], |row| {
                Ok(Self::row_to_announcement(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Filings that carry extracted text, oldest first.
    pub fn list_with_content(&self) -> Result<Vec<Announcement>> {
        self.query(
            "WHERE pdf_content IS NOT NULL AND TRIM(pdf_content) != '' \
             ORDER BY date_published ASC",
        )
    }

    /// Overwrite the extraction fields of an existing filing.
    ///
    /// Reprocessing the same filing id simply replaces the previous values.
    pub fn update_extraction(&self, ann: &Announcement) -> Result<()> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE sens_announcements \
                 SET pdf_content = ?1, ai_summary = ?2, parse_method = ?3, \
                     parse_status = ?4, parsed_at = ?5 \
                 WHERE sens_number = ?6",
                params![
                    ann.pdf_content,
                    ann.ai_summary,
                    ann.parse_method.as_str(),
                    ann.parse_status.as_str(),
                    ann.parsed_at.map(format_timestamp),
                    ann.sens_number,
                ],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        if count == 0 {
            return Err(Error::NotFound(format!("SENS {}", ann.sens_number)));
        }
        Ok(())
    }

    /// Administrative purge. Returns whether a row was removed.
    pub fn purge(&self, sens_number: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "DELETE FROM sens_announcements WHERE sens_number = ?1",
                params![sens_number],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        if count > 0 {
            info!("Purged SENS {}", sens_number);
        }
        Ok(count > 0)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM sens_announcements", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn query(&self, clause: &str) -> Result<Vec<Announcement>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {} FROM sens_announcements {}", SELECT_COLUMNS, clause);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_announcement(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    fn row_to_announcement(row: &Row) -> Announcement {
        let text = |idx: usize| -> Option<String> { row.get::<_, Option<String>>(idx).ok().flatten() };
        let when = |idx: usize| text(idx).as_deref().and_then(parse_timestamp);

        Announcement {
            sens_number: text(0).unwrap_or_default(),
            company_name: text(1).unwrap_or_default(),
            title: text(2).unwrap_or_default(),
            pdf_url: text(3).unwrap_or_default(),
            local_pdf_path: text(4).filter(|p| !p.is_empty()),
            date_published: when(5),
            date_scraped: when(6),
            is_urgent: row.get::<_, i64>(7).unwrap_or(0) != 0,
            urgent_reason: text(8).unwrap_or_default(),
            pdf_content: text(9),
            ai_summary: text(10),
            parse_method: ExtractionMethod::parse(&text(11).unwrap_or_default()),
            parse_status: ExtractionStatus::parse(&text(12).unwrap_or_default()),
            parsed_at: when(13),
        }
    }
}
