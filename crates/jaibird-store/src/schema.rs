//! Database schema SQL.

/// Company intelligence tables: profiles, directors, sponsor history, filing links.
pub const COMPANY_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    jse_code TEXT DEFAULT '',
    website TEXT DEFAULT '',
    sponsor TEXT DEFAULT '',
    description TEXT DEFAULT '',
    sector TEXT DEFAULT '',
    first_seen TEXT DEFAULT NULL,
    last_updated TEXT DEFAULT NULL,
    is_active INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS directors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    name TEXT NOT NULL,
    role TEXT DEFAULT '',
    appointed_date TEXT DEFAULT NULL,
    resigned_date TEXT DEFAULT NULL,
    source_sens TEXT DEFAULT '',
    is_active INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS sponsor_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    sponsor TEXT NOT NULL,
    effective_date TEXT DEFAULT NULL,
    source TEXT DEFAULT ''
);

CREATE TABLE IF NOT EXISTS company_sens (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    sens_number TEXT NOT NULL,
    date_published TEXT DEFAULT NULL,
    title TEXT DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_companies_code ON companies(jse_code);
CREATE INDEX IF NOT EXISTS idx_directors_company ON directors(company_id);
CREATE INDEX IF NOT EXISTS idx_sponsor_company ON sponsor_history(company_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_company_sens ON company_sens(company_id, sens_number);
"#;

/// Filing table consumed by the operator commands.
pub const ANNOUNCEMENT_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sens_announcements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sens_number TEXT UNIQUE NOT NULL,
    company_name TEXT NOT NULL,
    title TEXT NOT NULL,
    pdf_url TEXT NOT NULL DEFAULT '',
    local_pdf_path TEXT DEFAULT NULL,
    date_published TEXT DEFAULT NULL,
    date_scraped TEXT DEFAULT NULL,
    is_urgent INTEGER DEFAULT 0,
    urgent_reason TEXT DEFAULT '',
    pdf_content TEXT DEFAULT NULL,
    ai_summary TEXT DEFAULT NULL,
    parse_method TEXT DEFAULT 'none',
    parse_status TEXT DEFAULT 'pending',
    parsed_at TEXT DEFAULT NULL
);

CREATE INDEX IF NOT EXISTS idx_sens_company ON sens_announcements(company_name);
CREATE INDEX IF NOT EXISTS idx_sens_published ON sens_announcements(date_published);
CREATE INDEX IF NOT EXISTS idx_sens_status ON sens_announcements(parse_status);
"#;
