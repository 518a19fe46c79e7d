//! Database schema SQL.

/// Newspapers own pages, pages own articles. Deleting a newspaper cascades
/// down to its articles and their keyword links; keywords themselves are
/// never removed.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS newspapers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    issue_date TEXT,
    issue_number TEXT,
    total_pages INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'processed', 'failed')),
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    newspaper_id INTEGER NOT NULL REFERENCES newspapers(id) ON DELETE CASCADE,
    page_number INTEGER NOT NULL CHECK (page_number >= 1),
    image_path TEXT NOT NULL,
    ocr_text TEXT,
    created_at INTEGER NOT NULL,
    UNIQUE (newspaper_id, page_number)
);

CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    bbox_x REAL,
    bbox_y REAL,
    bbox_width REAL,
    bbox_height REAL,
    extracted_date TEXT,
    author TEXT,
    source TEXT,
    category TEXT,
    sentiment TEXT,
    entities_json TEXT,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    word TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS article_keywords (
    article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    keyword_id INTEGER NOT NULL REFERENCES keywords(id) ON DELETE CASCADE,
    PRIMARY KEY (article_id, keyword_id)
);

CREATE INDEX IF NOT EXISTS idx_pages_newspaper ON pages(newspaper_id);
CREATE INDEX IF NOT EXISTS idx_articles_page ON articles(page_id);
CREATE INDEX IF NOT EXISTS idx_article_keywords_keyword ON article_keywords(keyword_id);
CREATE INDEX IF NOT EXISTS idx_newspapers_created ON newspapers(created_at);
"#;
