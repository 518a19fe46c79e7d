//! SQLite repository for the newspaper archive.
//!
//! Every write runs inside one transaction: it commits when the closure
//! returns `Ok` and rolls back when it returns `Err` or unwinds. Reads go to
//! the database each time; nothing is cached between calls.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Transaction};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;
use crate::types::*;
use gazette_core::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

/// Map a driver error onto the archive taxonomy.
fn db_err(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = e {
        if failure.code == ErrorCode::ConstraintViolation {
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                return Error::Referential(e.to_string());
            }
            return Error::Constraint(e.to_string());
        }
    }
    Error::Database(e.to_string())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl SqliteStore {
    /// Open or create the archive database at `db_dir/gazette.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir)?;
        let db_path = db_dir.join("gazette.db");

        let conn = Connection::open(&db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        let stats = store.get_stats()?;
        info!(
            "SqliteStore initialized: {} newspapers, {} articles, {} keywords, path={}",
            stats.newspapers,
            stats.articles,
            stats.keywords,
            store.db_path.display()
        );
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `f` in a transaction, committing only if it succeeds.
    fn unit_of_work<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        let out = f(&tx)?;
        tx.commit().map_err(db_err)?;
        Ok(out)
    }

    // ---------------------------------------------------------------
    // Newspapers
    // ---------------------------------------------------------------

    /// Insert a newspaper in `pending` state. Returns its id.
    pub fn create_newspaper(&self, new: &NewNewspaper) -> Result<i64> {
        if new.name.trim().is_empty() {
            return Err(Error::Constraint("newspaper name is required".into()));
        }
        if new.file_path.trim().is_empty() {
            return Err(Error::Constraint("newspaper file path is required".into()));
        }
        let issue_date = new.issue_date.map(|d| d.format(DATE_FORMAT).to_string());

        self.unit_of_work(|tx| {
            tx.prepare_cached(
                "INSERT INTO newspapers \
                 (name, file_path, issue_date, issue_number, total_pages, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(db_err)?
            .insert(params![
                new.name,
                new.file_path,
                issue_date,
                new.issue_number,
                new.total_pages,
                NewspaperStatus::Pending,
                now_millis()
            ])
            .map_err(db_err)
        })
    }

    pub fn get_newspaper(&self, id: i64) -> Result<Option<Newspaper>> {
        let conn = self.conn.lock();
        Self::find_newspaper(&conn, id)
    }

    /// Newspaper with its pages.
    pub fn get_newspaper_detail(&self, id: i64) -> Result<Option<NewspaperDetail>> {
        let conn = self.conn.lock();
        let Some(newspaper) = Self::find_newspaper(&conn, id)? else {
            return Ok(None);
        };
        let pages = Self::pages_of(&conn, id)?;
        Ok(Some(NewspaperDetail { newspaper, pages }))
    }

    /// Newest first.
    pub fn list_newspapers(&self, limit: usize, offset: usize) -> Result<Vec<Newspaper>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM newspapers ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_newspaper)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Move a newspaper to `status`.
    ///
    /// Returns `false` when the id does not exist. Re-applying the current
    /// status is a no-op; a backwards move is a constraint error.
    pub fn set_newspaper_status(&self, id: i64, status: NewspaperStatus) -> Result<bool> {
        self.unit_of_work(|tx| {
            let current: Option<NewspaperStatus> = tx
                .query_row(
                    "SELECT status FROM newspapers WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err)?;
            let Some(current) = current else {
                return Ok(false);
            };
            if current == status {
                return Ok(true);
            }
            if !current.can_transition_to(status) {
                return Err(Error::Constraint(format!(
                    "newspaper {} cannot move from {} to {}",
                    id, current, status
                )));
            }
            tx.execute(
                "UPDATE newspapers SET status = ?1 WHERE id = ?2",
                params![status, id],
            )
            .map_err(db_err)?;
            debug!("Newspaper {}: {} -> {}", id, current, status);
            Ok(true)
        })
    }

    /// Delete a newspaper with its pages, articles and keyword links.
    pub fn delete_newspaper(&self, id: i64) -> Result<bool> {
        let count = self.unit_of_work(|tx| {
            tx.execute("DELETE FROM newspapers WHERE id = ?1", params![id])
                .map_err(db_err)
        })?;
        Ok(count > 0)
    }

    // ---------------------------------------------------------------
    // Pages
    // ---------------------------------------------------------------

    /// Insert a page. Page numbers must increase within a newspaper.
    pub fn create_page(
        &self,
        newspaper_id: i64,
        page_number: i64,
        image_path: &str,
        ocr_text: Option<&str>,
    ) -> Result<i64> {
        self.unit_of_work(|tx| {
            if Self::find_newspaper(tx, newspaper_id)?.is_none() {
                return Err(Error::Referential(format!(
                    "newspaper {} does not exist",
                    newspaper_id
                )));
            }
            let last: Option<i64> = tx
                .query_row(
                    "SELECT MAX(page_number) FROM pages WHERE newspaper_id = ?1",
                    params![newspaper_id],
                    |row| row.get(0),
                )
                .map_err(db_err)?;
            if let Some(last) = last {
                if page_number <= last {
                    return Err(Error::Constraint(format!(
                        "page {} follows page {} in newspaper {}",
                        page_number, last, newspaper_id
                    )));
                }
            }
            tx.prepare_cached(
                "INSERT INTO pages (newspaper_id, page_number, image_path, ocr_text, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(db_err)?
            .insert(params![newspaper_id, page_number, image_path, ocr_text, now_millis()])
            .map_err(db_err)
        })
    }

    pub fn get_page(&self, id: i64) -> Result<Option<Page>> {
        let conn = self.conn.lock();
        Self::find_page(&conn, id)
    }

    /// Pages of a newspaper in page order.
    pub fn get_pages(&self, newspaper_id: i64) -> Result<Vec<Page>> {
        let conn = self.conn.lock();
        Self::pages_of(&conn, newspaper_id)
    }

    // ---------------------------------------------------------------
    // Articles and keywords
    // ---------------------------------------------------------------

    /// Insert an article and link its keywords as one unit.
    ///
    /// If any keyword cannot be linked, the article is not kept either.
    pub fn create_article<S: AsRef<str>>(
        &self,
        page_id: i64,
        article: &NewArticle,
        keywords: &[S],
    ) -> Result<i64> {
        let entities = article
            .entities
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let date = article
            .extracted_date
            .map(|d| d.format(DATE_FORMAT).to_string());
        let bbox = article.bbox;

        self.unit_of_work(|tx| {
            if Self::find_page(tx, page_id)?.is_none() {
                return Err(Error::Referential(format!("page {} does not exist", page_id)));
            }
            let article_id = tx
                .prepare_cached(
                    "INSERT INTO articles \
                     (page_id, title, content, bbox_x, bbox_y, bbox_width, bbox_height, \
                      extracted_date, author, source, category, sentiment, entities_json, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                )
                .map_err(db_err)?
                .insert(params![
                    page_id,
                    article.title,
                    article.content,
                    bbox.map(|b| b.x),
                    bbox.map(|b| b.y),
                    bbox.map(|b| b.width),
                    bbox.map(|b| b.height),
                    date,
                    article.author,
                    article.source,
                    article.category,
                    article.sentiment,
                    entities,
                    now_millis()
                ])
                .map_err(db_err)?;
            let linked = Self::link_keywords(tx, article_id, keywords)?;
            debug!(
                "Article {} on page {}: {} keyword(s) linked",
                article_id, page_id, linked
            );
            Ok(article_id)
        })
    }

    /// Article with keywords, page and newspaper.
    pub fn get_article(&self, id: i64) -> Result<Option<ArticleRecord>> {
        let conn = self.conn.lock();
        let article = conn
            .query_row("SELECT * FROM articles WHERE id = ?1", params![id], Self::row_to_article)
            .optional()
            .map_err(db_err)?;
        article.map(|a| Self::resolve(&conn, a)).transpose()
    }

    pub fn articles_for_page(&self, page_id: i64) -> Result<Vec<Article>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM articles WHERE page_id = ?1 ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![page_id], Self::row_to_article)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Find-or-create each keyword and link it to the article.
    ///
    /// Links that already exist are left alone. Returns the number of new links.
    pub fn upsert_keywords_for_article<S: AsRef<str>>(
        &self,
        article_id: i64,
        words: &[S],
    ) -> Result<usize> {
        self.unit_of_work(|tx| {
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM articles WHERE id = ?1",
                    params![article_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err)?;
            if exists.is_none() {
                return Err(Error::Referential(format!(
                    "article {} does not exist",
                    article_id
                )));
            }
            Self::link_keywords(tx, article_id, words)
        })
    }

    /// Keywords of an article in the order they were linked.
    pub fn keywords_for_article(&self, article_id: i64) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        Self::keyword_words(&conn, article_id)
    }

    pub fn find_keyword(&self, word: &str) -> Result<Option<Keyword>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, word FROM keywords WHERE word = ?1",
            params![word],
            |row| {
                Ok(Keyword {
                    id: row.get(0)?,
                    word: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(db_err)
    }

    pub fn count_keywords(&self) -> Result<i64> {
        self.count("keywords")
    }

    pub fn count_newspapers(&self) -> Result<i64> {
        self.count("newspapers")
    }

    fn count(&self, table: &'static str) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .map_err(db_err)
    }

    fn link_keywords<S: AsRef<str>>(
        tx: &Transaction<'_>,
        article_id: i64,
        words: &[S],
    ) -> Result<usize> {
        let mut linked = 0;
        for word in words {
            let word = word.as_ref();
            if word.is_empty() {
                return Err(Error::Constraint("keyword must not be empty".into()));
            }
            // The UNIQUE index on `word` settles concurrent inserts; a
            // conflict means another writer created it first.
            tx.prepare_cached("INSERT INTO keywords (word) VALUES (?1) ON CONFLICT(word) DO NOTHING")
                .map_err(db_err)?
                .execute(params![word])
                .map_err(db_err)?;
            let keyword_id: i64 = tx
                .prepare_cached("SELECT id FROM keywords WHERE word = ?1")
                .map_err(db_err)?
                .query_row(params![word], |row| row.get(0))
                .map_err(db_err)?;
            linked += tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO article_keywords (article_id, keyword_id) VALUES (?1, ?2)",
                )
                .map_err(db_err)?
                .execute(params![article_id, keyword_id])
                .map_err(db_err)?;
        }
        Ok(linked)
    }

    // ---------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------

    /// Articles linked to a keyword equal to `word` (case-sensitive).
    pub fn search_by_keyword(&self, word: &str, limit: usize) -> Result<Vec<ArticleRecord>> {
        self.search(
            "SELECT a.* FROM articles a \
             JOIN article_keywords ak ON ak.article_id = a.id \
             JOIN keywords k ON k.id = ak.keyword_id \
             WHERE k.word = ?1 \
             ORDER BY a.id DESC LIMIT ?2",
            word,
            limit,
        )
    }

    /// Articles whose body contains `text` anywhere (case-sensitive).
    pub fn search_by_content(&self, text: &str, limit: usize) -> Result<Vec<ArticleRecord>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        self.search(
            "SELECT * FROM articles WHERE instr(content, ?1) > 0 ORDER BY id DESC LIMIT ?2",
            text,
            limit,
        )
    }

    fn search(&self, sql: &str, query: &str, limit: usize) -> Result<Vec<ArticleRecord>> {
        let conn = self.conn.lock();
        let articles = {
            let mut stmt = conn.prepare_cached(sql).map_err(db_err)?;
            let rows = stmt
                .query_map(params![query, limit as i64], Self::row_to_article)
                .map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?
        };
        articles
            .into_iter()
            .map(|a| Self::resolve(&conn, a))
            .collect()
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    pub fn get_stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let count = |table: &str| -> Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
                .map_err(db_err)
        };
        Ok(StoreStats {
            newspapers: count("newspapers")?,
            pages: count("pages")?,
            articles: count("articles")?,
            keywords: count("keywords")?,
            db_path: self.db_path.display().to_string(),
        })
    }

    // ---------------------------------------------------------------
    // Lookups shared by reads and writes
    // ---------------------------------------------------------------

    fn find_newspaper(conn: &Connection, id: i64) -> Result<Option<Newspaper>> {
        conn.prepare_cached("SELECT * FROM newspapers WHERE id = ?1")
            .map_err(db_err)?
            .query_row(params![id], Self::row_to_newspaper)
            .optional()
            .map_err(db_err)
    }

    fn find_page(conn: &Connection, id: i64) -> Result<Option<Page>> {
        conn.prepare_cached("SELECT * FROM pages WHERE id = ?1")
            .map_err(db_err)?
            .query_row(params![id], Self::row_to_page)
            .optional()
            .map_err(db_err)
    }

    fn pages_of(conn: &Connection, newspaper_id: i64) -> Result<Vec<Page>> {
        let mut stmt = conn
            .prepare_cached("SELECT * FROM pages WHERE newspaper_id = ?1 ORDER BY page_number")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![newspaper_id], Self::row_to_page)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn keyword_words(conn: &Connection, article_id: i64) -> Result<Vec<String>> {
        let mut stmt = conn
            .prepare_cached(
                "SELECT k.word FROM article_keywords ak \
                 JOIN keywords k ON k.id = ak.keyword_id \
                 WHERE ak.article_id = ?1 ORDER BY ak.rowid",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![article_id], |row| row.get(0))
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<String>>>().map_err(db_err)
    }

    /// Attach keywords, page and newspaper to an article.
    fn resolve(conn: &Connection, article: Article) -> Result<ArticleRecord> {
        let keywords = Self::keyword_words(conn, article.id)?;
        let page = Self::find_page(conn, article.page_id)?.ok_or_else(|| {
            Error::Referential(format!("article {} has no page", article.id))
        })?;
        let newspaper = Self::find_newspaper(conn, page.newspaper_id)?.ok_or_else(|| {
            Error::Referential(format!("page {} has no newspaper", page.id))
        })?;
        Ok(ArticleRecord {
            article,
            keywords,
            page,
            newspaper,
        })
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_newspaper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Newspaper> {
        Ok(Newspaper {
            id: row.get("id")?,
            name: row.get("name")?,
            file_path: row.get("file_path")?,
            issue_date: parse_date(row.get("issue_date")?),
            issue_number: row.get("issue_number")?,
            total_pages: row.get("total_pages")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }

    fn row_to_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
        Ok(Page {
            id: row.get("id")?,
            newspaper_id: row.get("newspaper_id")?,
            page_number: row.get("page_number")?,
            image_path: row.get("image_path")?,
            ocr_text: row.get("ocr_text")?,
            created_at: row.get("created_at")?,
        })
    }

    fn row_to_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
        let bbox = match (
            row.get::<_, Option<f64>>("bbox_x")?,
            row.get::<_, Option<f64>>("bbox_y")?,
            row.get::<_, Option<f64>>("bbox_width")?,
            row.get::<_, Option<f64>>("bbox_height")?,
        ) {
            (Some(x), Some(y), Some(width), Some(height)) => Some(BoundingBox {
                x,
                y,
                width,
                height,
            }),
            _ => None,
        };
        Ok(Article {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            bbox,
            extracted_date: parse_date(row.get("extracted_date")?),
            author: row.get("author")?,
            source: row.get("source")?,
            category: row.get("category")?,
            sentiment: row.get("sentiment")?,
            entities: row
                .get::<_, Option<String>>("entities_json")?
                .and_then(|s| serde_json::from_str(&s).ok()),
            created_at: row.get("created_at")?,
        })
    }
}

fn parse_date(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
}
