//! Document processing: upload → pages → lines → articles → store.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use gazette_core::{Error, GazetteConfig, Result};
use gazette_ingest::extract::{DateOutcome, JiebaSegmenter};
use gazette_ingest::{
    assemble, classify, ArticleDraft, ArticleSegmenter, MetadataExtractor, WholePageSegmenter,
};
use gazette_recognize::{create_rasterizer, create_recognizer, PageImage, Rasterizer, Recognizer};
use gazette_store::{NewArticle, NewNewspaper, NewspaperStatus, SqliteStore};
use tracing::{debug, error, info, warn};

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Engines and settings shared by every processing call.
pub struct PipelineContext {
    rasterizer: Arc<dyn Rasterizer>,
    recognizer: Arc<dyn Recognizer>,
    segmenter: Arc<dyn ArticleSegmenter>,
    extractor: MetadataExtractor,
    render_dpi: u32,
    processed_dir: PathBuf,
    shut_down: AtomicBool,
}

impl PipelineContext {
    /// Build the production pipeline from configuration. Loads the word
    /// segmentation dictionary, so call once.
    ///
    /// A configured user dictionary that cannot be read or parsed is an error.
    pub fn initialize(config: &GazetteConfig) -> Result<Self> {
        let segmenter = match &config.user_dict {
            Some(path) => {
                info!("Loading user dictionary {}", path.display());
                let file = File::open(path).map_err(|e| {
                    Error::Config(format!("cannot open user dictionary {}: {}", path.display(), e))
                })?;
                JiebaSegmenter::with_user_dict(&mut BufReader::new(file))?
            }
            None => JiebaSegmenter::new(),
        };
        let extractor = MetadataExtractor::new(Arc::new(segmenter), config.keyword_top_k);
        let ctx = Self::new(
            create_rasterizer(config),
            create_recognizer(config),
            extractor,
            config.render_dpi,
            config.data_paths.processed.clone(),
        );
        info!(
            "Pipeline initialized: recognizer={}, segmenter={}, dpi={}",
            ctx.recognizer.name(),
            ctx.extractor.segmenter_name(),
            ctx.render_dpi
        );
        Ok(ctx)
    }

    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        recognizer: Arc<dyn Recognizer>,
        extractor: MetadataExtractor,
        render_dpi: u32,
        processed_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            segmenter: Arc::new(WholePageSegmenter),
            extractor,
            render_dpi,
            processed_dir: processed_dir.into(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Replace the article segmenter.
    pub fn with_segmenter(mut self, segmenter: Arc<dyn ArticleSegmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn recognizer_available(&self) -> bool {
        self.recognizer.is_available()
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Directory holding the rendered pages of one newspaper.
    pub fn page_dir(&self, newspaper_id: i64) -> PathBuf {
        self.processed_dir.join(format!("newspaper_{}", newspaper_id))
    }

    /// Release engine resources. Later processing calls fail.
    pub fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::SeqCst) {
            self.recognizer.shutdown();
            info!("Pipeline shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Process one saved upload and return the new newspaper's id.
    ///
    /// Input and render problems surface before anything is stored. Once the
    /// newspaper row exists, any failure marks it `failed` before the error
    /// is returned; pages already committed stay in place.
    pub fn process_document(
        &self,
        store: &SqliteStore,
        path: &Path,
        display_name: Option<&str>,
    ) -> Result<i64> {
        if self.is_shut_down() {
            return Err(Error::Internal("pipeline has been shut down".into()));
        }

        let classification = classify(path)?;
        if let Some(warning) = &classification.warning {
            warn!("{}: {}", path.display(), warning);
        }

        let staging = self.processed_dir.join(format!(
            "staging_{}_{}",
            std::process::id(),
            STAGING_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let pages = match self
            .rasterizer
            .render(path, classification.kind, &staging, self.render_dpi)
        {
            Ok(pages) if pages.is_empty() => {
                remove_dir(&staging);
                return Err(Error::Input(format!(
                    "document has no pages: {}",
                    path.display()
                )));
            }
            Ok(pages) => pages,
            Err(e) => {
                remove_dir(&staging);
                return Err(e);
            }
        };
        info!(
            "Rendered {} page(s) from {} ({})",
            pages.len(),
            path.display(),
            classification.kind
        );

        let name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_name(path));
        let newspaper_id = match store.create_newspaper(&NewNewspaper {
            name,
            file_path: path.display().to_string(),
            total_pages: pages.len() as i64,
            ..Default::default()
        }) {
            Ok(id) => id,
            Err(e) => {
                remove_dir(&staging);
                return Err(e);
            }
        };

        let outcome = self
            .process_pages(store, newspaper_id, &staging, pages)
            .and_then(|articles| {
                store.set_newspaper_status(newspaper_id, NewspaperStatus::Processed)?;
                Ok(articles)
            });
        match outcome {
            Ok(articles) => {
                info!(
                    "Newspaper {} processed: {} article(s)",
                    newspaper_id, articles
                );
                Ok(newspaper_id)
            }
            Err(e) => {
                error!("Processing newspaper {} failed: {}", newspaper_id, e);
                if let Err(status_err) =
                    store.set_newspaper_status(newspaper_id, NewspaperStatus::Failed)
                {
                    warn!(
                        "Could not mark newspaper {} failed: {}",
                        newspaper_id, status_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Move staged images into place, then handle each page in order.
    fn process_pages(
        &self,
        store: &SqliteStore,
        newspaper_id: i64,
        staging: &Path,
        pages: Vec<PageImage>,
    ) -> Result<usize> {
        let page_dir = self.page_dir(newspaper_id);
        std::fs::rename(staging, &page_dir)?;

        let mut articles = 0;
        for mut page in pages {
            if let Some(file_name) = page.path.file_name() {
                page.path = page_dir.join(file_name);
            }
            articles += self.process_page(store, newspaper_id, &page)?;
        }
        Ok(articles)
    }

    fn process_page(&self, store: &SqliteStore, newspaper_id: i64, page: &PageImage) -> Result<usize> {
        let lines = self.recognizer.recognize(page)?;
        let assembled = assemble(lines, page.dimensions);
        debug!(
            "Page {}: {} line(s), {} char(s)",
            page.number,
            assembled.lines.len(),
            assembled.text.chars().count()
        );

        let page_id = store.create_page(
            newspaper_id,
            page.number as i64,
            &page.path.display().to_string(),
            Some(&assembled.text),
        )?;

        let drafts = self.segmenter.segment(&assembled);
        for draft in &drafts {
            let article_id = self.store_article(store, page_id, draft)?;
            debug!("Page {}: article {} '{}'", page.number, article_id, draft.title);
        }
        info!(
            "Newspaper {} page {}: {} article(s)",
            newspaper_id,
            page.number,
            drafts.len()
        );
        Ok(drafts.len())
    }

    fn store_article(&self, store: &SqliteStore, page_id: i64, draft: &ArticleDraft) -> Result<i64> {
        let meta = self.extractor.extract(&draft.body);
        match &meta.date {
            DateOutcome::Found(d) => debug!("Page {}: date {}", page_id, d),
            DateOutcome::NotFound => debug!("Page {}: no date", page_id),
            DateOutcome::Malformed(reason) => warn!("Page {}: malformed date, {}", page_id, reason),
        }

        let entities = if meta.entities.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&meta.entities)?)
        };
        let article = NewArticle {
            title: draft.title.clone(),
            content: draft.body.clone(),
            bbox: draft.bbox,
            extracted_date: meta.date.date(),
            author: draft.author.clone(),
            source: draft.source.clone(),
            category: Some(meta.category.as_str().to_string()),
            sentiment: Some(meta.sentiment.as_str().to_string()),
            entities,
        };
        store.create_article(page_id, &article, &meta.keyword_words())
    }
}

impl Drop for PipelineContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn default_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("untitled")
        .to_string()
}

fn remove_dir(dir: &Path) {
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            warn!("Could not remove {}: {}", dir.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_ingest::UNKNOWN_TITLE;
    use once_cell::sync::Lazy;
    use gazette_recognize::{DocumentKind, Point, Quad, RecognizedLine};
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    static SEGMENTER: Lazy<Arc<JiebaSegmenter>> = Lazy::new(|| Arc::new(JiebaSegmenter::new()));

    /// Writes `pages` blank PNG-named files.
    struct FakeRasterizer {
        pages: u32,
    }

    impl Rasterizer for FakeRasterizer {
        fn render(&self, _doc: &Path, _kind: DocumentKind, out_dir: &Path, _dpi: u32) -> Result<Vec<PageImage>> {
            std::fs::create_dir_all(out_dir)?;
            (1..=self.pages)
                .map(|n| {
                    let path = out_dir.join(format!("page_{}.png", n));
                    std::fs::write(&path, b"not really a png")?;
                    Ok(PageImage {
                        number: n,
                        path,
                        dimensions: Some((1000, 1000)),
                    })
                })
                .collect()
        }
    }

    struct MissingRasterizer;

    impl Rasterizer for MissingRasterizer {
        fn render(&self, _: &Path, _: DocumentKind, out_dir: &Path, _: u32) -> Result<Vec<PageImage>> {
            std::fs::create_dir_all(out_dir)?;
            Err(Error::RendererUnavailable("pdftoppm not installed".into()))
        }
    }

    /// Returns scripted lines per page; pages in `fail_on` error out.
    #[derive(Default)]
    struct ScriptedRecognizer {
        pages: HashMap<u32, Vec<&'static str>>,
        fail_on: Option<u32>,
        shutdowns: AtomicUsize,
    }

    impl Recognizer for ScriptedRecognizer {
        fn recognize(&self, page: &PageImage) -> Result<Vec<RecognizedLine>> {
            if self.fail_on == Some(page.number) {
                return Err(Error::recognition(page.number, "engine crashed"));
            }
            let texts = self.pages.get(&page.number).cloned().unwrap_or_default();
            Ok(texts
                .into_iter()
                .enumerate()
                .map(|(i, text)| {
                    let y = 100.0 + 50.0 * i as f64;
                    RecognizedLine {
                        quad: Quad([
                            Point { x: 100.0, y },
                            Point { x: 900.0, y },
                            Point { x: 900.0, y: y + 40.0 },
                            Point { x: 100.0, y: y + 40.0 },
                        ]),
                        text: text.to_string(),
                        confidence: 0.95,
                    }
                })
                .collect())
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        dir: TempDir,
        store: SqliteStore,
        upload: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("db")).unwrap();
        let upload = dir.path().join("shenbao_1926.pdf");
        std::fs::write(&upload, b"%PDF-1.4\n%fake").unwrap();
        Fixture { dir, store, upload }
    }

    fn context(f: &Fixture, rasterizer: Arc<dyn Rasterizer>, recognizer: Arc<dyn Recognizer>) -> PipelineContext {
        let extractor = MetadataExtractor::new(SEGMENTER.clone(), 50);
        PipelineContext::new(rasterizer, recognizer, extractor, 300, f.dir.path().join("processed"))
    }

    fn two_page_recognizer() -> ScriptedRecognizer {
        let mut pages = HashMap::new();
        pages.insert(
            1,
            vec![
                "经济困难之原因与对策",
                "民国十五年五月三日 近来 全国 商业 不振 市场 萧条 物价 下跌 经济 危机",
                "【商报记者 李文通】",
            ],
        );
        pages.insert(2, vec!["外交 消息", "日本 条约 外交 和平 稳定"]);
        ScriptedRecognizer {
            pages,
            ..Default::default()
        }
    }

    #[test]
    fn test_processes_all_pages() {
        let f = fixture();
        let ctx = context(&f, Arc::new(FakeRasterizer { pages: 2 }), Arc::new(two_page_recognizer()));
        let id = ctx.process_document(&f.store, &f.upload, Some("申报")).unwrap();

        let np = f.store.get_newspaper(id).unwrap().unwrap();
        assert_eq!(np.name, "申报");
        assert_eq!(np.status, NewspaperStatus::Processed);
        assert_eq!(np.total_pages, 2);

        let pages = f.store.get_pages(id).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].image_path.ends_with("page_1.png"));
        assert!(ctx.page_dir(id).join("page_2.png").exists());

        let articles = f.store.articles_for_page(pages[0].id).unwrap();
        assert_eq!(articles.len(), 1);
        let a = &articles[0];
        assert_eq!(a.title, "经济困难之原因与对策");
        assert!(a.content.starts_with("经济困难之原因与对策\n"));
        assert_eq!(a.author.as_deref(), Some("商报记者 李文通"));
        assert_eq!(a.category.as_deref(), Some("economy"));
        assert_eq!(a.sentiment.as_deref(), Some("negative"));
        assert_eq!(a.extracted_date.unwrap().to_string(), "1926-05-03");
        assert!(a.bbox.is_some());

        let keywords = f.store.keywords_for_article(a.id).unwrap();
        assert!(keywords.contains(&"经济".to_string()));

        let page2 = &f.store.articles_for_page(pages[1].id).unwrap()[0];
        assert_eq!(page2.category.as_deref(), Some("international"));
        assert_eq!(page2.sentiment.as_deref(), Some("positive"));
    }

    #[test]
    fn test_recognition_failure_marks_failed() {
        let f = fixture();
        let recognizer = ScriptedRecognizer {
            fail_on: Some(2),
            ..two_page_recognizer()
        };
        let ctx = context(&f, Arc::new(FakeRasterizer { pages: 3 }), Arc::new(recognizer));
        let err = ctx.process_document(&f.store, &f.upload, None).unwrap_err();
        assert!(matches!(err, Error::Recognition { page: 2, .. }));

        let np = &f.store.list_newspapers(10, 0).unwrap()[0];
        assert_eq!(np.status, NewspaperStatus::Failed);
        assert_eq!(np.name, "shenbao_1926");
        // Page 1 was committed before page 2 failed; page 3 never ran.
        let pages = f.store.get_pages(np.id).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
    }

    #[test]
    fn test_final_status_write_failure_marks_failed() {
        let f = fixture();
        let conn = rusqlite::Connection::open(f.dir.path().join("db/gazette.db")).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_processed BEFORE UPDATE OF status ON newspapers
             WHEN NEW.status = 'processed'
             BEGIN SELECT RAISE(ABORT, 'status locked'); END;",
        )
        .unwrap();

        let ctx = context(&f, Arc::new(FakeRasterizer { pages: 1 }), Arc::new(two_page_recognizer()));
        let err = ctx.process_document(&f.store, &f.upload, None).unwrap_err();
        assert!(matches!(err, Error::Database(_)), "{:?}", err);
        let np = &f.store.list_newspapers(10, 0).unwrap()[0];
        assert_eq!(np.status, NewspaperStatus::Failed);
    }

    #[test]
    fn test_blank_page_yields_placeholder_article() {
        let f = fixture();
        let ctx = context(
            &f,
            Arc::new(FakeRasterizer { pages: 1 }),
            Arc::new(ScriptedRecognizer::default()),
        );
        let id = ctx.process_document(&f.store, &f.upload, None).unwrap();
        let page = &f.store.get_pages(id).unwrap()[0];
        assert_eq!(page.ocr_text.as_deref(), Some(""));
        let articles = f.store.articles_for_page(page.id).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, UNKNOWN_TITLE);
        assert_eq!(articles[0].content, "");
        assert_eq!(articles[0].category.as_deref(), Some("other"));
        assert!(f.store.keywords_for_article(articles[0].id).unwrap().is_empty());
    }

    #[test]
    fn test_zero_pages_is_input_error() {
        let f = fixture();
        let ctx = context(
            &f,
            Arc::new(FakeRasterizer { pages: 0 }),
            Arc::new(ScriptedRecognizer::default()),
        );
        let err = ctx.process_document(&f.store, &f.upload, None).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert_eq!(f.store.count_newspapers().unwrap(), 0);
    }

    #[test]
    fn test_render_failure_creates_nothing() {
        let f = fixture();
        let ctx = context(&f, Arc::new(MissingRasterizer), Arc::new(ScriptedRecognizer::default()));
        let err = ctx.process_document(&f.store, &f.upload, None).unwrap_err();
        assert!(matches!(err, Error::RendererUnavailable(_)));
        assert_eq!(f.store.count_newspapers().unwrap(), 0);
        let leftovers = std::fs::read_dir(f.dir.path().join("processed"))
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_rejected_upload_creates_nothing() {
        let f = fixture();
        let bogus = f.dir.path().join("notes.txt");
        std::fs::write(&bogus, "民国十五年").unwrap();
        let ctx = context(
            &f,
            Arc::new(FakeRasterizer { pages: 1 }),
            Arc::new(ScriptedRecognizer::default()),
        );
        let err = ctx.process_document(&f.store, &bogus, None).unwrap_err();
        assert_eq!(err.category(), gazette_core::ErrorCategory::Input);
        assert_eq!(f.store.count_newspapers().unwrap(), 0);
    }

    #[test]
    fn test_resubmission_creates_new_newspaper() {
        let f = fixture();
        let ctx = context(&f, Arc::new(FakeRasterizer { pages: 1 }), Arc::new(two_page_recognizer()));
        let first = ctx.process_document(&f.store, &f.upload, None).unwrap();
        let second = ctx.process_document(&f.store, &f.upload, None).unwrap();
        assert_ne!(first, second);
        // Shared keywords are reused, not duplicated.
        let a1 = &f.store.articles_for_page(f.store.get_pages(first).unwrap()[0].id).unwrap()[0];
        let a2 = &f.store.articles_for_page(f.store.get_pages(second).unwrap()[0].id).unwrap()[0];
        assert_eq!(
            f.store.keywords_for_article(a1.id).unwrap(),
            f.store.keywords_for_article(a2.id).unwrap()
        );
        assert_eq!(
            f.store.count_keywords().unwrap() as usize,
            f.store.keywords_for_article(a1.id).unwrap().len()
        );
    }

    #[test]
    fn test_initialize_loads_user_dict() {
        let dir = TempDir::new().unwrap();
        let dict = dir.path().join("names.txt");
        std::fs::write(&dict, "李文通 20000 nr\n").unwrap();
        let mut config = GazetteConfig::with_defaults(dir.path()).unwrap();
        config.user_dict = Some(dict);

        let ctx = PipelineContext::initialize(&config).unwrap();
        let meta = ctx.extractor.extract("商报记者李文通报道上海商业消息");
        assert!(meta.entities.persons.contains(&"李文通".to_string()), "{:?}", meta.entities);

        config.user_dict = Some(dir.path().join("missing.txt"));
        let err = PipelineContext::initialize(&config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_shutdown_is_explicit_and_once() {
        let f = fixture();
        let recognizer = Arc::new(ScriptedRecognizer::default());
        let ctx = context(&f, Arc::new(FakeRasterizer { pages: 1 }), recognizer.clone());
        ctx.shutdown();
        ctx.shutdown();
        assert!(ctx.is_shut_down());
        assert_eq!(recognizer.shutdowns.load(Ordering::SeqCst), 1);
        let err = ctx.process_document(&f.store, &f.upload, None).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        drop(ctx);
        assert_eq!(recognizer.shutdowns.load(Ordering::SeqCst), 1);
    }
}
