//! Background blog writer.
//!
//! A generation run goes keyword -> titles -> web references -> scraped
//! pages -> article -> pending post with tags. Every step is reported as a
//! [`BlogEvent`] on a broadcast channel that the SSE endpoint relays.
//! Failures of a single title are logged and skipped; the run itself never
//! returns an error.

use std::sync::Arc;
use std::time::Duration;

use portfolio_core::events::{BlogEvent, GenerateStatus};
use portfolio_core::types::{Blog, BlogAuthor, BlogInput, BlogStatus};
use portfolio_core::slug::slugify;
use portfolio_storage::{BlogRepository, Database, TagRepository};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::client::{LanguageModel, PageFetcher, SearchProvider};
use crate::error::AiError;
use crate::prompts;
use crate::text::{clean_ai_output, clean_line, parse_sections};

/// Titles at or under this many characters are treated as noise.
const MIN_TITLE_CHARS: usize = 10;
const MIN_TAG_CHARS: usize = 2;

/// Outcome of one generation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub saved: usize,
    pub total_target: usize,
    pub blog_ids: Vec<i64>,
}

struct TitleRefs {
    title: String,
    references: Vec<String>,
}

#[derive(Clone)]
pub struct BlogGenerator {
    llm: Arc<dyn LanguageModel>,
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    blogs: BlogRepository,
    tags: TagRepository,
    events: broadcast::Sender<Value>,
    search_delay: Duration,
}

impl BlogGenerator {
    pub fn new(
        db: Arc<Database>,
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        events: broadcast::Sender<Value>,
    ) -> Self {
        Self {
            llm,
            search,
            fetcher,
            blogs: BlogRepository::new(db.clone()),
            tags: TagRepository::new(db),
            events,
            search_delay: Duration::from_millis(1000),
        }
    }

    /// Pause before each web search.
    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    fn emit(&self, event: BlogEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event.to_json());
    }

    /// Run a full generation for `keyword`, writing up to `total` posts.
    pub async fn generate(&self, keyword: &str, total: usize) -> GenerateReport {
        info!(keyword, total, "Blog generation started");
        self.emit(BlogEvent::GenerateProgress {
            keyword: keyword.to_string(),
            saved: 0,
            total_target: total,
            current_title: None,
            status: GenerateStatus::GeneratingTitles,
        });

        let titles = match self.generate_titles(keyword, total).await {
            Ok(titles) if !titles.is_empty() => titles,
            Ok(_) => return self.fail_run(keyword, total, "no usable titles returned".into()),
            Err(e) => return self.fail_run(keyword, total, e.to_string()),
        };
        debug!(?titles, "Titles generated");

        let mut plan = Vec::with_capacity(titles.len());
        for title in titles {
            let references = self.gather_references(&title).await;
            plan.push(TitleRefs { title, references });
        }
        for entry in &mut plan {
            entry.references = self.scrape_references(&entry.references).await;
        }

        let total_target = plan.len();
        let mut report = GenerateReport {
            saved: 0,
            total_target,
            blog_ids: Vec::new(),
        };

        for entry in &plan {
            let display_title = entry.title.replace('"', "'");
            self.emit(BlogEvent::GenerateProgress {
                keyword: keyword.to_string(),
                saved: report.saved,
                total_target,
                current_title: Some(display_title.clone()),
                status: GenerateStatus::Writing,
            });

            if entry.references.is_empty() {
                info!(title = %entry.title, "Skipping title without references");
                continue;
            }

            let blog = match self.write_post(&entry.title, &entry.references).await {
                Ok(Some(blog)) => blog,
                Ok(None) => continue,
                Err(e) => {
                    warn!(title = %entry.title, error = %e, "Failed to write post");
                    continue;
                }
            };

            self.assign_tags(blog.id, &blog.title).await;
            report.saved += 1;
            report.blog_ids.push(blog.id);
            info!(saved = report.saved, total_target, title = %blog.title, "Post saved");

            self.emit(BlogEvent::GenerateProgress {
                keyword: keyword.to_string(),
                saved: report.saved,
                total_target,
                current_title: Some(display_title),
                status: GenerateStatus::Saved,
            });
        }

        info!(keyword, saved = report.saved, total_target, "Blog generation finished");
        self.emit(BlogEvent::GenerateDone {
            keyword: keyword.to_string(),
            saved: report.saved,
            total_target,
            failed: report.saved == 0,
            error: None,
        });
        report
    }

    fn fail_run(&self, keyword: &str, total: usize, error: String) -> GenerateReport {
        warn!(keyword, error = %error, "Title generation failed");
        self.emit(BlogEvent::GenerateDone {
            keyword: keyword.to_string(),
            saved: 0,
            total_target: total,
            failed: true,
            error: Some(error),
        });
        GenerateReport {
            saved: 0,
            total_target: total,
            blog_ids: Vec::new(),
        }
    }

    async fn generate_titles(&self, keyword: &str, total: usize) -> Result<Vec<String>, AiError> {
        let today = chrono::Local::now().date_naive();
        let reply = self
            .llm
            .complete(&prompts::titles(keyword, total, today))
            .await?;
        Ok(reply
            .lines()
            .map(clean_line)
            .filter(|line| line.chars().count() > MIN_TITLE_CHARS)
            .take(total)
            .collect())
    }

    /// Search descriptions and URLs for `title`. A failed or unconfigured
    /// search gives none.
    async fn gather_references(&self, title: &str) -> Vec<String> {
        if !self.search.is_configured() {
            debug!(title, "Web search not configured, writing without references");
            return Vec::new();
        }
        if !self.search_delay.is_zero() {
            tokio::time::sleep(self.search_delay).await;
        }
        match self.search.search(title).await {
            Ok(results) => {
                let mut refs = Vec::new();
                for hit in results {
                    if !hit.description.is_empty() {
                        refs.push(hit.description);
                    }
                    refs.push(hit.url);
                }
                refs
            }
            Err(e) => {
                warn!(title, error = %e, "Web search failed");
                Vec::new()
            }
        }
    }

    /// Replace URL references with their page text. Unreachable pages are dropped.
    async fn scrape_references(&self, references: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(references.len());
        for reference in references {
            if reference.len() > 4 && reference.starts_with("http") {
                match self.fetcher.fetch_article(reference).await {
                    Ok(text) if !text.is_empty() => out.push(text),
                    Ok(_) => debug!(url = %reference, "Scraped page was empty"),
                    Err(e) => debug!(url = %reference, error = %e, "Scrape failed"),
                }
            } else {
                out.push(reference.clone());
            }
        }
        out
    }

    /// Ask for an article and store it as a pending post.
    ///
    /// Returns `Ok(None)` when the model replied with no content.
    async fn write_post(&self, title: &str, references: &[String]) -> Result<Option<Blog>, AiError> {
        let reply = self.llm.complete(&prompts::article(title, references)).await?;
        let (description, content) = parse_sections(&reply);
        let content = clean_ai_output(&content);
        if content.is_empty() {
            info!(title, "Model returned empty content");
            return Ok(None);
        }

        let input = BlogInput {
            title: title.to_string(),
            slug: slugify(title),
            description: clean_ai_output(&description),
            content,
            cover_image: String::new(),
            author: BlogAuthor::Aibys,
            status: BlogStatus::Pending,
            user_id: None,
        };
        Ok(Some(self.blogs.create_with_unique_slug(&input)?))
    }

    /// Ask for tags for a post and attach them. Failures are logged only.
    pub async fn assign_tags(&self, blog_id: i64, title: &str) {
        let reply = match self.llm.complete(&prompts::tags(title)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(blog_id, error = %e, "Tag suggestion failed");
                return;
            }
        };

        let mut tag_ids = Vec::new();
        for line in reply.lines() {
            let cleaned = clean_line(line);
            let name = cleaned.trim_matches(|c| matches!(c, '`' | '*' | '_')).trim();
            if name.chars().count() < MIN_TAG_CHARS {
                continue;
            }
            match self.tags.find_or_create(name) {
                Ok(tag) if !tag_ids.contains(&tag.id) => tag_ids.push(tag.id),
                Ok(_) => {}
                Err(e) => warn!(tag = name, error = %e, "Failed to create tag"),
            }
        }

        if tag_ids.is_empty() {
            return;
        }
        match self.blogs.replace_tags(blog_id, &tag_ids) {
            Ok(()) => debug!(blog_id, count = tag_ids.len(), "Tags assigned"),
            Err(e) => warn!(blog_id, error = %e, "Failed to assign tags"),
        }
    }

    /// Rewrite a rejected post following the reviewer's comment.
    ///
    /// On success the post returns to pending with the comment cleared.
    /// Returns whether the rewrite was stored.
    pub async fn regenerate(&self, blog: &Blog, comment: &str) -> bool {
        info!(blog_id = blog.id, title = %blog.title, "Regenerating rejected post");
        let success = match self.revise(blog, comment).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(blog_id = blog.id, error = %e, "Regeneration failed");
                false
            }
        };
        self.emit(BlogEvent::RegenerateDone {
            blog_id: blog.id,
            success,
        });
        success
    }

    async fn revise(&self, blog: &Blog, comment: &str) -> Result<bool, AiError> {
        let prompt = prompts::revision(&blog.title, &blog.description, &blog.content, comment);
        let reply = self.llm.complete(&prompt).await?;
        let (description, content) = parse_sections(&reply);
        let content = clean_ai_output(&content);
        if content.is_empty() {
            info!(blog_id = blog.id, "Model returned empty revision");
            return Ok(false);
        }
        let stored = self
            .blogs
            .apply_revision(blog.id, &clean_ai_output(&description), &content)?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use portfolio_storage::BlogFilter;
    use portfolio_core::pagination::PageRequest;

    use crate::client::SearchResult;

    /// Replies chosen by the first prompt line that contains a key.
    struct ScriptedModel {
        replies: Vec<(&'static str, Result<String, String>)>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<(&'static str, Result<String, String>)>) -> Self {
            Self { replies, prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            for (key, reply) in &self.replies {
                if prompt.contains(key) {
                    return reply.clone().map_err(AiError::Llm);
                }
            }
            Err(AiError::Llm("no scripted reply".into()))
        }
    }

    struct FakeSearch {
        results: HashMap<String, Vec<SearchResult>>,
        fail: bool,
        configured: bool,
        calls: Mutex<usize>,
    }

    impl FakeSearch {
        fn new(results: HashMap<String, Vec<SearchResult>>, fail: bool) -> Self {
            Self { results, fail, configured: true, calls: Mutex::new(0) }
        }
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, AiError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(AiError::Search("brave api returned status 500".into()));
            }
            Ok(self.results.get(query).cloned().unwrap_or_default())
        }
    }

    struct FakeFetcher;

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_article(&self, url: &str) -> Result<String, AiError> {
            if url.contains("broken") {
                return Err(AiError::Fetch("url returned status 404".into()));
            }
            Ok(format!("isi halaman {}", url))
        }
    }

    const TITLE: &str = "Panduan Lengkap Rust untuk Backend";

    fn hit(url: &str, description: &str) -> SearchResult {
        SearchResult { title: "hit".into(), url: url.into(), description: description.into() }
    }

    fn article_reply() -> Result<String, String> {
        Ok("---DESCRIPTION---\nRingkasan.\n---CONTENT---\n```html\n<h2>Isi</h2>\n```".into())
    }

    fn generator(
        model: Arc<ScriptedModel>,
        search_fail: bool,
    ) -> (BlogGenerator, Arc<Database>, broadcast::Receiver<Value>) {
        let db = Arc::new(Database::in_memory().unwrap());
        let (tx, rx) = broadcast::channel(64);
        let mut results = HashMap::new();
        results.insert(
            TITLE.to_string(),
            vec![hit("https://ok.example/a", "deskripsi"), hit("https://broken.example/b", "")],
        );
        let search = Arc::new(FakeSearch::new(results, search_fail));
        let gen = BlogGenerator::new(db.clone(), model, search, Arc::new(FakeFetcher), tx)
            .with_search_delay(Duration::ZERO);
        (gen, db, rx)
    }

    fn drain(rx: &mut broadcast::Receiver<Value>) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(v) = rx.try_recv() {
            out.push(v);
        }
        out
    }

    #[tokio::test]
    async fn test_generate_saves_pending_post_with_tags() {
        let model = Arc::new(ScriptedModel::new(vec![
            ("judul artikel blog", Ok(format!("1. {}\n2. Pendek\n", TITLE))),
            ("Berikan 3-5 tag", Ok("rust\n- **backend**\nx\n".into())),
            ("Judul artikel yang harus kamu tulis", article_reply()),
        ]));
        let (gen, db, mut rx) = generator(model.clone(), false);

        let report = gen.generate("rust", 2).await;
        assert_eq!(report.saved, 1);
        assert_eq!(report.total_target, 1);

        let blogs = BlogRepository::new(db.clone());
        let blog = blogs.find_by_id(report.blog_ids[0]).unwrap().unwrap();
        assert_eq!(blog.title, TITLE);
        assert_eq!(blog.slug, "panduan-lengkap-rust-untuk-backend");
        assert_eq!(blog.author, BlogAuthor::Aibys);
        assert_eq!(blog.status, BlogStatus::Pending);
        assert_eq!(blog.description, "Ringkasan.");
        assert_eq!(blog.content, "<h2>Isi</h2>");
        assert_eq!(blog.user_id, None);
        let tag_slugs: Vec<_> = blog.tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(tag_slugs.len(), 2);
        assert!(tag_slugs.contains(&"rust"));
        assert!(tag_slugs.contains(&"backend"));

        // Scraped page replaced the good URL, the broken one was dropped.
        let prompts = model.prompts.lock().unwrap();
        let article_prompt = prompts.iter().find(|p| p.contains("Referensi 1")).unwrap();
        assert!(article_prompt.contains("deskripsi"));
        assert!(article_prompt.contains("isi halaman https://ok.example/a"));
        assert!(!article_prompt.contains("broken.example"));
        drop(prompts);

        let events = drain(&mut rx);
        let kinds: Vec<_> = events
            .iter()
            .map(|e| (e["type"].as_str().unwrap().to_string(), e["status"].as_str().map(String::from)))
            .collect();
        assert_eq!(kinds[0], ("generate_progress".into(), Some("generating_titles".into())));
        assert_eq!(kinds[1], ("generate_progress".into(), Some("writing".into())));
        assert_eq!(kinds[2], ("generate_progress".into(), Some("saved".into())));
        let done = events.last().unwrap();
        assert_eq!(done["type"], "generate_done");
        assert_eq!(done["saved"], 1);
        assert_eq!(done["failed"], false);
    }

    #[tokio::test]
    async fn test_generate_title_failure_emits_failed_done() {
        let model = Arc::new(ScriptedModel::new(vec![(
            "judul artikel blog",
            Err("ollama returned status 500".into()),
        )]));
        let (gen, _db, mut rx) = generator(model, false);

        let report = gen.generate("rust", 3).await;
        assert_eq!(report.saved, 0);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        let done = &events[1];
        assert_eq!(done["type"], "generate_done");
        assert_eq!(done["failed"], true);
        assert_eq!(done["total_target"], 3);
        assert!(done["error"].as_str().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_failed_search_skips_title() {
        let model = Arc::new(ScriptedModel::new(vec![
            ("judul artikel blog", Ok(TITLE.to_string())),
            ("Judul artikel yang harus kamu tulis", article_reply()),
        ]));
        let (gen, db, mut rx) = generator(model, true);

        let report = gen.generate("", 1).await;
        assert_eq!(report.saved, 0);
        assert_eq!(report.total_target, 1);

        let stats = BlogRepository::new(db).stats().unwrap();
        assert_eq!(stats.total, 0);

        let done = drain(&mut rx).pop().unwrap();
        assert_eq!(done["failed"], true);
        assert!(done.get("error").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_titles_get_unique_slugs() {
        let model = Arc::new(ScriptedModel::new(vec![
            ("judul artikel blog", Ok(format!("{}\n{}", TITLE, TITLE))),
            ("Berikan 3-5 tag", Ok(String::new())),
            ("Judul artikel yang harus kamu tulis", article_reply()),
        ]));
        let (gen, db, _rx) = generator(model, false);

        let report = gen.generate("rust", 2).await;
        assert_eq!(report.saved, 2);

        let page = BlogRepository::new(db)
            .list(&BlogFilter::default(), PageRequest { page: 1, limit: 10 })
            .unwrap();
        let mut slugs: Vec<_> = page.items.iter().map(|b| b.slug.clone()).collect();
        slugs.sort();
        assert_eq!(
            slugs,
            vec![
                "panduan-lengkap-rust-untuk-backend".to_string(),
                "panduan-lengkap-rust-untuk-backend-2".to_string(),
            ]
        );
    }

    fn rejected_blog(db: &Arc<Database>) -> Blog {
        let blogs = BlogRepository::new(db.clone());
        let blog = blogs
            .create(&BlogInput {
                title: TITLE.into(),
                slug: "panduan".into(),
                description: "lama".into(),
                content: "<p>lama</p>".into(),
                cover_image: String::new(),
                author: BlogAuthor::Aibys,
                status: BlogStatus::Pending,
                user_id: None,
            })
            .unwrap();
        blogs
            .set_status(blog.id, BlogStatus::Rejected, Some("terlalu pendek"))
            .unwrap();
        blogs.find_by_id(blog.id).unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_regenerate_applies_revision() {
        let model = Arc::new(ScriptedModel::new(vec![(
            "ditolak dengan catatan",
            Ok("---DESCRIPTION---\nBaru.\n---CONTENT---\n<p>baru</p>".into()),
        )]));
        let (gen, db, mut rx) = generator(model.clone(), false);
        let blog = rejected_blog(&db);

        assert!(gen.regenerate(&blog, "terlalu pendek").await);

        let updated = BlogRepository::new(db).find_by_id(blog.id).unwrap().unwrap();
        assert_eq!(updated.status, BlogStatus::Pending);
        assert_eq!(updated.reject_comment, "");
        assert_eq!(updated.description, "Baru.");
        assert_eq!(updated.content, "<p>baru</p>");
        assert!(model.prompts.lock().unwrap()[0].contains("\"terlalu pendek\""));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "regenerate_done");
        assert_eq!(events[0]["blog_id"], blog.id);
        assert_eq!(events[0]["success"], true);
    }

    #[tokio::test]
    async fn test_regenerate_empty_content_keeps_post() {
        let model = Arc::new(ScriptedModel::new(vec![(
            "ditolak dengan catatan",
            Ok("---DESCRIPTION---\nx\n---CONTENT---\n```html\n```".into()),
        )]));
        let (gen, db, mut rx) = generator(model, false);
        let blog = rejected_blog(&db);

        assert!(!gen.regenerate(&blog, "perbaiki").await);

        let unchanged = BlogRepository::new(db).find_by_id(blog.id).unwrap().unwrap();
        assert_eq!(unchanged.status, BlogStatus::Rejected);
        assert_eq!(unchanged.content, "<p>lama</p>");
        assert_eq!(drain(&mut rx)[0]["success"], false);
    }

    #[tokio::test]
    async fn test_unconfigured_search_skips_delay_and_request() {
        let model = Arc::new(ScriptedModel::new(vec![
            ("judul artikel blog", Ok(format!("1. {}\n", TITLE))),
            ("Berikan 3-5 tag", Ok("rust\n".into())),
            ("Judul artikel yang harus kamu tulis", article_reply()),
        ]));
        let db = Arc::new(Database::in_memory().unwrap());
        let (tx, _rx) = broadcast::channel(64);
        let search = Arc::new(FakeSearch {
            configured: false,
            ..FakeSearch::new(HashMap::new(), false)
        });
        let gen = BlogGenerator::new(db, model, search.clone(), Arc::new(FakeFetcher), tx)
            .with_search_delay(Duration::from_secs(3600));

        let report = tokio::time::timeout(Duration::from_secs(5), gen.generate("rust", 1))
            .await
            .unwrap();
        assert_eq!(report.saved, 1);
        assert_eq!(*search.calls.lock().unwrap(), 0);
    }
}
