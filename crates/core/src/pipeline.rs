use std::path::PathBuf;

use tokio::fs;
use tracing::{info, warn};

use crate::{
    config::{CrawlConfig, FetchTarget},
    error::{CrawlError, Result},
    extract::Extractor,
    fetch::{FetchOutcome, PageFetcher},
    format::render,
    paths::{get_events_json_path, get_events_markdown_path},
    sink::{save_document, save_events_json},
};

/// Stages of a single crawl attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Init,
    Fetching,
    Extracting,
    Persisting,
    Done,
    Failed,
}

/// Result of writing one artifact.
#[derive(Debug)]
pub struct SinkReport {
    pub path: PathBuf,
    pub result: Result<()>,
}

impl SinkReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub struct CrawlReport {
    pub event_count: usize,
    pub document: String,
    pub json: SinkReport,
    pub markdown: SinkReport,
}

impl CrawlReport {
    /// Both artifacts were written.
    pub fn is_complete(&self) -> bool {
        self.json.is_ok() && self.markdown.is_ok()
    }
}

/// Owns a fetch session until it is handed back. Dropping the guard while
/// it still holds the session (cancellation, panic) routes the session to
/// [`PageFetcher::abandon`].
struct SessionGuard<'a, F: PageFetcher> {
    fetcher: &'a F,
    session: Option<F::Session>,
}

impl<'a, F: PageFetcher> SessionGuard<'a, F> {
    fn new(fetcher: &'a F, session: F::Session) -> Self {
        Self {
            fetcher,
            session: Some(session),
        }
    }

    async fn fetch(&mut self, target: &FetchTarget) -> FetchOutcome {
        match self.session.as_mut() {
            Some(session) => self.fetcher.fetch(session, target).await,
            None => FetchOutcome::failed("fetch session already released"),
        }
    }

    async fn release(mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => self.fetcher.release(session).await,
            None => Ok(()),
        }
    }
}

impl<F: PageFetcher> Drop for SessionGuard<'_, F> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            warn!("fetch session dropped before release, abandoning it");
            self.fetcher.abandon(session);
        }
    }
}

/// Run one crawl: acquire → fetch → extract → release → persist.
///
/// The session is released on every path once acquired, including when
/// this future is dropped before completion. A failed fetch
/// returns [`CrawlError::FetchFailed`] without touching the output
/// directory. Sink failures are reported in the [`CrawlReport`]; one failing
/// sink does not stop the other.
pub async fn run_crawl<F, O>(
    fetcher: &F,
    extractor: &Extractor,
    config: &CrawlConfig,
    mut observe: O,
) -> Result<CrawlReport>
where
    F: PageFetcher,
    O: FnMut(CrawlState),
{
    let mut transition = |state: CrawlState| {
        info!(?state, "crawl state");
        observe(state);
    };

    transition(CrawlState::Init);
    let mut session = match fetcher.acquire().await {
        Ok(session) => SessionGuard::new(fetcher, session),
        Err(e) => {
            transition(CrawlState::Failed);
            return Err(e);
        }
    };

    transition(CrawlState::Fetching);
    let outcome = session.fetch(&config.target).await;

    let extracted = match outcome {
        FetchOutcome::Rendered { html } => {
            transition(CrawlState::Extracting);
            Ok(extractor.extract_html(&html))
        }
        FetchOutcome::Failed { reason } => Err(reason),
    };

    if let Err(e) = session.release().await {
        warn!(error = %e, "failed to release fetch session");
    }

    let batch = match extracted {
        Ok(batch) => batch,
        Err(reason) => {
            transition(CrawlState::Failed);
            return Err(CrawlError::FetchFailed {
                target: config.target.url.clone(),
                reason,
            });
        }
    };
    info!(events = batch.len(), url = %config.target.url, "extracted events");

    transition(CrawlState::Persisting);
    if let Err(e) = fs::create_dir_all(&config.output_dir).await {
        warn!(dir = %config.output_dir.display(), error = %e, "could not create output directory");
    }

    let document = render(&batch);

    let json_path = get_events_json_path(&config.output_dir);
    let json_result = save_events_json(&batch, &json_path, config.encoding).await;
    if let Err(e) = &json_result {
        warn!(error = %e, "structured-data sink failed");
    }

    let markdown_path = get_events_markdown_path(&config.output_dir);
    let markdown_result = save_document(&document, &markdown_path, config.encoding).await;
    if let Err(e) = &markdown_result {
        warn!(error = %e, "document sink failed");
    }

    transition(CrawlState::Done);

    Ok(CrawlReport {
        event_count: batch.len(),
        document,
        json: SinkReport {
            path: json_path,
            result: json_result,
        },
        markdown: SinkReport {
            path: markdown_path,
            result: markdown_result,
        },
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        error::FailureKind,
        paths::{EVENTS_JSON, EVENTS_MARKDOWN},
    };

    struct MockFetcher {
        outcome: FetchOutcome,
        acquire_fails: bool,
        hangs: bool,
        acquired: AtomicUsize,
        released: AtomicUsize,
        abandoned: AtomicUsize,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockFetcher {
        fn new(outcome: FetchOutcome) -> Self {
            Self {
                outcome,
                acquire_fails: false,
                hangs: false,
                acquired: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
                abandoned: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn rendered(html: &str) -> Self {
            Self::new(FetchOutcome::Rendered {
                html: html.to_string(),
            })
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PageFetcher for MockFetcher {
        type Session = u32;

        async fn acquire(&self) -> Result<u32> {
            self.calls.lock().unwrap().push("acquire");
            if self.acquire_fails {
                return Err(CrawlError::BrowserNotFound {
                    browser: "Mock".to_string(),
                });
            }
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        }

        async fn fetch(&self, session: &mut u32, _target: &FetchTarget) -> FetchOutcome {
            assert_eq!(*session, 7);
            self.calls.lock().unwrap().push("fetch");
            if self.hangs {
                std::future::pending::<()>().await;
            }
            self.outcome.clone()
        }

        async fn release(&self, session: u32) -> Result<()> {
            assert_eq!(session, 7);
            self.calls.lock().unwrap().push("release");
            self.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn abandon(&self, session: u32) {
            assert_eq!(session, 7);
            self.calls.lock().unwrap().push("abandon");
            self.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }

    const PAGE: &str = r#"
        <article data-testid="event-card">
          <div data-testid="event-card-title">Feria de Diseño</div>
          <div data-testid="event-card-venue">Centro Cultural Recoleta</div>
          <a data-testid="event-card-link" href="/e/123">ver</a>
        </article>"#;

    fn config_in(dir: &std::path::Path) -> CrawlConfig {
        CrawlConfig {
            output_dir: dir.join("out"),
            ..CrawlConfig::default()
        }
    }

    #[tokio::test]
    async fn failed_fetch_releases_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = MockFetcher::new(FetchOutcome::failed("timeout"));
        let mut states = Vec::new();

        let err = run_crawl(&fetcher, &Extractor::eventbrite().unwrap(), &config, |s| {
            states.push(s)
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), FailureKind::FetchFailure);
        assert!(err.to_string().contains("timeout"));
        assert_eq!(fetcher.released.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.calls(), vec!["acquire", "fetch", "release"]);
        assert_eq!(
            states,
            vec![CrawlState::Init, CrawlState::Fetching, CrawlState::Failed]
        );
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn successful_crawl_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = MockFetcher::rendered(PAGE);
        let mut states = Vec::new();

        let report = run_crawl(&fetcher, &Extractor::eventbrite().unwrap(), &config, |s| {
            states.push(s)
        })
        .await
        .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.event_count, 1);
        assert_eq!(fetcher.released.load(Ordering::SeqCst), 1);
        assert_eq!(
            states,
            vec![
                CrawlState::Init,
                CrawlState::Fetching,
                CrawlState::Extracting,
                CrawlState::Persisting,
                CrawlState::Done,
            ]
        );

        let json = std::fs::read_to_string(config.output_dir.join(EVENTS_JSON)).unwrap();
        assert!(json.contains("\"location\": \"Centro Cultural Recoleta\""));
        assert!(!json.contains("datetime"));

        let md = std::fs::read_to_string(config.output_dir.join(EVENTS_MARKDOWN)).unwrap();
        assert_eq!(md, report.document);
        assert!(md.contains("## Feria de Diseño"));
        assert!(md.contains("[Feria de Diseño](/e/123)"));
    }

    #[tokio::test]
    async fn empty_page_still_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = MockFetcher::rendered("<html><body>no events today</body></html>");

        let report = run_crawl(&fetcher, &Extractor::eventbrite().unwrap(), &config, |_| {})
            .await
            .unwrap();

        assert_eq!(report.event_count, 0);
        let json = std::fs::read_to_string(&report.json.path).unwrap();
        assert_eq!(json, "[]");
        let md = std::fs::read_to_string(&report.markdown.path).unwrap();
        assert_eq!(md, "# Eventos en Buenos Aires\n\n");
    }

    #[tokio::test]
    async fn one_sink_failing_does_not_block_the_other() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        // A directory where the JSON file should go makes that write fail.
        std::fs::create_dir_all(config.output_dir.join(EVENTS_JSON)).unwrap();
        let fetcher = MockFetcher::rendered(PAGE);

        let report = run_crawl(&fetcher, &Extractor::eventbrite().unwrap(), &config, |_| {})
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert!(matches!(
            report.json.result,
            Err(CrawlError::SinkFailed { .. })
        ));
        assert!(report.markdown.is_ok());
        assert!(config.output_dir.join(EVENTS_MARKDOWN).is_file());
    }

    #[tokio::test]
    async fn acquire_failure_is_unexpected_and_skips_release() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut fetcher = MockFetcher::rendered(PAGE);
        fetcher.acquire_fails = true;
        let mut states = Vec::new();

        let err = run_crawl(&fetcher, &Extractor::eventbrite().unwrap(), &config, |s| {
            states.push(s)
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), FailureKind::UnexpectedFailure);
        assert_eq!(fetcher.calls(), vec!["acquire"]);
        assert_eq!(fetcher.acquired.load(Ordering::SeqCst), 0);
        assert_eq!(states, vec![CrawlState::Init, CrawlState::Failed]);
    }

    #[tokio::test]
    async fn cancelled_crawl_abandons_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut fetcher = MockFetcher::rendered(PAGE);
        fetcher.hangs = true;
        let extractor = Extractor::eventbrite().unwrap();

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            run_crawl(&fetcher, &extractor, &config, |_| {}),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(fetcher.released.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.abandoned.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.calls(), vec!["acquire", "fetch", "abandon"]);
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn completed_crawl_never_abandons() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = MockFetcher::new(FetchOutcome::failed("HTTP 503"));

        let _ = run_crawl(&fetcher, &Extractor::eventbrite().unwrap(), &config, |_| {}).await;

        assert_eq!(fetcher.released.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.abandoned.load(Ordering::SeqCst), 0);
    }
}
