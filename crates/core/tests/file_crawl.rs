use std::path::PathBuf;

use eventcrawl_core::{
    CrawlConfig, CrawlError, CrawlState, Extractor, FailureKind, FileFetcher, OutputEncoding,
    load_events_json, run_crawl,
};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/listing.html")
}

#[tokio::test]
async fn crawls_saved_listing_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = CrawlConfig {
        output_dir: dir.path().to_path_buf(),
        encoding: OutputEncoding::Utf8,
        ..CrawlConfig::default()
    };
    let extractor = Extractor::eventbrite().unwrap();
    let mut last_state = CrawlState::Init;

    let report = run_crawl(&FileFetcher::new(fixture()), &extractor, &config, |s| {
        last_state = s
    })
    .await
    .unwrap();

    assert_eq!(last_state, CrawlState::Done);
    assert!(report.is_complete());
    assert_eq!(report.event_count, 3);

    let batch = load_events_json(&report.json.path).await.unwrap();
    let records = batch.records();

    assert_eq!(records[0].title.as_deref(), Some("Feria de Diseño"));
    assert_eq!(records[0].datetime.as_deref(), Some("sáb, 12 abr, 18:00"));
    assert_eq!(
        records[0].url.as_deref(),
        Some("https://www.eventbrite.com/e/feria-de-diseno-123")
    );
    assert_eq!(
        records[0].image_url.as_deref(),
        Some("https://img.evbuc.com/feria.jpg")
    );

    assert_eq!(records[1].title.as_deref(), Some("Milonga en el Parque"));
    assert_eq!(records[1].location, None);
    assert_eq!(records[1].image_url, None);

    assert_eq!(records[2].title, None);
    assert_eq!(records[2].location.as_deref(), Some("Usina del Arte"));
    assert_eq!(records[2].image_url.as_deref(), Some(""));

    let md = std::fs::read_to_string(&report.markdown.path).unwrap();
    assert_eq!(md.matches("\n---\n").count(), 3);
    assert_eq!(md.matches("![Imagen del evento]").count(), 1);
    assert!(md.contains("## Sin título\n\n"));
    assert!(md.contains("**Link:** [Ver evento](#)"));
    assert!(md.contains("**Ubicación:** No especificada"));
}

#[tokio::test]
async fn unreadable_source_fails_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = CrawlConfig {
        output_dir: dir.path().join("out"),
        ..CrawlConfig::default()
    };
    let fetcher = FileFetcher::new(dir.path().join("missing.html"));

    let err = run_crawl(&fetcher, &Extractor::eventbrite().unwrap(), &config, |_| {})
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::FetchFailure);
    assert!(matches!(err, CrawlError::FetchFailed { .. }));
    assert!(!config.output_dir.exists());
}
