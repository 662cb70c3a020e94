//! End-to-end crawl runs against an in-memory renderer

mod common;

use std::time::Duration;

use common::*;
use release_harvester::content_saver::ContentSaver;
use release_harvester::crawl_engine::{
    ArticleOutcome, CrawlEngine, DateFilter, NoOpProgress, TerminationReason,
};
use release_harvester::progress_store::{FailureKind, ProgressStore, RetryQueue};
use tempfile::TempDir;

const FUNDED: &[&str] = &[
    "Acme raises Series B",
    "led by venture partners",
    "in an oversubscribed round",
];
const FUNDED_TEXT: &str = "Acme raises Series B\nled by venture partners\nin an oversubscribed round";
const EARNINGS: &[&str] = &[
    "Quarterly earnings beat expectations",
    "second round of layoffs avoided",
];

fn index_calls(renderer: &MockRenderer) -> Vec<String> {
    renderer
        .calls()
        .into_iter()
        .filter(|url| url.starts_with(BASE_URL))
        .collect()
}

/// Listing page 1 with A (unrecognized layout), B (3 hits), C (1 hit);
/// page 2 is past the end
fn abc_corpus() -> (std::sync::Arc<MockRenderer>, [String; 3]) {
    let filter = DateFilter::default();
    let a = article_url("a-video-release");
    let b = article_url("b-series-b");
    let c = article_url("c-earnings");

    let renderer = MockRenderer::new();
    renderer.page(index_url(1, &filter), index_page(&[&a, &b, &c]));
    renderer.page(index_url(2, &filter), empty_index_page());
    renderer.page(&a, unrecognized_article_page());
    renderer.page(&b, article_page(FUNDED));
    renderer.page(&c, article_page(EARNINGS));
    (renderer, [a, b, c])
}

#[tokio::test]
async fn abc_scenario_saves_rejects_and_logs() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join(".state");
    let (renderer, [a, b, c]) = abc_corpus();
    let progress = RecordingProgress::default();

    let config = test_config(dir.path()).build().unwrap();
    let engine = CrawlEngine::open(config, renderer.clone(), progress.clone())
        .await
        .unwrap();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.reason, TerminationReason::Exhausted);
    assert_eq!(summary.pages_completed, 1);
    assert_eq!(summary.articles.saved, 1);
    assert_eq!(summary.articles.rejected, 1);
    assert_eq!(summary.articles.failed, 1);
    assert_eq!(summary.final_cursor, 2);

    assert_eq!(processed_links(&state_dir), vec![b.clone(), c.clone()]);
    assert_eq!(read_lines(&state_dir.join("failed_links.txt")), vec![a.clone()]);

    let files = saved_files(dir.path());
    assert_eq!(files, vec![ContentSaver::new(dir.path()).path_for(&b)]);
    assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), FUNDED_TEXT);

    let queue = RetryQueue::load(&state_dir).await.unwrap();
    assert_eq!(queue.len(), 1);
    let entry = queue.get(&a).unwrap();
    assert_eq!(entry.failure_kind, FailureKind::Structure);
    assert_eq!(entry.attempt_count, 1);

    // Every processed link was either saved or rejected
    let reported = progress.0.articles.lock().clone();
    for link in processed_links(&state_dir) {
        let result = reported.iter().find(|r| r.link == link).unwrap();
        assert!(matches!(
            result.outcome,
            ArticleOutcome::Saved(_) | ArticleOutcome::Rejected { .. }
        ));
    }
    assert_eq!(
        *progress.0.terminations.lock(),
        vec![TerminationReason::Exhausted]
    );
    assert_eq!(renderer.releases(), 1);
}

#[tokio::test]
async fn second_run_over_same_corpus_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join(".state");
    let (renderer, [_, b, _]) = abc_corpus();

    let config = test_config(dir.path()).build().unwrap();
    CrawlEngine::open(config.clone(), renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    let processed = processed_links(&state_dir);
    let saved = ContentSaver::new(dir.path()).path_for(&b);
    let content = std::fs::read_to_string(&saved).unwrap();
    let calls_before = renderer.calls().len();

    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reason, TerminationReason::Exhausted);
    assert_eq!(
        renderer.calls()[calls_before..],
        [index_url(2, &DateFilter::default())]
    );
    assert_eq!(processed_links(&state_dir), processed);
    assert_eq!(saved_files(dir.path()), vec![saved.clone()]);
    assert_eq!(std::fs::read_to_string(&saved).unwrap(), content);
    assert_eq!(renderer.releases(), 2);
}

#[tokio::test]
async fn processed_links_are_never_dispatched() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join(".state");
    let (renderer, [a, b, c]) = abc_corpus();

    let mut store = ProgressStore::open(state_dir.clone(), DateFilter::default())
        .await
        .unwrap();
    store.mark_processed(&b);
    store.flush().await.unwrap();

    let config = test_config(dir.path()).build().unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(renderer.times_rendered(&b), 0);
    assert_eq!(renderer.times_rendered(&a), 1);
    assert_eq!(renderer.times_rendered(&c), 1);
    assert_eq!(summary.links_skipped, 1);
    assert!(saved_files(dir.path()).is_empty());
    assert_eq!(processed_links(&state_dir), vec![b, c]);
}

#[tokio::test]
async fn duplicate_links_on_a_page_are_dispatched_once() {
    let dir = TempDir::new().unwrap();
    let filter = DateFilter::default();
    let b = article_url("b-series-b");

    let renderer = MockRenderer::new();
    renderer.page(index_url(1, &filter), index_page(&[&b, &b]));
    renderer.page(index_url(2, &filter), empty_index_page());
    renderer.page(&b, article_page(FUNDED));

    let config = test_config(dir.path()).build().unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(renderer.times_rendered(&b), 1);
    assert_eq!(summary.links_skipped, 1);
    assert_eq!(summary.articles.saved, 1);
}

#[tokio::test]
async fn relative_hrefs_resolve_against_the_index_url() {
    let dir = TempDir::new().unwrap();
    let filter = DateFilter::default();
    let resolved = article_url("relative-release");

    let renderer = MockRenderer::new();
    renderer.page(
        index_url(1, &filter),
        index_page(&["/news-releases/relative-release.html"]),
    );
    renderer.page(index_url(2, &filter), empty_index_page());
    renderer.page(&resolved, article_page(FUNDED));

    let config = test_config(dir.path()).build().unwrap();
    CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(renderer.times_rendered(&resolved), 1);
    assert_eq!(
        processed_links(&dir.path().join(".state")),
        vec![resolved]
    );
}

#[tokio::test]
async fn empty_first_page_terminates_cleanly() {
    let dir = TempDir::new().unwrap();
    let renderer = MockRenderer::new();
    renderer.page(index_url(1, &DateFilter::default()), empty_index_page());

    let config = test_config(dir.path()).build().unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reason, TerminationReason::Exhausted);
    assert_eq!(summary.pages_completed, 0);
    assert_eq!(summary.final_cursor, 1);
    assert_eq!(renderer.calls().len(), 1);
    // Final flush still writes state
    let cursor = std::fs::read_to_string(dir.path().join(".state/current_page_count.txt")).unwrap();
    assert_eq!(cursor, "1");
    assert_eq!(renderer.releases(), 1);
}

#[tokio::test]
async fn bootstrap_page_starts_new_epoch_at_page_one() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join(".state");
    let initial = DateFilter::default();
    let next = DateFilter {
        month: 10,
        day: 1,
        year: 2024,
        hour: 19,
    };
    let (x, y, z) = (
        article_url("x"),
        article_url("y"),
        article_url("z"),
    );

    let renderer = MockRenderer::new();
    renderer.page(index_url(1, &initial), index_page(&[&x]));
    renderer.page(
        index_url(2, &initial),
        index_page_with_times(&[
            (&y, "Oct 01, 2024, 17:10 ET"),
            (&z, "Oct 01, 2024, 18:40 ET"),
        ]),
    );
    renderer.page(index_url(1, &next), empty_index_page());
    for link in [&x, &y, &z] {
        renderer.page(link, article_page(EARNINGS));
    }
    let progress = RecordingProgress::default();

    let config = test_config(dir.path())
        .bootstrap_page(Some(2))
        .build()
        .unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), progress.clone())
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        index_calls(&renderer),
        vec![
            index_url(1, &initial),
            index_url(2, &initial),
            index_url(1, &next)
        ]
    );
    assert_eq!(summary.reason, TerminationReason::Exhausted);
    assert_eq!(summary.epochs_started, 1);
    assert_eq!(summary.final_cursor, 1);
    assert_eq!(*progress.0.epochs.lock(), vec![(1, next)]);

    let store = ProgressStore::open(state_dir, initial).await.unwrap();
    assert_eq!(store.cursor(), 1);
    assert_eq!(store.filter(), next);
    assert_eq!(store.epoch().epoch, 1);
}

#[tokio::test]
async fn unreadable_bootstrap_timestamp_just_advances() {
    let dir = TempDir::new().unwrap();
    let filter = DateFilter::default();
    let x = article_url("x");

    let renderer = MockRenderer::new();
    renderer.page(index_url(1, &filter), index_page_with_times(&[(&x, "soon")]));
    renderer.page(index_url(2, &filter), empty_index_page());
    renderer.page(&x, article_page(EARNINGS));

    let config = test_config(dir.path())
        .bootstrap_page(Some(1))
        .build()
        .unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.epochs_started, 0);
    assert_eq!(
        index_calls(&renderer),
        vec![index_url(1, &filter), index_url(2, &filter)]
    );
}

#[tokio::test]
async fn epoch_limit_stops_after_new_epoch_is_recorded() {
    let dir = TempDir::new().unwrap();
    let filter = DateFilter::default();
    let x = article_url("x");

    let renderer = MockRenderer::new();
    renderer.page(
        index_url(1, &filter),
        index_page_with_times(&[(&x, "Oct 02, 2024, 08:15 ET")]),
    );
    renderer.page(&x, article_page(EARNINGS));

    let config = test_config(dir.path())
        .bootstrap_page(Some(1))
        .max_epochs(Some(1))
        .build()
        .unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reason, TerminationReason::EpochLimit);
    assert_eq!(index_calls(&renderer).len(), 1);

    let store = ProgressStore::open(dir.path().join(".state"), filter)
        .await
        .unwrap();
    assert_eq!(store.cursor(), 1);
    assert_eq!(
        store.filter(),
        DateFilter {
            month: 10,
            day: 2,
            year: 2024,
            hour: 9
        }
    );
}

#[tokio::test]
async fn failed_index_page_is_skipped() {
    let dir = TempDir::new().unwrap();
    let filter = DateFilter::default();
    let b = article_url("b-series-b");

    let renderer = MockRenderer::new();
    // page 1 is not mocked and times out
    renderer.page(index_url(2, &filter), index_page(&[&b]));
    renderer.page(index_url(3, &filter), empty_index_page());
    renderer.page(&b, article_page(FUNDED));

    let config = test_config(dir.path()).build().unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reason, TerminationReason::Exhausted);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.pages_completed, 1);
    assert_eq!(summary.articles.saved, 1);
}

#[tokio::test]
async fn consecutive_index_failures_end_the_crawl() {
    let dir = TempDir::new().unwrap();
    let renderer = MockRenderer::new();

    let config = test_config(dir.path()).build().unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reason, TerminationReason::TooManyPageFailures);
    assert_eq!(summary.pages_failed, 3);
    assert_eq!(renderer.calls().len(), 3);
    // The last failed page is retried on the next run
    assert_eq!(summary.final_cursor, 3);
    assert_eq!(renderer.releases(), 1);
}

#[tokio::test]
async fn page_limit_then_resume_from_saved_cursor() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join(".state");
    let filter = DateFilter::default();
    let (b, c) = (article_url("b-series-b"), article_url("c-earnings"));

    let renderer = MockRenderer::new();
    renderer.page(index_url(1, &filter), index_page(&[&b]));
    renderer.page(index_url(2, &filter), index_page(&[&c]));
    renderer.page(index_url(3, &filter), empty_index_page());
    renderer.page(&b, article_page(FUNDED));
    renderer.page(&c, article_page(EARNINGS));

    let config = test_config(dir.path()).build().unwrap();
    let limited = config.clone().into_builder().max_pages(Some(1)).build().unwrap();
    let first = CrawlEngine::open(limited, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(first.reason, TerminationReason::PageLimit);
    assert_eq!(first.final_cursor, 2);
    assert_eq!(processed_links(&state_dir), vec![b.clone()]);

    let calls_before = renderer.calls().len();
    let second = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(second.reason, TerminationReason::Exhausted);
    assert_eq!(renderer.calls()[calls_before], index_url(2, &filter));
    assert_eq!(processed_links(&state_dir), vec![b, c]);
}

#[tokio::test]
async fn state_is_flushed_every_n_pages() {
    let dir = TempDir::new().unwrap();
    let filter = DateFilter::default();
    let renderer = MockRenderer::new();
    for page in 1..=3 {
        let link = article_url(&format!("release-{page}"));
        renderer.page(index_url(page, &filter), index_page(&[&link]));
        renderer.page(&link, article_page(EARNINGS));
    }
    renderer.page(index_url(4, &filter), empty_index_page());
    let progress = RecordingProgress::default();

    let config = test_config(dir.path())
        .flush_every_pages(2)
        .build()
        .unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), progress.clone())
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_completed, 3);
    assert_eq!(*progress.0.flushes.lock(), vec![2]);
    assert_eq!(processed_links(&dir.path().join(".state")).len(), 3);
}

#[tokio::test]
async fn resumed_run_flushes_on_page_multiples() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join(".state");
    let filter = DateFilter::default();

    let mut store = ProgressStore::open(state_dir.clone(), filter).await.unwrap();
    store.advance();
    store.flush().await.unwrap();

    let renderer = MockRenderer::new();
    for page in 2..=4 {
        let link = article_url(&format!("release-{page}"));
        renderer.page(index_url(page, &filter), index_page(&[&link]));
        renderer.page(&link, article_page(EARNINGS));
    }
    renderer.page(index_url(5, &filter), empty_index_page());
    let progress = RecordingProgress::default();

    let config = test_config(dir.path())
        .flush_every_pages(2)
        .build()
        .unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), progress.clone())
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_completed, 3);
    assert_eq!(index_calls(&renderer)[0], index_url(2, &filter));
    assert_eq!(*progress.0.flushes.lock(), vec![2, 4]);
}

#[tokio::test]
async fn listing_without_container_is_exhausted_not_failed() {
    let dir = TempDir::new().unwrap();
    let filter = DateFilter::default();
    let b = article_url("b-series-b");

    let renderer = MockRenderer::new();
    renderer.enforce_readiness();
    renderer.page(index_url(1, &filter), index_page(&[&b]));
    for page in 2..=5 {
        renderer.page(
            index_url(page, &filter),
            "<html><body><p>No results</p></body></html>",
        );
    }
    renderer.page(&b, article_page(FUNDED));

    let config = test_config(dir.path()).build().unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reason, TerminationReason::Exhausted);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.final_cursor, 2);
    assert_eq!(summary.articles.saved, 1);
    assert_eq!(index_calls(&renderer).len(), 2);
}

#[tokio::test]
async fn article_without_ready_marker_is_a_fetch_failure() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join(".state");
    let filter = DateFilter::default();
    let b = article_url("b-still-loading");

    let renderer = MockRenderer::new();
    renderer.enforce_readiness();
    renderer.page(index_url(1, &filter), index_page(&[&b]));
    renderer.page(index_url(2, &filter), empty_index_page());
    renderer.page(&b, "<html><body><p>venture round series</p></body></html>");

    let config = test_config(dir.path()).build().unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reason, TerminationReason::Exhausted);
    assert_eq!(summary.articles.failed, 1);
    assert!(processed_links(&state_dir).is_empty());
    let queue = RetryQueue::load(&state_dir).await.unwrap();
    assert_eq!(queue.get(&b).unwrap().failure_kind, FailureKind::Fetch);
}

#[tokio::test]
async fn article_renders_never_exceed_concurrency() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join(".state");
    let filter = DateFilter::default();
    let links: Vec<String> = (1..=8)
        .map(|n| article_url(&format!("seed-round-{n}")))
        .collect();

    let renderer = MockRenderer::new();
    renderer.delay(Duration::from_millis(20));
    renderer.page(index_url(1, &filter), index_page(&links));
    renderer.page(index_url(2, &filter), empty_index_page());
    for link in &links {
        renderer.page(link, article_page(FUNDED));
    }

    let config = test_config(dir.path()).concurrency(2).build().unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(renderer.peak_in_flight(), 2);
    assert_eq!(summary.articles.saved, 8);
    assert_eq!(processed_links(&state_dir), links);
    assert_eq!(saved_files(dir.path()).len(), 8);
}

#[tokio::test]
async fn stop_request_interrupts_before_next_page() {
    let dir = TempDir::new().unwrap();
    let (renderer, _) = abc_corpus();

    let config = test_config(dir.path()).build().unwrap();
    let engine = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap();
    engine.stop_handle().request_stop();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.reason, TerminationReason::Interrupted);
    assert!(renderer.calls().is_empty());
    assert_eq!(renderer.releases(), 1);
}

#[tokio::test]
async fn article_fetch_and_worker_failures_are_recorded() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join(".state");
    let filter = DateFilter::default();
    let (b, missing, crashing) = (
        article_url("b-series-b"),
        article_url("never-loads"),
        article_url("crashes-worker"),
    );

    let renderer = MockRenderer::new();
    renderer.page(index_url(1, &filter), index_page(&[&b, &missing, &crashing]));
    renderer.page(index_url(2, &filter), empty_index_page());
    renderer.page(&b, article_page(FUNDED));
    renderer.panic_on(&crashing);

    let config = test_config(dir.path()).build().unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.articles.saved, 1);
    assert_eq!(summary.articles.failed, 2);
    assert_eq!(
        read_lines(&state_dir.join("failed_links.txt")),
        vec![missing.clone(), crashing.clone()]
    );
    let queue = RetryQueue::load(&state_dir).await.unwrap();
    assert_eq!(queue.get(&missing).unwrap().failure_kind, FailureKind::Fetch);
    assert_eq!(queue.get(&crashing).unwrap().failure_kind, FailureKind::Fetch);
}

#[tokio::test]
async fn save_failure_keeps_link_unprocessed() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join("state");
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();
    let filter = DateFilter::default();
    let b = article_url("b-series-b");

    let renderer = MockRenderer::new();
    renderer.page(index_url(1, &filter), index_page(&[&b]));
    renderer.page(index_url(2, &filter), empty_index_page());
    renderer.page(&b, article_page(FUNDED));

    let config = test_config(&blocked)
        .state_dir(&state_dir)
        .build()
        .unwrap();
    let summary = CrawlEngine::open(config, renderer.clone(), NoOpProgress)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.articles.failed, 1);
    assert!(processed_links(&state_dir).is_empty());
    let queue = RetryQueue::load(&state_dir).await.unwrap();
    assert_eq!(queue.get(&b).unwrap().failure_kind, FailureKind::Save);
}
