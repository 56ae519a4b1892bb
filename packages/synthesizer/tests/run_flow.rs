//! End-to-end runs through the application context, backed by a file store
//! in a temporary directory and mock services.

use std::sync::Arc;
use tokio_test::assert_ok;

use synthesizer_core::testing::{MockFetcher, MockGenerator, MockResolver};
use synthesizer_core::{
    export_document, parse_synthesis, AppContext, Config, FileStore, Generator, HnThread,
    KeyValueStore, ModelId, RunRequest, SkinId, SkinView, SourceInput, Status,
};

const ARTICLE: &str = "https://blog.example.com/rust-async";
const THREAD: &str = "https://news.ycombinator.com/item?id=4242";

fn context(dir: &std::path::Path, generator: MockGenerator, fetcher: MockFetcher) -> AppContext {
    let resolver = MockResolver::new().with_thread(
        THREAD,
        HnThread {
            id: 4242,
            title: "Async Rust in practice".into(),
            article_url: Some(ARTICLE.into()),
        },
    );
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir));
    AppContext::with_parts(
        Config::with_data_dir(dir),
        store,
        Arc::new(fetcher),
        Arc::new(resolver),
        Box::new(move |_key: &str| -> Arc<dyn Generator> { Arc::new(generator.clone()) }),
    )
    .unwrap()
}

fn pages() -> MockFetcher {
    MockFetcher::new()
        .with_page(ARTICLE, "article body")
        .with_page(THREAD, "thread body")
}

#[tokio::test]
async fn dual_run_persists_history_across_contexts() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockGenerator::new().with_synthesis(
        "# Async Rust\n\n## TOPIC FOLLOWS: Runtimes\n• According to the Article: tokio dominates\n\n## PROVENANCE\n- Article: Async Rust",
    );

    let ctx = context(dir.path(), generator.clone(), pages());
    ctx.set_credential("test-key").unwrap();

    let request = RunRequest::dual(
        ModelId::Pro,
        SourceInput::Url(ARTICLE.into()),
        SourceInput::Url(THREAD.into()),
    );
    let result = assert_ok!(ctx.run(&request).await);

    assert_eq!(ctx.orchestrator().snapshot().status, Status::Done);
    let synthesis = result.synthesis.clone().unwrap();
    let parsed = parse_synthesis(&synthesis);
    assert_eq!(parsed.topics.len(), 1);
    assert_eq!(
        parsed.provenance,
        vec![
            "- Article: Async Rust".to_string(),
            format!("- {}", ARTICLE),
            format!("- {}", THREAD),
        ]
    );
    assert_eq!(generator.synthesis_calls(), 1);

    // A fresh context over the same directory sees the stored key and entry
    let reopened = context(dir.path(), MockGenerator::new(), MockFetcher::new());
    assert!(reopened.has_credential());
    let entries = reopened.history().entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].results, result);
    assert_eq!(entries[0].hn_title.as_deref(), Some("Async Rust in practice"));
    assert_eq!(entries[0].model, ModelId::Pro);

    let doc = export_document(&entries[0]);
    assert!(doc.starts_with("App: Content Synthesizer\n"));
    assert!(doc.contains(&format!("HN Thread: {}\n", THREAD)));
    assert!(doc.contains("\n# Async Rust in practice\n"));
}

#[tokio::test]
async fn failed_run_leaves_history_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockGenerator::new().with_synthesis_failure("API error: model overloaded");
    let ctx = context(dir.path(), generator, pages());
    ctx.set_credential("test-key").unwrap();

    let err = ctx
        .run(&RunRequest::dual(
            ModelId::Flash,
            SourceInput::Url(ARTICLE.into()),
            SourceInput::Url(THREAD.into()),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "API error: model overloaded");
    let snap = ctx.orchestrator().snapshot();
    assert_eq!(snap.status, Status::Error);
    assert!(snap.result.is_empty());
    assert!(ctx.history().is_empty().await);
}

#[tokio::test]
async fn pinned_entries_survive_reload_in_display_order() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), MockGenerator::new(), MockFetcher::new());
    ctx.set_credential("test-key").unwrap();

    for text in ["first", "second", "third"] {
        assert_ok!(
            ctx.run(&RunRequest::single(ModelId::Flash, SourceInput::Text(text.into())))
                .await
        );
    }
    let first = ctx.history().entries().await[2].clone();
    assert_ok!(ctx.history().toggle_pin(first.id).await);

    let reopened = context(dir.path(), MockGenerator::new(), MockFetcher::new());
    let order: Vec<String> = reopened
        .history()
        .display_order()
        .await
        .into_iter()
        .map(|e| e.results.summary1.unwrap_or_default())
        .collect();
    assert_eq!(
        order,
        vec![
            "• The overall main point is first",
            "• The overall main point is third",
            "• The overall main point is second",
        ]
    );
}

#[tokio::test]
async fn selected_skin_renders_stored_result() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), MockGenerator::new(), pages());
    ctx.set_credential("test-key").unwrap();
    ctx.preferences().set_skin(SkinId::Outline).unwrap();

    let result = assert_ok!(
        ctx.run(&RunRequest::dual(
            ModelId::Flash,
            SourceInput::Url(ARTICLE.into()),
            SourceInput::Text("pasted notes".into()),
        ))
        .await
    );

    let view = SkinView {
        result: &result,
        url1: Some(ARTICLE),
        url2: None,
        hn_title: None,
    };
    let out = ctx.skins().get(ctx.preferences().skin()).render(&view);
    assert!(out.contains("I. Topic\n   A. point"));
    assert!(out.contains(&format!("[1] {}", ARTICLE)));
}
