//! Request ordering and state transitions of `DocumentLoader`.
//!
//! Fetches are held open with gates so the order in which loads finish is
//! controlled by the test rather than by the scheduler.

mod common;

use common::{GatedSource, id, registry};
use learngl_reader::{DocumentLoader, DocumentState};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_later_request_wins_when_earlier_finishes_last() {
    let source = Arc::new(GatedSource::new(&[("a", "# A"), ("b", "# B")]));
    let gate_a = source.gate("a");
    let loader = DocumentLoader::new(source.clone(), registry());

    let first = loader.load(id("a"));
    let second = loader.load(id("b"));

    second.await.unwrap();
    let html = loader.state().document().unwrap().render_html();
    assert_eq!(html, "<h1>B</h1>");

    gate_a.notify_one();
    first.await.unwrap();

    let snapshot = loader.snapshot();
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.id.unwrap().as_str(), "b");
    assert_eq!(
        snapshot.state.document().unwrap().render_html(),
        "<h1>B</h1>"
    );
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_stale_error_does_not_replace_ready() {
    let source = Arc::new(GatedSource::new(&[("b", "본문")]));
    let gate_missing = source.gate("missing");
    let loader = DocumentLoader::new(source.clone(), registry());

    let first = loader.load(id("missing"));
    loader.load(id("b")).await.unwrap();
    assert!(loader.state().document().is_some());

    gate_missing.notify_one();
    first.await.unwrap();
    assert!(loader.state().document().is_some());
    assert!(loader.state().error().is_none());
}

#[tokio::test]
async fn test_stale_result_does_not_replace_loading() {
    let source = Arc::new(GatedSource::new(&[("a", "# A"), ("b", "# B")]));
    let gate_b = source.gate("b");
    let loader = DocumentLoader::new(source.clone(), registry());

    let first = loader.load(id("a"));
    let _second = loader.load(id("b"));
    first.await.unwrap();

    assert!(loader.state().is_loading());

    gate_b.notify_one();
    let state = loader.settled().await;
    assert_eq!(state.document().unwrap().render_html(), "<h1>B</h1>");
}

#[tokio::test]
async fn test_new_request_resets_to_loading_synchronously() {
    let source = Arc::new(GatedSource::new(&[("a", "# A")]));
    let loader = DocumentLoader::new(source.clone(), registry());

    loader.load(id("missing")).await.unwrap();
    assert!(loader.state().error().is_some());

    let _gate = source.gate("a");
    let _pending = loader.load(id("a"));
    assert!(loader.state().is_loading());
    assert!(loader.state().error().is_none());
}

#[tokio::test]
async fn test_observer_sees_loading_then_ready() {
    let source = Arc::new(GatedSource::new(&[("a", "# A")]));
    let gate = source.gate("a");
    let loader = DocumentLoader::new(source.clone(), registry());
    let mut rx = loader.subscribe();

    let handle = loader.load(id("a"));
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().state.is_loading());

    gate.notify_one();
    rx.changed().await.unwrap();
    assert!(matches!(rx.borrow_and_update().state, DocumentState::Ready(_)));
    handle.await.unwrap();
}

#[tokio::test]
async fn test_compile_failure_is_isolated() {
    let source = Arc::new(GatedSource::new(&[
        ("bad", "# 제목\n\n<Unknown>\n내용\n</Unknown>"),
        ("good", "# 제목"),
    ]));
    let loader = DocumentLoader::new(source, registry());

    loader.load(id("bad")).await.unwrap();
    let state = loader.state();
    let message = state.error().unwrap();
    assert!(message.starts_with("MDX 파싱 오류: "));
    assert!(message.contains("Unknown"));
    assert!(state.document().is_none());

    loader.load(id("good")).await.unwrap();
    assert!(loader.state().document().is_some());
}

#[tokio::test]
async fn test_syntax_error_message() {
    let source = Arc::new(GatedSource::new(&[("fence", "```cpp\nint x;\n")]));
    let loader = DocumentLoader::new(source, registry());

    loader.load(id("fence")).await.unwrap();
    assert_eq!(
        loader.state().error(),
        Some("MDX 파싱 오류: line 1: unterminated code fence")
    );
}

#[tokio::test]
async fn test_hung_fetch_stays_loading_without_timeout() {
    let source = Arc::new(GatedSource::new(&[("a", "# A")]));
    let _gate = source.gate("a");
    let loader = DocumentLoader::new(source.clone(), registry());

    let _pending = loader.load(id("a"));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(loader.state().is_loading());
}

#[tokio::test]
async fn test_hung_fetch_times_out_when_configured() {
    let source = Arc::new(GatedSource::new(&[("a", "# A")]));
    let _gate = source.gate("a");
    let loader = DocumentLoader::new(source.clone(), registry())
        .with_fetch_timeout(Some(Duration::from_millis(20)));

    loader.load(id("a")).await.unwrap();
    assert_eq!(loader.state().error(), Some("문서를 불러올 수 없습니다."));
}

#[tokio::test]
async fn test_degenerate_markdown_settles() {
    let unclosed = "*a ".repeat(5000);
    let docs = [
        ("trailing", "# 제목\n\n- 항목\n- \n\n다음"),
        ("bare", "-"),
        ("unclosed", unclosed.as_str()),
    ];
    let source = Arc::new(GatedSource::new(&docs));
    let loader = DocumentLoader::new(source, registry());

    for (name, _) in docs {
        tokio::time::timeout(Duration::from_secs(10), loader.load(id(name)))
            .await
            .expect("load settles")
            .unwrap();
        let state = loader.state();
        assert!(state.is_settled(), "{name} ended as {}", state.label());
    }

    loader.load(id("trailing")).await.unwrap();
    let html = loader.state().document().unwrap().render_html();
    assert!(html.ends_with("<div class=\"paragraph\">다음</div>"), "{html}");
}
