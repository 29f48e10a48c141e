use super::*;
use std::collections::{HashMap, VecDeque};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq)]
struct Row(i64);

impl Keyed for Row {
    type Key = i64;

    fn key(&self) -> i64 {
        self.0
    }
}

type PageResult = Result<Page<Row>, RemoteError>;

fn ok_page(ids: &[i64], pages: u32) -> PageResult {
    Ok(Page {
        items: ids.iter().copied().map(Row).collect(),
        pages,
    })
}

fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Answers each page number from a queue and records every query it saw.
#[derive(Default)]
struct ScriptedSource {
    responses: Mutex<HashMap<u32, VecDeque<PageResult>>>,
    calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl ScriptedSource {
    async fn respond(&self, page: u32, result: PageResult) {
        self.responses
            .lock()
            .await
            .entry(page)
            .or_default()
            .push_back(result);
    }

    async fn calls(&self) -> Vec<Vec<(String, String)>> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ListSource<Row> for ScriptedSource {
    async fn fetch_page(&self, query: &[(String, String)]) -> PageResult {
        self.calls.lock().await.push(query.to_vec());
        let page = query_value(query, "page")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);
        self.responses
            .lock()
            .await
            .get_mut(&page)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(RemoteError::Transport(format!("no response for page {page}"))))
    }
}

/// Parks every fetch until the test answers it, so completions can be
/// reordered.
struct GatedSource {
    calls: mpsc::UnboundedSender<(Vec<(String, String)>, oneshot::Sender<PageResult>)>,
}

#[async_trait]
impl ListSource<Row> for GatedSource {
    async fn fetch_page(&self, query: &[(String, String)]) -> PageResult {
        let (tx, rx) = oneshot::channel();
        self.calls
            .send((query.to_vec(), tx))
            .expect("test receiver alive");
        rx.await
            .unwrap_or_else(|_| Err(RemoteError::Transport("request dropped".into())))
    }
}

fn ids(items: &[Row]) -> Vec<i64> {
    items.iter().map(|r| r.0).collect()
}

#[tokio::test]
async fn loading_next_page_concatenates_both_pages() {
    let source = Arc::new(ScriptedSource::default());
    source.respond(1, ok_page(&[1, 2, 3], 3)).await;
    source.respond(2, ok_page(&[4, 5], 3)).await;
    let controller = PagedListController::<Row>::new("rows", source.clone(), 3);

    assert!(controller.mount().await.is_applied());
    let completion = controller.load_next_page().await.expect("a fetch ran");
    assert!(completion.is_applied());

    let snapshot = controller.snapshot().await;
    assert_eq!(ids(&snapshot.items), vec![1, 2, 3, 4, 5]);
    assert_eq!(snapshot.cursor, PageCursor { page: 2, total_pages: 3 });
    assert!(!snapshot.loading && !snapshot.loading_more);
}

#[tokio::test]
async fn search_scenario_pages_through_filtered_results() {
    let source = Arc::new(ScriptedSource::default());
    source.respond(1, ok_page(&[1, 2], 2)).await;
    source.respond(2, ok_page(&[3], 2)).await;
    let controller = PagedListController::<Row>::new("users", source.clone(), 2);

    controller
        .set_filter(FilterCriteria::new().with("search", "ali"))
        .await;
    controller.load_next_page().await.expect("page 2 fetched");
    assert!(controller.load_next_page().await.is_none());

    assert_eq!(ids(&controller.items().await), vec![1, 2, 3]);
    let calls = source.calls().await;
    assert_eq!(calls.len(), 2);
    for (call, page) in calls.iter().zip(["1", "2"]) {
        assert_eq!(query_value(call, "page"), Some(page));
        assert_eq!(query_value(call, "limit"), Some("2"));
        assert_eq!(query_value(call, "search"), Some("ali"));
    }
}

#[tokio::test]
async fn next_page_is_noop_when_on_last_page() {
    let source = Arc::new(ScriptedSource::default());
    source.respond(1, ok_page(&[1], 1)).await;
    let controller = PagedListController::<Row>::new("rows", source.clone(), 10);

    controller.mount().await;
    assert!(controller.load_next_page().await.is_none());
    assert_eq!(source.calls().await.len(), 1);
}

#[tokio::test]
async fn failed_fetch_keeps_displayed_items() {
    let source = Arc::new(ScriptedSource::default());
    source.respond(1, ok_page(&[1, 2], 2)).await;
    source
        .respond(
            1,
            Err(RemoteError::Status {
                status: 503,
                message: None,
            }),
        )
        .await;
    let controller = PagedListController::<Row>::new("rows", source.clone(), 2);

    controller.mount().await;
    let completion = controller.refresh().await;
    assert!(matches!(completion, Completion::Failed(_)));

    let snapshot = controller.snapshot().await;
    assert_eq!(ids(&snapshot.items), vec![1, 2]);
    assert!(!snapshot.loading && !snapshot.loading_more);
}

#[tokio::test]
async fn scrolling_after_failed_filter_change_does_not_mix_results() {
    let source = Arc::new(ScriptedSource::default());
    source.respond(1, ok_page(&[1, 2], 3)).await;
    source
        .respond(1, Err(RemoteError::Transport("timeout".into())))
        .await;
    source.respond(2, ok_page(&[90], 3)).await;
    let controller = PagedListController::<Row>::new("rows", source.clone(), 2);

    controller.mount().await;
    let completion = controller.set_filter_field("search", "zz").await;
    assert!(matches!(completion, Completion::Failed(_)));

    assert!(controller.handle(ListEvent::ScrolledNearEnd).await.is_none());
    let snapshot = controller.snapshot().await;
    assert_eq!(ids(&snapshot.items), vec![1, 2]);
    assert_eq!(source.calls().await.len(), 2);
}

#[tokio::test]
async fn filter_change_replaces_collection() {
    let source = Arc::new(ScriptedSource::default());
    source.respond(1, ok_page(&[1, 2], 2)).await;
    source.respond(2, ok_page(&[3, 4], 2)).await;
    source.respond(1, ok_page(&[7], 1)).await;
    let controller = PagedListController::<Row>::new("rows", source.clone(), 2);

    controller.mount().await;
    controller.load_next_page().await;
    controller.set_filter_field("status", "sold").await;

    let snapshot = controller.snapshot().await;
    assert_eq!(ids(&snapshot.items), vec![7]);
    assert_eq!(snapshot.cursor.page, 1);
    assert_eq!(snapshot.filter.get("status"), Some("sold"));
    let last_call = source.calls().await.pop().expect("calls");
    assert_eq!(query_value(&last_call, "page"), Some("1"));
}

#[tokio::test]
async fn events_map_onto_operations() {
    let source = Arc::new(ScriptedSource::default());
    source.respond(1, ok_page(&[1], 2)).await;
    source.respond(2, ok_page(&[2], 2)).await;
    source.respond(1, ok_page(&[1], 2)).await;
    let controller = PagedListController::<Row>::new("rows", source.clone(), 1);

    assert!(controller.handle(ListEvent::Mounted).await.is_some());
    assert!(controller.handle(ListEvent::ScrolledNearEnd).await.is_some());
    assert!(controller.handle(ListEvent::ScrolledNearEnd).await.is_none());
    assert_eq!(ids(&controller.items().await), vec![1, 2]);

    controller.handle(ListEvent::PulledToRefresh).await;
    assert_eq!(ids(&controller.items().await), vec![1]);
    assert_eq!(source.calls().await.len(), 3);
}

#[tokio::test]
async fn slow_response_for_old_filter_is_discarded() {
    let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
    let controller = Arc::new(PagedListController::<Row>::new(
        "users",
        Arc::new(GatedSource { calls: calls_tx }),
        10,
    ));

    let old = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move {
            controller
                .set_filter(FilterCriteria::new().with("search", "a"))
                .await
        }
    });
    let (old_query, old_reply) = calls_rx.recv().await.expect("first fetch");
    assert_eq!(query_value(&old_query, "search"), Some("a"));

    let new = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move {
            controller
                .set_filter(FilterCriteria::new().with("search", "ali"))
                .await
        }
    });
    let (new_query, new_reply) = calls_rx.recv().await.expect("second fetch");
    assert_eq!(query_value(&new_query, "search"), Some("ali"));

    new_reply.send(ok_page(&[10, 11], 1)).expect("reply new");
    assert!(new.await.expect("join new").is_applied());

    old_reply.send(ok_page(&[1, 2, 3], 4)).expect("reply old");
    assert_eq!(old.await.expect("join old"), Completion::Stale);

    let snapshot = controller.snapshot().await;
    assert_eq!(ids(&snapshot.items), vec![10, 11]);
    assert_eq!(snapshot.cursor.total_pages, 1);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn next_page_is_skipped_while_refresh_is_outstanding() {
    let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
    let controller = Arc::new(PagedListController::<Row>::new(
        "deals",
        Arc::new(GatedSource { calls: calls_tx }),
        5,
    ));

    let mount = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.mount().await }
    });
    let (_, first_reply) = calls_rx.recv().await.expect("mount fetch");
    first_reply.send(ok_page(&[1], 3)).expect("reply mount");
    mount.await.expect("join mount");

    let refresh = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.refresh().await }
    });
    let (_, refresh_reply) = calls_rx.recv().await.expect("refresh fetch");
    assert!(controller.snapshot().await.loading);
    assert!(controller.load_next_page().await.is_none());

    refresh_reply.send(ok_page(&[1], 3)).expect("reply refresh");
    assert!(refresh.await.expect("join refresh").is_applied());
    assert!(calls_rx.try_recv().is_err());
}
