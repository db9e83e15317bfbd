use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use signage_core::types::Orientation;
use signage_display::{
    Display, Exclusions, LayoutNode, LayoutTree, Metrics, Selector, TickerOptions, VideoOptions,
    Viewport,
};
use signage_format::Event;

fn display() -> Arc<Display> {
    Display::new(
        Viewport {
            width: 1280.0,
            height: 720.0,
        },
        Metrics::default(),
        TickerOptions {
            period: Duration::from_millis(1000),
            fade: Duration::from_millis(100),
        },
    )
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2011, 12, 5).expect("valid date")
}

/// Layout with a video panel and a menu panel whose loader counts its runs.
fn layout(display: &Arc<Display>, menu_loads: &Arc<AtomicUsize>, with_video: bool) -> LayoutTree {
    let presenter = display.presenter().clone();
    let counter = Arc::clone(menu_loads);
    let menu = LayoutNode::leaf("menu", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let events = vec![
            Event::titled("Breakfast").description("Eggs").build_on(day()),
            Event::titled("Lunch").description("Soup").build_on(day()),
        ];
        presenter.write_table(&events, &Selector::content_of("menu"), Some("t()|-|d()"));
    })
    .with_title("Menu");

    let mut panels = Vec::new();
    if with_video {
        let video = display.video().clone();
        panels.push(
            LayoutNode::leaf("video", move || {
                video.play_videos(VideoOptions {
                    path: "videos/".to_string(),
                    list: vec!["a.m4v".to_string(), "b.m4v".to_string()],
                    panel: "video".to_string(),
                });
            })
            .with_size(60.0),
        );
    }
    panels.push(menu);

    LayoutTree::new(
        LayoutNode::branch("main", Some(Orientation::Horizontal), panels).with_parent("screen"),
    )
    .expect("valid layout")
}

#[test_log::test(tokio::test(start_paused = true))]
async fn install_builds_and_loads_every_panel() {
    let display = display();
    let loads = Arc::new(AtomicUsize::new(0));
    let placement = display.install(layout(&display, &loads, true));

    assert_eq!(placement.leaves, ["video", "menu"]);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(display.video().is_mounted());

    let html = display.render_document(0);
    assert!(html.contains("<video id='videoPlayer'"));
    assert!(html.contains("<h1>Menu</h1>"));
    assert!(html.contains("<td>Breakfast</td><td>-</td><td>Eggs</td>"));
}

#[test_log::test(tokio::test(start_paused = true))]
async fn data_reload_waits_for_the_clip_to_end() {
    let display = display();
    let loads = Arc::new(AtomicUsize::new(0));
    display.install(layout(&display, &loads, true));

    display.queue_data_reload(Exclusions::from("video"));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(display.video().pending(), 1);

    let next = display.video().next_video();
    assert_eq!(next.as_deref(), Some("videos/b.m4v"));
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn data_reload_without_video_runs_at_once() {
    let display = display();
    let loads = Arc::new(AtomicUsize::new(0));
    display.install(layout(&display, &loads, false));

    display.queue_data_reload(Exclusions::none());
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn periodic_reload_queues_each_interval() {
    let display = display();
    let loads = Arc::new(AtomicUsize::new(0));
    display.install(layout(&display, &loads, false));

    let task = display.spawn_periodic_reload(Duration::from_secs(60), Exclusions::none());
    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(loads.load(Ordering::SeqCst), 3);
    task.abort();
}

#[test_log::test(tokio::test(start_paused = true))]
async fn unanswered_clip_end_still_reloads_and_never_piles_up() {
    let display = display();
    let loads = Arc::new(AtomicUsize::new(0));
    display.install(layout(&display, &loads, true));

    let task = display.spawn_periodic_reload(Duration::from_secs(900), Exclusions::from("video"));
    tokio::time::sleep(Duration::from_secs(10 * 900 + 1)).await;

    // Every second tick finds the previous reload still waiting and runs it.
    assert_eq!(loads.load(Ordering::SeqCst), 6);
    assert_eq!(display.video().pending(), 0);

    display.request_refresh("calendar failed");
    display.request_refresh("calendar failed");
    assert_eq!(display.video().pending(), 1);
    task.abort();
}

#[test_log::test(tokio::test(start_paused = true))]
async fn repeated_data_reloads_wait_as_one() {
    let display = display();
    let loads = Arc::new(AtomicUsize::new(0));
    display.install(layout(&display, &loads, true));

    for _ in 0..10 {
        display.queue_data_reload(Exclusions::from("video"));
    }
    assert_eq!(display.video().pending(), 1);

    display.video().next_video();
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn served_page_reports_clip_end_when_a_video_plays() {
    let loads = Arc::new(AtomicUsize::new(0));
    let plain = display();
    plain.install(layout(&plain, &loads, false));
    assert!(!plain.render_document(0).contains("<script>"));

    let display = display();
    display.install(layout(&display, &loads, true));
    assert!(
        display
            .render_document(0)
            .contains("fetch('/api/display/video/ended'")
    );
}

#[test_log::test(tokio::test(start_paused = true))]
async fn refresh_rebuilds_after_the_clip_and_stops_old_tickers() {
    let display = display();
    let loads = Arc::new(AtomicUsize::new(0));
    display.install(layout(&display, &loads, true));

    let events = vec![
        Event::titled("One").build_on(day()),
        Event::titled("Two").build_on(day()),
    ];
    let ticker = display
        .presenter()
        .write_ticker(&events, &Selector::content_of("menu"), None)
        .expect("ticker");
    assert!(ticker.is_running());

    display.request_refresh("test");
    assert!(ticker.is_running());
    display.video().next_video();

    assert!(!ticker.is_running());
    assert!(display.tickers().is_empty());
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    assert_eq!(
        display.video().current_source().as_deref(),
        Some("videos/a.m4v")
    );
}

#[test_log::test(tokio::test(start_paused = true))]
async fn late_writes_after_reload_land_harmlessly() {
    let display = display();
    let loads = Arc::new(AtomicUsize::new(0));
    display.install(layout(&display, &loads, false));

    let stale = display.page().with(|page| page.element_by_id("menu"));
    display.reload();
    display.page().with(|page| {
        if let Some(node) = stale {
            page.set_html(node, "stale");
        }
    });
    assert!(!display.render_document(0).contains("stale"));
}
