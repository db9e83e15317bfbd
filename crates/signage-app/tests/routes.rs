use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use salvo::http::StatusCode;
use salvo::test::{ResponseExt, TestClient};
use salvo::{Router, Service};
use signage_app::app::routes;
use signage_app::config::ConfigHandler;
use signage_app::display_handler::DisplayHandler;
use signage_core::config::{
    DisplayConfig, LoggingConfig, ProvidersConfig, ReloadConfig, ServerConfig, Settings,
    TickerConfig,
};
use signage_core::constants::VIDEO_ENDED_ROUTE;
use signage_core::types::Orientation;
use signage_display::{Display, LayoutNode, LayoutTree, Selector, VideoOptions};

fn settings(refresh_secs: u32) -> Settings {
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5800,
            refresh_secs,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        display: DisplayConfig {
            width: 800.0,
            height: 600.0,
            heading_height: 40.0,
            font_size: 16.0,
            timezone: "Pacific/Honolulu".to_string(),
            layout_path: "layout.json".to_string(),
        },
        ticker: TickerConfig {
            period_ms: 1000,
            fade_ms: 100,
        },
        reload: ReloadConfig {
            interval_secs: 900,
            exclude: Vec::new(),
        },
        providers: ProvidersConfig {
            menu_url: "http://menu.invalid/get.php".to_string(),
            calendar_base_url: "http://calendar.invalid/v3".to_string(),
            calendar_api_key: None,
            movie_lookup_url: None,
            movie_lookup_key: None,
            timeout_secs: 1,
            max_retries: 0,
        },
    }
}

/// A display with a video panel and a notice panel that counts its loads.
fn display(settings: &Settings, loads: &Arc<AtomicUsize>) -> Arc<Display> {
    let display = Display::from_settings(settings);
    let video = display.video().clone();
    let presenter = display.presenter().clone();
    let counter = Arc::clone(loads);

    let tree = LayoutTree::new(
        LayoutNode::branch(
            "main",
            Some(Orientation::Horizontal),
            vec![
                LayoutNode::leaf("video", move || {
                    video.play_videos(VideoOptions {
                        path: "videos/".to_string(),
                        list: vec!["a.m4v".to_string(), "b.m4v".to_string()],
                        panel: "video".to_string(),
                    });
                }),
                LayoutNode::leaf("notice", move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    presenter.write_html(&Selector::content_of("notice"), "<p>Welcome</p>");
                })
                .with_title("Notice"),
            ],
        )
        .with_parent("screen"),
    )
    .expect("valid layout");
    display.install(tree);
    display
}

fn service(settings: Settings, display: Option<Arc<Display>>) -> Service {
    let mut router = Router::new();
    if let Some(display) = display {
        router = router.hoop(DisplayHandler { display });
    }
    Service::new(router.hoop(ConfigHandler::new(settings)).push(routes()))
}

#[test_log::test(tokio::test)]
async fn healthcheck_returns_ok() {
    let settings = settings(0);
    let loads = Arc::new(AtomicUsize::new(0));
    let service = service(settings.clone(), Some(display(&settings, &loads)));

    let mut res = TestClient::get("http://127.0.0.1:5800/api/app/healthcheck")
        .send(&service)
        .await;

    assert_eq!(res.status_code, Some(StatusCode::OK));
    assert_eq!(res.take_string().await.expect("body"), "OK");
}

#[test_log::test(tokio::test)]
async fn root_serves_the_rendered_page() {
    let settings = settings(300);
    let loads = Arc::new(AtomicUsize::new(0));
    let service = service(settings.clone(), Some(display(&settings, &loads)));

    let mut res = TestClient::get("http://127.0.0.1:5800/")
        .send(&service)
        .await;

    assert_eq!(res.status_code, Some(StatusCode::OK));
    let body = res.take_string().await.expect("body");
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains("http-equiv='refresh' content='300'"));
    assert!(body.contains("<h1>Notice</h1>"));
    assert!(body.contains("<p>Welcome</p>"));
    assert!(body.contains("<video id='videoPlayer'"));
}

#[test_log::test(tokio::test)]
async fn root_without_display_is_a_server_error() {
    let service = service(settings(0), None);

    let res = TestClient::get("http://127.0.0.1:5800/")
        .send(&service)
        .await;

    assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[test_log::test(tokio::test)]
async fn video_ended_advances_the_playlist_and_runs_deferred_work() {
    let settings = settings(0);
    let loads = Arc::new(AtomicUsize::new(0));
    let display = display(&settings, &loads);
    let service = service(settings, Some(Arc::clone(&display)));

    display.queue_data_reload("video".into());
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let mut res = TestClient::post("http://127.0.0.1:5800/api/display/video/ended")
        .send(&service)
        .await;

    assert_eq!(res.status_code, Some(StatusCode::OK));
    let body = res.take_string().await.expect("body");
    assert!(body.contains("videos/b.m4v"));
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test_log::test(tokio::test)]
async fn page_script_posts_to_the_clip_end_route() {
    let settings = settings(0);
    let loads = Arc::new(AtomicUsize::new(0));
    let display = display(&settings, &loads);
    let service = service(settings, Some(Arc::clone(&display)));
    display.queue_data_reload("video".into());
    display.queue_data_reload("video".into());

    let mut page = TestClient::get("http://127.0.0.1:5800/")
        .send(&service)
        .await;
    let body = page.take_string().await.expect("body");
    assert!(body.contains("addEventListener('ended'"));
    assert!(body.contains(&format!("fetch('{VIDEO_ENDED_ROUTE}'")));

    let res = TestClient::post(format!("http://127.0.0.1:5800{VIDEO_ENDED_ROUTE}"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    assert_eq!(display.video().pending(), 0);
}

#[test_log::test(tokio::test)]
async fn reload_rebuilds_the_display() {
    let settings = settings(0);
    let loads = Arc::new(AtomicUsize::new(0));
    let display = display(&settings, &loads);
    let service = service(settings, Some(Arc::clone(&display)));
    display.video().next_video();

    let mut res = TestClient::post("http://127.0.0.1:5800/api/display/reload")
        .send(&service)
        .await;

    assert_eq!(res.status_code, Some(StatusCode::OK));
    let body = res.take_string().await.expect("body");
    assert!(body.contains("\"video\""));
    assert!(body.contains("\"notice\""));
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    assert_eq!(
        display.video().current_source().as_deref(),
        Some("videos/a.m4v")
    );
}

#[test_log::test(tokio::test)]
async fn reload_without_layout_is_unavailable() {
    let settings = settings(0);
    let display = Display::from_settings(&settings);
    let service = service(settings, Some(display));

    let res = TestClient::post("http://127.0.0.1:5800/api/display/reload")
        .send(&service)
        .await;

    assert_eq!(res.status_code, Some(StatusCode::SERVICE_UNAVAILABLE));
}
