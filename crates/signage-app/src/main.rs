use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use signage_app::app::routes;
use signage_app::config::ConfigHandler;
use signage_app::display_handler::DisplayHandler;
use signage_app::escalation::spawn_reload_listener;
use signage_app::layout_config::{LoaderContext, build_layout, load_layout};
use signage_core::config::load_config;
use signage_core::types::ReloadRequest;
use signage_display::Display;
use tokio::sync::mpsc::unbounded_channel;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting signage display");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let display = Display::from_settings(&config);
    let (reload_tx, reload_rx) = unbounded_channel::<ReloadRequest>();

    let layout = load_layout(&config.display.layout_path)?;
    let loaders = LoaderContext::new(&display, &config)?.escalate_to(reload_tx);
    let tree = build_layout(&layout, &loaders)?;
    let placement = display.install(tree);

    tracing::info!(panels = ?placement.leaves, "Layout installed");

    let _listener = spawn_reload_listener(&display, reload_rx);
    let _periodic = display.spawn_periodic_reload(
        config.reload.interval(),
        config.reload.exclude.clone().into(),
    );

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(DisplayHandler {
            display: display.clone(),
        })
        .hoop(ConfigHandler::new(config.clone()))
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
