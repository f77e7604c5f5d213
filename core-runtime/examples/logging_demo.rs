//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! cargo run -p core-runtime --example logging_demo            # default format
//! cargo run -p core-runtime --example logging_demo -- json
//! cargo run -p core-runtime --example logging_demo -- compact "core_playback=trace"
//! ```

use bridge_traits::time::{ConsoleLogger, LogLevel};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use std::env;
use std::sync::Arc;
use tracing::{debug, info, instrument, span, warn, Level};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_logger_sink(Arc::new(ConsoleLogger::default()));

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    if let Err(e) = init_logging(config) {
        eprintln!("logging init failed: {}", e);
        return;
    }

    info!(format = ?format, "Logging initialized");

    demo_playback_session().await;
    demo_redaction();
}

#[instrument]
async fn demo_playback_session() {
    let span = span!(Level::INFO, "play_track", track_id = "t1");
    let _enter = span.enter();

    info!(title = "Blue in Green", album_id = "a1", "Playback started");
    for position in [1.0_f64, 2.0, 3.0] {
        debug!(position_secs = position, "Position update");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    info!(seconds = 3, total_seconds = 13, "Playtime recorded");
    warn!(error = "HTTP 503", "Failed to persist playtime");
}

fn demo_redaction() {
    let token = "eyJhbGciOiJIUzI1NiJ9.secret";
    let email = "listener@example.com";
    let path = "/home/listener/covers/front.png";

    info!(
        access_token = %redact_if_sensitive("access_token", token),
        email = %redact_if_sensitive("email", email),
        file = %strip_path(path),
        "Uploading artist image"
    );
}
