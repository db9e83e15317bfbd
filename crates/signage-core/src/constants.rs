/// Literal rendered in place of an empty table or ticker.
pub const NO_EVENTS: &str = "No events";

/// Default rotation period of a ticker, in milliseconds.
pub const DEFAULT_TICKER_PERIOD_MS: u64 = 10_000;

/// Default duration of a ticker fade transition, in milliseconds.
pub const DEFAULT_TICKER_FADE_MS: u64 = 400;

/// Retries a calendar fetch is allowed after its first failed attempt.
pub const DEFAULT_FETCH_RETRIES: u32 = 3;

/// Request timeout for provider fetches, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Interval between partial data reloads, in seconds.
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 15 * 60;

/// Date pattern used for `s()`/`e()` when no format string is supplied.
pub const DEFAULT_TIME_PATTERN: &str = "h:mm";

/// Format string used when a presenter is given none.
pub const DEFAULT_FORMAT: &str = "s() - e() &mdash; t()";

/// Class given to the content area of every leaf panel.
pub const CONTENT_CLASS: &str = "content";

/// Element id of the `<video>` element written by the video player.
pub const VIDEO_ELEMENT_ID: &str = "videoPlayer";

/// Default selector of the video player's content area.
pub const VIDEO_CONTENT_SELECTOR: &str = "#video .content";

/// Route component constants for the HTTP surface
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const DISPLAY_ROUTE_COMPONENT: &str = "display";
pub const DISPLAY_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", DISPLAY_ROUTE_COMPONENT);

/// Route the page posts to when a clip ends, relative to the display routes.
pub const VIDEO_ENDED_COMPONENT: &str = "video/ended";
pub const VIDEO_ENDED_ROUTE: &str =
    const_str::concat!(DISPLAY_ROUTE_PREFIX, "/", VIDEO_ENDED_COMPONENT);

/// Script served with any page carrying a video player.
///
/// On every `ended` event it reports the clip end, then reloads the document
/// so the browser picks up the next clip along with whatever the deferred
/// work rewrote.
pub const CLIP_END_SCRIPT: &str = const_str::concat!(
    "(function () {",
    "var video = document.getElementById('",
    VIDEO_ELEMENT_ID,
    "');",
    "if (!video) { return; }",
    "video.addEventListener('ended', function () {",
    "fetch('",
    VIDEO_ENDED_ROUTE,
    "', { method: 'POST' })",
    ".catch(function () {})",
    ".then(function () { window.location.reload(); });",
    "});",
    "})();"
);
