//! Looping video playlist and the deferred-work queue tied to it.
//!
//! Work that would disturb playback (data reloads, full refreshes) is queued
//! here and run between clips.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use signage_core::constants::VIDEO_ELEMENT_ID;

use crate::page::{Selector, SharedPage, format_number};

/// Work run when the current clip ends.
pub type Deferred = Box<dyn FnOnce() + Send>;

/// Key of the full refresh queued by [`VideoPlayer::queue_refresh`].
pub const REFRESH_KEY: &str = "refresh";

/// What [`VideoPlayer::queue_refresh`] runs.
pub type RefreshHook = Arc<dyn Fn() + Send + Sync>;

/// Where the clips live and which to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOptions {
    /// Prefix, with trailing slash, every clip name is appended to.
    pub path: String,
    pub list: Vec<String>,
    /// Panel the player is mounted in.
    pub panel: String,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            path: "videos/".to_string(),
            list: vec!["1.webm".to_string(), "2.webm".to_string()],
            panel: "video".to_string(),
        }
    }
}

impl VideoOptions {
    fn source(&self, index: usize) -> Option<String> {
        self.list.get(index).map(|clip| format!("{}{clip}", self.path))
    }
}

struct Queued {
    /// Keyed work is queued at most once; queuing it again replaces it.
    key: Option<&'static str>,
    work: Deferred,
}

#[derive(Default)]
struct VideoState {
    options: Option<VideoOptions>,
    current: usize,
    queue: Vec<Queued>,
    refresh: Option<RefreshHook>,
    /// Bumped by every successful `play_videos`.
    mounts: u64,
}

/// The display's video player. Clones share the same player.
#[derive(Clone)]
pub struct VideoPlayer {
    page: SharedPage,
    state: Arc<Mutex<VideoState>>,
}

impl fmt::Debug for VideoPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("VideoPlayer")
            .field("options", &state.options)
            .field("current", &state.current)
            .field("queued", &state.queue.len())
            .finish_non_exhaustive()
    }
}

impl VideoPlayer {
    #[must_use]
    pub fn new(page: SharedPage) -> Self {
        Self {
            page,
            state: Arc::new(Mutex::new(VideoState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, VideoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets what [`VideoPlayer::queue_refresh`] queues.
    pub fn on_refresh(&self, hook: RefreshHook) {
        self.state().refresh = Some(hook);
    }

    /// ## Summary
    /// Mounts the player in the panel's content area and starts the first
    /// clip.
    ///
    /// The `<video>` element is capped at the panel's outer height minus the
    /// content area's vertical padding. Does nothing when the playlist is
    /// empty or the panel is not on the page.
    pub fn play_videos(&self, options: VideoOptions) {
        let Some(source) = options.source(0) else {
            tracing::warn!(panel = %options.panel, "Empty video playlist");
            return;
        };

        let mut state = self.state();
        let content = Selector::content_of(options.panel.as_str());
        let mounted = self.page.with(|page| {
            let panel = page.element_by_id(&options.panel)?;
            let container = page.select(&content)?;
            let max_height =
                (page.outer_height(panel) - page.padding(container).vertical()).max(0.0);

            page.clear(container);
            let video = page.create_child(container, "video")?;
            page.set_id(video, VIDEO_ELEMENT_ID);
            page.set_attr(video, "src", &source);
            page.set_attr(video, "autoplay", "");
            page.set_attr(video, "autobuffer", "");
            page.set_style(
                video,
                "max-height",
                &format!("{}px", format_number(max_height)),
            );
            Some(())
        });

        if mounted.is_none() {
            tracing::debug!(panel = %options.panel, "Video panel is gone");
            return;
        }
        tracing::info!(source = %source, clips = options.list.len(), "Playing videos");
        state.options = Some(options);
        state.current = 0;
        state.mounts += 1;
    }

    /// ## Summary
    /// Runs every queued function, then moves to the next clip.
    ///
    /// The queue is emptied before anything runs, so work queued by a
    /// deferred function waits for the following clip. The playlist wraps
    /// around. When the deferred work mounted a fresh player, that player's
    /// first clip stands. Returns the clip now playing, or `None` when no
    /// player is mounted.
    pub fn next_video(&self) -> Option<String> {
        let mounts = self.state().mounts;
        self.run_deferred();

        let source = {
            let mut state = self.state();
            let len = state.options.as_ref().map_or(0, |o| o.list.len());
            if len == 0 {
                return None;
            }
            if state.mounts != mounts {
                return state.options.as_ref()?.source(state.current);
            }
            state.current = (state.current + 1) % len;
            state.options.as_ref()?.source(state.current)?
        };

        self.page.with(|page| {
            if let Some(video) = page.element_by_id(VIDEO_ELEMENT_ID) {
                page.set_attr(video, "src", &source);
            }
        });
        tracing::debug!(source = %source, "Next video");
        Some(source)
    }

    /// ## Summary
    /// Runs every queued function without moving to the next clip.
    ///
    /// The queue is emptied before anything runs. Returns how many functions
    /// ran.
    pub fn run_deferred(&self) -> usize {
        let queued = std::mem::take(&mut self.state().queue);
        let count = queued.len();
        if count > 0 {
            tracing::debug!(count, "Running deferred work");
        }
        for queued in queued {
            (queued.work)();
        }
        count
    }

    /// Queues `work` to run when the current clip ends.
    pub fn queue_fn(&self, work: impl FnOnce() + Send + 'static) {
        self.state().queue.push(Queued {
            key: None,
            work: Box::new(work),
        });
    }

    /// ## Summary
    /// Queues `work` under `key` to run when the current clip ends.
    ///
    /// Work already queued under the same key is replaced in place, so
    /// repeated requests never pile up. Returns `false` when it replaced
    /// earlier work.
    pub fn queue_keyed(&self, key: &'static str, work: impl FnOnce() + Send + 'static) -> bool {
        let mut state = self.state();
        let work: Deferred = Box::new(work);
        if let Some(queued) = state.queue.iter_mut().find(|q| q.key == Some(key)) {
            queued.work = work;
            return false;
        }
        state.queue.push(Queued {
            key: Some(key),
            work,
        });
        true
    }

    /// Whether work is waiting under `key`.
    #[must_use]
    pub fn is_queued(&self, key: &str) -> bool {
        self.state().queue.iter().any(|q| q.key == Some(key))
    }

    /// Queues a full display reload for when the current clip ends.
    pub fn queue_refresh(&self) {
        let hook = self.state().refresh.clone();
        match hook {
            Some(hook) => {
                if !self.queue_keyed(REFRESH_KEY, move || hook()) {
                    tracing::debug!("Refresh already queued");
                }
            }
            None => tracing::warn!("No refresh hook installed, refresh dropped"),
        }
    }

    /// Whether a player is mounted on the page.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.current_source().is_some()
    }

    /// Source of the clip currently playing.
    #[must_use]
    pub fn current_source(&self) -> Option<String> {
        let state = self.state();
        let source = state.options.as_ref()?.source(state.current)?;
        drop(state);
        self.page
            .with(|page| page.element_by_id(VIDEO_ELEMENT_ID))
            .map(|_| source)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.state().current
    }

    /// Number of functions waiting for the current clip to end.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state().queue.len()
    }

    /// Forgets the mounted player. Queued work is kept.
    pub fn reset(&self) {
        let mut state = self.state();
        state.options = None;
        state.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::page::{Metrics, NodeId, Page, Viewport};

    fn setup() -> (SharedPage, VideoPlayer) {
        let mut page = Page::new(
            Viewport {
                width: 640.0,
                height: 480.0,
            },
            Metrics::default(),
        );
        let body = page.body();
        if let Some(panel) = page.create_child(body, "div") {
            page.set_id(panel, "video");
            page.set_height(panel, 400.0);
            if let Some(content) = page.create_child(panel, "div") {
                page.add_class(content, "content");
                page.set_style(content, "padding", "10px");
            }
        }
        let page = SharedPage::new(page);
        let player = VideoPlayer::new(page.clone());
        (page, player)
    }

    fn options() -> VideoOptions {
        VideoOptions {
            path: "http://host/videos/".to_string(),
            list: vec!["1.m4v".into(), "2.m4v".into(), "3.m4v".into()],
            panel: "video".to_string(),
        }
    }

    fn video_node(page: &SharedPage) -> Option<NodeId> {
        page.with(|page| page.element_by_id(VIDEO_ELEMENT_ID))
    }

    #[test_log::test]
    fn play_writes_video_element() {
        let (page, player) = setup();
        player.play_videos(options());

        let video = video_node(&page).expect("video mounted");
        page.with(|page| {
            assert_eq!(page.attr(video, "src"), Some("http://host/videos/1.m4v"));
            assert_eq!(page.attr(video, "autoplay"), Some(""));
            assert_eq!(page.style(video, "max-height"), Some("380px"));
            assert_eq!(page.tag(video), Some("video"));
        });
        assert!(player.is_mounted());
        assert_eq!(
            player.current_source().as_deref(),
            Some("http://host/videos/1.m4v")
        );
    }

    #[test_log::test]
    fn playlist_wraps_around() {
        let (page, player) = setup();
        player.play_videos(options());
        let sources: Vec<String> = (0..4).filter_map(|_| player.next_video()).collect();
        assert_eq!(
            sources,
            [
                "http://host/videos/2.m4v",
                "http://host/videos/3.m4v",
                "http://host/videos/1.m4v",
                "http://host/videos/2.m4v",
            ]
        );
        let video = video_node(&page).expect("video mounted");
        assert_eq!(
            page.with(|page| page.attr(video, "src").map(ToString::to_string)),
            Some("http://host/videos/2.m4v".to_string())
        );
    }

    #[test_log::test]
    fn next_video_drains_the_whole_queue() {
        let (_, player) = setup();
        player.play_videos(options());
        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let ran = Arc::clone(&ran);
            player.queue_fn(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(player.pending(), 5);

        player.next_video();
        assert_eq!(ran.load(Ordering::SeqCst), 5);
        assert_eq!(player.pending(), 0);
    }

    #[test_log::test]
    fn work_queued_while_draining_waits_for_next_clip() {
        let (_, player) = setup();
        player.play_videos(options());
        let ran = Arc::new(AtomicUsize::new(0));
        let requeue = player.clone();
        let counter = Arc::clone(&ran);
        player.queue_fn(move || {
            requeue.queue_fn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        player.next_video();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(player.pending(), 1);
        player.next_video();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test_log::test]
    fn queue_refresh_runs_the_hook_between_clips() {
        let (_, player) = setup();
        player.play_videos(options());
        let refreshed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshed);
        player.on_refresh(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        player.queue_refresh();
        assert_eq!(refreshed.load(Ordering::SeqCst), 0);
        player.next_video();
        assert_eq!(refreshed.load(Ordering::SeqCst), 1);
    }

    #[test_log::test]
    fn keyed_work_replaces_what_is_already_queued() {
        let (_, player) = setup();
        player.play_videos(options());
        let ran = Arc::new(Mutex::new(Vec::new()));
        for round in 0..10 {
            let ran = Arc::clone(&ran);
            player.queue_keyed("reload", move || {
                ran.lock().expect("lock").push(round);
            });
        }
        player.queue_fn(|| {});

        assert_eq!(player.pending(), 2);
        assert!(player.is_queued("reload"));
        player.next_video();
        assert_eq!(*ran.lock().expect("lock"), [9]);
        assert!(!player.is_queued("reload"));
    }

    #[test_log::test]
    fn repeated_refresh_requests_queue_once() {
        let (_, player) = setup();
        player.play_videos(options());
        let refreshed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshed);
        player.on_refresh(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        player.queue_refresh();
        player.queue_refresh();
        player.queue_refresh();
        assert_eq!(player.pending(), 1);
        player.next_video();
        assert_eq!(refreshed.load(Ordering::SeqCst), 1);
    }

    #[test_log::test]
    fn run_deferred_keeps_the_current_clip() {
        let (_, player) = setup();
        player.play_videos(options());
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        player.queue_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(player.run_deferred(), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(player.current_index(), 0);
        assert_eq!(player.pending(), 0);
    }

    #[test_log::test]
    fn missing_panel_or_empty_list_mounts_nothing() {
        let (page, player) = setup();
        player.play_videos(VideoOptions {
            list: Vec::new(),
            ..options()
        });
        assert!(!player.is_mounted());

        player.play_videos(VideoOptions {
            panel: "elsewhere".to_string(),
            ..options()
        });
        assert!(!player.is_mounted());
        assert!(video_node(&page).is_none());
        assert_eq!(player.next_video(), None);
    }

    #[test_log::test]
    fn reset_unmounts_but_keeps_queue() {
        let (page, player) = setup();
        player.play_videos(options());
        player.queue_fn(|| {});
        page.with(Page::reset);
        player.reset();
        assert!(!player.is_mounted());
        assert_eq!(player.pending(), 1);
    }

    #[test_log::test]
    fn remount_during_deferred_work_restarts_playlist() {
        let (_, player) = setup();
        player.play_videos(options());
        player.next_video();
        let remount = player.clone();
        player.queue_fn(move || remount.play_videos(options()));

        assert_eq!(
            player.next_video().as_deref(),
            Some("http://host/videos/1.m4v")
        );
        assert_eq!(player.current_index(), 0);
    }
}
