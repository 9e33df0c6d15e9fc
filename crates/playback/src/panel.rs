//! The playback panel
//!
//! Owns the transport and the authoritative "now playing" state. Selection
//! signals from other panels load and start a chapter; navigation inside the
//! panel (next, previous, end of track) is announced back on the bus.

use crate::error::{PlaybackError, PlaybackResult, TransportError};
use crate::rate::RateCycle;
use crate::state::NowPlaying;
use crate::transport::{LoadId, Transport, TransportEvent, TransportReport};
use bookdeck_config::PlayerConfig;
use bookdeck_core::{
    log_diagnostics, AppError, Book, Chapter, Diagnostic, DiagnosticHook, Origin, Signal,
    SignalBus,
};
use bookdeck_resilience::{Generation, KeyedTasks};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Result of one `Transport::start` call
#[derive(Debug)]
pub struct StartOutcome {
    pub load: LoadId,
    pub generation: Generation,
    pub result: Result<(), TransportError>,
}

pub type StartReceiver = mpsc::UnboundedReceiver<StartOutcome>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

pub struct PlaybackPanel {
    bus: SignalBus,
    transport: Box<dyn Transport>,
    state: NowPlaying,
    rates: RateCycle,
    load: LoadId,
    starts: KeyedTasks<LoadId>,
    start_tx: mpsc::UnboundedSender<StartOutcome>,
    now_playing: watch::Sender<NowPlaying>,
    diagnostics: DiagnosticHook,
}

impl PlaybackPanel {
    /// Creates a paused panel positioned on the first chapter of `book`
    ///
    /// Start results arrive on the returned receiver and must be fed back
    /// through `handle_start_outcome`.
    pub fn new(
        bus: SignalBus,
        transport: Box<dyn Transport>,
        book: Arc<Book>,
        config: &PlayerConfig,
    ) -> PlaybackResult<(Self, StartReceiver)> {
        let chapter = book
            .first_chapter()
            .cloned()
            .ok_or_else(|| PlaybackError::EmptyBook(book.id.to_string()))?;

        let volume = config.default_volume;
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }

        let rates = RateCycle::new(config.rates.clone())?;
        let rate = if rates.contains(config.default_rate) {
            config.default_rate
        } else {
            log::warn!(
                "Default rate {} is not in the rate cycle, using {}",
                config.default_rate,
                rates.first()
            );
            rates.first()
        };

        let state = NowPlaying::new(book, chapter, volume, rate);
        let (now_playing, _) = watch::channel(state.clone());
        let (start_tx, start_rx) = mpsc::unbounded_channel();

        let mut panel = Self {
            bus,
            transport,
            state,
            rates,
            load: LoadId::default(),
            starts: KeyedTasks::new(),
            start_tx,
            now_playing,
            diagnostics: log_diagnostics(),
        };
        panel.prepare_transport();

        Ok((panel, start_rx))
    }

    /// Replaces the hook that receives ignored-signal and stale-completion events
    pub fn with_diagnostics(mut self, hook: DiagnosticHook) -> Self {
        self.diagnostics = hook;
        self
    }

    pub fn state(&self) -> &NowPlaying {
        &self.state
    }

    /// Returns a receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<NowPlaying> {
        self.now_playing.subscribe()
    }

    pub fn current_load(&self) -> LoadId {
        self.load
    }

    /// Returns true while a start request has not resolved
    pub fn is_starting(&self) -> bool {
        !self.starts.is_empty()
    }

    /// Reacts to a signal from another panel
    pub fn handle_signal(&mut self, signal: &Signal) {
        if signal.origin() == Origin::Playback {
            return;
        }

        match signal {
            Signal::BookSelected { book, .. } => match book.first_chapter() {
                Some(chapter) => self.load_chapter(Arc::clone(book), chapter.clone()),
                None => log::warn!("Book {} has no chapters, ignoring selection", book.id),
            },
            Signal::ChapterSelected { selection, .. } => {
                let resolved = selection.resolve(Some(&self.state.book));
                match resolved {
                    Some((book, chapter)) => self.load_chapter(book, chapter),
                    None => (self.diagnostics)(&Diagnostic::unresolved(Origin::Playback, selection)),
                }
            }
        }
    }

    pub fn toggle_play(&mut self) {
        if self.state.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn play(&mut self) {
        if !self.state.playing {
            self.begin_start();
        }
    }

    pub fn pause(&mut self) {
        if !self.state.playing {
            return;
        }

        self.starts.cancel_all();
        self.transport.pause();
        self.state.playing = false;
        self.publish();
    }

    /// Moves the playhead, ignoring non-finite targets
    pub fn seek(&mut self, seconds: f64) {
        let Some(target) = self.state.clamp_seek(seconds) else {
            log::debug!("Ignoring seek to {}", seconds);
            return;
        };

        self.transport.seek(target);
        self.state.elapsed = target;
        self.publish();
    }

    pub fn next(&mut self) {
        self.step(Direction::Forward);
    }

    pub fn previous(&mut self) {
        self.step(Direction::Backward);
    }

    /// Steps to the next rate in the cycle and returns it
    pub fn cycle_rate(&mut self) -> f32 {
        let rate = self.rates.next_after(self.state.rate);
        self.state.rate = rate;
        self.transport.set_rate(rate);
        self.publish();
        rate
    }

    /// Flips the mute flag and returns the new value
    pub fn toggle_mute(&mut self) -> bool {
        self.state.muted = !self.state.muted;
        self.transport.set_volume(self.state.effective_volume());
        self.publish();
        self.state.muted
    }

    /// Stores a new volume level; the transport only hears it while unmuted
    pub fn set_volume(&mut self, level: f32) -> PlaybackResult<()> {
        if !level.is_finite() || !(0.0..=1.0).contains(&level) {
            return Err(PlaybackError::InvalidVolume(level));
        }

        self.state.volume = level;
        self.transport.set_volume(self.state.effective_volume());
        self.publish();
        Ok(())
    }

    /// Flips immersive mode and returns the new value
    pub fn toggle_immersive(&mut self) -> bool {
        self.state.immersive = !self.state.immersive;
        self.publish();
        self.state.immersive
    }

    /// Applies something the transport observed
    pub fn handle_report(&mut self, report: TransportReport) {
        if report.load != self.load {
            log::trace!(
                "Dropping {:?} from superseded {}",
                report.event,
                report.load
            );
            return;
        }

        match report.event {
            TransportEvent::TimeUpdate(seconds) => {
                if seconds.is_finite() {
                    self.state.elapsed = seconds.max(0.0);
                    self.publish();
                }
            }
            TransportEvent::MetadataLoaded { duration } => {
                self.state.duration = if duration.is_finite() && duration > 0.0 {
                    duration
                } else {
                    log::debug!(
                        "Unusable duration {} for chapter {}",
                        duration,
                        self.state.chapter.id
                    );
                    0.0
                };
                self.publish();
            }
            TransportEvent::Ended => {
                log::info!("Chapter {} ended", self.state.chapter.id);
                self.next();
            }
            TransportEvent::Error(reason) => {
                log::error!(
                    "Media error for chapter {}: {}",
                    self.state.chapter.id,
                    reason
                );
                self.starts.cancel_all();
                self.state.playing = false;
                self.publish();
            }
        }
    }

    /// Applies the result of a start request
    pub fn handle_start_outcome(&mut self, outcome: StartOutcome) {
        if outcome.load != self.load || !self.starts.complete(&outcome.load, outcome.generation) {
            (self.diagnostics)(&Diagnostic::StaleCompletion {
                observer: Origin::Playback,
                key: format!("start {}", outcome.load),
            });
            return;
        }

        match outcome.result {
            Ok(()) => log::debug!("Playback started for {}", self.state.chapter.id),
            Err(reason) => {
                let err = AppError::PlaybackStart {
                    chapter: self.state.chapter.id.to_string(),
                    reason: reason.to_string(),
                };
                log::error!("{} ({})", err, err.recovery_action());
                self.state.playing = false;
                self.publish();
            }
        }
    }

    fn step(&mut self, direction: Direction) {
        let book = Arc::clone(&self.state.book);
        let Some(index) = book.position_of(&self.state.chapter.id) else {
            log::warn!(
                "Chapter {} is not part of book {}",
                self.state.chapter.id,
                book.id
            );
            return;
        };

        let len = book.total_chapters();
        let target = match direction {
            Direction::Forward => (index + 1) % len,
            Direction::Backward => (index + len - 1) % len,
        };
        let chapter = book.chapters[target].clone();

        let label = match direction {
            Direction::Forward => "next",
            Direction::Backward => "previous",
        };
        log::info!("Playing {} chapter: {}", label, chapter.title);
        self.load_chapter(Arc::clone(&book), chapter.clone());
        self.bus.publish(Signal::chapter(Origin::Playback, book, chapter));
    }

    fn load_chapter(&mut self, book: Arc<Book>, chapter: Chapter) {
        log::debug!("Loading chapter {} of book {}", chapter.id, book.id);

        self.starts.cancel_all();
        self.load = self.load.next();

        self.state.book = book;
        self.state.chapter = chapter;
        self.state.elapsed = 0.0;
        self.state.duration = 0.0;
        self.state.immersive = false;

        self.prepare_transport();
        self.begin_start();
    }

    fn prepare_transport(&mut self) {
        self.transport.load(&self.state.chapter, self.load);
        self.transport.set_rate(self.state.rate);
        self.transport.set_volume(self.state.effective_volume());
    }

    fn begin_start(&mut self) {
        self.state.playing = true;

        let load = self.load;
        let generation = self.starts.next_generation();
        let start = self.transport.start();
        let tx = self.start_tx.clone();

        self.starts.spawn(load, async move {
            let result = start.await;
            let _ = tx.send(StartOutcome {
                load,
                generation,
                result,
            });
        });

        self.publish();
    }

    fn publish(&self) {
        self.now_playing.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdeck_core::{BookId, Catalog};
    use futures::future::BoxFuture;
    use futures::FutureExt;

    struct NullTransport;

    impl Transport for NullTransport {
        fn load(&mut self, _chapter: &Chapter, _load: LoadId) {}

        fn start(&mut self) -> BoxFuture<'static, Result<(), TransportError>> {
            futures::future::ready(Ok(())).boxed()
        }

        fn pause(&mut self) {}

        fn seek(&mut self, _seconds: f64) {}

        fn set_volume(&mut self, _level: f32) {}

        fn set_rate(&mut self, _rate: f32) {}
    }

    fn panel(book: &str) -> (PlaybackPanel, StartReceiver) {
        let catalog = Catalog::sample();
        let book = Arc::clone(catalog.book(&BookId::from(book)).unwrap());
        PlaybackPanel::new(
            SignalBus::default(),
            Box::new(NullTransport),
            book,
            &PlayerConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_initial_state_is_paused_on_first_chapter() {
        let (panel, _starts) = panel("3");
        assert!(!panel.state().playing);
        assert_eq!(panel.state().chapter.id.as_str(), "3-chapter-1");
        assert_eq!(panel.state().volume, 0.7);
        assert_eq!(panel.state().rate, 1.0);
        assert!(!panel.is_starting());
    }

    #[tokio::test]
    async fn test_previous_wraps_to_last() {
        let (mut panel, _starts) = panel("5");
        panel.previous();
        assert_eq!(panel.state().chapter.id.as_str(), "5-chapter-6");
        assert!(panel.state().playing);
    }

    #[tokio::test]
    async fn test_unknown_default_rate_falls_back() {
        let catalog = Catalog::sample();
        let config = PlayerConfig {
            default_rate: 1.1,
            ..Default::default()
        };
        let (panel, _starts) = PlaybackPanel::new(
            SignalBus::default(),
            Box::new(NullTransport),
            Arc::clone(&catalog.books()[0]),
            &config,
        )
        .unwrap();
        assert_eq!(panel.state().rate, 0.75);
    }

    #[tokio::test]
    async fn test_new_rejects_bad_volume() {
        let catalog = Catalog::sample();
        let config = PlayerConfig {
            default_volume: 1.5,
            ..Default::default()
        };
        let result = PlaybackPanel::new(
            SignalBus::default(),
            Box::new(NullTransport),
            Arc::clone(&catalog.books()[0]),
            &config,
        );
        assert!(matches!(result, Err(PlaybackError::InvalidVolume(_))));
    }

    #[tokio::test]
    async fn test_start_outcome_settles_start() {
        let (mut panel, mut starts) = panel("1");
        panel.play();
        assert!(panel.is_starting());

        let outcome = starts.recv().await.unwrap();
        panel.handle_start_outcome(outcome);
        assert!(!panel.is_starting());
        assert!(panel.state().playing);
    }
}
