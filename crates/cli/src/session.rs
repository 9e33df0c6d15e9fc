//! A player session: both panels wired to one signal bus
//!
//! The session owns every receiver the panels produce and routes each
//! message back to the panel that handles it. All handling happens on the
//! task that drives the session, one message at a time.

use crate::commands::{Command, HELP};
use crate::view;
use anyhow::{anyhow, Context, Result};
use bookdeck_catalog::{CatalogPanel, DurationProbe, ProbeOutcome, ProbeReceiver};
use bookdeck_config::Config;
use bookdeck_core::{
    log_diagnostics, BookId, Catalog, ChapterId, DiagnosticHook, Origin, Signal, SignalBus,
};
use bookdeck_playback::{
    format_rate, NowPlaying, PlaybackPanel, ReportReceiver, StartOutcome, StartReceiver,
    Transport, TransportReport,
};
use std::sync::Arc;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::sync::watch;

/// Consecutive empty polls after which `settle` considers the session quiet
const SETTLE_IDLE_ROUNDS: usize = 4;

/// A message waiting to be handled by one of the panels
#[derive(Debug)]
pub enum Event {
    /// A bus signal as seen by the `observer` panel
    Signal { observer: Origin, signal: Signal },
    /// The playback panel published a new snapshot
    NowPlaying(NowPlaying),
    Report(TransportReport),
    Start(StartOutcome),
    Probe(ProbeOutcome),
}

/// What the caller should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Done,
    Text(String),
    Quit,
}

enum Woke {
    Event(Event),
    NowPlaying,
    Closed,
}

pub struct Session {
    bus: SignalBus,
    playback: PlaybackPanel,
    catalog: CatalogPanel,
    playback_signals: broadcast::Receiver<Signal>,
    catalog_signals: broadcast::Receiver<Signal>,
    now_playing: watch::Receiver<NowPlaying>,
    reports: ReportReceiver,
    starts: StartReceiver,
    probes: ProbeReceiver,
    followed: (BookId, ChapterId),
}

impl Session {
    /// Builds a session on the first book of `catalog`
    ///
    /// Must be called from within a tokio runtime; duration probes for the
    /// first book start immediately.
    pub fn new(
        catalog: Arc<Catalog>,
        config: &Config,
        transport: Box<dyn Transport>,
        reports: ReportReceiver,
        probe: Arc<dyn DurationProbe>,
    ) -> Result<Self> {
        Self::with_diagnostics(catalog, config, transport, reports, probe, log_diagnostics())
    }

    /// Like `new`, sending both panels' diagnostics to `hook`
    pub fn with_diagnostics(
        catalog: Arc<Catalog>,
        config: &Config,
        transport: Box<dyn Transport>,
        reports: ReportReceiver,
        probe: Arc<dyn DurationProbe>,
        hook: DiagnosticHook,
    ) -> Result<Self> {
        let bus = SignalBus::default();
        let playback_signals = bus.subscribe();
        let catalog_signals = bus.subscribe();

        let book = catalog
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Catalog has no books"))?;

        let (playback, starts) =
            PlaybackPanel::new(bus.clone(), transport, book, &config.player)
                .context("Failed to create playback panel")?;
        let playback = playback.with_diagnostics(Arc::clone(&hook));

        let (catalog, probes) = CatalogPanel::new(bus.clone(), catalog, probe, &config.catalog)
            .context("Failed to create catalog panel")?;
        let mut catalog = catalog.with_diagnostics(hook);
        catalog.refresh_durations();

        let now_playing = playback.subscribe();
        let followed = {
            let state = playback.state();
            (state.book.id.clone(), state.chapter.id.clone())
        };

        Ok(Self {
            bus,
            playback,
            catalog,
            playback_signals,
            catalog_signals,
            now_playing,
            reports,
            starts,
            probes,
            followed,
        })
    }

    pub fn playback(&self) -> &PlaybackPanel {
        &self.playback
    }

    pub fn catalog(&self) -> &CatalogPanel {
        &self.catalog
    }

    pub fn now_playing(&self) -> &NowPlaying {
        self.playback.state()
    }

    /// Returns the bus both panels publish on
    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    /// Takes the next queued message without waiting
    ///
    /// Signals go first so a selection is applied before reports that may
    /// already belong to the next chapter.
    pub fn try_next_event(&mut self) -> Option<Event> {
        if let Some(signal) = try_signal(&mut self.playback_signals) {
            return Some(Event::Signal {
                observer: Origin::Playback,
                signal,
            });
        }
        if let Some(signal) = try_signal(&mut self.catalog_signals) {
            return Some(Event::Signal {
                observer: Origin::Catalog,
                signal,
            });
        }
        if self.now_playing.has_changed().unwrap_or(false) {
            return Some(Event::NowPlaying(self.now_playing.borrow_and_update().clone()));
        }
        if let Ok(report) = self.reports.try_recv() {
            return Some(Event::Report(report));
        }
        if let Ok(outcome) = self.starts.try_recv() {
            return Some(Event::Start(outcome));
        }
        if let Ok(outcome) = self.probes.try_recv() {
            return Some(Event::Probe(outcome));
        }
        None
    }

    /// Waits for the next message; `None` once every source has closed
    pub async fn next_event(&mut self) -> Option<Event> {
        if let Some(event) = self.try_next_event() {
            return Some(event);
        }

        let woke = tokio::select! {
            Some(signal) = recv_signal(&mut self.playback_signals) => Woke::Event(Event::Signal {
                observer: Origin::Playback,
                signal,
            }),
            Some(signal) = recv_signal(&mut self.catalog_signals) => Woke::Event(Event::Signal {
                observer: Origin::Catalog,
                signal,
            }),
            Ok(()) = self.now_playing.changed() => Woke::NowPlaying,
            Some(report) = self.reports.recv() => Woke::Event(Event::Report(report)),
            Some(outcome) = self.starts.recv() => Woke::Event(Event::Start(outcome)),
            Some(outcome) = self.probes.recv() => Woke::Event(Event::Probe(outcome)),
            else => Woke::Closed,
        };

        match woke {
            Woke::Event(event) => Some(event),
            Woke::NowPlaying => Some(Event::NowPlaying(self.now_playing.borrow_and_update().clone())),
            Woke::Closed => None,
        }
    }

    /// Hands a message to the panel that owns it
    pub fn dispatch(&mut self, event: Event) {
        match event {
            Event::Signal {
                observer: Origin::Playback,
                signal,
            } => self.playback.handle_signal(&signal),
            Event::Signal {
                observer: Origin::Catalog,
                signal,
            } => self.catalog.handle_signal(&signal),
            Event::NowPlaying(state) => self.follow(&state),
            Event::Report(report) => self.playback.handle_report(report),
            Event::Start(outcome) => self.playback.handle_start_outcome(outcome),
            Event::Probe(outcome) => self.catalog.handle_probe_outcome(outcome),
        }
    }

    /// Handles queued messages until nothing new arrives
    ///
    /// Yields between empty polls so spawned start and probe tasks can
    /// deliver. Tasks that never finish are not waited for.
    pub async fn settle(&mut self) {
        let mut idle = 0;
        while idle < SETTLE_IDLE_ROUNDS {
            match self.try_next_event() {
                Some(event) => {
                    self.dispatch(event);
                    idle = 0;
                }
                None => {
                    idle += 1;
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    /// Runs one user command against the panels
    pub fn apply(&mut self, command: Command) -> Result<Reply> {
        log::debug!("Command: {:?}", command);

        let reply = match command {
            Command::Play => {
                self.playback.play();
                Reply::Done
            }
            Command::Pause => {
                self.playback.pause();
                Reply::Done
            }
            Command::Toggle => {
                self.playback.toggle_play();
                Reply::Done
            }
            Command::Next => {
                self.playback.next();
                Reply::Done
            }
            Command::Previous => {
                self.playback.previous();
                Reply::Done
            }
            Command::Seek(seconds) => {
                self.playback.seek(seconds);
                Reply::Done
            }
            Command::Rate => {
                let rate = self.playback.cycle_rate();
                Reply::Text(format!("Rate {}", format_rate(rate)))
            }
            Command::Mute => {
                let muted = self.playback.toggle_mute();
                Reply::Text(if muted { "Muted" } else { "Unmuted" }.to_string())
            }
            Command::Volume(level) => {
                self.playback
                    .set_volume(level)
                    .context("Failed to set volume")?;
                Reply::Done
            }
            Command::Immersive => {
                let on = self.playback.toggle_immersive();
                Reply::Text(format!("Immersive mode {}", if on { "on" } else { "off" }))
            }
            Command::Book(id) => {
                self.catalog.select_book(&id)?;
                Reply::Done
            }
            Command::Chapter(id) => {
                self.catalog.select_chapter(&id)?;
                Reply::Done
            }
            Command::ChapterNumber(number) => {
                let book = Arc::clone(self.catalog.highlighted_book());
                let chapter = book.chapter_by_number(number).ok_or_else(|| {
                    anyhow!("Book {} has no chapter {}", book.id, number)
                })?;
                self.catalog.select_chapter(&chapter.id)?;
                Reply::Done
            }
            Command::Collapse => {
                let collapsed = self.catalog.toggle_collapsed();
                Reply::Text(if collapsed { "Collapsed" } else { "Expanded" }.to_string())
            }
            Command::Chapters => Reply::Text(view::chapter_list(&self.catalog)),
            Command::Status => Reply::Text(view::status_line(self.playback.state())),
            Command::Help => Reply::Text(HELP.to_string()),
            Command::Quit => Reply::Quit,
        };

        Ok(reply)
    }

    /// Moves the catalog highlight when the playing chapter changes
    fn follow(&mut self, state: &NowPlaying) {
        if state.book.id == self.followed.0 && state.chapter.id == self.followed.1 {
            return;
        }

        self.followed = (state.book.id.clone(), state.chapter.id.clone());
        self.catalog.follow(&state.book, &state.chapter.id);
    }
}

/// Waits for the next signal, skipping past any the receiver lagged behind on
///
/// `None` once the bus is closed.
async fn recv_signal(receiver: &mut broadcast::Receiver<Signal>) -> Option<Signal> {
    loop {
        match receiver.recv().await {
            Ok(signal) => return Some(signal),
            Err(RecvError::Lagged(missed)) => {
                log::warn!("Missed {} signals", missed);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

fn try_signal(receiver: &mut broadcast::Receiver<Signal>) -> Option<Signal> {
    loop {
        match receiver.try_recv() {
            Ok(signal) => return Some(signal),
            Err(TryRecvError::Lagged(missed)) => {
                log::warn!("Missed {} signals", missed);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_selected(catalog: &Catalog, id: &str) -> Signal {
        Signal::BookSelected {
            origin: Origin::Catalog,
            book: Arc::clone(catalog.book(&BookId::from(id)).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_recv_signal_recovers_from_lag() {
        let catalog = Catalog::sample();
        let (tx, mut rx) = broadcast::channel(2);
        for id in ["1", "2", "3", "4", "5"] {
            tx.send(book_selected(&catalog, id)).unwrap();
        }

        let Some(Signal::BookSelected { book, .. }) = recv_signal(&mut rx).await else {
            panic!("a lagged receiver should still yield the oldest kept signal");
        };
        assert_eq!(book.id.as_str(), "4");

        drop(tx);
        assert!(recv_signal(&mut rx).await.is_some());
        assert!(recv_signal(&mut rx).await.is_none());
    }

    #[test]
    fn test_try_signal_recovers_from_lag() {
        let catalog = Catalog::sample();
        let (tx, mut rx) = broadcast::channel(2);
        for id in ["1", "2", "3"] {
            tx.send(book_selected(&catalog, id)).unwrap();
        }

        assert!(try_signal(&mut rx).is_some());
        assert!(try_signal(&mut rx).is_some());
        assert!(try_signal(&mut rx).is_none());
    }
}
