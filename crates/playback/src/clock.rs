//! Headless transport driven by a tokio clock
//!
//! Plays nothing. Elapsed time advances on an interval scaled by the rate,
//! the chapter's catalog length stands in for the media duration, and
//! `ended` is reported when the position reaches it. Sources starting with
//! `blocked:` refuse to start.

use crate::error::TransportError;
use crate::transport::{LoadId, ReportSender, Transport, TransportEvent, TransportReport};
use bookdeck_core::Chapter;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Interval between time updates
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

/// Source prefix that makes `start` fail
pub const BLOCKED_PREFIX: &str = "blocked:";

#[derive(Debug)]
enum ClockCommand {
    Load {
        source: String,
        length: f64,
        load: LoadId,
    },
    Start(oneshot::Sender<Result<(), TransportError>>),
    Pause,
    Seek(f64),
    SetVolume(f32),
    SetRate(f32),
}

/// Transport handle; the clock itself runs on a spawned task
pub struct ClockTransport {
    commands: mpsc::UnboundedSender<ClockCommand>,
    task: JoinHandle<()>,
}

impl ClockTransport {
    /// Spawns a clock reporting into `reports`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(reports: ReportSender) -> Self {
        Self::with_tick(reports, DEFAULT_TICK)
    }

    pub fn with_tick(reports: ReportSender, tick: Duration) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_clock(rx, reports, tick));
        Self { commands, task }
    }

    fn send(&self, command: ClockCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("Clock transport is no longer running");
        }
    }
}

impl Transport for ClockTransport {
    fn load(&mut self, chapter: &Chapter, load: LoadId) {
        self.send(ClockCommand::Load {
            source: chapter.audio_url.clone(),
            length: f64::from(chapter.length_in_seconds),
            load,
        });
    }

    fn start(&mut self) -> BoxFuture<'static, Result<(), TransportError>> {
        let (reply, rx) = oneshot::channel();
        self.send(ClockCommand::Start(reply));
        async move { rx.await.unwrap_or(Err(TransportError::Closed)) }.boxed()
    }

    fn pause(&mut self) {
        self.send(ClockCommand::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.send(ClockCommand::Seek(seconds));
    }

    fn set_volume(&mut self, level: f32) {
        self.send(ClockCommand::SetVolume(level));
    }

    fn set_rate(&mut self, rate: f32) {
        self.send(ClockCommand::SetRate(rate));
    }
}

impl Drop for ClockTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Clock {
    source: Option<String>,
    load: LoadId,
    position: f64,
    duration: f64,
    rate: f32,
    playing: bool,
}

impl Clock {
    fn new() -> Self {
        Self {
            source: None,
            load: LoadId::default(),
            position: 0.0,
            duration: 0.0,
            rate: 1.0,
            playing: false,
        }
    }

    /// Applies a command; returns true when the clock just started running
    fn apply(&mut self, command: ClockCommand, reports: &ReportSender) -> bool {
        match command {
            ClockCommand::Load {
                source,
                length,
                load,
            } => {
                self.source = Some(source);
                self.load = load;
                self.position = 0.0;
                self.duration = length;
                self.playing = false;
                self.report(reports, TransportEvent::MetadataLoaded { duration: length });
                false
            }
            ClockCommand::Start(reply) => {
                let result = match self.source.as_deref() {
                    None => Err(TransportError::NoSource),
                    Some(source) if source.starts_with(BLOCKED_PREFIX) => {
                        Err(TransportError::Blocked(source.to_string()))
                    }
                    Some(_) => Ok(()),
                };

                let started = result.is_ok() && !self.playing;
                if result.is_ok() {
                    self.playing = true;
                }
                let _ = reply.send(result);
                started
            }
            ClockCommand::Pause => {
                self.playing = false;
                false
            }
            ClockCommand::Seek(seconds) => {
                self.position = if self.duration > 0.0 {
                    seconds.clamp(0.0, self.duration)
                } else {
                    seconds.max(0.0)
                };
                self.report(reports, TransportEvent::TimeUpdate(self.position));
                false
            }
            ClockCommand::SetVolume(level) => {
                log::trace!("Clock volume {}", level);
                false
            }
            ClockCommand::SetRate(rate) => {
                self.rate = rate;
                false
            }
        }
    }

    fn advance(&mut self, elapsed: Duration, reports: &ReportSender) {
        self.position += elapsed.as_secs_f64() * f64::from(self.rate);

        if self.duration > 0.0 && self.position >= self.duration {
            self.position = self.duration;
            self.playing = false;
            self.report(reports, TransportEvent::TimeUpdate(self.position));
            self.report(reports, TransportEvent::Ended);
        } else {
            self.report(reports, TransportEvent::TimeUpdate(self.position));
        }
    }

    fn report(&self, reports: &ReportSender, event: TransportEvent) {
        if reports.send(TransportReport::new(self.load, event)).is_err() {
            log::trace!("Report dropped: no receiver");
        }
    }
}

async fn run_clock(
    mut commands: mpsc::UnboundedReceiver<ClockCommand>,
    reports: ReportSender,
    tick: Duration,
) {
    let mut clock = Clock::new();
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => {
                    if clock.apply(command, &reports) {
                        ticker.reset();
                    }
                }
                None => break,
            },
            _ = ticker.tick(), if clock.playing => clock.advance(tick, &reports),
        }
    }

    log::debug!("Clock transport stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::report_channel;
    use bookdeck_core::ChapterId;

    fn chapter(url: &str, seconds: u32) -> Chapter {
        Chapter {
            id: ChapterId::new("t-chapter-1"),
            number: 1,
            title: "Chapter 1: The Beginning".to_string(),
            duration: "1 min".to_string(),
            audio_url: url.to_string(),
            cover_url: None,
            length_in_seconds: seconds,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_runs_to_end() {
        let (tx, mut rx) = report_channel();
        let mut clock = ClockTransport::with_tick(tx, Duration::from_secs(1));
        let load = LoadId::default().next();

        clock.load(&chapter("https://example.com/a.ogg", 3), load);
        let first = rx.recv().await.unwrap();
        assert_eq!(first.load, load);
        assert_eq!(first.event, TransportEvent::MetadataLoaded { duration: 3.0 });

        clock.start().await.unwrap();

        let mut events = Vec::new();
        while let Some(report) = rx.recv().await {
            let done = report.event == TransportEvent::Ended;
            events.push(report.event);
            if done {
                break;
            }
        }

        assert_eq!(
            events,
            vec![
                TransportEvent::TimeUpdate(1.0),
                TransportEvent::TimeUpdate(2.0),
                TransportEvent::TimeUpdate(3.0),
                TransportEvent::Ended,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_scales_progress() {
        let (tx, mut rx) = report_channel();
        let mut clock = ClockTransport::with_tick(tx, Duration::from_secs(1));

        clock.load(&chapter("https://example.com/a.ogg", 60), LoadId::default());
        let _metadata = rx.recv().await.unwrap();

        clock.set_rate(2.0);
        clock.start().await.unwrap();

        let report = rx.recv().await.unwrap();
        assert_eq!(report.event, TransportEvent::TimeUpdate(2.0));
    }

    #[tokio::test]
    async fn test_blocked_source_refuses_start() {
        let (tx, mut rx) = report_channel();
        let mut clock = ClockTransport::spawn(tx);

        clock.load(&chapter("blocked:autoplay", 60), LoadId::default());
        let _metadata = rx.recv().await.unwrap();

        let result = clock.start().await;
        assert!(matches!(result, Err(TransportError::Blocked(_))));
    }

    #[tokio::test]
    async fn test_start_without_source() {
        let (tx, _rx) = report_channel();
        let mut clock = ClockTransport::spawn(tx);
        assert_eq!(clock.start().await, Err(TransportError::NoSource));
    }

    #[tokio::test]
    async fn test_seek_is_clamped() {
        let (tx, mut rx) = report_channel();
        let mut clock = ClockTransport::spawn(tx);

        clock.load(&chapter("https://example.com/a.ogg", 30), LoadId::default());
        let _metadata = rx.recv().await.unwrap();

        clock.seek(45.0);
        assert_eq!(rx.recv().await.unwrap().event, TransportEvent::TimeUpdate(30.0));
    }
}
