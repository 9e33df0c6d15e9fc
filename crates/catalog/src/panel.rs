//! The catalog panel
//!
//! Shows the chapters of one highlighted book and measures their real
//! lengths in the background. Selections made here are announced on the
//! bus; selections announced by other panels move the highlight.

use crate::durations::DurationCache;
use crate::error::{CatalogError, CatalogResult, ProbeError};
use crate::probe::DurationProbe;
use bookdeck_config::CatalogConfig;
use bookdeck_core::{
    log_diagnostics, AppError, Book, BookId, Catalog, Chapter, ChapterId, ChapterSelection,
    Diagnostic, DiagnosticHook, Origin, Signal, SignalBus,
};
use bookdeck_resilience::{Generation, KeyedTasks, Timeout};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Result of one duration probe
#[derive(Debug)]
pub struct ProbeOutcome {
    pub chapter: ChapterId,
    pub source: String,
    pub generation: Generation,
    pub result: Result<f64, ProbeError>,
}

pub type ProbeReceiver = mpsc::UnboundedReceiver<ProbeOutcome>;

#[derive(Debug, Clone)]
struct SelectionState {
    book: Arc<Book>,
    chapter: ChapterId,
    collapsed: bool,
}

pub struct CatalogPanel {
    catalog: Arc<Catalog>,
    bus: SignalBus,
    selection: SelectionState,
    durations: DurationCache,
    probe: Arc<dyn DurationProbe>,
    probes: KeyedTasks<ChapterId>,
    limiter: Arc<Semaphore>,
    timeout: Timeout,
    probe_tx: mpsc::UnboundedSender<ProbeOutcome>,
    diagnostics: DiagnosticHook,
}

impl CatalogPanel {
    /// Creates a panel highlighting the first chapter of the first book
    ///
    /// No probe runs until `refresh_durations` is called from inside a tokio
    /// runtime. Probe results arrive on the returned receiver and must be fed
    /// back through `handle_probe_outcome`.
    pub fn new(
        bus: SignalBus,
        catalog: Arc<Catalog>,
        probe: Arc<dyn DurationProbe>,
        config: &CatalogConfig,
    ) -> CatalogResult<(Self, ProbeReceiver)> {
        let book = catalog.first().cloned().ok_or(CatalogError::EmptyCatalog)?;
        let chapter = book
            .first_chapter()
            .map(|c| c.id.clone())
            .ok_or_else(|| CatalogError::EmptyBook(book.id.to_string()))?;

        if config.max_concurrent_probes == 0 {
            return Err(CatalogError::InvalidConcurrency(config.max_concurrent_probes));
        }

        let (probe_tx, probe_rx) = mpsc::unbounded_channel();

        let panel = Self {
            catalog,
            bus,
            selection: SelectionState {
                book,
                chapter,
                collapsed: config.start_collapsed,
            },
            durations: DurationCache::new(),
            probe,
            probes: KeyedTasks::new(),
            limiter: Arc::new(Semaphore::new(config.max_concurrent_probes)),
            timeout: Timeout::new(config.probe_timeout()),
            probe_tx,
            diagnostics: log_diagnostics(),
        };

        Ok((panel, probe_rx))
    }

    /// Replaces the hook that receives ignored-signal and stale-completion events
    pub fn with_diagnostics(mut self, hook: DiagnosticHook) -> Self {
        self.diagnostics = hook;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn highlighted_book(&self) -> &Arc<Book> {
        &self.selection.book
    }

    pub fn highlighted_chapter(&self) -> &ChapterId {
        &self.selection.chapter
    }

    /// Chapters of the highlighted book, in order
    pub fn visible_chapters(&self) -> &[Chapter] {
        &self.selection.book.chapters
    }

    pub fn is_collapsed(&self) -> bool {
        self.selection.collapsed
    }

    /// Flips the collapsed flag and returns the new value
    pub fn toggle_collapsed(&mut self) -> bool {
        self.selection.collapsed = !self.selection.collapsed;
        self.selection.collapsed
    }

    /// Length shown for a chapter: measured if known, else the static label
    pub fn display_duration(&self, chapter: &Chapter) -> String {
        self.durations.display(chapter)
    }

    pub fn durations(&self) -> &DurationCache {
        &self.durations
    }

    /// Number of probes still in flight
    pub fn pending_probes(&self) -> usize {
        self.probes.len()
    }

    /// Highlights a book and its first chapter and announces the book
    pub fn select_book(&mut self, id: &BookId) -> CatalogResult<()> {
        let book = self
            .catalog
            .book(id)
            .cloned()
            .ok_or_else(|| CatalogError::BookNotFound(id.to_string()))?;
        let chapter = book
            .first_chapter()
            .map(|c| c.id.clone())
            .ok_or_else(|| CatalogError::EmptyBook(book.id.to_string()))?;

        log::info!("Selected book: {}", book.title);
        self.highlight(Arc::clone(&book), chapter);
        self.bus.publish(Signal::BookSelected {
            origin: Origin::Catalog,
            book,
        });
        Ok(())
    }

    /// Highlights a chapter of the highlighted book and announces it
    pub fn select_chapter(&mut self, id: &ChapterId) -> CatalogResult<()> {
        let book = Arc::clone(&self.selection.book);
        let chapter = book
            .chapter(id)
            .cloned()
            .ok_or_else(|| CatalogError::ChapterNotFound {
                book: book.id.to_string(),
                chapter: id.to_string(),
            })?;

        log::info!("Selected chapter: {}", chapter.title);
        self.highlight(Arc::clone(&book), chapter.id.clone());
        self.bus.publish(Signal::chapter(Origin::Catalog, book, chapter));
        Ok(())
    }

    /// Reacts to a signal from another panel
    pub fn handle_signal(&mut self, signal: &Signal) {
        if signal.origin() == Origin::Catalog {
            return;
        }

        match signal {
            Signal::BookSelected { book, .. } => match book.first_chapter() {
                Some(chapter) => self.highlight(Arc::clone(book), chapter.id.clone()),
                None => log::warn!("Book {} has no chapters, ignoring selection", book.id),
            },
            Signal::ChapterSelected { selection, .. } => {
                let fallback = self.fallback_book(selection);
                let resolved = selection.resolve(Some(&fallback));
                match resolved {
                    Some((book, chapter)) => self.highlight(book, chapter.id),
                    None => (self.diagnostics)(&Diagnostic::unresolved(Origin::Catalog, selection)),
                }
            }
        }
    }

    /// Moves the highlight to what the playback panel reports as playing
    pub fn follow(&mut self, book: &Arc<Book>, chapter: &ChapterId) {
        if !book.contains(chapter) {
            (self.diagnostics)(&Diagnostic::unresolved_id(Origin::Catalog, &book.id, chapter));
            return;
        }
        self.highlight(Arc::clone(book), chapter.clone());
    }

    /// Starts probes for visible chapters that have no cached length
    ///
    /// Probes for chapters that are no longer visible are cancelled and
    /// will be started again once their book is highlighted.
    pub fn refresh_durations(&mut self) {
        let visible: HashSet<&ChapterId> =
            self.selection.book.chapters.iter().map(|c| &c.id).collect();
        let cancelled = self.probes.retain(|id| visible.contains(id));
        if cancelled > 0 {
            log::debug!("Cancelled {} probe(s) for hidden chapters", cancelled);
        }

        let book = Arc::clone(&self.selection.book);
        for chapter in &book.chapters {
            if self.durations.contains(&chapter.id) || self.probes.is_running(&chapter.id) {
                continue;
            }
            self.spawn_probe(chapter);
        }
    }

    /// Caches the result of a probe
    pub fn handle_probe_outcome(&mut self, outcome: ProbeOutcome) {
        if !self.probes.complete(&outcome.chapter, outcome.generation) {
            (self.diagnostics)(&Diagnostic::StaleCompletion {
                observer: Origin::Catalog,
                key: format!("probe {}", outcome.chapter),
            });
            return;
        }

        match outcome.result.and_then(ProbeError::check_length) {
            Ok(seconds) => {
                log::debug!("Measured {} at {:.1}s", outcome.chapter, seconds);
                self.durations.record(outcome.chapter, seconds);
            }
            Err(reason) => {
                let err = AppError::MetadataProbe {
                    resource: outcome.source,
                    reason: reason.to_string(),
                };
                log::warn!("{} ({})", err, err.recovery_action());
                self.durations.record_failure(outcome.chapter);
            }
        }
    }

    fn fallback_book(&self, selection: &ChapterSelection) -> Arc<Book> {
        let owner = match selection {
            ChapterSelection::Direct { chapter, .. } => self.catalog.book_of(&chapter.id),
            ChapterSelection::ByNumber { .. } => None,
        };
        Arc::clone(owner.unwrap_or(&self.selection.book))
    }

    fn highlight(&mut self, book: Arc<Book>, chapter: ChapterId) {
        let book_changed = book.id != self.selection.book.id;
        self.selection.book = book;
        self.selection.chapter = chapter;

        if book_changed {
            log::debug!("Catalog now shows book {}", self.selection.book.id);
            self.refresh_durations();
        }
    }

    fn spawn_probe(&mut self, chapter: &Chapter) {
        let probe = Arc::clone(&self.probe);
        let limiter = Arc::clone(&self.limiter);
        let timeout = self.timeout;
        let tx = self.probe_tx.clone();
        let id = chapter.id.clone();
        let source = chapter.audio_url.clone();
        let generation = self.probes.next_generation();

        log::trace!("Probing {} ({})", id, source);
        self.probes.spawn(chapter.id.clone(), async move {
            let result = match limiter.acquire_owned().await {
                Ok(_permit) => match timeout.run(probe.probe(&source)).await {
                    Ok(result) => result,
                    Err(elapsed) => Err(ProbeError::from(elapsed)),
                },
                Err(_) => Err(ProbeError::Task("probe limiter closed".to_string())),
            };

            let outcome = ProbeOutcome {
                chapter: id,
                source,
                generation,
                result,
            };
            if tx.send(outcome).is_err() {
                log::trace!("Probe outcome dropped: panel is gone");
            }
        });
    }
}
