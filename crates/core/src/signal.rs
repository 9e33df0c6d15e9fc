//! Typed signals exchanged between the catalog and playback panels
//!
//! The bus is injected into both panels. Every signal carries an owned payload
//! and the `Origin` of the panel that emitted it, so a panel can skip its own
//! announcements instead of re-entering its selection logic.

use crate::error::AppError;
use crate::types::{Book, BookId, Chapter, ChapterId};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of signals buffered per subscriber
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Which panel emitted a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Catalog,
    Playback,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Playback => write!(f, "playback"),
        }
    }
}

/// How a "chapter selected" signal names its chapter
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterSelection {
    /// A direct chapter reference, optionally with the book it belongs to
    Direct {
        book: Option<Arc<Book>>,
        chapter: Chapter,
    },
    /// A chapter number to be resolved against the book's chapters
    ByNumber { book: Arc<Book>, number: u32 },
}

impl ChapterSelection {
    /// Resolves the selection to a book and one of its chapters
    ///
    /// A direct reference without a book is resolved against `fallback`.
    /// Returns `None` when the chapter is not part of the book.
    pub fn resolve(&self, fallback: Option<&Arc<Book>>) -> Option<(Arc<Book>, Chapter)> {
        match self {
            Self::Direct { book, chapter } => {
                let book = book.as_ref().or(fallback)?;
                book.chapter(&chapter.id)
                    .map(|found| (Arc::clone(book), found.clone()))
            }
            Self::ByNumber { book, number } => book
                .chapter_by_number(*number)
                .map(|found| (Arc::clone(book), found.clone())),
        }
    }

    /// Returns the book carried by the selection, if any
    pub fn book(&self) -> Option<&Arc<Book>> {
        match self {
            Self::Direct { book, .. } => book.as_ref(),
            Self::ByNumber { book, .. } => Some(book),
        }
    }

    /// Returns the chapter number named by the selection
    pub fn number(&self) -> u32 {
        match self {
            Self::Direct { chapter, .. } => chapter.number,
            Self::ByNumber { number, .. } => *number,
        }
    }

    fn target(&self) -> String {
        match self {
            Self::Direct { chapter, .. } => chapter.id.to_string(),
            Self::ByNumber { number, .. } => format!("#{}", number),
        }
    }
}

/// A fire-and-forget notification broadcast to every subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    BookSelected {
        origin: Origin,
        book: Arc<Book>,
    },
    ChapterSelected {
        origin: Origin,
        selection: ChapterSelection,
    },
}

impl Signal {
    /// Builds a "chapter selected" signal carrying book, chapter and number
    pub fn chapter(origin: Origin, book: Arc<Book>, chapter: Chapter) -> Self {
        Self::ChapterSelected {
            origin,
            selection: ChapterSelection::Direct {
                book: Some(book),
                chapter,
            },
        }
    }

    /// Builds a "chapter selected" signal that names the chapter by number
    pub fn chapter_number(origin: Origin, book: Arc<Book>, number: u32) -> Self {
        Self::ChapterSelected {
            origin,
            selection: ChapterSelection::ByNumber { book, number },
        }
    }

    /// Returns the panel that emitted this signal
    pub fn origin(&self) -> Origin {
        match self {
            Self::BookSelected { origin, .. } | Self::ChapterSelected { origin, .. } => *origin,
        }
    }
}

/// Page-scoped publish/subscribe channel for signals
#[derive(Debug, Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<Signal>,
}

impl SignalBus {
    /// Creates a bus buffering up to `capacity` signals per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcasts a signal to current subscribers
    ///
    /// Delivery is not acknowledged; with no subscribers the signal is dropped.
    pub fn publish(&self, signal: Signal) {
        log::trace!("Publishing {:?} signal from {}", kind(&signal), signal.origin());
        if self.sender.send(signal).is_err() {
            log::debug!("Signal dropped: no subscribers");
        }
    }

    /// Registers a new subscriber that sees signals published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

fn kind(signal: &Signal) -> &'static str {
    match signal {
        Signal::BookSelected { .. } => "book-selected",
        Signal::ChapterSelected { .. } => "chapter-selected",
    }
}

/// Observable events that the panels otherwise handle silently
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A chapter selection could not be resolved and was ignored
    UnresolvedChapter {
        observer: Origin,
        book: Option<BookId>,
        target: String,
    },
    /// An async completion arrived after its request was superseded
    StaleCompletion { observer: Origin, key: String },
}

impl Diagnostic {
    /// Records a selection that did not resolve
    pub fn unresolved(observer: Origin, selection: &ChapterSelection) -> Self {
        Self::UnresolvedChapter {
            observer,
            book: selection.book().map(|b| b.id.clone()),
            target: selection.target(),
        }
    }

    /// Records a chapter id that is not in the expected book
    pub fn unresolved_id(observer: Origin, book: &BookId, chapter: &ChapterId) -> Self {
        Self::UnresolvedChapter {
            observer,
            book: Some(book.clone()),
            target: chapter.to_string(),
        }
    }

    /// Converts the diagnostic into the matching error, if it has one
    pub fn as_error(&self) -> Option<AppError> {
        match self {
            Self::UnresolvedChapter { book, target, .. } => Some(AppError::ChapterNotFound {
                book: book
                    .as_ref()
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "<none>".to_string()),
                target: target.clone(),
            }),
            Self::StaleCompletion { .. } => None,
        }
    }
}

/// Callback invoked for every diagnostic
pub type DiagnosticHook = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

/// Returns a hook that logs diagnostics at debug level
pub fn log_diagnostics() -> DiagnosticHook {
    Arc::new(|diagnostic: &Diagnostic| match diagnostic.as_error() {
        Some(err) => log::debug!("Ignored signal: {}", err),
        None => log::debug!("{:?}", diagnostic),
    })
}
