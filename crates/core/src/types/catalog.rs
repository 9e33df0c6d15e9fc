//! Read-only catalog of books and the bundled sample data

use crate::error::{AppError, Result};
use crate::types::{Book, BookId, Chapter, ChapterId, Validator};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

const SAMPLE_AUDIO_URLS: [&str; 5] = [
    "https://commondatastorage.googleapis.com/codeskulptor-assets/Epoq-Lepidoptera.ogg",
    "https://commondatastorage.googleapis.com/codeskulptor-assets/Evillaugh.ogg",
    "https://commondatastorage.googleapis.com/codeskulptor-demos/DDR_assets/Kangaroo_MusiQue_-_The_Neverwritten_Role_Playing_Game.mp3",
    "https://commondatastorage.googleapis.com/codeskulptor-assets/Collision8-Bit.ogg",
    "https://commondatastorage.googleapis.com/codeskulptor-demos/DDR_assets/Sevish_-__nbsp_.mp3",
];

const CHAPTER_TITLES: [&str; 10] = [
    "The Beginning",
    "A New Discovery",
    "Unexpected Turns",
    "The Journey Continues",
    "Revelations",
    "Hidden Truths",
    "The Confrontation",
    "Mysteries Unveiled",
    "The Decision",
    "Final Destination",
];

/// Ordered, immutable collection of books
///
/// Books are held behind `Arc` so signals can carry a whole book by value
/// without copying its chapter list. Chapter ids are unique across the whole
/// catalog, so a chapter id alone identifies its book.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: Vec<Arc<Book>>,
}

impl Catalog {
    /// Builds a catalog from books, validating every book first
    pub fn new(books: Vec<Book>) -> Result<Self> {
        let catalog = Self {
            books: books.into_iter().map(Arc::new).collect(),
        };

        catalog
            .validate()
            .map_err(|errors| AppError::InvalidCatalog { errors })?;

        Ok(catalog)
    }

    /// Loads a catalog from a JSON file containing an array of books
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| AppError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;

        let books: Vec<Book> =
            serde_json::from_str(&content).map_err(|source| AppError::CatalogParse {
                path: path.to_path_buf(),
                source,
            })?;

        log::info!("Loaded {} books from {}", books.len(), path.display());
        Self::new(books)
    }

    /// Returns the bundled sample catalog
    pub fn sample() -> Self {
        let books = vec![
            sample_book(
                "1",
                "The Midnight Library",
                "Matt Haig",
                "Carey Mulligan",
                "/celestial-library.png",
                "8h 49m",
                12,
                4.5,
                "Fiction",
                "Between life and death there is a library, and within that library, the shelves go on forever. Every book provides a chance to try another life you could have lived.",
            ),
            sample_book(
                "2",
                "Atomic Habits",
                "James Clear",
                "James Clear",
                "/atomic-symbol-book.png",
                "5h 35m",
                8,
                4.8,
                "Self-Help",
                "No matter your goals, Atomic Habits offers a proven framework for improving--every day.",
            ),
            sample_book(
                "3",
                "Project Hail Mary",
                "Andy Weir",
                "Ray Porter",
                "/nebula-explorer.png",
                "16h 10m",
                10,
                4.7,
                "Science Fiction",
                "A lone astronaut must save the earth from disaster in this incredible new science-based thriller from the #1 New York Times bestselling author of The Martian.",
            ),
            sample_book(
                "4",
                "Dune",
                "Frank Herbert",
                "Scott Brick",
                "/Shifting Sands Leviathan.png",
                "21h 2m",
                15,
                4.6,
                "Science Fiction",
                "Set on the desert planet Arrakis, Dune is the story of the boy Paul Atreides, heir to a noble family tasked with ruling an inhospitable world where the only thing of value is the \"spice\" melange.",
            ),
            sample_book(
                "5",
                "The Psychology of Money",
                "Morgan Housel",
                "Chris Hill",
                "/wealth-of-mind.png",
                "5h 48m",
                6,
                4.7,
                "Finance",
                "Doing well with money isn't necessarily about what you know. It's about how you behave. And behavior is hard to teach, even to really smart people.",
            ),
            sample_book(
                "6",
                "The Hobbit",
                "J.R.R. Tolkien",
                "Andy Serkis",
                "/mountain-dragon-book.png",
                "10h 25m",
                9,
                4.8,
                "Fantasy",
                "Bilbo Baggins is a hobbit who enjoys a comfortable, unambitious life, rarely traveling any farther than his pantry or cellar. But his contentment is disturbed when the wizard Gandalf and a company of dwarves arrive on his doorstep.",
            ),
        ];

        Self {
            books: books.into_iter().map(Arc::new).collect(),
        }
    }

    /// Returns all books in catalog order
    pub fn books(&self) -> &[Arc<Book>] {
        &self.books
    }

    /// Returns the first book
    pub fn first(&self) -> Option<&Arc<Book>> {
        self.books.first()
    }

    /// Finds a book by id
    pub fn book(&self, id: &BookId) -> Option<&Arc<Book>> {
        self.books.iter().find(|b| &b.id == id)
    }

    /// Finds the book that owns a chapter
    pub fn book_of(&self, chapter: &ChapterId) -> Option<&Arc<Book>> {
        self.books.iter().find(|b| b.contains(chapter))
    }

    /// Returns the number of books
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Returns true if the catalog has no books
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl Validator for Catalog {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.books.is_empty() {
            errors.push("Catalog must contain at least one book".to_string());
        }

        let mut seen = HashSet::new();
        let mut owners: HashMap<&ChapterId, &BookId> = HashMap::new();
        for book in &self.books {
            if !seen.insert(&book.id) {
                errors.push(format!("Duplicate book id {}", book.id));
            }
            if let Err(book_errors) = book.validate() {
                errors.extend(book_errors);
            }

            for chapter in &book.chapters {
                match owners.get(&chapter.id) {
                    Some(owner) if *owner != &book.id => errors.push(format!(
                        "Chapter id {} is used by books {} and {}",
                        chapter.id, owner, book.id
                    )),
                    Some(_) => {}
                    None => {
                        owners.insert(&chapter.id, &book.id);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn sample_book(
    id: &str,
    title: &str,
    author: &str,
    narrator: &str,
    cover_url: &str,
    length: &str,
    total_chapters: u32,
    rating: f32,
    genre: &str,
    description: &str,
) -> Book {
    Book {
        id: BookId::new(id),
        title: title.to_string(),
        author: author.to_string(),
        narrator: narrator.to_string(),
        cover_url: cover_url.to_string(),
        length: length.to_string(),
        rating,
        genre: genre.to_string(),
        description: description.to_string(),
        chapters: sample_chapters(id, total_chapters),
    }
}

fn sample_chapters(book_id: &str, total: u32) -> Vec<Chapter> {
    let seed: u32 = book_id.bytes().map(u32::from).sum();

    (1..=total)
        .map(|number| {
            // 15-44 minutes, stable across runs
            let minutes = 15 + (seed * 7 + number * 11) % 30;
            let audio_url = SAMPLE_AUDIO_URLS[(number as usize - 1) % SAMPLE_AUDIO_URLS.len()];

            Chapter {
                id: ChapterId::new(format!("{}-chapter-{}", book_id, number)),
                number,
                title: format!(
                    "Chapter {}: {}",
                    number,
                    CHAPTER_TITLES[number as usize % CHAPTER_TITLES.len()]
                ),
                duration: format!("{} min", minutes),
                audio_url: audio_url.to_string(),
                cover_url: None,
                length_in_seconds: minutes * 60,
            }
        })
        .collect()
}
