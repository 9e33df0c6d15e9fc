//! Book and chapter domain models

use crate::types::Validator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifier for a book within a catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Creates a BookId from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the BookId as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier for a chapter, unique within its book
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(String);

impl ChapterId {
    /// Creates a ChapterId from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ChapterId as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChapterId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An audiobook with its ordered chapters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub narrator: String,
    pub cover_url: String,
    /// Display string for the whole book, e.g. "8h 49m"
    pub length: String,
    pub rating: f32,
    pub genre: String,
    pub description: String,
    pub chapters: Vec<Chapter>,
}

impl Book {
    /// Returns the number of chapters
    pub fn total_chapters(&self) -> usize {
        self.chapters.len()
    }

    /// Returns the first chapter, if the book has any
    pub fn first_chapter(&self) -> Option<&Chapter> {
        self.chapters.first()
    }

    /// Finds a chapter by id
    pub fn chapter(&self, id: &ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| &c.id == id)
    }

    /// Finds a chapter by its 1-based number
    pub fn chapter_by_number(&self, number: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.number == number)
    }

    /// Returns the index of a chapter within this book
    pub fn position_of(&self, id: &ChapterId) -> Option<usize> {
        self.chapters.iter().position(|c| &c.id == id)
    }

    /// Returns true if the chapter belongs to this book
    pub fn contains(&self, id: &ChapterId) -> bool {
        self.position_of(id).is_some()
    }
}

impl Validator for Book {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.as_str().trim().is_empty() {
            errors.push("Book id cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            errors.push(format!("Book {}: title cannot be empty", self.id));
        }

        if !(0.0..=5.0).contains(&self.rating) {
            errors.push(format!("Book {}: rating must be between 0 and 5", self.id));
        }

        if self.chapters.is_empty() {
            errors.push(format!("Book {}: must have at least one chapter", self.id));
        }

        let mut seen = HashSet::new();
        for (index, chapter) in self.chapters.iter().enumerate() {
            if !seen.insert(&chapter.id) {
                errors.push(format!(
                    "Book {}: duplicate chapter id {}",
                    self.id, chapter.id
                ));
            }

            let expected = index as u32 + 1;
            if chapter.number != expected {
                errors.push(format!(
                    "Book {}: chapter {} has number {}, expected {}",
                    self.id, chapter.id, chapter.number, expected
                ));
            }

            if let Err(chapter_errors) = chapter.validate() {
                errors.extend(chapter_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// One playable segment of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: ChapterId,
    /// 1-based position within the book
    pub number: u32,
    pub title: String,
    /// Static display duration, e.g. "23 min"
    pub duration: String,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub length_in_seconds: u32,
}

impl Chapter {
    /// Returns the chapter cover, falling back to the book cover
    pub fn cover_or<'a>(&'a self, book: &'a Book) -> &'a str {
        self.cover_url.as_deref().unwrap_or(&book.cover_url)
    }
}

impl Validator for Chapter {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.as_str().trim().is_empty() {
            errors.push("Chapter id cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            errors.push(format!("Chapter {}: title cannot be empty", self.id));
        }

        if self.audio_url.trim().is_empty() {
            errors.push(format!("Chapter {}: audio url cannot be empty", self.id));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(book: &str, number: u32) -> Chapter {
        Chapter {
            id: ChapterId::new(format!("{}-chapter-{}", book, number)),
            number,
            title: format!("Chapter {}", number),
            duration: "20 min".to_string(),
            audio_url: "https://example.com/a.ogg".to_string(),
            cover_url: None,
            length_in_seconds: 1200,
        }
    }

    fn book(id: &str, chapters: u32) -> Book {
        Book {
            id: BookId::new(id),
            title: "Test Book".to_string(),
            author: "Author".to_string(),
            narrator: "Narrator".to_string(),
            cover_url: "/cover.png".to_string(),
            length: "1h 0m".to_string(),
            rating: 4.0,
            genre: "Fiction".to_string(),
            description: String::new(),
            chapters: (1..=chapters).map(|n| chapter(id, n)).collect(),
        }
    }

    #[test]
    fn test_id_display_and_from() {
        let id = BookId::from("7");
        assert_eq!(id.to_string(), "7");
        assert_eq!(ChapterId::from("7-chapter-1").as_str(), "7-chapter-1");
    }

    #[test]
    fn test_chapter_lookups() {
        let book = book("1", 4);
        assert_eq!(book.total_chapters(), 4);
        assert_eq!(book.first_chapter().map(|c| c.number), Some(1));
        assert_eq!(book.chapter_by_number(3).map(|c| c.id.as_str()), Some("1-chapter-3"));
        assert!(book.chapter_by_number(99).is_none());
        assert_eq!(book.position_of(&ChapterId::from("1-chapter-4")), Some(3));
        assert!(!book.contains(&ChapterId::from("2-chapter-1")));
    }

    #[test]
    fn test_cover_fallback() {
        let mut book = book("1", 2);
        assert_eq!(book.chapters[0].cover_or(&book), "/cover.png");

        book.chapters[1].cover_url = Some("/special.png".to_string());
        assert_eq!(book.chapters[1].cover_or(&book), "/special.png");
    }

    #[test]
    fn test_book_validation_success() {
        assert!(book("1", 3).is_valid());
    }

    #[test]
    fn test_book_validation_gap_in_numbers() {
        let mut book = book("1", 3);
        book.chapters[2].number = 5;
        let errors = book.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("expected 3"));
    }

    #[test]
    fn test_book_validation_duplicate_ids() {
        let mut book = book("1", 2);
        book.chapters[1].id = book.chapters[0].id.clone();
        assert!(!book.is_valid());
    }

    #[test]
    fn test_book_validation_no_chapters() {
        assert!(!book("1", 0).is_valid());
    }

    #[test]
    fn test_book_validation_invalid_rating() {
        let mut book = book("1", 1);
        book.rating = 6.5;
        assert!(!book.is_valid());
    }

    #[test]
    fn test_chapter_validation_empty_title() {
        let mut chapter = chapter("1", 1);
        chapter.title = "   ".to_string();
        assert!(!chapter.is_valid());
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&chapter("1", 1)).unwrap();
        assert!(json.contains("\"audioUrl\""));
        assert!(json.contains("\"lengthInSeconds\""));
        assert!(!json.contains("coverUrl"));
    }
}
