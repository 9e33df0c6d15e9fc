//! Domain types for Bookdeck
//!
//! - `book`: Book and Chapter types
//! - `catalog`: the read-only catalog and bundled sample data
//! - `common`: shared traits and display helpers

mod book;
mod catalog;
mod common;

pub use book::{Book, BookId, Chapter, ChapterId};
pub use catalog::Catalog;
pub use common::{format_time, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _book_id: BookId = BookId::new("1");
        let _chapter_id: ChapterId = ChapterId::new("1-chapter-1");
        let catalog: Catalog = Catalog::sample();
        assert!(catalog.is_valid());
    }
}
