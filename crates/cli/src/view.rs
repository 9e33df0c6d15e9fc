//! Text rendering of the panels

use bookdeck_catalog::CatalogPanel;
use bookdeck_core::Catalog;
use bookdeck_playback::{format_rate, NowPlaying};
use console::style;

/// One-line summary of the playback panel
pub fn status_line(state: &NowPlaying) -> String {
    let status = if state.playing {
        style("▶ Playing").green()
    } else {
        style("⏸ Paused").yellow()
    };

    let volume = if state.muted {
        format!("muted ({}%)", percent(state.volume))
    } else {
        format!("vol {}%", percent(state.volume))
    };

    let mut line = format!(
        "{} {} - {} [{} / {}] {} {}",
        status,
        style(&state.book.title).bold(),
        state.chapter.title,
        state.elapsed_label(),
        state.duration_label(),
        format_rate(state.rate),
        volume,
    );
    if state.immersive {
        line.push_str(&format!(" {}", style("[immersive]").magenta()));
    }
    line
}

/// Chapter list of the highlighted book; collapsed lists show numbers only
pub fn chapter_list(panel: &CatalogPanel) -> String {
    let book = panel.highlighted_book();
    let mut out = format!(
        "{} by {} ({} chapters)\n",
        style(&book.title).bold().cyan(),
        book.author,
        book.total_chapters()
    );

    for chapter in panel.visible_chapters() {
        let marker = if &chapter.id == panel.highlighted_chapter() {
            style("›").green().bold().to_string()
        } else {
            " ".to_string()
        };

        if panel.is_collapsed() {
            out.push_str(&format!("{} {:>2}\n", marker, chapter.number));
        } else {
            out.push_str(&format!(
                "{} {:>2}  {:<40} {}\n",
                marker,
                chapter.number,
                chapter.title,
                style(panel.display_duration(chapter)).dim()
            ));
        }
    }

    out
}

/// Table of every book in the catalog
pub fn book_list(catalog: &Catalog) -> String {
    let mut out = format!("\n{} Books in Catalog\n", style(catalog.len()).bold().cyan());
    out.push_str(&"=".repeat(80));
    out.push('\n');

    for book in catalog.books() {
        out.push_str(&format!(
            "{:>3}  {}  by {}, read by {}\n",
            book.id,
            style(&book.title).bold(),
            book.author,
            book.narrator
        ));
        out.push_str(&format!(
            "     {} | {} | {} chapters | ★ {:.1}\n",
            book.genre,
            book.length,
            book.total_chapters(),
            book.rating
        ));
    }

    out
}

fn percent(level: f32) -> u32 {
    (level * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdeck_core::BookId;
    use std::sync::Arc;

    fn state() -> NowPlaying {
        let catalog = Catalog::sample();
        let book = Arc::clone(catalog.book(&BookId::from("2")).unwrap());
        let chapter = book.chapters[0].clone();
        NowPlaying::new(book, chapter, 0.7, 1.25)
    }

    #[test]
    fn test_status_line() {
        let mut state = state();
        let line = status_line(&state);
        assert!(line.contains("Atomic Habits"));
        assert!(line.contains("Loading..."));
        assert!(line.contains("1.25x"));
        assert!(line.contains("vol 70%"));

        state.muted = true;
        state.immersive = true;
        let line = status_line(&state);
        assert!(line.contains("muted (70%)"));
        assert!(line.contains("immersive"));
    }

    #[test]
    fn test_book_list_names_every_book() {
        let catalog = Catalog::sample();
        let out = book_list(&catalog);
        for book in catalog.books() {
            assert!(out.contains(&book.title));
        }
    }
}
