//! Per-account saved word list ("word book").
//!
//! [`WordBook`] persists an ordered list of words as JSON, one file per
//! account id in the platform data directory:
//!
//! | Platform | Path |
//! |----------|------|
//! | Windows  | `%LOCALAPPDATA%\snaplearn\wordbooks\{account_id}.json` |
//! | macOS    | `~/Library/Application Support/snaplearn/wordbooks/{account_id}.json` |
//! | Linux    | `~/.local/share/snaplearn/wordbooks/{account_id}.json` |
//!
//! Ordering is most-recently-added first.  Adding a word removes any
//! case-insensitive duplicate and prepends; removal matches the exact
//! string.  Every mutation rewrites the whole file.  Persistence failures
//! are logged and swallowed — the in-memory list stays usable.  Missing or
//! corrupt files read as an empty list.  Single-writer assumption: two
//! processes on the same account race and the last write wins.

use std::path::PathBuf;

use crate::config::AppPaths;

// ---------------------------------------------------------------------------
// WordBook
// ---------------------------------------------------------------------------

/// The saved word list for one account.
pub struct WordBook {
    words: Vec<String>,
    path: PathBuf,
}

impl WordBook {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Open the word book for `account_id`, creating an empty one when no
    /// file exists yet.
    pub fn open(account_id: &str) -> Self {
        let path = AppPaths::new()
            .wordbook_dir
            .join(format!("{account_id}.json"));
        Self::open_at(path)
    }

    /// Open from an explicit path (useful for tests).
    pub fn open_at(path: PathBuf) -> Self {
        let words = Self::load_words(&path);
        Self { words, path }
    }

    fn load_words(path: &PathBuf) -> Vec<String> {
        if path.exists() {
            let data = std::fs::read_to_string(path).unwrap_or_default();
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Saved words, most-recently-added first.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Save `word` to the front of the list, removing any case-insensitive
    /// duplicate first, then persist.
    ///
    /// Adding a word that is already at the front (any casing) keeps the
    /// list's contents stable apart from the stored casing.
    pub fn add(&mut self, word: &str) {
        let lower = word.to_lowercase();
        self.words.retain(|w| w.to_lowercase() != lower);
        self.words.insert(0, word.to_string());
        self.save();
    }

    /// Remove exact-string matches of `word`, then persist.
    pub fn remove(&mut self, word: &str) {
        self.words.retain(|w| w != word);
        self.save();
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn save(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&self.words) {
            Ok(data) => {
                if let Err(e) = std::fs::write(&self.path, data) {
                    log::warn!("word book: failed to write {}: {e}", self.path.display());
                }
            }
            Err(e) => log::warn!("word book: failed to serialize: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn book_in_temp() -> (WordBook, tempfile::TempDir) {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("acct.json");
        let book = WordBook::open_at(path);
        (book, dir)
    }

    #[test]
    fn starts_empty() {
        let (book, _dir) = book_in_temp();
        assert!(book.is_empty());
        assert_eq!(book.len(), 0);
    }

    #[test]
    fn add_prepends() {
        let (mut book, _dir) = book_in_temp();
        book.add("lamp");
        book.add("cup");
        assert_eq!(book.words(), ["cup", "lamp"]);
    }

    /// add(add(list, w), w) == add(list, w) with w at the front.
    #[test]
    fn add_is_idempotent_at_the_front() {
        let (mut book, _dir) = book_in_temp();
        book.add("lamp");
        book.add("cup");
        book.add("lamp");
        let after_once: Vec<String> = book.words().to_vec();

        book.add("lamp");
        assert_eq!(book.words(), after_once.as_slice());
        assert_eq!(book.words()[0], "lamp");
    }

    #[test]
    fn add_dedupes_case_insensitively() {
        let (mut book, _dir) = book_in_temp();
        book.add("Lamp");
        book.add("cup");
        book.add("lamp");
        assert_eq!(book.words(), ["lamp", "cup"]);
    }

    /// remove(add(list, w), w) restores the original contents.
    #[test]
    fn remove_after_add_round_trips() {
        let (mut book, _dir) = book_in_temp();
        book.add("cup");
        book.add("chair");
        let before: Vec<String> = book.words().to_vec();

        book.add("lamp");
        book.remove("lamp");
        assert_eq!(book.words(), before.as_slice());
    }

    #[test]
    fn remove_matches_exact_string_only() {
        let (mut book, _dir) = book_in_temp();
        book.add("Lamp");
        book.remove("lamp"); // different casing — no match
        assert_eq!(book.words(), ["Lamp"]);
        book.remove("Lamp");
        assert!(book.is_empty());
    }

    #[test]
    fn remove_missing_word_is_a_noop() {
        let (mut book, _dir) = book_in_temp();
        book.add("cup");
        book.remove("chair");
        assert_eq!(book.words(), ["cup"]);
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("acct.json");

        {
            let mut book = WordBook::open_at(path.clone());
            book.add("lamp");
            book.add("cup");
        }

        let reloaded = WordBook::open_at(path);
        assert_eq!(reloaded.words(), ["cup", "lamp"]);
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("acct.json");
        std::fs::write(&path, "{ not json ]").expect("write");

        let book = WordBook::open_at(path);
        assert!(book.is_empty());
    }

    #[test]
    fn mutation_overwrites_the_whole_list() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("acct.json");

        let mut book = WordBook::open_at(path.clone());
        book.add("lamp");
        book.add("cup");
        book.remove("lamp");

        let on_disk: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(on_disk, vec!["cup".to_string()]);
    }
}
