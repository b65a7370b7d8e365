//! Ordering scanned pages by the number in their file name.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new("[0-9]+").expect("digit run is a valid pattern"))
}

/// The last run of digits in the file stem, e.g. 12 for `scan_3_page12.jpg`.
///
/// `None` when the stem has no digits, or too many to fit a `u64`.
pub fn page_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_string_lossy();
    digits().find_iter(&stem).last()?.as_str().parse().ok()
}

/// Sorts by page number, files without one first, then by path.
pub fn sort_pages(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort_by_cached_key(|path| (page_number(path), path.clone()));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn last_number_in_stem() {
        assert_eq!(page_number(Path::new("scans/notes_2017_p12.jpg")), Some(12));
        assert_eq!(page_number(Path::new("007.png")), Some(7));
        assert_eq!(page_number(Path::new("dir42/cover.png")), None);
        assert_eq!(page_number(Path::new("page3.v2")), Some(3));
        assert_eq!(page_number(Path::new("p99999999999999999999999.png")), None);
    }

    #[test]
    fn pattern_is_compiled_once() {
        assert!(std::ptr::eq(digits(), digits()));
    }

    #[test]
    fn numeric_not_lexical_order() {
        let sorted = sort_pages(vec![
            PathBuf::from("page10.png"),
            PathBuf::from("page9.png"),
            PathBuf::from("cover.png"),
            PathBuf::from("page1.png"),
        ]);
        assert_eq!(
            sorted,
            vec![
                PathBuf::from("cover.png"),
                PathBuf::from("page1.png"),
                PathBuf::from("page9.png"),
                PathBuf::from("page10.png"),
            ]
        );
    }
}
