//! Utility functions and helpers.

pub mod http;

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

fn html_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("static pattern"))
}

/// Normalize a raw CSV cell.
///
/// HTML tags are removed, whitespace runs inside each line collapse to a single
/// space and the remaining lines are joined with `;`.
pub fn clean_cell(raw: &str) -> String {
    let stripped = html_tag_pattern().replace_all(raw, "");
    stripped
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join(";")
}

/// Directory-safe, collision-free key for a region name.
///
/// Keeps ASCII alphanumerics for readability and appends a short sha256
/// digest of the full name.
pub fn region_slug(region: &str) -> String {
    let readable: String = region
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let readable = readable.trim_matches('_');

    let digest = Sha256::digest(region.as_bytes());
    let short = hex::encode(&digest[..6]);

    if readable.is_empty() {
        short
    } else {
        format!("{readable}_{short}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_cell_strips_tags_and_whitespace() {
        assert_eq!(clean_cell("<p>Python   developer</p>"), "Python developer");
        assert_eq!(clean_cell("  Москва "), "Москва");
        assert_eq!(clean_cell("SQL\nGit  \n Linux"), "SQL;Git;Linux");
    }

    #[test]
    fn test_region_slug_is_stable_and_distinct() {
        let a = region_slug("Санкт-Петербург");
        let b = region_slug("Москва");
        assert_eq!(a, region_slug("Санкт-Петербург"));
        assert_ne!(a, b);
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

        let latin = region_slug("New York");
        assert!(latin.starts_with("new_york_"));
    }
}
