use std::cmp::Ordering;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Lowercase, trim, drop anything but ASCII letters/digits/whitespace/hyphens,
/// then turn each whitespace run into a single hyphen.
///
/// Whitespace exposed by the filter is kept, so "& Rust" becomes "-rust".
/// Ids already in published catalogs were derived this way.
pub fn slugify(input: &str) -> String {
    let cleaned: String = input
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-'
        })
        .collect();
    hyphenate_whitespace(&cleaned)
}

/// Hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compare names so embedded numbers sort by value ("ch2" < "ch10").
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_num = take_digits(&mut left);
                let r_num = take_digits(&mut right);
                let l_trim = l_num.trim_start_matches('0');
                let r_trim = r_num.trim_start_matches('0');
                let ordering = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

/// Replace every whitespace run with a single hyphen. Leading and trailing
/// runs are replaced too, not trimmed.
pub fn hyphenate_whitespace(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push('-');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// True for a single path component that cannot climb out of its folder.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// File name component of a path, lossily converted.
pub fn file_name_string(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

/// Encode each segment of a slash-separated remote path for use in a URL.
pub fn encode_remote_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Introduction to Graphics"), "introduction-to-graphics");
        assert_eq!(slugify("  C++ & Rust: Part 2 "), "c-rust-part-2");
        assert_eq!(slugify("already-slugged"), "already-slugged");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("& Rust"), "-rust");
        assert_eq!(slugify("Rust &"), "rust-");
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("compressed-book.pdf"));
        assert!(is_plain_file_name("6f1c..e2"));
        assert!(!is_plain_file_name("../x"));
        assert!(!is_plain_file_name("a\\b"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(" "));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_natural_cmp_orders_numbers_by_value() {
        let mut names = vec!["ch10.pdf", "ch2.pdf", "Ch1.pdf", "appendix.pdf", "ch02b.pdf"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["appendix.pdf", "Ch1.pdf", "ch2.pdf", "ch02b.pdf", "ch10.pdf"]);
    }

    #[test]
    fn test_hyphenate_whitespace() {
        assert_eq!(hyphenate_whitespace("unit 1  notes.pdf"), "unit-1-notes.pdf");
        assert_eq!(hyphenate_whitespace(" notes.pdf"), "-notes.pdf");
    }

    #[test]
    fn test_encode_remote_path() {
        assert_eq!(
            encode_remote_path("resources/cs 101/a b.pdf"),
            "resources/cs%20101/a%20b.pdf"
        );
    }
}
