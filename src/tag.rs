//! Parsing of a window's tag line.
//!
//! An acme tag looks like `/src/main.go Del Snarf | Look +Err`.  Everything
//! before the first `|` is the file or directory name followed by acme's
//! fixed commands; everything after it is user-added tags.

/// Split a tag on its first `|` delimiter.
///
/// The left part is returned verbatim, surrounding whitespace included.
/// The right part is split on whitespace.  A tag without a delimiter yields
/// the whole tag and no custom tags.
pub fn split_name_and_tags(tag: &str) -> (String, Vec<String>) {
    match tag.split_once('|') {
        Some((name, rest)) => (
            name.to_string(),
            rest.split_whitespace().map(str::to_string).collect(),
        ),
        None => (tag.to_string(), Vec::new()),
    }
}

/// The window name: the first whitespace-separated token of the tag.
///
/// Names containing spaces are truncated at the first space.
pub fn window_name(tag: &str) -> Option<&str> {
    tag.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_preserves_name_whitespace() {
        let (name, tags) = split_name_and_tags("main.go | +Err Del Snarf");
        assert_eq!(name, "main.go ");
        assert_eq!(tags, vec!["+Err", "Del", "Snarf"]);
    }

    #[test]
    fn only_first_delimiter_splits() {
        let (name, tags) = split_name_and_tags("/tmp/ Del | a|b c");
        assert_eq!(name, "/tmp/ Del ");
        assert_eq!(tags, vec!["a|b", "c"]);
    }

    #[test]
    fn missing_delimiter_yields_no_tags() {
        let (name, tags) = split_name_and_tags("/home/me/notes Del Snarf");
        assert_eq!(name, "/home/me/notes Del Snarf");
        assert!(tags.is_empty());
    }

    #[test]
    fn empty_custom_section() {
        let (name, tags) = split_name_and_tags("x.rs |\n");
        assert_eq!(name, "x.rs ");
        assert!(tags.is_empty());
    }

    #[test]
    fn window_name_is_first_token() {
        assert_eq!(window_name("main.go | +Err"), Some("main.go"));
        assert_eq!(window_name("  /src/lib.rs Del"), Some("/src/lib.rs"));
    }

    #[test]
    fn window_name_of_blank_tag() {
        assert_eq!(window_name(""), None);
        assert_eq!(window_name(" \n"), None);
    }
}
