//! Slash normalisation for view names, directory roots and URL segments.
//!
//! Pure string transforms, no filesystem access. Both `/` and `\` count as
//! separators, and a leading `./` is treated as a separator too.

/// Which end of the path receives the separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashMode {
    /// One leading `/`, no trailing separator. Used for layout and script
    /// names and for the base URL.
    Leading,
    /// No leading separator, exactly one trailing `/`. Used for directory
    /// roots and relative URL segments.
    Trailing,
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

fn strip_leading(mut path: &str) -> &str {
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if path.starts_with(is_separator) {
            path = &path[1..];
        } else {
            return path;
        }
    }
}

/// Normalises the separators of `path` according to `mode`.
///
/// An input that is nothing but separators normalises to `""` in
/// [`SlashMode::Leading`] and to `"/"` in [`SlashMode::Trailing`].
///
/// ```rust
/// use waypost_render::{normalize_slashes, SlashMode};
///
/// assert_eq!(normalize_slashes("index/index.jinja", SlashMode::Leading), "/index/index.jinja");
/// assert_eq!(normalize_slashes("//views/", SlashMode::Trailing), "views/");
/// ```
pub fn normalize_slashes(path: &str, mode: SlashMode) -> String {
    let body = strip_leading(path).trim_end_matches(is_separator);
    match mode {
        SlashMode::Leading if body.is_empty() => String::new(),
        SlashMode::Leading => format!("/{}", body),
        SlashMode::Trailing => format!("{}/", body),
    }
}
