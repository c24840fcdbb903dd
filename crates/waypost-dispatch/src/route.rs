//! Request path parsing.
//!
//! A request path has the shape `/controller/action/flag1/flag2/...`:
//!
//! | Path | Controller | Action | Flags |
//! |------|------------|--------|-------|
//! | `""` or `"/"` | `index` | `index` | |
//! | `/about` | `index` | `about` | |
//! | `/blog/post` | `blog` | `post` | |
//! | `/blog/post/draft/preview` | `blog` | `post` | `draft`, `preview` |
//!
//! Controller and action names pass through [`filter`]; flags are kept as
//! decoded.

use std::borrow::Cow;
use std::collections::BTreeSet;

/// Controller and action used when the path does not name one.
pub const DEFAULT_NAME: &str = "index";

/// Decodes a URL component. `+` decodes to a space and invalid UTF-8 is
/// replaced rather than rejected.
pub fn url_decode(input: &str) -> String {
    let spaced: Cow<'_, str> = if input.contains('+') {
        Cow::Owned(input.replace('+', " "))
    } else {
        Cow::Borrowed(input)
    };
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes()))
            .into_owned(),
    }
}

/// Reduces a path segment to a safe identifier.
///
/// The segment is URL-decoded and trimmed, every character other than ASCII
/// letters, digits, whitespace and `-` is dropped, whitespace runs become a
/// single `-`, and the result is lowercased.
///
/// ```rust
/// use waypost_dispatch::filter;
///
/// assert_eq!(filter("My%20Action!"), "my-action");
/// assert_eq!(filter("  Hello   World  "), "hello-world");
/// assert_eq!(filter(&filter("Hello World")), "hello-world");
/// ```
pub fn filter(segment: &str) -> String {
    let decoded = url_decode(segment);
    let kept: String = decoded
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c.to_ascii_lowercase());
            in_space = false;
        }
    }
    out
}

/// The controller, action and flags named by a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub controller: String,
    pub action: String,
    pub flags: BTreeSet<String>,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            controller: DEFAULT_NAME.to_string(),
            action: DEFAULT_NAME.to_string(),
            flags: BTreeSet::new(),
        }
    }
}

impl Route {
    /// Parses a request path whose query string, if any, is already gone.
    /// A `?` left in the path is just another character for [`filter`].
    pub fn parse(path: &str) -> Self {
        let decoded = url_decode(path);

        let mut segments: Vec<&str> = decoded.split('/').collect();
        if segments.first().is_some_and(|s| s.is_empty()) {
            segments.remove(0);
        }

        let mut route = Route::default();
        match segments.as_slice() {
            [] => {}
            [action] => route.set_action(action),
            [controller, action, flags @ ..] => {
                route.set_controller(controller);
                route.set_action(action);
                route.flags = flags
                    .iter()
                    .filter(|f| !f.is_empty())
                    .map(|f| f.to_string())
                    .collect();
            }
        }
        route
    }

    fn set_controller(&mut self, segment: &str) {
        let name = filter(segment);
        if !name.is_empty() {
            self.controller = name;
        }
    }

    fn set_action(&mut self, segment: &str) {
        let name = filter(segment);
        if !name.is_empty() {
            self.action = name;
        }
    }

    /// Returns `true` if `name` was passed as a flag.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }
}

/// Returns the part of `uri` before the query string.
pub fn strip_query(uri: &str) -> &str {
    uri.split_once('?').map_or(uri, |(path, _)| path)
}
