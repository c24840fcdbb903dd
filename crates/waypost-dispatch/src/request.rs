//! Request sources.
//!
//! The dispatcher needs two things from a request: a named query parameter
//! (the path can be passed as `?q=/blog/post`) and the request URI. Anything
//! that can answer both implements [`RequestSource`].

use std::env;

use crate::route::{strip_query, url_decode};

/// Where the dispatcher reads the request path from.
pub trait RequestSource {
    /// Decoded value of the query parameter `name`, if present.
    fn query_param(&self, name: &str) -> Option<String>;

    /// The raw request URI, query string included.
    fn request_uri(&self) -> String;
}

/// A request built from a URI.
///
/// ```rust
/// use waypost_dispatch::{Request, RequestSource};
///
/// let request = Request::from_uri("/index.cgi?q=/blog/post&page=2");
/// assert_eq!(request.path(), "/index.cgi");
/// assert_eq!(request.query_param("q").as_deref(), Some("/blog/post"));
/// assert_eq!(request.query_param("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    uri: String,
    query: Vec<(String, String)>,
}

impl Request {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let query = match uri.split_once('?') {
            Some((_, query)) => parse_query(query),
            None => Vec::new(),
        };
        Self { uri, query }
    }

    /// The URI as given.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI without its query string.
    pub fn path(&self) -> &str {
        strip_query(&self.uri)
    }
}

impl RequestSource for Request {
    fn query_param(&self, name: &str) -> Option<String> {
        lookup(&self.query, name)
    }

    fn request_uri(&self) -> String {
        self.uri.clone()
    }
}

/// A request described by CGI environment variables.
///
/// `REQUEST_URI` supplies the URI and `QUERY_STRING` the parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgiRequest {
    request_uri: String,
    query: Vec<(String, String)>,
}

impl CgiRequest {
    pub fn new(request_uri: impl Into<String>, query_string: &str) -> Self {
        Self {
            request_uri: request_uri.into(),
            query: parse_query(query_string),
        }
    }

    /// Reads `REQUEST_URI` and `QUERY_STRING` from the process environment.
    /// Missing variables count as empty.
    pub fn from_env() -> Self {
        let request_uri = env::var("REQUEST_URI").unwrap_or_default();
        let query_string = env::var("QUERY_STRING").unwrap_or_default();
        Self::new(request_uri, &query_string)
    }
}

impl RequestSource for CgiRequest {
    fn query_param(&self, name: &str) -> Option<String> {
        lookup(&self.query, name)
    }

    fn request_uri(&self) -> String {
        self.request_uri.clone()
    }
}

/// Splits `a=1&b=2` into decoded pairs. A key without `=` gets an empty value.
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (url_decode(key), url_decode(value)),
            None => (url_decode(pair), String::new()),
        })
        .collect()
}

// Last occurrence wins.
fn lookup(query: &[(String, String)], name: &str) -> Option<String> {
    query
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}
