//! The [`Route`] value type and internal-URL codec.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Query parameter carrying the route in dynamic URLs.
pub const DEFAULT_ROUTE_PARAM: &str = "r";

/// Script prefix of dynamic URLs.
const SCRIPT_PREFIX: &str = "index.php?";

/// Unreserved characters: A-Z a-z 0-9 - . _ ~
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// An internal route with its query parameters.
///
/// Parameters are kept sorted so that [`Route::to_internal`] is canonical.
/// Stored routes may list parameters in any order or encode them
/// differently, so compare routes as values rather than as strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Route {
    /// Route path, e.g. `app/page/show`.
    pub path: String,
    /// Query parameters.
    pub params: BTreeMap<String, String>,
}

impl Route {
    /// Route without parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Parse the stored form `path&k=v&k2=v2`.
    ///
    /// ```
    /// use big_router::Route;
    ///
    /// let route = Route::parse("app/page/show&id=3");
    /// assert_eq!(route.path, "app/page/show");
    /// assert_eq!(route.params["id"], "3");
    /// ```
    pub fn parse(stored: &str) -> Self {
        let (path, query) = stored.split_once('&').unwrap_or((stored, ""));
        Self {
            path: path.to_owned(),
            params: decode_pairs(query).collect(),
        }
    }

    /// Stored form, `path` followed by `&`-joined encoded parameters.
    pub fn to_internal(&self) -> String {
        let mut url = self.path.clone();
        if !self.params.is_empty() {
            url.push('&');
            url.push_str(&encode_pairs(&self.params));
        }
        url
    }

    /// Dynamic URL form, e.g. `index.php?r=app/page/show&id=3`.
    pub fn to_dynamic_url(&self, route_param: &str) -> String {
        dynamic_url(&self.to_internal(), route_param)
    }

    /// Whether the stored form `stored` names this route.
    ///
    /// ```
    /// use big_router::Route;
    ///
    /// let route = Route::parse("blog/post&id=9&lang=da");
    /// assert!(route.matches("blog/post&lang=da&id=9"));
    /// ```
    pub fn matches(&self, stored: &str) -> bool {
        let (path, query) = stored.split_once('&').unwrap_or((stored, ""));
        path == self.path && decode_pairs(query).collect::<BTreeMap<_, _>>() == self.params
    }

    /// Whether the route has no path.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_internal())
    }
}

/// Dynamic URL for a route in stored form, kept as written.
///
/// ```
/// use big_router::dynamic_url;
///
/// assert_eq!(dynamic_url("blog/post&lang=da&id=9", "r"), "index.php?r=blog/post&lang=da&id=9");
/// ```
pub fn dynamic_url(stored: &str, route_param: &str) -> String {
    format!("{SCRIPT_PREFIX}{route_param}={stored}")
}

/// Decode a dynamic URL query as written in authored HTML.
///
/// Accepts the query with or without the `index.php?` prefix and with
/// HTML-escaped separators (`&amp;`). The value of `route_param` becomes
/// the route path; every other pair becomes a parameter. Returns `None`
/// when the route parameter is missing.
///
/// ```
/// use big_router::parse_internal_url;
///
/// let route = parse_internal_url("index.php?r=app/page/show&amp;id=3", "r").unwrap();
/// assert_eq!(route.to_internal(), "app/page/show&id=3");
/// ```
pub fn parse_internal_url(query: &str, route_param: &str) -> Option<Route> {
    let query = query.replace("&amp;", "&");
    let query = query.strip_prefix(SCRIPT_PREFIX).unwrap_or(&query);

    let mut path = None;
    let mut params = BTreeMap::new();
    for (key, value) in decode_pairs(query) {
        if key == route_param {
            path = Some(value);
        } else {
            params.insert(key, value);
        }
    }

    path.map(|path| Route { path, params })
}

fn decode_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
}

fn decode_component(input: &str) -> String {
    let input = input.replace('+', " ");
    percent_decode_str(&input).decode_utf8_lossy().into_owned()
}

fn encode_pairs(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_ENCODE_SET),
                utf8_percent_encode(v, QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
