//! Internal routes and the URL router boundary.
//!
//! Content authored in the editor links to pages through *internal* URLs of
//! the form `index.php?r=app/page/show&id=3`. Menu items store the same
//! route without the script prefix (`app/page/show&id=3`). This crate
//! provides the [`Route`] value both forms decode into, and the
//! [`UrlRouter`] trait that turns routes into public SEO paths and back.

mod route;

pub use route::{DEFAULT_ROUTE_PARAM, Route, dynamic_url, parse_internal_url};

/// Two-way mapping between internal routes and public paths.
pub trait UrlRouter: Send + Sync {
    /// Public path for `route`, or `None` when this router has no mapping.
    fn create_url(&self, route: &Route) -> Option<String>;

    /// Internal route for a public request path, or `None` when unmatched.
    fn parse_request(&self, path: &str) -> Option<Route>;
}
