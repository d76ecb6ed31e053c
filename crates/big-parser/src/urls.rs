//! URL rewriting in rendered markup.

use std::borrow::Cow;
use std::sync::LazyLock;

use big_router::{UrlRouter, parse_internal_url};
use regex::{Captures, Regex};

/// Internal link as inserted by the editor. Group 1 is the query string.
///
/// The closing quote is not part of the match and survives substitution.
static INTERNAL_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="index\.php\?([^"]*)"#).unwrap());

/// `src`, `href` or `poster` attribute. Group 1 is the name, group 2 the value.
static ASSET_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(src|href|poster)="([^"]*)""#).unwrap());

/// URI scheme prefix such as `http:` or `mailto:`.
static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+:").unwrap());

/// Replace internal `href="index.php?..."` links with public URLs.
///
/// Links the router cannot map are left as they are.
pub fn rewrite_internal_urls<'a>(
    markup: &'a str,
    router: &dyn UrlRouter,
    route_param: &str,
) -> Cow<'a, str> {
    INTERNAL_HREF_RE.replace_all(markup, |caps: &Captures<'_>| {
        let url = parse_internal_url(&caps[1], route_param).and_then(|route| router.create_url(&route));
        match url {
            Some(url) => format!(r#"href="{url}"#),
            None => {
                tracing::debug!(query = &caps[1], "No public URL for internal link");
                caps[0].to_owned()
            }
        }
    })
}

/// Prefix `base` onto relative `src`, `href` and `poster` values.
///
/// Values starting with `/`, `#`, `'` or a URI scheme are left alone.
pub fn prefix_base_url<'a>(markup: &'a str, base: &str) -> Cow<'a, str> {
    if base.is_empty() {
        return Cow::Borrowed(markup);
    }
    ASSET_ATTR_RE.replace_all(markup, |caps: &Captures<'_>| {
        let value = &caps[2];
        if is_absolute(value) {
            caps[0].to_owned()
        } else {
            format!(r#"{}="{base}{value}""#, &caps[1])
        }
    })
}

fn is_absolute(value: &str) -> bool {
    value.starts_with(['/', '#', '\'']) || SCHEME_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use big_router::Route;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Maps `app/page/show&id=N` to `/page-N`.
    struct PageRouter;

    impl UrlRouter for PageRouter {
        fn create_url(&self, route: &Route) -> Option<String> {
            (route.path == "app/page/show").then(|| format!("/page-{}", route.params["id"]))
        }

        fn parse_request(&self, _path: &str) -> Option<Route> {
            None
        }
    }

    #[test]
    fn test_prefix_relative_src() {
        let out = prefix_base_url(r#"<img src="photo.png">"#, "http://example.com/");

        assert_eq!(out, r#"<img src="http://example.com/photo.png">"#);
    }

    #[test]
    fn test_absolute_values_unchanged() {
        let markup = concat!(
            r#"<img src="/abs/photo.png">"#,
            r#"<a href="https://other.org/x">"#,
            r#"<a href="mailto:me@example.com">"#,
            r##"<a href="#top">"##,
            r#"<a href="'quoted'">"#,
        );

        let out = prefix_base_url(markup, "http://example.com/");

        assert_eq!(out, markup);
    }

    #[test]
    fn test_prefix_poster_and_href() {
        let out = prefix_base_url(r#"<video poster="p.jpg"></video><a href="docs/a.pdf">"#, "/site/");

        assert_eq!(out, r#"<video poster="/site/p.jpg"></video><a href="/site/docs/a.pdf">"#);
    }

    #[test]
    fn test_prefix_matches_inside_longer_attribute_names() {
        let out = prefix_base_url(r#"<img data-src="lazy.png">"#, "http://cdn/");

        assert_eq!(out, r#"<img data-src="http://cdn/lazy.png">"#);
    }

    #[test]
    fn test_empty_base_borrows() {
        let out = prefix_base_url(r#"<img src="photo.png">"#, "");

        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_rewrite_internal_url() {
        let out = rewrite_internal_urls(
            r#"<a href="index.php?r=app/page/show&amp;id=3">About</a>"#,
            &PageRouter,
            "r",
        );

        assert_eq!(out, r#"<a href="/page-3">About</a>"#);
    }

    #[test]
    fn test_unmapped_internal_url_kept() {
        let markup = r#"<a href="index.php?r=shop/cart">Cart</a><a href="index.php?id=4">x</a>"#;

        let out = rewrite_internal_urls(markup, &PageRouter, "r");

        assert_eq!(out, markup);
    }
}
