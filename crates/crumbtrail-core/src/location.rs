//! The currently loaded page, as seen through the browser address bar.

use url::Url;

use crate::error::Result;
use crate::query::{self, QueryParams};

/// Path marker preceding a dashboard id, e.g. `/d/{uid}/{slug}`.
pub const DASHBOARD_PATH_MARKER: &str = "/d/";

/// A parsed browser location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    pub fn parse(href: &str) -> Result<Self> {
        Ok(Self {
            url: Url::parse(href)?,
        })
    }

    /// The full URL, as `window.location.href` would report it.
    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// The raw query string including the leading `?`, or empty.
    pub fn search(&self) -> String {
        self.url
            .query()
            .map(|q| format!("?{}", q))
            .unwrap_or_default()
    }

    pub fn query_params(&self) -> QueryParams {
        query::decode(&self.search())
    }

    /// Everything in the href before the first `/d/` marker.
    ///
    /// This is the prefix onto which `/d/{uid}` links are appended. For a
    /// location that is not a dashboard page the prefix is empty, which
    /// yields host-relative links.
    pub fn dashboard_root(&self) -> &str {
        let href = self.href();
        href.find(DASHBOARD_PATH_MARKER)
            .map_or("", |idx| &href[..idx])
    }

    /// Id of the dashboard shown at this location.
    ///
    /// Dashboard paths end in `/{uid}/{slug}`, so the id is the second to
    /// last path segment.
    pub fn current_dashboard_id(&self) -> Option<&str> {
        let mut segments = self.pathname().rsplit('/');
        segments.next()?;
        segments.next().filter(|s| !s.is_empty())
    }

    /// Replaces the query string, leaving the path and fragment alone.
    pub fn set_query(&mut self, params: &QueryParams) {
        let encoded = query::encode(params);
        let body = encoded.trim_start_matches('?');
        if body.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.set_query(Some(body));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_location_parts() {
        let loc =
            PageLocation::parse("http://grafana.local:3000/d/abc/overview?orgId=1&breadcrumb=x")
                .unwrap();
        assert_eq!(loc.pathname(), "/d/abc/overview");
        assert_eq!(loc.search(), "?orgId=1&breadcrumb=x");
        assert_eq!(loc.current_dashboard_id(), Some("abc"));
        assert_eq!(loc.dashboard_root(), "http://grafana.local:3000");
        assert_eq!(loc.query_params().get("breadcrumb"), Some("x"));
    }

    #[test]
    fn test_dashboard_root_under_subpath() {
        let loc = PageLocation::parse("https://example.com/grafana/d/xyz/slug").unwrap();
        assert_eq!(loc.dashboard_root(), "https://example.com/grafana");
        assert_eq!(loc.search(), "");
    }

    #[test]
    fn test_non_dashboard_location() {
        let loc = PageLocation::parse("http://localhost/").unwrap();
        assert_eq!(loc.dashboard_root(), "");
        assert_eq!(loc.current_dashboard_id(), None);
    }

    #[test]
    fn test_set_query() {
        let mut loc = PageLocation::parse("http://localhost/d/abc/slug?orgId=1").unwrap();
        let mut params = loc.query_params();
        params.insert("breadcrumb", Some("a,b".to_string()));
        loc.set_query(&params);
        assert_eq!(loc.href(), "http://localhost/d/abc/slug?orgId=1&breadcrumb=a,b");
    }

    #[test]
    fn test_parse_rejects_relative_href() {
        assert!(PageLocation::parse("/d/abc/slug").unwrap_err().is_config());
    }
}
