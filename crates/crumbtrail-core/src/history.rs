//! Browser history surface: the current location and non-navigating URL rewrites.

use std::sync::RwLock;

use crate::error::{CrumbError, Result};
use crate::location::PageLocation;
use crate::query::QueryParams;

/// History events delivered to a mounted breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    /// The user navigated back (`popstate`).
    Back,
}

/// Access to the browser's location and history stack.
pub trait BrowserHistory: Send + Sync {
    fn location(&self) -> Result<PageLocation>;

    /// Replaces the current history entry's query without navigating and
    /// without pushing a new entry.
    fn replace_state(&self, params: &QueryParams) -> Result<()>;
}

/// History double holding a single location.
#[derive(Debug)]
pub struct MemoryHistory {
    location: RwLock<PageLocation>,
    replacements: RwLock<Vec<QueryParams>>,
}

impl MemoryHistory {
    pub fn new(location: PageLocation) -> Self {
        Self {
            location: RwLock::new(location),
            replacements: RwLock::new(Vec::new()),
        }
    }

    pub fn parse(href: &str) -> Result<Self> {
        Ok(Self::new(PageLocation::parse(href)?))
    }

    /// Simulates a full navigation to `href`.
    pub fn navigate(&self, href: &str) -> Result<()> {
        let location = PageLocation::parse(href)?;
        let mut slot = self
            .location
            .write()
            .map_err(|e| CrumbError::internal(format!("history lock poisoned: {}", e)))?;
        *slot = location;
        Ok(())
    }

    /// Every query passed to `replace_state`, oldest first.
    pub fn replacements(&self) -> Vec<QueryParams> {
        self.replacements
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl BrowserHistory for MemoryHistory {
    fn location(&self) -> Result<PageLocation> {
        self.location
            .read()
            .map(|l| l.clone())
            .map_err(|e| CrumbError::internal(format!("history lock poisoned: {}", e)))
    }

    fn replace_state(&self, params: &QueryParams) -> Result<()> {
        let mut location = self
            .location
            .write()
            .map_err(|e| CrumbError::internal(format!("history lock poisoned: {}", e)))?;
        location.set_query(params);
        drop(location);

        let mut replacements = self
            .replacements
            .write()
            .map_err(|e| CrumbError::internal(format!("history lock poisoned: {}", e)))?;
        replacements.push(params.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query;

    #[test]
    fn test_replace_state_rewrites_query_only() {
        let history = MemoryHistory::parse("http://localhost/d/abc/slug?orgId=1").unwrap();
        let params = query::decode("?orgId=1&breadcrumb=x,y");

        history.replace_state(&params).unwrap();

        let loc = history.location().unwrap();
        assert_eq!(loc.pathname(), "/d/abc/slug");
        assert_eq!(loc.search(), "?orgId=1&breadcrumb=x,y");
        assert_eq!(history.replacements(), vec![params]);
    }

    #[test]
    fn test_navigate() {
        let history = MemoryHistory::parse("http://localhost/d/abc/slug").unwrap();
        history.navigate("http://localhost/d/def/other?orgId=2").unwrap();
        assert_eq!(history.location().unwrap().current_dashboard_id(), Some("def"));
        assert!(history.navigate("not a url").is_err());
    }
}
