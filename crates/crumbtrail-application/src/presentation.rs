//! Presentation adapter: the mounted breadcrumb panel.
//!
//! Holds a display-bound copy of the trail received from the reconciler and
//! turns it into links. Clicks are forwarded to the reconciler; the panel
//! never edits the trail itself.

use std::sync::Arc;

use crumbtrail_core::breadcrumb::BreadcrumbList;
use crumbtrail_core::error::Result;
use tokio::sync::watch;

use crate::reconciler::{BreadcrumbReconciler, NavigationTarget};

/// Chevron drawn after every item.
const SEPARATOR_SVG: &str = concat!(
    r#"<svg height="10" viewBox="0 0 10 10" width="10" xmlns="http://www.w3.org/2000/svg">"#,
    r#"<path d="M3.1,0L1.9,1.2L5.7,5L1.9,8.8L3.1,10l5-5L3.1,0z" />"#,
    r#"<path d="M-7-7h24v24H-7V-7z" fill="none" />"#,
    "</svg>"
);

/// One rendered breadcrumb item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadcrumbLink {
    pub index: usize,
    pub label: String,
    pub href: String,
}

pub struct BreadcrumbPanel {
    reconciler: Arc<BreadcrumbReconciler>,
    display: watch::Receiver<BreadcrumbList>,
}

impl BreadcrumbPanel {
    pub fn new(reconciler: Arc<BreadcrumbReconciler>) -> Self {
        let display = reconciler.subscribe();
        Self {
            reconciler,
            display,
        }
    }

    /// Mounts the panel: runs the reconciler's initialization.
    pub async fn mount(&mut self) -> Result<()> {
        self.reconciler.initialize().await?;
        self.display.mark_changed();
        Ok(())
    }

    /// Unmounts the panel, releasing the back-navigation listener.
    pub fn unmount(&self) {
        self.reconciler.teardown();
    }

    /// Whether rendering is switched off by `hide_text_in_root_dashboard`.
    pub fn is_hidden(&self) -> bool {
        self.reconciler.options().hide_text_in_root_dashboard
    }

    /// The displayed trail.
    pub fn displayed(&self) -> BreadcrumbList {
        self.display.borrow().clone()
    }

    /// Links to render, oldest first. `None` when the panel is hidden.
    pub fn links(&self) -> Option<Vec<BreadcrumbLink>> {
        if self.is_hidden() {
            return None;
        }
        let list = self.display.borrow();
        Some(
            list.entries()
                .iter()
                .enumerate()
                .map(|(index, entry)| BreadcrumbLink {
                    index,
                    label: entry.display_name.clone(),
                    href: entry.canonical_url.clone(),
                })
                .collect(),
        )
    }

    /// Renders the trail as an ordered list. Empty when the panel is hidden.
    pub fn render_html(&self) -> String {
        let Some(links) = self.links() else {
            return String::new();
        };

        let mut html = String::from(r#"<ol class="breadcrumb-container">"#);
        for link in &links {
            html.push_str(&format!(
                r#"<li><a href="{}" data-index="{}">{}</a>{}</li>"#,
                escape_html(&link.href),
                link.index,
                escape_html(&link.label),
                SEPARATOR_SVG
            ));
        }
        html.push_str("</ol>");
        html
    }

    /// Renders the trail as `A › B › C`. Empty when the panel is hidden.
    pub fn render_text(&self) -> String {
        self.links()
            .unwrap_or_default()
            .iter()
            .map(|link| link.label.as_str())
            .collect::<Vec<_>>()
            .join(" › ")
    }

    /// Handles a click on the item at `index`.
    pub async fn click(&self, index: usize) -> Result<NavigationTarget> {
        self.reconciler.navigate(index).await
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Q&A"</b> it's"#),
            "&lt;b&gt;&quot;Q&amp;A&quot;&lt;/b&gt; it&#39;s"
        );
    }
}
