//! Node label assembly for the presentation boundary: ordered icons
//! followed by the escaped display name.

use std::fmt;

use crate::data::{Confidence, Finding};
use crate::tree::{NodeId, SiteTree};

/// Icon shown while a node is known only from automated crawling.
pub const CRAWL_BADGE_ICON: &str = "icon/crawl-badge";

/// Ordered label parts for one tree row: the highest-severity finding icon
/// (false positives excluded), the crawl badge, each custom annotation icon
/// in insertion order, then the escaped node name.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLabel {
    pub icons: Vec<String>,
    pub text: String,
}

pub fn node_label(tree: &SiteTree, id: NodeId) -> NodeLabel {
    let mut icons = Vec::new();

    let mut top: Option<Finding> = None;
    for finding in tree.findings(id) {
        if finding.confidence == Confidence::FalsePositive {
            continue;
        }
        // Strictly greater keeps the first of equally severe findings.
        if top.as_ref().is_none_or(|t| finding.severity > t.severity) {
            top = Some(finding);
        }
    }
    if let Some(finding) = top {
        icons.push(finding.icon);
    }

    if tree.just_discovered(id) {
        icons.push(CRAWL_BADGE_ICON.to_string());
    }
    for (annotation, _) in tree.annotations(id) {
        icons.push(annotation);
    }

    NodeLabel {
        icons,
        text: escape_html(tree.name(id)),
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<html><body>")?;
        for icon in &self.icons {
            write!(f, "&nbsp;<img src=\"{}\">&nbsp;", icon)?;
        }
        write!(f, "{}</body></html>", self.text)
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
            _ => out.push(c),
        }
    }
    out
}
