//! Bottom-up finding aggregation: a node carries a finding iff it raised it
//! directly or at least one of its descendants still carries it.

use crate::data::Finding;
use crate::tree::{NodeId, SiteTree};

impl SiteTree {
    /// True when the node's own set holds an equal finding.
    pub fn has_finding(&self, id: NodeId, finding: &Finding) -> bool {
        self.get(id).is_some_and(|n| n.findings.contains(finding))
    }

    /// Point-in-time copy of the node's findings, safe to iterate while
    /// producers keep mutating the tree.
    pub fn findings(&self, id: NodeId) -> Vec<Finding> {
        self.get(id).map(|n| n.findings.clone()).unwrap_or_default()
    }

    /// Record a finding on this node and every ancestor. Duplicates are
    /// ignored, which is also what terminates the upward propagation.
    pub fn add_finding(&mut self, id: NodeId, finding: Finding) {
        let Some(node) = self.get_mut(id) else { return };
        if node.findings.contains(&finding) {
            return;
        }
        node.findings.push(finding.clone());
        let parent = node.parent;
        if let Some(parent) = parent {
            self.add_finding(parent, finding);
        }
        self.notify(id);
    }

    /// Replace the locally-held finding with the same id, propagating the
    /// replacement up the ancestor chain. Nothing happens when no revision
    /// of the finding is held here.
    pub fn update_finding(&mut self, id: NodeId, finding: Finding) {
        let Some(node) = self.get_mut(id) else { return };
        let Some(slot) = node.findings.iter().position(|f| f.id == finding.id) else {
            return;
        };
        node.findings[slot] = finding.clone();
        let parent = node.parent;
        if let Some(parent) = parent {
            self.update_finding(parent, finding);
        }
    }

    /// Remove a finding from this node, then re-validate the ancestor chain:
    /// an ancestor keeps the finding as long as any other child subtree
    /// still carries it.
    pub fn delete_finding(&mut self, id: NodeId, finding: &Finding) {
        let Some(node) = self.get_mut(id) else { return };
        remove_first(&mut node.findings, finding);
        let parent = node.parent;
        if let Some(parent) = parent {
            self.clear_child_finding(parent, finding, id);
        }
        self.notify(id);
    }

    fn clear_child_finding(&mut self, id: NodeId, finding: &Finding, excluded: NodeId) {
        let Some(node) = self.get_mut(id) else { return };
        remove_first(&mut node.findings, finding);
        let parent = node.parent;
        let children = node.children.clone();
        for child in children {
            if child != excluded && self.has_finding(child, finding) {
                // A sibling subtree still carries it: restore and stop.
                if let Some(node) = self.get_mut(id) {
                    node.findings.push(finding.clone());
                }
                return;
            }
        }
        if let Some(parent) = parent {
            self.clear_child_finding(parent, finding, id);
        }
    }

    /// Remove a batch of findings at once. At each ancestor, findings still
    /// present in any immediate child's own set are spared; only genuinely
    /// orphaned ones propagate upward, and a change event fires only when
    /// the set actually changed.
    pub fn delete_findings(&mut self, id: NodeId, findings: &[Finding]) {
        let Some(node) = self.get_mut(id) else { return };
        let before = node.findings.len();
        node.findings.retain(|f| !findings.contains(f));
        if node.findings.len() == before {
            return;
        }
        let parent = node.parent;
        if let Some(parent) = parent {
            self.clear_child_findings(parent, findings.to_vec());
        }
        self.notify(id);
    }

    fn clear_child_findings(&mut self, id: NodeId, mut findings: Vec<Finding>) {
        let Some(node) = self.get(id) else { return };
        for &child in &node.children {
            if let Some(child_node) = self.get(child) {
                findings.retain(|f| !child_node.findings.contains(f));
            }
        }
        let Some(node) = self.get_mut(id) else { return };
        let before = node.findings.len();
        node.findings.retain(|f| !findings.contains(f));
        if node.findings.len() == before {
            return;
        }
        let parent = node.parent;
        if let Some(parent) = parent {
            self.clear_child_findings(parent, findings);
        }
        self.notify(id);
    }
}

fn remove_first(findings: &mut Vec<Finding>, target: &Finding) {
    if let Some(slot) = findings.iter().position(|f| f == target) {
        findings.remove(slot);
    }
}
