use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::data::{Finding, RecordOrigin, RequestRecord};
use crate::events::{ChangeSink, TreeEvent};

/// Stable handle to a node in a [`SiteTree`]. Nodes are never freed, so a
/// `NodeId` stays valid for the life of the tree that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One location (host/path/request) in the site hierarchy.
///
/// Structure is index-based: the parent back-reference and the child list
/// both hold `NodeId`s into the owning tree's arena, so the mutual
/// parent/child references never form an ownership cycle.
#[derive(Debug)]
pub(crate) struct SiteNode {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) findings: Vec<Finding>,
    pub(crate) current_record: Option<Arc<RequestRecord>>,
    pub(crate) past_records: Vec<Arc<RequestRecord>>,
    pub(crate) included_in_scope: bool,
    pub(crate) excluded_from_scope: bool,
    pub(crate) just_discovered: bool,
    // Parallel columns, always the same length: annotation id and whether a
    // manual visit clears it.
    pub(crate) annotations: Vec<String>,
    pub(crate) clear_on_visit: Vec<bool>,
}

impl SiteNode {
    fn new(name: String, just_discovered: bool) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            findings: Vec::new(),
            current_record: None,
            past_records: Vec::new(),
            included_in_scope: false,
            excluded_from_scope: false,
            just_discovered,
            annotations: Vec::new(),
            clear_on_visit: Vec::new(),
        }
    }
}

/// The site hierarchy for one scan session.
///
/// All node state lives in the tree's arena and is addressed by [`NodeId`];
/// concurrent producers share the tree behind a lock of their choosing.
/// Mutations that change observable state emit a [`TreeEvent`] through the
/// subscribed channel, giving observers a serialized view of changes.
pub struct SiteTree {
    nodes: Vec<SiteNode>,
    pub(crate) sink: ChangeSink,
}

impl SiteTree {
    /// Create a tree containing only the (unnamed) root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![SiteNode::new(String::new(), false)],
            sink: ChangeSink::default(),
        }
    }

    /// Install a change-event subscriber, replacing any previous one.
    /// Pair the receiver with [`crate::events::spawn_observer`] to drain it.
    pub fn subscribe(&mut self) -> UnboundedReceiver<TreeEvent> {
        self.sink.subscribe()
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&SiteNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut SiteNode> {
        self.nodes.get_mut(id.0)
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Dispatch a node-changed event; no-op for ids this tree never issued.
    pub(crate) fn notify(&self, id: NodeId) {
        if self.contains(id) {
            self.sink.notify(id);
        }
    }

    /// Create a detached node. A crawler-discovered origin marks the node as
    /// just-discovered until a manual request visits it.
    pub fn new_node(&mut self, origin: RecordOrigin, name: impl Into<String>) -> NodeId {
        let name = name.into();
        debug!("new node {:?} ({})", name, origin.as_str());
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(SiteNode::new(name, origin == RecordOrigin::Crawler));
        id
    }

    /// Create a node already wired under `parent` in both directions.
    pub fn new_child(&mut self, parent: NodeId, origin: RecordOrigin, name: impl Into<String>) -> NodeId {
        let id = self.new_node(origin, name);
        self.attach_child(parent, id);
        id
    }

    /// Rewire only the parent back-reference. Keeping the parent's child
    /// list consistent is the tree-builder's job; a self-assignment is
    /// silently ignored.
    pub fn set_parent(&mut self, child: NodeId, new_parent: Option<NodeId>) {
        if new_parent == Some(child) {
            return;
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = new_parent;
        }
    }

    /// Wire `child` under `parent` in both directions, detaching it from
    /// any previous parent's child list first.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.contains(parent) {
            return;
        }
        let Some(node) = self.get_mut(child) else { return };
        let old_parent = node.parent.replace(parent);
        if let Some(old) = old_parent
            && old != parent
            && let Some(old_node) = self.get_mut(old)
        {
            old_node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.get_mut(parent)
            && !node.children.contains(&child)
        {
            node.children.push(child);
        }
    }

    pub fn name(&self, id: NodeId) -> &str {
        self.get(id).map(|n| n.name.as_str()).unwrap_or("")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    pub fn just_discovered(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.just_discovered)
    }

    /// Folder-boundary predicate used by the tree builder: true when
    /// `candidate` sorts strictly before this node's name.
    pub fn is_grouping_candidate(&self, id: NodeId, candidate: &str) -> bool {
        self.get(id).is_some_and(|n| candidate < n.name.as_str())
    }

    /// Breadcrumb path for display: empty for the root, the raw name for a
    /// direct child of the root, otherwise the parent's path, a slash, and
    /// this node's name - cleaned of its method prefix, parameter summary
    /// and query string when the node is a leaf.
    pub fn hierarchic_path(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        let Some(parent) = node.parent else {
            return String::new();
        };
        if self.get(parent).is_some_and(|p| p.parent.is_none()) {
            return node.name.clone();
        }
        let name = if node.children.is_empty() {
            clean_leaf_name(&node.name)
        } else {
            node.name.clone()
        };
        format!("{}/{}", self.hierarchic_path(parent), name)
    }

    /// Add an annotation pair unless the id is already present.
    pub fn add_annotation(&mut self, id: NodeId, annotation: &str, clear_on_visit: bool) {
        let Some(node) = self.get_mut(id) else { return };
        if node.annotations.iter().any(|a| a == annotation) {
            return;
        }
        node.annotations.push(annotation.to_string());
        node.clear_on_visit.push(clear_on_visit);
        self.notify(id);
    }

    /// Remove an annotation pair; absent annotations are a no-op.
    pub fn remove_annotation(&mut self, id: NodeId, annotation: &str) {
        let Some(node) = self.get_mut(id) else { return };
        let Some(slot) = node.annotations.iter().position(|a| a == annotation) else {
            return;
        };
        node.annotations.remove(slot);
        node.clear_on_visit.remove(slot);
        self.notify(id);
    }

    /// Replace both annotation columns at once. The columns must pair up.
    pub fn set_annotations(&mut self, id: NodeId, annotations: Vec<String>, clear_on_visit: Vec<bool>) {
        if annotations.len() != clear_on_visit.len() {
            warn!(
                "mismatched annotation columns ({} ids, {} flags), ignoring",
                annotations.len(),
                clear_on_visit.len()
            );
            return;
        }
        let Some(node) = self.get_mut(id) else { return };
        node.annotations = annotations;
        node.clear_on_visit = clear_on_visit;
    }

    /// Snapshot of the (annotation, clear-on-visit) pairs in insertion order.
    pub fn annotations(&self, id: NodeId) -> Vec<(String, bool)> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        node.annotations
            .iter()
            .cloned()
            .zip(node.clear_on_visit.iter().copied())
            .collect()
    }

    pub fn included_in_scope(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.included_in_scope)
    }

    pub fn excluded_from_scope(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.excluded_from_scope)
    }

    /// Set the inclusion flag, optionally broadcasting top-down to every
    /// descendant.
    pub fn set_included(&mut self, id: NodeId, value: bool, recurse: bool) {
        let Some(node) = self.get_mut(id) else { return };
        node.included_in_scope = value;
        self.notify(id);
        if recurse {
            for child in self.children(id).to_vec() {
                self.set_included(child, value, recurse);
            }
        }
    }

    /// Set the exclusion flag; exclusion dominates, so excluding a node also
    /// drops it from the included set. Optionally broadcasts top-down.
    pub fn set_excluded(&mut self, id: NodeId, value: bool, recurse: bool) {
        let Some(node) = self.get_mut(id) else { return };
        node.excluded_from_scope = value;
        if value {
            node.included_in_scope = false;
        }
        self.notify(id);
        if recurse {
            for child in self.children(id).to_vec() {
                self.set_excluded(child, value, recurse);
            }
        }
    }
}

impl Default for SiteTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Display cleanup for leaf names, applied in sequence to the progressively
/// shortened string: drop through the first colon (method prefix), drop from
/// the first paren (parameter summary), drop from the first question mark
/// (query string). A separator at position zero is left alone.
fn clean_leaf_name(raw: &str) -> String {
    let mut name = raw;
    if let Some(i) = name.find(':')
        && i > 0
    {
        name = &name[i + 1..];
    }
    if let Some(i) = name.find('(')
        && i > 0
    {
        name = &name[..i];
    }
    if let Some(i) = name.find('?')
        && i > 0
    {
        name = &name[..i];
    }
    name.to_string()
}
