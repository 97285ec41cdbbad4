//! Per-node request-record bookkeeping with type-dependent merge rules.

use std::sync::Arc;

use crate::data::{RecordOrigin, RequestRecord};
use crate::tree::{NodeId, SiteTree};

impl SiteTree {
    pub fn current_record(&self, id: NodeId) -> Option<Arc<RequestRecord>> {
        self.get(id)?.current_record.clone()
    }

    /// Point-in-time copy of the past-record handles, oldest first.
    pub fn past_records(&self, id: NodeId) -> Vec<Arc<RequestRecord>> {
        self.get(id)
            .map(|n| n.past_records.clone())
            .unwrap_or_default()
    }

    /// Install `record` as the node's current record.
    ///
    /// With an existing current record the merge depends on origin:
    /// scanner-generated records stack up in the past list (one entry per
    /// scan pass) without displacing the current record or taking the
    /// back-reference. Any other origin replaces the current record; a
    /// manual origin first clears the just-discovered flag and any
    /// clear-on-visit annotations. The displaced record lands in the past
    /// list - unconditionally when it was scanner-generated, otherwise only
    /// when not already there.
    pub fn set_current_record(&mut self, id: NodeId, record: Arc<RequestRecord>) {
        let Some(node) = self.get_mut(id) else { return };

        if node.current_record.is_none() {
            record.set_node(Some(id));
            node.current_record = Some(record);
            return;
        }

        if record.origin() == RecordOrigin::Scanner {
            node.past_records.push(record);
            return;
        }

        let mut cleared_discovery = false;
        let mut cleared_annotations = false;
        if record.origin().is_manual() {
            if node.just_discovered {
                node.just_discovered = false;
                cleared_discovery = true;
            }
            if node.clear_on_visit.iter().any(|&clear| clear) {
                let annotations = std::mem::take(&mut node.annotations);
                let flags = std::mem::take(&mut node.clear_on_visit);
                for (annotation, clear) in annotations.into_iter().zip(flags) {
                    if !clear {
                        node.annotations.push(annotation);
                        node.clear_on_visit.push(clear);
                    }
                }
                cleared_annotations = true;
            }
        }

        if let Some(old) = node.current_record.take() {
            let already_past = node.past_records.iter().any(|r| r.id() == old.id());
            if old.origin() == RecordOrigin::Scanner || !already_past {
                node.past_records.push(old);
            }
        }
        record.set_node(Some(id));
        node.current_record = Some(record);

        if cleared_discovery {
            self.notify(id);
        }
        if cleared_annotations {
            self.notify(id);
        }
    }

    /// True when the current record or any past record has this origin.
    pub fn has_history_type(&self, id: NodeId, origin: RecordOrigin) -> bool {
        let Some(node) = self.get(id) else { return false };
        let Some(current) = &node.current_record else {
            return false;
        };
        current.origin() == origin || node.past_records.iter().any(|r| r.origin() == origin)
    }

    /// True only when every record ever associated with this node, current
    /// and past alike, has this origin.
    pub fn has_just_history_type(&self, id: NodeId, origin: RecordOrigin) -> bool {
        let Some(node) = self.get(id) else { return false };
        let Some(current) = &node.current_record else {
            return false;
        };
        current.origin() == origin && node.past_records.iter().all(|r| r.origin() == origin)
    }
}
