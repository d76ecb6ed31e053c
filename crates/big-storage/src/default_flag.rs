//! Uniqueness of the "is default" flag.
//!
//! At most one template and one menu item may be flagged as default. The
//! flag is kept unique at write time: before a flagged record is committed,
//! every other flagged record is demoted.

use crate::row::{MenuData, NodeRow, TemplateRecord};

/// A persisted record carrying the "is default" flag.
pub trait DefaultFlag {
    fn record_id(&self) -> i64;
    fn is_default(&self) -> bool;
    fn set_default(&mut self, value: bool);
}

impl DefaultFlag for TemplateRecord {
    fn record_id(&self) -> i64 {
        self.id
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, value: bool) {
        self.is_default = value;
    }
}

impl DefaultFlag for NodeRow<MenuData> {
    fn record_id(&self) -> i64 {
        self.id
    }

    fn is_default(&self) -> bool {
        self.data.is_default
    }

    fn set_default(&mut self, value: bool) {
        self.data.is_default = value;
    }
}

/// Pre-commit step run by storage backends before saving `incoming`.
///
/// When `incoming` is flagged as default, clears the flag on every other
/// record in `existing`. Returns the ids that were demoted.
pub fn demote_previous_default<T: DefaultFlag>(existing: &mut [T], incoming: &T) -> Vec<i64> {
    if !incoming.is_default() {
        return Vec::new();
    }

    let mut demoted = Vec::new();
    for record in existing
        .iter_mut()
        .filter(|r| r.is_default() && r.record_id() != incoming.record_id())
    {
        record.set_default(false);
        demoted.push(record.record_id());
    }

    if !demoted.is_empty() {
        tracing::debug!(new_default = incoming.record_id(), ?demoted, "Demoted previous default");
    }
    demoted
}
