// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::UserId;

/// Which rows show their detail section and which single row is being edited.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowInteractionState {
    expanded: BTreeSet<UserId>,
    editing: Option<UserId>,
}

impl RowInteractionState {
    pub fn toggle_expand(&mut self, id: UserId) -> bool {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
        self.is_expanded(id)
    }

    /// Switching to another row drops the previous target without touching its
    /// local edits.
    pub fn toggle_edit(&mut self, id: UserId) -> Option<UserId> {
        self.editing = if self.editing == Some(id) {
            None
        } else {
            Some(id)
        };
        self.editing
    }

    pub fn clear_edit(&mut self) {
        self.editing = None;
    }

    /// Forgets rows that are no longer listed, after a refresh.
    pub fn retain_present(&mut self, present: &BTreeSet<UserId>) {
        self.expanded.retain(|id| present.contains(id));
        self.editing = self.editing.filter(|id| present.contains(id));
    }

    pub fn is_expanded(&self, id: UserId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn is_editing(&self, id: UserId) -> bool {
        self.editing == Some(id)
    }

    pub fn editing(&self) -> Option<UserId> {
        self.editing
    }

    pub fn expanded(&self) -> &BTreeSet<UserId> {
        &self.expanded
    }
}
