// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};

use crate::{User, UserField, UserId};

/// Local mirror of the server's user list.
///
/// The list is either clean or dirty for exactly one user. The list as last
/// received from the server is kept alongside; reverting restores a row from
/// it, not from whatever the row held when the marker last moved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserCollection {
    users: Vec<User>,
    server: Vec<User>,
    dirty: Option<UserId>,
}

impl UserCollection {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            server: users.clone(),
            users,
            dirty: None,
        }
    }

    /// Replaces everything, in server order. Unsaved edits are gone afterwards.
    pub fn replace_all(&mut self, users: Vec<User>) {
        self.server = users.clone();
        self.users = users;
        self.dirty = None;
    }

    pub fn set_field(&mut self, index: usize, field: UserField, value: String) -> Result<()> {
        let len = self.users.len();
        let user = self
            .users
            .get_mut(index)
            .ok_or_else(|| anyhow!("row {index} is out of range ({len} users loaded)"))?;
        self.dirty = Some(user.id);
        user.set_field(field, value);
        Ok(())
    }

    /// Restores the server copy of `id` if it carries the dirty marker.
    pub fn revert(&mut self, id: UserId) -> bool {
        if self.dirty.take_if(|dirty| *dirty == id).is_none() {
            return false;
        }
        let Some(pristine) = self.server.iter().find(|user| user.id == id) else {
            return false;
        };
        match self.users.iter_mut().find(|user| user.id == id) {
            Some(user) => {
                *user = pristine.clone();
                true
            }
            None => false,
        }
    }

    pub fn is_dirty(&self, id: UserId) -> bool {
        self.dirty == Some(id)
    }

    pub fn get(&self, index: usize) -> Option<&User> {
        self.users.get(index)
    }

    pub fn position(&self, id: UserId) -> Option<usize> {
        self.users.iter().position(|user| user.id == id)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }
}
