// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{NewUser, User, UserId};

/// The remote `/user` collection. Every failure, transport or status, is a
/// single kind of error.
pub trait UserApi {
    fn list_users(&mut self) -> Result<Vec<User>>;
    fn create_user(&mut self, user: &NewUser) -> Result<()>;
    fn update_user(&mut self, user: &User) -> Result<()>;
    fn delete_user(&mut self, id: UserId) -> Result<()>;
}

impl<T: UserApi + ?Sized> UserApi for Box<T> {
    fn list_users(&mut self) -> Result<Vec<User>> {
        (**self).list_users()
    }

    fn create_user(&mut self, user: &NewUser) -> Result<()> {
        (**self).create_user(user)
    }

    fn update_user(&mut self, user: &User) -> Result<()> {
        (**self).update_user(user)
    }

    fn delete_user(&mut self, id: UserId) -> Result<()> {
        (**self).delete_user(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    Refresh,
    Create,
    Update,
    Delete,
}

impl RemoteOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::Create => "create",
            Self::Update => "save",
            Self::Delete => "delete",
        }
    }
}
