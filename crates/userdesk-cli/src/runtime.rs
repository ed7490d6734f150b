// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use userdesk_app::{NewUser, User, UserApi, UserId};
use userdesk_client::Client;
use userdesk_testkit::MemoryUserApi;

const DEMO_SEED: u64 = 20_260_101;
const DEMO_USERS: usize = 12;

/// The backend the session talks to: the HTTP API or the in-memory demo.
#[derive(Debug)]
pub enum ApiRuntime {
    Http(Client),
    Demo(MemoryUserApi),
}

impl ApiRuntime {
    pub fn demo() -> Self {
        Self::Demo(MemoryUserApi::demo(DEMO_SEED, DEMO_USERS))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Http(client) => format!(
                "{} (timeout {}ms)",
                client.base_url(),
                client.timeout().as_millis()
            ),
            Self::Demo(api) => format!("demo data ({} users in memory)", api.users().len()),
        }
    }

    /// Used by `--check`.
    pub fn check(&self) -> Result<()> {
        match self {
            Self::Http(client) => client.ping(),
            Self::Demo(_) => Ok(()),
        }
    }
}

impl UserApi for ApiRuntime {
    fn list_users(&mut self) -> Result<Vec<User>> {
        match self {
            Self::Http(client) => UserApi::list_users(client),
            Self::Demo(api) => api.list_users(),
        }
    }

    fn create_user(&mut self, user: &NewUser) -> Result<()> {
        match self {
            Self::Http(client) => UserApi::create_user(client, user),
            Self::Demo(api) => api.create_user(user),
        }
    }

    fn update_user(&mut self, user: &User) -> Result<()> {
        match self {
            Self::Http(client) => UserApi::update_user(client, user),
            Self::Demo(api) => api.update_user(user),
        }
    }

    fn delete_user(&mut self, id: UserId) -> Result<()> {
        match self {
            Self::Http(client) => UserApi::delete_user(client, id),
            Self::Demo(api) => api.delete_user(id),
        }
    }
}
