// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use userdesk_app::{NewUser, User, UserApi, UserId};

const USER_PATH: &str = "user";

/// Blocking client for the `/user` REST collection.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        // A trailing slash makes `join` append instead of replacing the last
        // path segment.
        let base_url = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("api.base_url {trimmed:?} is not a valid URL"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url {trimmed:?} must use http or https, got {}",
                base_url.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn users_url(&self) -> Result<Url> {
        self.base_url
            .join(USER_PATH)
            .context("build user collection URL")
    }

    pub fn user_url(&self, id: UserId) -> Result<Url> {
        self.base_url
            .join(&format!("{USER_PATH}/{id}"))
            .with_context(|| format!("build URL for user {id}"))
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let response = self.send("GET", self.http.get(self.users_url()?))?;
        response.json().context("decode user list")
    }

    pub fn create_user(&self, user: &NewUser) -> Result<()> {
        self.send("POST", self.http.post(self.users_url()?).json(user))?;
        Ok(())
    }

    /// The API updates through the same POST endpoint; the `id` in the body
    /// selects the record.
    pub fn update_user(&self, user: &User) -> Result<()> {
        self.send("POST", self.http.post(self.users_url()?).json(user))?;
        Ok(())
    }

    pub fn delete_user(&self, id: UserId) -> Result<()> {
        self.send("DELETE", self.http.delete(self.user_url(id)?))?;
        Ok(())
    }

    pub fn ping(&self) -> Result<()> {
        self.list_users().map(|_| ())
    }

    fn send(&self, method: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        tracing::debug!(method, url = %response.url(), status = status.as_u16(), "api response");
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }
}

impl UserApi for Client {
    fn list_users(&mut self) -> Result<Vec<User>> {
        Client::list_users(self)
    }

    fn create_user(&mut self, user: &NewUser) -> Result<()> {
        Client::create_user(self, user)
    }

    fn update_user(&mut self, user: &User) -> Result<()> {
        Client::update_user(self, user)
    }

    fn delete_user(&mut self, id: UserId) -> Result<()> {
        Client::delete_user(self, id)
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- start the API server or fix [api].base_url ({})",
        base_url,
        error
    )
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}
