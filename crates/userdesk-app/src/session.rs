// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::collections::BTreeSet;

use crate::{
    NewUser, RemoteOperation, RowInteractionState, User, UserApi, UserCollection, UserField,
    UserForm, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Refreshed { count: usize },
    ExpandToggled { id: UserId, expanded: bool },
    EditChanged(Option<UserId>),
    FieldEdited { id: UserId, field: UserField },
    EditReverted(UserId),
    Saved(UserId),
    Created,
    Deleted(UserId),
    FormOpened,
    FormClosed,
    RemoteFailed {
        operation: RemoteOperation,
        message: String,
    },
}

/// The user list view model: row state, the cached collection and the
/// creation form, mutated only through the operations below.
///
/// Remote failures never escape as errors. They are logged, recorded on the
/// status line and returned as [`SessionEvent::RemoteFailed`]; the cache and
/// edit state stay as they were.
pub struct UserListSession<A> {
    api: A,
    users: UserCollection,
    rows: RowInteractionState,
    form: Option<UserForm>,
    status_line: Option<String>,
}

impl<A: UserApi> UserListSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            users: UserCollection::default(),
            rows: RowInteractionState::default(),
            form: None,
            status_line: None,
        }
    }

    pub fn users(&self) -> &[User] {
        self.users.users()
    }

    pub fn rows(&self) -> &RowInteractionState {
        &self.rows
    }

    pub fn form(&self) -> Option<&UserForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut UserForm> {
        self.form.as_mut()
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_line = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_line = None;
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    pub fn refresh(&mut self) -> Vec<SessionEvent> {
        match self.api.list_users() {
            Ok(users) => {
                let count = users.len();
                let present: BTreeSet<UserId> = users.iter().map(|user| user.id).collect();
                self.rows.retain_present(&present);
                self.users.replace_all(users);
                tracing::debug!(count, "user list refreshed");
                vec![SessionEvent::Refreshed { count }]
            }
            Err(error) => vec![self.report(RemoteOperation::Refresh, &error)],
        }
    }

    pub fn toggle_expand(&mut self, id: UserId) -> Vec<SessionEvent> {
        let expanded = self.rows.toggle_expand(id);
        vec![SessionEvent::ExpandToggled { id, expanded }]
    }

    pub fn toggle_edit(&mut self, id: UserId) -> Vec<SessionEvent> {
        let previous = self.rows.editing();
        let editing = self.rows.toggle_edit(id);
        if let Some(previous) = previous
            && editing.is_some()
            && self.users.is_dirty(previous)
        {
            tracing::info!(%previous, "edit target switched with unsaved changes");
        }
        vec![SessionEvent::EditChanged(editing)]
    }

    pub fn clear_edit(&mut self) -> Vec<SessionEvent> {
        self.rows.clear_edit();
        vec![SessionEvent::EditChanged(None)]
    }

    /// Leaves edit mode and puts back the server copy of the edited row.
    pub fn cancel_edit(&mut self) -> Vec<SessionEvent> {
        let Some(id) = self.rows.editing() else {
            return Vec::new();
        };
        let mut events = Vec::new();
        if self.users.revert(id) {
            events.push(SessionEvent::EditReverted(id));
        }
        self.rows.clear_edit();
        events.push(SessionEvent::EditChanged(None));
        events
    }

    /// Local only; the server sees the change on `save`.
    pub fn set_field(
        &mut self,
        index: usize,
        field: UserField,
        value: impl Into<String>,
    ) -> Result<Vec<SessionEvent>> {
        self.users.set_field(index, field, value.into())?;
        let id = self.user_id_at(index)?;
        tracing::debug!(%id, field = field.as_str(), "field edited locally");
        Ok(vec![SessionEvent::FieldEdited { id, field }])
    }

    pub fn save(&mut self, index: usize) -> Result<Vec<SessionEvent>> {
        let user = self
            .users
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("row {index} is out of range"))?;

        if let Err(error) = self.api.update_user(&user) {
            return Ok(vec![self.report(RemoteOperation::Update, &error)]);
        }

        tracing::info!(id = %user.id, "user saved");
        self.rows.clear_edit();
        let mut events = vec![SessionEvent::Saved(user.id), SessionEvent::EditChanged(None)];
        events.extend(self.refresh());
        Ok(events)
    }

    pub fn open_form(&mut self) -> Vec<SessionEvent> {
        self.form = Some(UserForm::new());
        vec![SessionEvent::FormOpened]
    }

    pub fn cancel_form(&mut self) -> Vec<SessionEvent> {
        if self.form.take().is_none() {
            return Vec::new();
        }
        vec![SessionEvent::FormClosed]
    }

    /// The form closes whether or not the server accepted the draft.
    pub fn create(&mut self, draft: &NewUser) -> Vec<SessionEvent> {
        let result = self.api.create_user(draft);
        self.form = None;
        let mut events = vec![SessionEvent::FormClosed];
        match result {
            Ok(()) => {
                tracing::info!(name = %draft.name, "user created");
                events.push(SessionEvent::Created);
                events.extend(self.refresh());
            }
            Err(error) => events.push(self.report(RemoteOperation::Create, &error)),
        }
        events
    }

    /// Validates the open form and sends it. A form that fails validation
    /// stays open.
    pub fn submit_form(&mut self) -> Result<Vec<SessionEvent>> {
        let Some(form) = &self.form else {
            return Ok(Vec::new());
        };
        form.validate()?;
        let draft = form.draft().clone();
        Ok(self.create(&draft))
    }

    pub fn delete(&mut self, id: UserId) -> Vec<SessionEvent> {
        if let Err(error) = self.api.delete_user(id) {
            return vec![self.report(RemoteOperation::Delete, &error)];
        }
        tracing::info!(%id, "user deleted");
        let mut events = vec![SessionEvent::Deleted(id)];
        events.extend(self.refresh());
        events
    }

    pub fn index_of(&self, id: UserId) -> Option<usize> {
        self.users.position(id)
    }

    fn user_id_at(&self, index: usize) -> Result<UserId> {
        self.users
            .get(index)
            .map(|user| user.id)
            .ok_or_else(|| anyhow!("row {index} is out of range"))
    }

    fn report(&mut self, operation: RemoteOperation, error: &anyhow::Error) -> SessionEvent {
        let message = format!("{error:#}");
        tracing::warn!(operation = operation.as_str(), error = %message, "remote operation failed");
        self.status_line = Some(format!("{} failed: {message}", operation.as_str()));
        SessionEvent::RemoteFailed { operation, message }
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionEvent, UserListSession};
    use crate::{NewUser, RemoteOperation, User, UserApi, UserField, UserId};
    use anyhow::{Result, bail};

    #[derive(Debug, Default)]
    struct StubApi {
        server: Vec<User>,
        fail_update: bool,
        fail_list: bool,
        list_calls: usize,
        updates: Vec<User>,
    }

    impl UserApi for StubApi {
        fn list_users(&mut self) -> Result<Vec<User>> {
            self.list_calls += 1;
            if self.fail_list {
                bail!("server returned 503");
            }
            Ok(self.server.clone())
        }

        fn create_user(&mut self, user: &NewUser) -> Result<()> {
            let id = UserId::new(self.server.len() as i64 + 1);
            self.server.push(user.clone().with_id(id));
            Ok(())
        }

        fn update_user(&mut self, user: &User) -> Result<()> {
            if self.fail_update {
                bail!("server returned 500");
            }
            self.updates.push(user.clone());
            if let Some(existing) = self.server.iter_mut().find(|row| row.id == user.id) {
                *existing = user.clone();
            }
            Ok(())
        }

        fn delete_user(&mut self, id: UserId) -> Result<()> {
            self.server.retain(|user| user.id != id);
            Ok(())
        }
    }

    fn alice() -> User {
        User {
            id: UserId::new(1),
            name: "Alice".to_owned(),
            birthdate: "1990-04-12".to_owned(),
            birth_place: "Vienna".to_owned(),
            mothers_name: "Helga".to_owned(),
            social_security_number: "123456789".to_owned(),
            tax_identification_number: "1234567890".to_owned(),
            email_address: "alice@example.com".to_owned(),
            addresses: Vec::new(),
            phone_numbers: Vec::new(),
        }
    }

    fn loaded_session(api: StubApi) -> UserListSession<StubApi> {
        let mut session = UserListSession::new(api);
        session.refresh();
        session
    }

    #[test]
    fn refresh_failure_leaves_cache_and_sets_status() {
        let mut session = loaded_session(StubApi {
            server: vec![alice()],
            ..StubApi::default()
        });
        session.api_mut().fail_list = true;
        session.api_mut().server.clear();

        let events = session.refresh();
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::RemoteFailed {
                operation: RemoteOperation::Refresh,
                ..
            }]
        ));
        assert_eq!(session.users(), &[alice()]);
        assert!(
            session
                .status_line()
                .is_some_and(|status| status.starts_with("refresh failed"))
        );
    }

    #[test]
    fn save_sends_the_locally_edited_record() -> Result<()> {
        let mut session = loaded_session(StubApi {
            server: vec![alice()],
            ..StubApi::default()
        });
        session.toggle_edit(UserId::new(1));
        session.set_field(0, UserField::Name, "Alicia")?;

        let events = session.save(0)?;
        assert_eq!(session.api().updates[0].name, "Alicia");
        assert_eq!(session.rows().editing(), None);
        assert_eq!(session.api().list_calls, 2);
        assert!(events.contains(&SessionEvent::Saved(UserId::new(1))));
        assert!(events.contains(&SessionEvent::Refreshed { count: 1 }));
        Ok(())
    }

    #[test]
    fn cancel_edit_reverts_local_changes() -> Result<()> {
        let mut session = loaded_session(StubApi {
            server: vec![alice()],
            ..StubApi::default()
        });
        session.toggle_edit(UserId::new(1));
        session.set_field(0, UserField::EmailAddress, "a@b")?;

        let events = session.cancel_edit();
        assert_eq!(
            events,
            vec![
                SessionEvent::EditReverted(UserId::new(1)),
                SessionEvent::EditChanged(None)
            ]
        );
        assert_eq!(session.users(), &[alice()]);
        Ok(())
    }

    #[test]
    fn set_field_rejects_unknown_row() {
        let mut session = loaded_session(StubApi::default());
        assert!(session.set_field(0, UserField::Name, "x").is_err());
        assert!(session.save(0).is_err());
    }

    #[test]
    fn submit_form_keeps_invalid_form_open() {
        let mut session = loaded_session(StubApi::default());
        session.open_form();
        if let Some(form) = session.form_mut() {
            form.set_value(
                crate::FormField::User(UserField::SocialSecurityNumber),
                "12".to_owned(),
            );
        }
        assert!(session.submit_form().is_err());
        assert!(session.form().is_some());
        assert!(session.api().server.is_empty());
    }
}
