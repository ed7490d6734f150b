// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::Date;
use time::macros::format_description;

use crate::{Address, AddressField, NewUser, PhoneNumber, UserField};

const MIN_NAME_CHARS: usize = 4;
const SSN_CHARS: usize = 9;
const TIN_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    User(UserField),
    Address { index: usize, field: AddressField },
    Phone { index: usize },
}

impl FormField {
    pub fn label(self) -> String {
        match self {
            Self::User(field) => field.label().to_owned(),
            Self::Address { index, field } => format!("Address {} {}", index + 1, field.label()),
            Self::Phone { index } => format!("Phone Number {}", index + 1),
        }
    }
}

/// A constraint the entered value does not meet yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormHint {
    pub field: FormField,
    pub message: String,
}

/// The "add new user" form: a draft plus the focused field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    draft: NewUser,
    cursor: usize,
}

impl Default for UserForm {
    fn default() -> Self {
        Self::new()
    }
}

impl UserForm {
    pub fn new() -> Self {
        Self {
            draft: NewUser {
                addresses: vec![Address::default()],
                phone_numbers: vec![PhoneNumber::default()],
                ..NewUser::default()
            },
            cursor: 0,
        }
    }

    pub fn draft(&self) -> &NewUser {
        &self.draft
    }

    pub fn into_draft(self) -> NewUser {
        self.draft
    }

    pub fn fields(&self) -> Vec<FormField> {
        let mut fields = UserField::ALL
            .iter()
            .copied()
            .map(FormField::User)
            .collect::<Vec<_>>();
        for index in 0..self.draft.addresses.len() {
            fields.extend(
                AddressField::ALL
                    .iter()
                    .map(|field| FormField::Address {
                        index,
                        field: *field,
                    }),
            );
        }
        fields.extend((0..self.draft.phone_numbers.len()).map(|index| FormField::Phone { index }));
        fields
    }

    pub fn focused(&self) -> FormField {
        let fields = self.fields();
        fields[self.cursor.min(fields.len() - 1)]
    }

    pub fn focus_index(&self) -> usize {
        self.cursor
    }

    pub fn next_field(&mut self) -> FormField {
        self.move_cursor(1)
    }

    pub fn prev_field(&mut self) -> FormField {
        self.move_cursor(-1)
    }

    fn move_cursor(&mut self, delta: isize) -> FormField {
        let len = self.fields().len() as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
        self.focused()
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::User(field) => self.draft.field(field),
            FormField::Address { index, field } => self
                .draft
                .addresses
                .get(index)
                .map(|address| field.get(address))
                .unwrap_or(""),
            FormField::Phone { index } => self
                .draft
                .phone_numbers
                .get(index)
                .map(|phone| phone.phone_number.as_str())
                .unwrap_or(""),
        }
    }

    pub fn set_value(&mut self, field: FormField, value: String) {
        match field {
            FormField::User(field) => self.draft.set_field(field, value),
            FormField::Address { index, field } => {
                if let Some(address) = self.draft.addresses.get_mut(index) {
                    field.set(address, value);
                }
            }
            FormField::Phone { index } => {
                if let Some(phone) = self.draft.phone_numbers.get_mut(index) {
                    phone.phone_number = value;
                }
            }
        }
    }

    pub fn push_char(&mut self, ch: char) {
        let field = self.focused();
        let mut value = self.value(field).to_owned();
        value.push(ch);
        self.set_value(field, value);
    }

    pub fn pop_char(&mut self) {
        let field = self.focused();
        let mut value = self.value(field).to_owned();
        value.pop();
        self.set_value(field, value);
    }

    /// Appends a blank address and focuses its first input.
    pub fn add_address(&mut self) -> FormField {
        self.draft.addresses.push(Address::default());
        let index = self.draft.addresses.len() - 1;
        self.focus(FormField::Address {
            index,
            field: AddressField::ALL[0],
        })
    }

    pub fn add_phone_number(&mut self) -> FormField {
        self.draft.phone_numbers.push(PhoneNumber::default());
        let index = self.draft.phone_numbers.len() - 1;
        self.focus(FormField::Phone { index })
    }

    fn focus(&mut self, field: FormField) -> FormField {
        if let Some(position) = self.fields().iter().position(|candidate| *candidate == field) {
            self.cursor = position;
        }
        self.focused()
    }

    /// Length and format constraints. Empty values are not checked.
    pub fn hints(&self) -> Vec<FormHint> {
        let mut hints = Vec::new();
        for field in [UserField::Name, UserField::BirthPlace, UserField::MothersName] {
            let count = self.draft.field(field).chars().count();
            if count > 0 && count < MIN_NAME_CHARS {
                hints.push(FormHint {
                    field: FormField::User(field),
                    message: format!(
                        "{} needs at least {MIN_NAME_CHARS} characters (has {count})",
                        field.label()
                    ),
                });
            }
        }
        for (field, exact) in [
            (UserField::SocialSecurityNumber, SSN_CHARS),
            (UserField::TaxIdentificationNumber, TIN_CHARS),
        ] {
            let count = self.draft.field(field).chars().count();
            if count > 0 && count != exact {
                hints.push(FormHint {
                    field: FormField::User(field),
                    message: format!(
                        "{} must be exactly {exact} characters (has {count})",
                        field.label()
                    ),
                });
            }
        }
        let birthdate = self.draft.birthdate.trim();
        if !birthdate.is_empty()
            && Date::parse(birthdate, format_description!("[year]-[month]-[day]")).is_err()
        {
            hints.push(FormHint {
                field: FormField::User(UserField::Birthdate),
                message: "Birthdate must be a date like 1990-04-12".to_owned(),
            });
        }
        let email = self.draft.email_address.trim();
        if !email.is_empty() && !email.contains('@') {
            hints.push(FormHint {
                field: FormField::User(UserField::EmailAddress),
                message: "Email must contain an @".to_owned(),
            });
        }
        hints
    }

    pub fn hint_for(&self, field: FormField) -> Option<FormHint> {
        self.hints().into_iter().find(|hint| hint.field == field)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(hint) = self.hints().into_iter().next() {
            bail!("{} -- fix the field and retry", hint.message);
        }
        Ok(())
    }
}
