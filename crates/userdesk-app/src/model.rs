// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::*;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, deserialize_with = "null_as_default")]
    pub street: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub postal_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
}

impl Address {
    /// One-line rendering used by the detail row.
    pub fn summary(&self) -> String {
        format!(
            "{} {}, {}, {}, {}",
            self.street, self.number, self.city, self.postal_code, self.country
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub birthdate: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub birth_place: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mothers_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub social_security_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tax_identification_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub addresses: Vec<Address>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone_numbers: Vec<PhoneNumber>,
}

impl User {
    pub fn field(&self, field: UserField) -> &str {
        match field {
            UserField::Name => &self.name,
            UserField::Birthdate => &self.birthdate,
            UserField::BirthPlace => &self.birth_place,
            UserField::MothersName => &self.mothers_name,
            UserField::SocialSecurityNumber => &self.social_security_number,
            UserField::TaxIdentificationNumber => &self.tax_identification_number,
            UserField::EmailAddress => &self.email_address,
        }
    }

    pub fn set_field(&mut self, field: UserField, value: String) {
        *self.field_mut(field) = value;
    }

    fn field_mut(&mut self, field: UserField) -> &mut String {
        match field {
            UserField::Name => &mut self.name,
            UserField::Birthdate => &mut self.birthdate,
            UserField::BirthPlace => &mut self.birth_place,
            UserField::MothersName => &mut self.mothers_name,
            UserField::SocialSecurityNumber => &mut self.social_security_number,
            UserField::TaxIdentificationNumber => &mut self.tax_identification_number,
            UserField::EmailAddress => &mut self.email_address,
        }
    }
}

/// A user that has not been stored yet; the server assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub birthdate: String,
    pub birth_place: String,
    pub mothers_name: String,
    pub social_security_number: String,
    pub tax_identification_number: String,
    pub email_address: String,
    pub addresses: Vec<Address>,
    pub phone_numbers: Vec<PhoneNumber>,
}

impl NewUser {
    pub fn field(&self, field: UserField) -> &str {
        match field {
            UserField::Name => &self.name,
            UserField::Birthdate => &self.birthdate,
            UserField::BirthPlace => &self.birth_place,
            UserField::MothersName => &self.mothers_name,
            UserField::SocialSecurityNumber => &self.social_security_number,
            UserField::TaxIdentificationNumber => &self.tax_identification_number,
            UserField::EmailAddress => &self.email_address,
        }
    }

    pub fn set_field(&mut self, field: UserField, value: String) {
        let slot = match field {
            UserField::Name => &mut self.name,
            UserField::Birthdate => &mut self.birthdate,
            UserField::BirthPlace => &mut self.birth_place,
            UserField::MothersName => &mut self.mothers_name,
            UserField::SocialSecurityNumber => &mut self.social_security_number,
            UserField::TaxIdentificationNumber => &mut self.tax_identification_number,
            UserField::EmailAddress => &mut self.email_address,
        };
        *slot = value;
    }

    pub fn with_id(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            birthdate: self.birthdate,
            birth_place: self.birth_place,
            mothers_name: self.mothers_name,
            social_security_number: self.social_security_number,
            tax_identification_number: self.tax_identification_number,
            email_address: self.email_address,
            addresses: self.addresses,
            phone_numbers: self.phone_numbers,
        }
    }
}

/// Scalar fields that can be edited inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Name,
    Birthdate,
    BirthPlace,
    MothersName,
    SocialSecurityNumber,
    TaxIdentificationNumber,
    EmailAddress,
}

impl UserField {
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Birthdate,
        Self::BirthPlace,
        Self::MothersName,
        Self::SocialSecurityNumber,
        Self::TaxIdentificationNumber,
        Self::EmailAddress,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Birthdate => "birthdate",
            Self::BirthPlace => "birthPlace",
            Self::MothersName => "mothersName",
            Self::SocialSecurityNumber => "socialSecurityNumber",
            Self::TaxIdentificationNumber => "taxIdentificationNumber",
            Self::EmailAddress => "emailAddress",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Birthdate => "Birthdate",
            Self::BirthPlace => "Birth Place",
            Self::MothersName => "Mother's Name",
            Self::SocialSecurityNumber => "SSN",
            Self::TaxIdentificationNumber => "TIN",
            Self::EmailAddress => "Email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Country,
    City,
    PostalCode,
    Street,
    Number,
}

impl AddressField {
    /// Order matches the creation form.
    pub const ALL: [Self; 5] = [
        Self::Country,
        Self::City,
        Self::PostalCode,
        Self::Street,
        Self::Number,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Country => "Country",
            Self::City => "City",
            Self::PostalCode => "Postal Code",
            Self::Street => "Street",
            Self::Number => "Street number",
        }
    }

    pub fn get(self, address: &Address) -> &str {
        match self {
            Self::Country => &address.country,
            Self::City => &address.city,
            Self::PostalCode => &address.postal_code,
            Self::Street => &address.street,
            Self::Number => &address.number,
        }
    }

    pub fn set(self, address: &mut Address, value: String) {
        let slot = match self {
            Self::Country => &mut address.country,
            Self::City => &mut address.city,
            Self::PostalCode => &mut address.postal_code,
            Self::Street => &mut address.street,
            Self::Number => &mut address.number,
        };
        *slot = value;
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
