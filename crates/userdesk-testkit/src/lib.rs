// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::HashMap;
use time::{Date, Duration, Month};
use userdesk_app::{Address, NewUser, PhoneNumber, RemoteOperation, User, UserApi, UserId};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];
const MOTHER_NAMES: [&str; 10] = [
    "Margaret", "Eleanor", "Patricia", "Dorothy", "Judith", "Beatrice", "Rosalind", "Harriet",
    "Josephine", "Theresa",
];

const CITIES: [(&str, &str); 12] = [
    ("Austin", "USA"),
    ("Seattle", "USA"),
    ("Denver", "USA"),
    ("Toronto", "Canada"),
    ("Vancouver", "Canada"),
    ("Vienna", "Austria"),
    ("Graz", "Austria"),
    ("Budapest", "Hungary"),
    ("Debrecen", "Hungary"),
    ("Munich", "Germany"),
    ("Hamburg", "Germany"),
    ("Dublin", "Ireland"),
];
const STREET_NAMES: [&str; 14] = [
    "Cedar", "Maple", "Oak", "Pine", "Willow", "Elm", "Birch", "Juniper", "Sunset", "Ridge",
    "Valley", "Lakeview", "Hillcrest", "Meadow",
];
const STREET_SUFFIXES: [&str; 5] = ["St", "Ave", "Rd", "Ln", "Way"];
const EMAIL_DOMAINS: [&str; 4] = ["example.com", "mail.test", "people.local", "inbox.io"];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of plausible user records.
#[derive(Debug, Clone)]
pub struct UserFaker {
    rng: DeterministicRng,
}

impl UserFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn new_user(&mut self) -> NewUser {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let (birth_place, _) = self.pick(&CITIES);
        let domain = self.pick(&EMAIL_DOMAINS);
        let address_count = 1 + self.rng.int_n(2);
        let phone_count = self.rng.int_n(3);

        NewUser {
            name: format!("{first} {last}"),
            birthdate: self.birthdate(),
            birth_place: birth_place.to_owned(),
            mothers_name: format!("{} {last}", self.pick(&MOTHER_NAMES)),
            social_security_number: self.digits(9),
            tax_identification_number: self.digits(10),
            email_address: format!(
                "{}.{}@{domain}",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            ),
            addresses: (0..address_count).map(|_| self.address()).collect(),
            phone_numbers: (0..phone_count).map(|_| self.phone_number()).collect(),
        }
    }

    pub fn user(&mut self, id: i64) -> User {
        self.new_user().with_id(UserId::new(id))
    }

    pub fn users(&mut self, count: usize) -> Vec<User> {
        (1..=count as i64).map(|id| self.user(id)).collect()
    }

    pub fn address(&mut self) -> Address {
        let (city, country) = self.pick(&CITIES);
        Address {
            street: format!(
                "{} {}",
                self.pick(&STREET_NAMES),
                self.pick(&STREET_SUFFIXES)
            ),
            number: (1 + self.rng.int_n(400)).to_string(),
            city: city.to_owned(),
            postal_code: format!("{:05}", 1_000 + self.rng.int_n(98_000)),
            country: country.to_owned(),
        }
    }

    pub fn phone_number(&mut self) -> PhoneNumber {
        PhoneNumber {
            phone_number: format!(
                "({:03}) {:03}-{:04}",
                200 + self.rng.int_n(800),
                200 + self.rng.int_n(800),
                self.rng.int_n(10_000),
            ),
        }
    }

    fn birthdate(&mut self) -> String {
        let start = Date::from_calendar_date(REFERENCE_YEAR - 80, Month::January, 1)
            .expect("valid reference date");
        let offset = self.rng.int_n(62 * 365) as i64;
        let date = start + Duration::days(offset);
        date.format(time::macros::format_description!("[year]-[month]-[day]"))
            .expect("format calendar date")
    }

    fn digits(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| char::from(b'0' + self.rng.int_n(10) as u8))
            .collect()
    }

    fn pick<T: Copy>(&mut self, values: &[T]) -> T {
        values[self.rng.int_n(values.len())]
    }
}

/// In-memory `/user` collection with scriptable failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserApi {
    users: Vec<User>,
    next_id: i64,
    failures: HashMap<RemoteOperation, usize>,
    calls: Vec<RemoteOperation>,
}

impl MemoryUserApi {
    pub fn new(users: Vec<User>) -> Self {
        let next_id = users.iter().map(|user| user.id.get()).max().unwrap_or(0) + 1;
        Self {
            users,
            next_id,
            failures: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// Seeds `count` fake users.
    pub fn demo(seed: u64, count: usize) -> Self {
        Self::new(UserFaker::new(seed).users(count))
    }

    /// The next `times` calls of `operation` answer like a 500 response.
    pub fn fail_next(&mut self, operation: RemoteOperation, times: usize) {
        self.failures.insert(operation, times);
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn users_mut(&mut self) -> &mut Vec<User> {
        &mut self.users
    }

    pub fn call_count(&self, operation: RemoteOperation) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == operation)
            .count()
    }

    fn begin(&mut self, operation: RemoteOperation) -> Result<()> {
        self.calls.push(operation);
        if let Some(remaining) = self.failures.get_mut(&operation)
            && *remaining > 0
        {
            *remaining -= 1;
            bail!("server error (500): {} rejected", operation.as_str());
        }
        Ok(())
    }
}

impl UserApi for MemoryUserApi {
    fn list_users(&mut self) -> Result<Vec<User>> {
        self.begin(RemoteOperation::Refresh)?;
        Ok(self.users.clone())
    }

    fn create_user(&mut self, user: &NewUser) -> Result<()> {
        self.begin(RemoteOperation::Create)?;
        let id = UserId::new(self.next_id.max(1));
        self.next_id = id.get() + 1;
        self.users.push(user.clone().with_id(id));
        Ok(())
    }

    fn update_user(&mut self, user: &User) -> Result<()> {
        self.begin(RemoteOperation::Update)?;
        let Some(existing) = self.users.iter_mut().find(|row| row.id == user.id) else {
            bail!("server error (404): user {} not found", user.id);
        };
        *existing = user.clone();
        Ok(())
    }

    fn delete_user(&mut self, id: UserId) -> Result<()> {
        self.begin(RemoteOperation::Delete)?;
        let before = self.users.len();
        self.users.retain(|user| user.id != id);
        if self.users.len() == before {
            bail!("server error (404): user {id} not found");
        }
        Ok(())
    }
}
