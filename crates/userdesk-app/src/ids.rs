// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::UserId;

    #[test]
    fn user_id_serializes_as_bare_number() {
        let encoded = serde_json::to_string(&UserId::new(42)).expect("encode id");
        assert_eq!(encoded, "42");
        let decoded: UserId = serde_json::from_str("7").expect("decode id");
        assert_eq!(decoded.get(), 7);
        assert_eq!(decoded.to_string(), "7");
    }
}
