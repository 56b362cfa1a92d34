// src/models/user.rs

use serde::{Deserialize, Serialize};

/// The (email, provider) pair a comment author is known by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorIdentity {
    pub email: String,
    pub provider: String,
}

impl AuthorIdentity {
    pub fn new(email: impl Into<String>, provider: impl Into<String>) -> Self {
        AuthorIdentity {
            email: email.into(),
            provider: provider.into(),
        }
    }
}
