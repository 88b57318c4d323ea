use serde::{Deserialize, Serialize};

/// A known party, identified by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        User {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Static email to display-name mapping. Only used to render names, never
/// to decide who may approve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    users: Vec<User>,
}

impl Directory {
    pub fn new(users: Vec<User>) -> Self {
        Directory { users }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn get(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    /// The user's name, or the email itself for unknown parties.
    pub fn display_name<'a>(&'a self, email: &'a str) -> &'a str {
        self.get(email).map(|u| u.name.as_str()).unwrap_or(email)
    }
}

pub(crate) fn sample_users() -> Vec<User> {
    vec![
        User::new("manager@company.com", "Project Manager"),
        User::new("tech.lead@company.com", "Tech Lead"),
        User::new("qa.engineer@company.com", "QA Engineer"),
        User::new("security@company.com", "Security Officer"),
        User::new("product.owner@company.com", "Product Owner"),
        User::new("stakeholder@company.com", "Stakeholder"),
    ]
}
