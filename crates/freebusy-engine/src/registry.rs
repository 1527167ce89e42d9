//! Directory-resolved users, keyed by lower-cased email.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::model::User;

/// Outcome of offering a user to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Added,
    /// Rejected: the user has no usable email address.
    Invalid,
    /// Rejected: a user with the same lower-cased email is already present.
    Duplicate,
}

/// Users taking part in one reconciliation batch.
///
/// The orchestrator writes `access_level` and `busy_times` of the users it
/// finds free/busy data for; nothing else in the registry changes.
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: BTreeMap<String, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit every user of a directory result, logging rejects.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        let mut registry = Self::new();
        for user in users {
            registry.insert(user);
        }
        registry
    }

    /// Registry holding exactly `user`, skipping validation.
    pub(crate) fn single(user: User) -> Self {
        let mut users = BTreeMap::new();
        users.insert(user.key(), user);
        Self { users }
    }

    pub fn insert(&mut self, user: User) -> Admission {
        if !user.is_valid() {
            warn!(
                "User '{}' is invalid and will not be synchronized.",
                user.common_name
            );
            return Admission::Invalid;
        }
        match self.users.entry(user.key()) {
            btree_map::Entry::Occupied(_) => {
                warn!(
                    "User '{}' was returned multiple times in the directory query. \
                     Only the first instance was added.",
                    user.email
                );
                Admission::Duplicate
            }
            btree_map::Entry::Vacant(slot) => {
                info!("Found and added '{}' as a calendar user.", user.email);
                slot.insert(user);
                Admission::Added
            }
        }
    }

    /// Case-insensitive lookup by email.
    pub fn get(&self, email: &str) -> Option<&User> {
        self.users.get(&email.to_lowercase())
    }

    pub fn get_mut(&mut self, email: &str) -> Option<&mut User> {
        self.users.get_mut(&email.to_lowercase())
    }

    pub fn contains(&self, email: &str) -> bool {
        self.users.contains_key(&email.to_lowercase())
    }

    pub fn remove(&mut self, email: &str) -> Option<User> {
        self.users.remove(&email.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// `(key, user)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &User)> {
        self.users.iter()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut User)> {
        self.users.iter_mut()
    }

    pub fn into_users(self) -> Vec<User> {
        self.users.into_values().collect()
    }

    /// Search terms that matched no registered user.
    ///
    /// `mail` terms are compared against the registry key; `cn` and
    /// `displayName` against the admitted users' names, case-insensitively.
    /// Other attributes are not recorded on [`User`], so nothing is reported.
    pub fn unresolved_terms<'a>(&self, attribute: &str, terms: &'a [String]) -> Vec<&'a str> {
        let resolved: HashSet<String> = match attribute {
            "mail" => self.users.keys().cloned().collect(),
            "cn" => self.users.values().map(|u| u.common_name.to_lowercase()).collect(),
            "displayName" => self.users.values().map(|u| u.display_name.to_lowercase()).collect(),
            other => {
                debug!("Cannot check unresolved terms for attribute '{}'.", other);
                return Vec::new();
            }
        };
        let missing: Vec<&str> = terms
            .iter()
            .filter(|term| !resolved.contains(&term.trim().to_lowercase()))
            .map(String::as_str)
            .collect();
        for term in &missing {
            debug!("Unable to find directory user where '{}'='{}'.", attribute, term);
        }
        missing
    }
}
