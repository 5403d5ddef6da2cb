//! Per-run user accumulation.

use std::collections::BTreeMap;

use crate::entity::user;

/// Users discovered during one sync run, keyed by login.
///
/// Registration is merge-by-login: the last snapshot registered for a login
/// replaces earlier ones wholesale. At the end of the run the registry moves
/// through two phases. First the observed set is frozen and the logins that
/// only have a stub are listed with [`UserRegistry::stubs`]. Then the caller
/// fetches whatever full profiles it can and hands them to
/// [`UserRegistry::into_enriched`], which produces the final batch.
#[derive(Debug, Default)]
pub struct UserRegistry {
    observed: BTreeMap<String, user::Model>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation. Records without a login are dropped.
    pub fn register(&mut self, user: user::Model) {
        if user.user_login.is_empty() {
            return;
        }
        self.observed.insert(user.user_login.clone(), user);
    }

    pub fn register_all(&mut self, users: impl IntoIterator<Item = user::Model>) {
        for user in users {
            self.register(user);
        }
    }

    pub fn get(&self, login: &str) -> Option<&user::Model> {
        self.observed.get(login)
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Logins whose display name is still empty, in login order.
    pub fn stubs(&self) -> Vec<String> {
        self.observed
            .values()
            .filter(|u| u.is_stub())
            .map(|u| u.user_login.clone())
            .collect()
    }

    /// The final batch: every observed user, replaced by its fetched profile
    /// where one is available. The observed login is kept as the key.
    pub fn into_enriched(self, profiles: BTreeMap<String, user::Model>) -> Vec<user::Model> {
        let mut profiles = profiles;
        self.observed
            .into_iter()
            .map(|(login, observed)| match profiles.remove(&login) {
                Some(profile) => user::Model {
                    user_login: login,
                    ..profile
                },
                None => observed,
            })
            .collect()
    }
}
