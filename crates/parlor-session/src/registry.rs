//! The session registry: which connection is logged in as which account.

use std::collections::HashMap;

use parlor_protocol::ConnectionId;

use crate::{AccountStore, SessionError};

/// Maps live connections to the account they logged in as.
///
/// The registry holds account *names*, never the accounts themselves;
/// the [`AccountStore`] stays the only owner. Every mutation updates both
/// sides so `account.connection()` and [`account_for`](Self::account_for)
/// always agree.
///
/// An account has at most one bound connection. Logging in again from a
/// new connection moves the binding; the old connection stays connected
/// but is no longer logged in.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    by_connection: HashMap<ConnectionId, String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `connection` to the account called `name`.
    ///
    /// Call only after the password has been verified. Returns the
    /// connection that was displaced, if the account was already bound
    /// elsewhere.
    ///
    /// # Errors
    /// [`SessionError::UnknownAccount`] if no such account exists.
    pub fn bind(
        &mut self,
        connection: ConnectionId,
        name: &str,
        accounts: &mut AccountStore,
    ) -> Result<Option<ConnectionId>, SessionError> {
        if accounts.lookup_by_name(name).is_none() {
            return Err(SessionError::UnknownAccount(name.to_owned()));
        }

        // A connection is logged in as one account at a time.
        if let Some(previous) = self.by_connection.get(&connection).cloned() {
            if previous != name {
                self.clear_account(connection, &previous, accounts);
            }
        }

        let account = accounts
            .lookup_by_name_mut(name)
            .ok_or_else(|| SessionError::UnknownAccount(name.to_owned()))?;
        let displaced = account.connection.filter(|old| *old != connection);
        if let Some(old) = displaced {
            self.by_connection.remove(&old);
            tracing::warn!(%name, %old, new = %connection, "account logged in elsewhere, rebinding");
        }

        account.connection = Some(connection);
        self.by_connection.insert(connection, name.to_owned());
        tracing::info!(%connection, %name, "logged in");
        Ok(displaced)
    }

    /// Forgets whatever account `connection` was logged in as.
    ///
    /// A no-op for connections that never logged in. Returns the account
    /// name that was unbound.
    pub fn unbind(&mut self, connection: ConnectionId, accounts: &mut AccountStore) -> Option<String> {
        let name = self.by_connection.get(&connection).cloned()?;
        self.clear_account(connection, &name, accounts);
        tracing::debug!(%connection, %name, "session unbound");
        Some(name)
    }

    /// The account name `connection` is logged in as.
    pub fn account_for(&self, connection: ConnectionId) -> Option<&str> {
        self.by_connection.get(&connection).map(String::as_str)
    }

    /// Number of logged-in connections.
    pub fn len(&self) -> usize {
        self.by_connection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_connection.is_empty()
    }

    fn clear_account(&mut self, connection: ConnectionId, name: &str, accounts: &mut AccountStore) {
        self.by_connection.remove(&connection);
        if let Some(account) = accounts.lookup_by_name_mut(name) {
            if account.connection == Some(connection) {
                account.connection = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn store_with(names: &[&str]) -> AccountStore {
        let mut store = AccountStore::in_memory();
        for name in names {
            store.create(name, "pw").unwrap();
        }
        store
    }

    #[test]
    fn test_bind_sets_both_directions() {
        let mut accounts = store_with(&["alice"]);
        let mut sessions = SessionRegistry::new();

        let displaced = sessions.bind(cid(1), "alice", &mut accounts).unwrap();

        assert_eq!(displaced, None);
        assert_eq!(sessions.account_for(cid(1)), Some("alice"));
        assert_eq!(accounts.lookup_by_name("alice").unwrap().connection(), Some(cid(1)));
    }

    #[test]
    fn test_bind_unknown_account_fails() {
        let mut accounts = store_with(&[]);
        let mut sessions = SessionRegistry::new();

        let result = sessions.bind(cid(1), "ghost", &mut accounts);

        assert!(matches!(result, Err(SessionError::UnknownAccount(_))));
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_bind_second_connection_displaces_first() {
        let mut accounts = store_with(&["alice"]);
        let mut sessions = SessionRegistry::new();
        sessions.bind(cid(1), "alice", &mut accounts).unwrap();

        let displaced = sessions.bind(cid(2), "alice", &mut accounts).unwrap();

        assert_eq!(displaced, Some(cid(1)));
        assert_eq!(sessions.account_for(cid(1)), None);
        assert_eq!(sessions.account_for(cid(2)), Some("alice"));
        assert_eq!(accounts.lookup_by_name("alice").unwrap().connection(), Some(cid(2)));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_bind_same_connection_twice_is_idempotent() {
        let mut accounts = store_with(&["alice"]);
        let mut sessions = SessionRegistry::new();
        sessions.bind(cid(1), "alice", &mut accounts).unwrap();

        let displaced = sessions.bind(cid(1), "alice", &mut accounts).unwrap();

        assert_eq!(displaced, None);
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_bind_other_account_releases_previous_one() {
        let mut accounts = store_with(&["alice", "bob"]);
        let mut sessions = SessionRegistry::new();
        sessions.bind(cid(1), "alice", &mut accounts).unwrap();

        sessions.bind(cid(1), "bob", &mut accounts).unwrap();

        assert_eq!(sessions.account_for(cid(1)), Some("bob"));
        assert_eq!(accounts.lookup_by_name("alice").unwrap().connection(), None);
    }

    #[test]
    fn test_unbind_clears_account_connection() {
        let mut accounts = store_with(&["alice"]);
        let mut sessions = SessionRegistry::new();
        sessions.bind(cid(1), "alice", &mut accounts).unwrap();

        let name = sessions.unbind(cid(1), &mut accounts);

        assert_eq!(name.as_deref(), Some("alice"));
        assert!(sessions.is_empty());
        assert_eq!(accounts.lookup_by_name("alice").unwrap().connection(), None);
    }

    #[test]
    fn test_unbind_never_logged_in_is_noop() {
        let mut accounts = store_with(&["alice"]);
        let mut sessions = SessionRegistry::new();

        assert_eq!(sessions.unbind(cid(9), &mut accounts), None);
    }

    #[test]
    fn test_unbind_displaced_connection_leaves_new_binding() {
        let mut accounts = store_with(&["alice"]);
        let mut sessions = SessionRegistry::new();
        sessions.bind(cid(1), "alice", &mut accounts).unwrap();
        sessions.bind(cid(2), "alice", &mut accounts).unwrap();

        // The old connection disconnecting must not log out the new one.
        assert_eq!(sessions.unbind(cid(1), &mut accounts), None);
        assert_eq!(accounts.lookup_by_name("alice").unwrap().connection(), Some(cid(2)));
    }
}
