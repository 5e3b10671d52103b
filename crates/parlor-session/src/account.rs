//! Accounts and the registry that owns them.

use parlor_protocol::ConnectionId;

use crate::{AccountLog, MemoryAccountLog, SessionError};

/// A named player account.
///
/// Names are unique and case-sensitive. Passwords are stored as given:
/// this service does no cryptographic authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    name: String,
    password: String,
    /// The connection currently logged in as this account, if any.
    /// Only [`SessionRegistry`](crate::SessionRegistry) changes this.
    pub(crate) connection: Option<ConnectionId>,
}

impl Account {
    pub(crate) fn new(name: String, password: String) -> Self {
        Self {
            name,
            password,
            connection: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }
}

/// In-memory registry of all accounts, backed by an [`AccountLog`].
///
/// Lookups are linear scans; the target scale is a few hundred accounts
/// at most.
pub struct AccountStore {
    accounts: Vec<Account>,
    log: Box<dyn AccountLog>,
}

impl AccountStore {
    /// Loads every account from `log`.
    ///
    /// Records with duplicate names are skipped (first one wins) so the
    /// uniqueness invariant holds even for a hand-edited log.
    ///
    /// # Errors
    /// [`SessionError::Storage`] if the log exists but can't be read.
    pub fn open(log: impl AccountLog + 'static) -> Result<Self, SessionError> {
        let mut store = Self {
            accounts: Vec::new(),
            log: Box::new(log),
        };
        for record in store.log.load_all()? {
            if store.lookup_by_name(&record.name).is_some() {
                tracing::warn!(name = %record.name, "duplicate account in log, skipping");
                continue;
            }
            store.accounts.push(Account::new(record.name, record.password));
        }
        tracing::info!(accounts = store.accounts.len(), "account store loaded");
        Ok(store)
    }

    /// An empty store that persists nowhere but memory.
    pub fn in_memory() -> Self {
        Self {
            accounts: Vec::new(),
            log: Box::new(MemoryAccountLog::default()),
        }
    }

    /// Finds an account by exact, case-sensitive name.
    pub fn lookup_by_name(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    pub(crate) fn lookup_by_name_mut(&mut self, name: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.name == name)
    }

    /// Creates a new account and rewrites the whole log.
    ///
    /// If the log write fails the account is not kept, so memory and
    /// storage never disagree.
    ///
    /// # Errors
    /// - [`SessionError::InvalidName`]: empty, or contains `,` or a line break
    /// - [`SessionError::DuplicateName`]: the name is taken, whatever the password
    /// - [`SessionError::Storage`]: the log could not be written
    pub fn create(&mut self, name: &str, password: &str) -> Result<&Account, SessionError> {
        validate_credential("name", name)?;
        if self.lookup_by_name(name).is_some() {
            return Err(SessionError::DuplicateName(name.to_owned()));
        }
        validate_credential("password", password)?;

        self.accounts
            .push(Account::new(name.to_owned(), password.to_owned()));
        if let Err(e) = self.log.save_all(&self.accounts) {
            self.accounts.pop();
            return Err(SessionError::Storage(e));
        }

        tracing::info!(%name, "account created");
        Ok(&self.accounts[self.accounts.len() - 1])
    }

    /// Checks a name/password pair.
    ///
    /// # Errors
    /// [`SessionError::AuthFailed`] for an unknown name or a wrong
    /// password; the message distinguishes them for logging.
    pub fn verify(&self, name: &str, password: &str) -> Result<&Account, SessionError> {
        let account = self
            .lookup_by_name(name)
            .ok_or_else(|| SessionError::AuthFailed("unknown account".into()))?;
        if account.password != password {
            return Err(SessionError::AuthFailed("incorrect password".into()));
        }
        Ok(account)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("accounts", &self.accounts.len())
            .finish_non_exhaustive()
    }
}

/// Rejects values that would corrupt the comma/newline account log.
fn validate_credential(what: &str, value: &str) -> Result<(), SessionError> {
    if value.is_empty() {
        return Err(SessionError::InvalidName(format!("{what} is empty")));
    }
    if value.contains([',', '\r', '\n']) {
        return Err(SessionError::InvalidName(format!(
            "{what} contains a comma or line break"
        )));
    }
    Ok(())
}
