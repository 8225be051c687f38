//! Accounts and the signed-in user.
//!
//! The signed-in user is an explicit [`Session`] value owned by the caller.
//! The store only keeps a copy of it under `current_user` so a session can
//! be restored after a restart.

use crate::database::{Draft, RecordStore, CURRENT_USER};
use crate::error::{Result, StoreError};
use crate::model::{NewUser, User};
use crate::storage::Storage;
use log::{debug, info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

impl<S: Storage> RecordStore<S> {
    pub fn users(&self) -> Result<Vec<User>> {
        self.load()
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users()?.into_iter().find(|u| u.email == email))
    }

    /// Creates an account. Fails with `DuplicateIdentity` when the email is
    /// taken, leaving the user collection untouched.
    pub fn register_user(&self, email: &str, password: &str, name: &str) -> Result<User> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StoreError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        let password_hash = bcrypt::hash(password, self.config().bcrypt_cost)?;
        let draft = NewUser {
            email: email.to_owned(),
            name: name.to_owned(),
            is_admin: email == self.config().admin_email,
            password_hash,
        };
        let user = self.modify(|users: &mut Vec<User>| {
            if users.iter().any(|u| u.email == draft.email) {
                return Err(StoreError::DuplicateIdentity {
                    email: draft.email.clone(),
                });
            }
            let user = draft
                .clone()
                .into_record(self.next_id(users)?, chrono::Utc::now());
            users.push(user.clone());
            Ok(user)
        })?;
        info!("Registered user {} (admin: {})", user.email, user.is_admin);
        Ok(user)
    }

    /// Looks up the account and, unless disabled in the config, checks the
    /// password against the stored bcrypt hash.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .user_by_email(email)?
            .ok_or_else(|| StoreError::UnknownUser {
                email: email.to_owned(),
            })?;
        if self.config().verify_passwords
            && (user.password_hash.is_empty() || !bcrypt::verify(password, &user.password_hash)?)
        {
            debug!("Rejected password for {}", email);
            return Err(StoreError::InvalidCredentials {
                email: email.to_owned(),
            });
        }
        Ok(user)
    }

    pub fn current_user_pointer(&self) -> Result<Option<User>> {
        Ok(self.get_raw(CURRENT_USER)?.and_then(|bytes| {
            serde_json::from_slice(&bytes)
                .map_err(|err| warn!("Malformed session pointer, ignoring: {}", err))
                .ok()
        }))
    }

    /// Persists the session pointer, or clears it with `None`. The password
    /// hash is never written here.
    pub fn set_current_user(&self, user: Option<&User>) -> Result<()> {
        let value = match user {
            Some(user) => {
                let mut user = user.clone();
                user.password_hash.clear();
                Some(serde_json::to_vec(&user)?)
            }
            None => None,
        };
        self.put_raw(CURRENT_USER, value)
    }
}

/// Identity of whoever is using the store. `None` means logged out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resumes the session persisted by the last login or registration.
    pub fn restore<S: Storage>(store: &RecordStore<S>) -> Result<Self> {
        let user = store.current_user_pointer()?;
        if let Some(user) = &user {
            debug!("Restored session for {}", user.email);
        }
        Ok(Session { user })
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn require_admin(&self) -> Result<&User> {
        self.user
            .as_ref()
            .filter(|user| user.is_admin)
            .ok_or(StoreError::NotAuthorized)
    }

    pub fn register<S: Storage>(
        &mut self,
        store: &RecordStore<S>,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<&User> {
        let user = store.register_user(email, password, name)?;
        self.begin(store, user)
    }

    pub fn login<S: Storage>(
        &mut self,
        store: &RecordStore<S>,
        email: &str,
        password: &str,
    ) -> Result<&User> {
        let user = store.authenticate(email, password)?;
        info!("Logged in {}", user.email);
        self.begin(store, user)
    }

    pub fn logout<S: Storage>(&mut self, store: &RecordStore<S>) -> Result<()> {
        store.set_current_user(None)?;
        if let Some(user) = self.user.take() {
            info!("Logged out {}", user.email);
        }
        Ok(())
    }

    fn begin<S: Storage>(&mut self, store: &RecordStore<S>, mut user: User) -> Result<&User> {
        store.set_current_user(Some(&user))?;
        user.password_hash.clear();
        Ok(&*self.user.insert(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::MemoryStorage;

    fn store() -> RecordStore<MemoryStorage> {
        let _ = env_logger::builder().is_test(true).try_init();
        RecordStore::with_config(MemoryStorage::new(), Config::new().bcrypt_cost(4))
    }

    #[test]
    fn register_signs_in() {
        let store = store();
        let mut session = Session::anonymous();
        let user = session
            .register(&store, "ann@example.com", "secret", "Ann")
            .unwrap()
            .clone();
        assert_eq!(user.name, "Ann");
        assert!(!user.is_admin);
        assert!(user.password_hash.is_empty());
        assert_eq!(store.current_user_pointer().unwrap(), Some(user.clone()));
        assert_eq!(Session::restore(&store).unwrap(), session);
        assert!(!store.users().unwrap()[0].password_hash.is_empty());
    }

    #[test]
    fn duplicate_email() {
        let store = store();
        store.register_user("ann@example.com", "secret", "Ann").unwrap();
        let users = store.users().unwrap();
        let mut session = Session::anonymous();
        let err = session
            .register(&store, "ann@example.com", "another", "Other Ann")
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentity { .. }));
        assert_eq!(store.users().unwrap(), users);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn admin_email_grants_admin() {
        let store = store();
        let mut session = Session::anonymous();
        assert!(matches!(
            session.require_admin(),
            Err(StoreError::NotAuthorized)
        ));
        session
            .register(&store, "ann@example.com", "secret", "Ann")
            .unwrap();
        assert!(session.require_admin().is_err());
        session
            .register(&store, "admin@orangeflix.com", "secret", "Admin")
            .unwrap();
        assert_eq!(session.require_admin().unwrap().name, "Admin");
    }

    #[test]
    fn short_password_is_rejected() {
        let store = store();
        let mut session = Session::anonymous();
        assert!(matches!(
            session.register(&store, "ann@example.com", "12345", "Ann"),
            Err(StoreError::WeakPassword { min: MIN_PASSWORD_LEN })
        ));
        assert!(store.users().unwrap().is_empty());
        assert!(!session.is_authenticated());
        session
            .register(&store, "ann@example.com", "123456", "Ann")
            .unwrap();
    }

    #[test]
    fn login_checks_password() {
        let store = store();
        store.register_user("ann@example.com", "secret", "Ann").unwrap();
        let mut session = Session::anonymous();
        assert!(matches!(
            session.login(&store, "ann@example.com", "wrong"),
            Err(StoreError::InvalidCredentials { .. })
        ));
        assert!(!session.is_authenticated());
        session.login(&store, "ann@example.com", "secret").unwrap();
        assert_eq!(session.current_user().unwrap().email, "ann@example.com");
    }

    #[test]
    fn unknown_email() {
        let store = store();
        let err = Session::anonymous()
            .login(&store, "nobody@example.com", "pw")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn unverified_login() {
        let store = RecordStore::with_config(
            MemoryStorage::new(),
            Config::new().bcrypt_cost(4).verify_passwords(false),
        );
        store.register_user("ann@example.com", "secret", "Ann").unwrap();
        let mut session = Session::anonymous();
        session
            .login(&store, "ann@example.com", "anything")
            .unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn logout_clears_pointer() {
        let store = store();
        let mut session = Session::anonymous();
        session.register(&store, "ann@example.com", "secret", "Ann").unwrap();
        session.logout(&store).unwrap();
        assert!(session.current_user().is_none());
        assert_eq!(store.current_user_pointer().unwrap(), None);
        assert_eq!(Session::restore(&store).unwrap(), Session::anonymous());
    }

    #[test]
    fn malformed_pointer_is_logged_out() {
        let store = store();
        store.put_raw(CURRENT_USER, Some(b"nope".to_vec())).unwrap();
        assert!(!Session::restore(&store).unwrap().is_authenticated());
    }
}
