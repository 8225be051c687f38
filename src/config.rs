use crate::database::RecordStore;
use crate::error::Result;
use crate::storage::SledStorage;
use log::debug;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_NAMESPACE: &str = "orangeflix";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@orangeflix.com";

/// Settings for opening a store, built the same way as `sled::Config`.
///
/// ```no_run
/// let store = orangeflix::Config::new()
///     .path("/var/lib/orangeflix")
///     .verify_passwords(false)
///     .open()?;
/// # Ok::<(), orangeflix::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) path: Option<PathBuf>,
    pub(crate) temporary: bool,
    pub(crate) namespace: String,
    pub(crate) admin_email: String,
    pub(crate) verify_passwords: bool,
    pub(crate) bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            path: None,
            temporary: false,
            namespace: DEFAULT_NAMESPACE.to_owned(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_owned(),
            verify_passwords: true,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `ORANGEFLIX_*` environment variables. Values
    /// that fail to parse are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = env::var("ORANGEFLIX_DB_PATH") {
            config.path = Some(PathBuf::from(path));
        }
        if let Ok(namespace) = env::var("ORANGEFLIX_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Ok(email) = env::var("ORANGEFLIX_ADMIN_EMAIL") {
            config.admin_email = email;
        }
        if let Some(verify) = env::var("ORANGEFLIX_VERIFY_PASSWORDS")
            .ok()
            .and_then(|v| parse_flag(&v))
        {
            config.verify_passwords = verify;
        }
        if let Some(cost) = env::var("ORANGEFLIX_BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.bcrypt_cost = cost;
        }
        config
    }

    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_owned());
        self
    }

    /// Discard all data when the store is dropped.
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    /// Name of the sled tree holding the collections.
    pub fn namespace<N: Into<String>>(mut self, namespace: N) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Registering with this email grants administrator rights.
    pub fn admin_email<E: Into<String>>(mut self, email: E) -> Self {
        self.admin_email = email.into();
        self
    }

    pub fn verify_passwords(mut self, verify: bool) -> Self {
        self.verify_passwords = verify;
        self
    }

    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn open(self) -> Result<RecordStore<SledStorage>> {
        let mut sled_config = sled::Config::new().temporary(self.temporary);
        if let Some(path) = &self.path {
            sled_config = sled_config.path(path);
        }
        debug!("Opening store {:?} (namespace {})", self.path, self.namespace);
        let storage = SledStorage::new(sled_config.open()?, &self.namespace)?;
        Ok(RecordStore::with_config(storage, self))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::new()
            .namespace("test")
            .admin_email("root@example.com")
            .verify_passwords(false)
            .bcrypt_cost(4);
        assert_eq!(config.namespace, "test");
        assert_eq!(config.admin_email, "root@example.com");
        assert!(!config.verify_passwords);
        assert_eq!(config.bcrypt_cost, 4);
        assert!(Config::new().verify_passwords);
    }

    #[test]
    fn open_temporary() {
        let store = Config::new().temporary(true).open().unwrap();
        assert!(store.users().unwrap().is_empty());
    }
}
