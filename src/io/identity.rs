//! Identity port and a local, file-backed adapter.
//!
//! The local adapter keeps registered users in `users.json` (salted SHA-256
//! password digests) and the signed-in user in `session.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::io::atomic::atomic_write;
use crate::io::lock::{LockError, StoreLock};
use crate::model::user::User;

const USERS_FILE: &str = "users.json";
const SESSION_FILE: &str = "session.json";
const MIN_PASSWORD_LEN: usize = 6;

/// Error type for identity operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("password must be at least 6 characters")]
    WeakPassword,
    #[error("an account already exists for {0}")]
    EmailInUse(String),
    #[error("wrong email or password")]
    InvalidCredentials,
    #[error("not signed in (run `tl login` or `tl signup`)")]
    NotSignedIn,
    #[error("could not read or write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Identity provider contract.
pub trait Identity {
    /// The signed-in user, if any.
    fn current_user(&self) -> Result<Option<User>, AuthError>;

    /// Register a new account and sign it in.
    fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError>;

    fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;

    fn sign_out(&self) -> Result<(), AuthError>;

    /// The signed-in user, or [`AuthError::NotSignedIn`].
    fn require_user(&self) -> Result<User, AuthError> {
        self.current_user()?.ok_or(AuthError::NotSignedIn)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    id: String,
    email: String,
    salt: String,
    digest: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Debug, Clone)]
pub struct LocalIdentity {
    data_dir: PathBuf,
}

impl LocalIdentity {
    pub fn new(data_dir: &Path) -> Self {
        LocalIdentity {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AuthError> {
        let path = self.data_dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| AuthError::Io {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| AuthError::Parse { path, source: e })
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), AuthError> {
        let path = self.data_dir.join(name);
        fs::create_dir_all(&self.data_dir).map_err(|e| AuthError::Io {
            path: self.data_dir.clone(),
            source: e,
        })?;
        let content = serde_json::to_string_pretty(value).map_err(|e| AuthError::Parse {
            path: path.clone(),
            source: e,
        })?;
        atomic_write(&path, content.as_bytes()).map_err(|e| AuthError::Io { path, source: e })
    }

    /// Append a user record to `users.json` while holding the data
    /// directory lock, so two sign-ups never overwrite each other.
    fn register(&self, email: String, password: &str) -> Result<User, AuthError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| AuthError::Io {
            path: self.data_dir.clone(),
            source: e,
        })?;
        let _lock = StoreLock::acquire_default(&self.data_dir)?;

        let mut file: UsersFile = self.read_json(USERS_FILE)?.unwrap_or_default();
        if file.users.iter().any(|u| u.email == email) {
            return Err(AuthError::EmailInUse(email));
        }
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let record = UserRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            email: email.clone(),
            digest: password_digest(&salt, password),
            salt,
        };
        let user = User {
            id: record.id.clone(),
            email,
        };
        file.users.push(record);
        self.write_json(USERS_FILE, &file)?;
        Ok(user)
    }

    fn start_session(&self, user: &User) -> Result<(), AuthError> {
        self.write_json(SESSION_FILE, user)?;
        tracing::info!(user = %user.email, "signed in");
        Ok(())
    }
}

impl Identity for LocalIdentity {
    fn current_user(&self) -> Result<Option<User>, AuthError> {
        self.read_json(SESSION_FILE)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let user = self.register(email, password)?;
        tracing::info!(user = %user.email, "account created");
        self.start_session(&user)?;
        Ok(user)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        let file: UsersFile = self.read_json(USERS_FILE)?.unwrap_or_default();
        let record = file
            .users
            .iter()
            .find(|u| u.email == email)
            .ok_or(AuthError::InvalidCredentials)?;
        if password_digest(&record.salt, password) != record.digest {
            tracing::debug!(user = %email, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }
        let user = User {
            id: record.id.clone(),
            email: record.email.clone(),
        };
        self.start_session(&user)?;
        Ok(user)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        let path = self.data_dir.join(SESSION_FILE);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("signed out");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Io { path, source: e }),
        }
    }
}

/// Trim and lowercase an email, rejecting anything without a local part and
/// a dotted domain.
fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail(email))
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
