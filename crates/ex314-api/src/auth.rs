//! Password login against the configured user list and opaque bearer sessions.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;

use crate::config::{AuthConfig, UserEntry};

const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Authenticated caller, inserted into request extensions by the session middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user: CurrentUser,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionStore {
    users: Vec<UserEntry>,
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            users: config.users.clone(),
            ttl: Duration::seconds(
                i64::try_from(config.session_ttl_secs)
                    .unwrap_or(MAX_TTL_SECS)
                    .min(MAX_TTL_SECS),
            ),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Check credentials and open a session; `None` on unknown user or wrong password
    pub fn login(&self, username: &str, password: &str) -> Option<(String, Session)> {
        let entry = self
            .users
            .iter()
            .find(|u| {
                let password_ok = constant_time_eq(u.password.as_bytes(), password.as_bytes());
                u.username == username && password_ok
            })?;

        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let session = Session {
            user: CurrentUser {
                user_id: entry.username.clone(),
                is_admin: entry.admin,
            },
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().ok()?;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(token.clone(), session.clone());
        Some((token, session))
    }

    /// Resolve a live session; expired ones are dropped
    pub fn validate(&self, token: &str) -> Option<CurrentUser> {
        let now = Utc::now();
        let session = self.sessions.read().ok()?.get(token).cloned()?;
        if session.expires_at > now {
            return Some(session.user);
        }
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(token);
        }
        None
    }

    pub fn logout(&self, token: &str) -> bool {
        self.sessions
            .write()
            .map(|mut sessions| sessions.remove(token).is_some())
            .unwrap_or(false)
    }
}
