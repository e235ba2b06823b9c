use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::UserCredential;

/// Authenticated identity. Every directory operation receives one explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
}

/// Identity provider seam: sign-in, sign-out and token lookup.
pub trait AuthProvider: Send + Sync {
    fn login(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn logout(&self, session: &Session);
    fn resolve(&self, token: &str) -> Option<Session>;
    fn active_sessions(&self) -> usize;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("session is missing or expired")]
    Unauthenticated,
    #[error("session store unavailable")]
    Unavailable,
}

impl Session {
    pub fn is_live(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.issued_at) < ttl
    }
}

/// Provider backed by a fixed list of users whose passwords are stored as blake3 digests.
/// Sessions expire `session_ttl` after sign-in; expired entries are pruned on the next login.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    users: Arc<HashMap<String, String>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    session_ttl: Duration,
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self::new([])
    }
}

impl StaticCredentials {
    pub fn new(users: impl IntoIterator<Item = UserCredential>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.email.to_lowercase(), user.password_digest))
            .collect();
        Self {
            users: Arc::new(users),
            sessions: Arc::default(),
            session_ttl: Duration::hours(12),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Digest format expected in `APP_USERS`.
    pub fn digest(password: &str) -> String {
        blake3::hash(password.as_bytes()).to_hex().to_string()
    }
}

impl AuthProvider for StaticCredentials {
    fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_lowercase();
        let expected = self
            .users
            .get(&email)
            .ok_or(AuthError::InvalidCredentials)?;
        if Self::digest(password) != *expected {
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            email,
            issued_at: Utc::now(),
        };
        let mut sessions = self.sessions.write().map_err(|_| AuthError::Unavailable)?;
        let now = session.issued_at;
        sessions.retain(|_, existing| existing.is_live(now, self.session_ttl));
        sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    fn logout(&self, session: &Session) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(&session.token);
        }
    }

    fn resolve(&self, token: &str) -> Option<Session> {
        let session = self.sessions.read().ok()?.get(token).cloned()?;
        if session.is_live(Utc::now(), self.session_ttl) {
            return Some(session);
        }
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(token);
        }
        None
    }

    fn active_sessions(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .read()
            .map(|sessions| {
                sessions
                    .values()
                    .filter(|session| session.is_live(now, self.session_ttl))
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> StaticCredentials {
        StaticCredentials::new([UserCredential {
            email: "Coordinator@Example.org".to_string(),
            password_digest: StaticCredentials::digest("correct horse"),
        }])
    }

    #[test]
    fn login_issues_resolvable_session() {
        let auth = provider();
        let session = auth
            .login(" coordinator@example.org ", "correct horse")
            .expect("login succeeds");

        assert_eq!(session.email, "coordinator@example.org");
        assert_eq!(auth.resolve(&session.token), Some(session.clone()));
        assert_eq!(auth.active_sessions(), 1);

        auth.logout(&session);
        assert!(auth.resolve(&session.token).is_none());
        assert_eq!(auth.active_sessions(), 0);
    }

    #[test]
    fn wrong_password_and_unknown_user_are_indistinguishable() {
        let auth = provider();
        let wrong = auth.login("coordinator@example.org", "battery staple");
        let unknown = auth.login("nobody@example.org", "correct horse");

        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn expired_sessions_stop_resolving_and_counting() {
        let auth = provider().with_session_ttl(Duration::zero());
        let session = auth
            .login("coordinator@example.org", "correct horse")
            .expect("login succeeds");

        assert!(auth.resolve(&session.token).is_none());
        assert_eq!(auth.active_sessions(), 0);
    }

    #[test]
    fn abandoned_sessions_are_pruned_on_login() {
        let auth = provider().with_session_ttl(Duration::zero());
        for _ in 0..3 {
            auth.login("coordinator@example.org", "correct horse")
                .expect("login succeeds");
        }

        assert_eq!(auth.sessions.read().expect("lock").len(), 1);
    }
}
