//! Session Gate
//!
//! Cookie-based sessions for the single configured operator account.
//! Tokens are random v4 UUIDs held in memory. Expired sessions are rejected
//! and swept whenever a new session starts.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use subtle::ConstantTimeEq;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::settings::AuthConfig;
use crate::SharedState;

/// Logged-in session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-memory session registry.
///
/// Holds at most `max_sessions` live sessions; starting one more evicts the
/// oldest.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    next_seq: AtomicU64,
    ttl: Duration,
    max_sessions: usize,
}

/// Stored session with its creation order
struct Entry {
    seq: u64,
    session: Session,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Lifetime of newly created sessions
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session, returning its token
    pub fn create(&self, email: &str) -> (String, Session) {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();
        let session = Session {
            email: email.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, e| !e.session.is_expired(now));
        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(token, _)| token.clone());
            match oldest {
                Some(oldest) => {
                    debug!("Session limit reached, evicting oldest session");
                    sessions.remove(&oldest);
                }
                None => break,
            }
        }
        sessions.insert(
            token.clone(),
            Entry {
                seq,
                session: session.clone(),
            },
        );
        (token, session)
    }

    /// Look up a live session; expired ones are removed
    pub fn validate(&self, token: &str) -> Option<Session> {
        let session = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .map(|e| e.session.clone())?;

        if session.is_expired(Utc::now()) {
            debug!("Session for {} expired", session.email);
            self.revoke(token);
            return None;
        }
        Some(session)
    }

    /// End a session, returning whether it existed
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compare submitted credentials with the configured account
pub fn credentials_match(auth: &AuthConfig, email: &str, password: &str) -> bool {
    let email_ok = auth.email.as_bytes().ct_eq(email.as_bytes());
    let password_ok = auth.password.as_bytes().ct_eq(password.as_bytes());
    (email_ok & password_ok).into()
}

/// `Set-Cookie` value starting a session
pub fn session_cookie(name: &str, token: &str, max_age_seconds: u64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        name, token, max_age_seconds
    )
}

/// `Set-Cookie` value clearing the session cookie
pub fn expired_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0", name)
}

/// Extract a named cookie from the request headers
pub fn cookie_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Session token presented with a request
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Middleware rejecting requests without a live session cookie
pub async fn require_session(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = cookie_value(request.headers(), &state.config.auth.cookie_name)
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let session = state.sessions.validate(&token).ok_or(ApiError::Unauthorized)?;

    request.extensions_mut().insert(session);
    request.extensions_mut().insert(SessionToken(token));
    Ok(next.run(request).await)
}
