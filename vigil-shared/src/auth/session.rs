/// Opaque session tokens and the process-wide session store
///
/// Sessions are modeled explicitly: a keyed store of
/// `token -> (user, account, role, expiry)` with explicit issue, resolve,
/// revoke, and purge operations. There is no implicit global login state;
/// every protected operation receives the resolved [`ActorContext`] as an
/// explicit parameter.
///
/// # Token Format
///
/// `vgl_{32 random base62 chars}`: opaque, carries no claims. Validity is
/// decided solely by the store, so revocation is immediate.
///
/// # Example
///
/// ```
/// use vigil_shared::auth::session::SessionStore;
/// use vigil_shared::models::user::{User, UserRole};
/// use std::time::Duration;
///
/// # async fn example(user: User) {
/// let store = SessionStore::new(Duration::from_secs(86_400));
///
/// let session = store.issue(&user).await;
/// let actor = store.resolve(&session.token).await.expect("fresh token resolves");
/// assert_eq!(actor.user_id, user.id);
///
/// store.revoke(&session.token).await;
/// assert!(store.resolve(&session.token).await.is_none());
/// # }
/// ```

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::user::{User, UserRole};

/// Session token prefix
pub const TOKEN_PREFIX: &str = "vgl_";

/// Length of the random part of a session token (characters)
const TOKEN_RANDOM_LENGTH: usize = 32;

/// The resolved identity attached to an authenticated request
///
/// Handlers extract this from request extensions after the session
/// middleware has run; it is the only way protected operations learn who is
/// acting and which account they are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// Authenticated user
    pub user_id: Uuid,

    /// Account every operation is scoped to
    pub account_id: Uuid,

    /// Role driving the permission policy
    pub role: UserRole,
}

/// One live session
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque token handed to the client
    pub token: String,

    /// Authenticated user
    pub user_id: Uuid,

    /// Account the session is bound to
    pub account_id: Uuid,

    /// Role at login time
    pub role: UserRole,

    /// When the session was issued
    pub issued_at: DateTime<Utc>,

    /// When the session stops resolving
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// The actor context this session resolves to
    pub fn actor(&self) -> ActorContext {
        ActorContext {
            user_id: self.user_id,
            account_id: self.account_id,
            role: self.role,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-wide keyed session store
///
/// Cloning shares the underlying map. Mutation is limited to issuing,
/// revoking, and expiry; sessions never share mutable state with each other.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: ChronoDuration,
}

impl SessionStore {
    /// Creates an empty store; issued sessions live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::days(1)),
        }
    }

    /// Issues a fresh session bound to (user, account, role)
    pub async fn issue(&self, user: &User) -> Session {
        let now = Utc::now();
        let session = Session {
            token: generate_token(),
            user_id: user.id,
            account_id: user.account_id,
            role: user.role,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.inner.write().await;
        sessions.insert(session.token.clone(), session.clone());

        session
    }

    /// Resolves a token into an actor context
    ///
    /// Unknown and expired tokens fail identically with `None`; expired
    /// entries are dropped on the way out.
    pub async fn resolve(&self, token: &str) -> Option<ActorContext> {
        let mut sessions = self.inner.write().await;

        match sessions.get(token) {
            Some(session) if session.is_expired(Utc::now()) => {
                sessions.remove(token);
                None
            }
            Some(session) => Some(session.actor()),
            None => None,
        }
    }

    /// Invalidates a token immediately
    ///
    /// Idempotent: revoking an unknown or already-revoked token is not an
    /// error.
    pub async fn revoke(&self, token: &str) {
        let mut sessions = self.inner.write().await;
        sessions.remove(token);
    }

    /// Drops every expired session, returning how many were removed
    ///
    /// Resolution already drops expired entries lazily; this handles tokens
    /// the client never presented again. Called periodically by the sweeper
    /// task the server spawns at startup.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }

    /// Number of live (not yet purged) sessions
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Generates an opaque session token: `vgl_` + 32 base62 chars
fn generate_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let random_part: String = (0..TOKEN_RANDOM_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("{}{}", TOKEN_PREFIX, random_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "tester@example.com".to_string(),
            password_hash: "unused".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            account_id: Uuid::new_v4(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token.len(), TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH);
        assert!(token[TOKEN_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_token_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let store = SessionStore::new(Duration::from_secs(3600));
        let user = test_user(UserRole::Admin);

        let session = store.issue(&user).await;
        let actor = store.resolve(&session.token).await.expect("should resolve");

        assert_eq!(actor.user_id, user.id);
        assert_eq!(actor.account_id, user.account_id);
        assert_eq!(actor.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let store = SessionStore::new(Duration::from_secs(3600));
        assert!(store.resolve("vgl_nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_expired_token() {
        // Zero TTL: sessions are born expired
        let store = SessionStore::new(Duration::ZERO);
        let user = test_user(UserRole::Owner);

        let session = store.issue(&user).await;
        assert!(store.resolve(&session.token).await.is_none());

        // The expired entry was dropped on resolution
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = SessionStore::new(Duration::from_secs(3600));
        let user = test_user(UserRole::Analyst);

        let session = store.issue(&user).await;
        store.revoke(&session.token).await;
        assert!(store.resolve(&session.token).await.is_none());

        // Second revoke is a no-op, not an error
        store.revoke(&session.token).await;
        store.revoke("vgl_never_issued").await;
    }

    #[tokio::test]
    async fn test_purge_expired_removes_only_expired() {
        let expired_store = SessionStore::new(Duration::ZERO);
        let live_store = SessionStore::new(Duration::from_secs(3600));
        let user = test_user(UserRole::Owner);

        expired_store.issue(&user).await;
        expired_store.issue(&user).await;
        live_store.issue(&user).await;

        assert_eq!(expired_store.purge_expired().await, 2);
        assert_eq!(expired_store.len().await, 0);

        assert_eq!(live_store.purge_expired().await, 0);
        assert_eq!(live_store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new(Duration::from_secs(3600));
        let user = test_user(UserRole::Admin);

        let first = store.issue(&user).await;
        let second = store.issue(&user).await;
        assert_ne!(first.token, second.token);

        // Revoking one leaves the other valid
        store.revoke(&first.token).await;
        assert!(store.resolve(&first.token).await.is_none());
        assert!(store.resolve(&second.token).await.is_some());
    }
}
