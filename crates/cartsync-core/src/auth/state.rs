use super::Session;

/// Answers "is a shopper signed in right now?".
///
/// Cart operations talk to the server when this is true and to the local
/// store otherwise.
pub trait AuthState: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

impl AuthState for Session {
    fn is_authenticated(&self) -> bool {
        self.is_valid()
    }
}

/// Fixed answer, e.g. to force anonymous mode regardless of any saved session.
#[derive(Debug, Clone, Copy)]
pub struct StaticAuth(pub bool);

impl AuthState for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.0
    }
}
