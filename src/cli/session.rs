use crate::error::{MstoreError, Result};

pub use crate::account::types::UserRole;

/// Logged-in user, handed to every operation that needs to know who is asking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: UserRole,
}

impl Session {
    pub fn new(username: &str, role: UserRole) -> Self {
        Self {
            username: username.to_string(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// `action` completes the sentence "Only admin can ..."
    pub fn require_admin(&self, action: &'static str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(MstoreError::PermissionDenied(action))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        assert!(Session::new("root", UserRole::Admin).require_admin("delete users").is_ok());

        let err = Session::new("alice", UserRole::Normal)
            .require_admin("delete users")
            .unwrap_err();
        assert_eq!(err.to_string(), "Only admin can delete users.");
    }
}
