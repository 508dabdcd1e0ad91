use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MindmateError, MindmateResult};

/// Minimum length for a new password.
pub const MIN_PASSWORD_LEN: usize = 6;

const LOGIN_USER_ID: &str = "1";
const REGISTER_USER_ID: &str = "2";
const MOCK_TOKEN: &str = "mock-jwt-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub join_date: DateTime<Local>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated { user: User, token: String },
}

/// Stub authentication: every credential is accepted.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated { user, .. } => Some(user),
            SessionState::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<String> {
        self.current_user().map(|u| u.id.clone())
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Some(token),
            SessionState::Anonymous => None,
        }
    }

    pub fn login(&mut self, username: &str, _password: &str) -> MindmateResult<User> {
        Ok(self.authenticate(LOGIN_USER_ID, username))
    }

    pub fn register(&mut self, username: &str, _password: &str) -> MindmateResult<User> {
        Ok(self.authenticate(REGISTER_USER_ID, username))
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.current_user() {
            info!(username = %user.username, "logged out");
        }
        self.state = SessionState::Anonymous;
    }

    pub fn profile(&self) -> MindmateResult<UserProfile> {
        let user = self.require_user()?;
        Ok(UserProfile {
            id: user.id.clone(),
            username: user.username.clone(),
            email: "user@example.com".to_string(),
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
            join_date: Local::now(),
        })
    }

    pub fn change_password(&self, current: &str, new: &str, confirm: &str) -> MindmateResult<()> {
        let user = self.require_user()?;
        if current.is_empty() {
            return Err(MindmateError::Validation("current password is required".into()));
        }
        validate_new_password(new, confirm)?;
        info!(username = %user.username, "password changed");
        Ok(())
    }

    pub fn delete_account(&mut self, _password: &str) -> MindmateResult<()> {
        let user = self.require_user()?;
        info!(username = %user.username, "account deleted");
        self.logout();
        Ok(())
    }

    fn authenticate(&mut self, id: &str, username: &str) -> User {
        let user = User {
            id: id.to_string(),
            username: username.to_string(),
        };
        info!(username = %user.username, id = %user.id, "authenticated");
        self.state = SessionState::Authenticated {
            user: user.clone(),
            token: MOCK_TOKEN.to_string(),
        };
        user
    }

    fn require_user(&self) -> MindmateResult<&User> {
        self.current_user().ok_or_else(|| {
            warn!("operation requires an authenticated session");
            MindmateError::NotAuthenticated
        })
    }
}

/// Checks the rules shared by the register and change-password forms.
pub fn validate_new_password(password: &str, confirm: &str) -> MindmateResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(MindmateError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password != confirm {
        return Err(MindmateError::Validation("passwords do not match".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_anonymous() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.current_user(), None);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn login_accepts_anything() {
        let mut session = Session::new();
        let user = session.login("alice", "").unwrap();
        assert_eq!(user.id, "1");
        assert_eq!(user.username, "alice");
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("mock-jwt-token"));
    }

    #[test]
    fn register_authenticates_with_its_own_id() {
        let mut session = Session::new();
        let user = session.register("bob", "hunter22").unwrap();
        assert_eq!(user.id, "2");
        assert_eq!(session.user_id().as_deref(), Some("2"));
    }

    #[test]
    fn logout_clears_identity() {
        let mut session = Session::new();
        session.login("alice", "pw").unwrap();
        session.logout();
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(session.user_id(), None);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn profile_requires_login() {
        let mut session = Session::new();
        assert_eq!(session.profile(), Err(MindmateError::NotAuthenticated));
        session.login("carol", "pw").unwrap();
        let profile = session.profile().unwrap();
        assert_eq!(profile.username, "carol");
        assert_eq!(profile.email, "user@example.com");
    }

    #[test]
    fn change_password_rules() {
        let mut session = Session::new();
        assert_eq!(
            session.change_password("old", "newpass", "newpass"),
            Err(MindmateError::NotAuthenticated)
        );

        session.login("dave", "old").unwrap();
        assert!(session.change_password("", "newpass", "newpass").is_err());
        assert!(session.change_password("old", "short", "short").is_err());
        assert!(session.change_password("old", "newpass", "newpasz").is_err());
        assert!(session.change_password("old", "newpass", "newpass").is_ok());
    }

    #[test]
    fn delete_account_logs_out() {
        let mut session = Session::new();
        assert_eq!(session.delete_account("pw"), Err(MindmateError::NotAuthenticated));
        session.login("erin", "pw").unwrap();
        session.delete_account("pw").unwrap();
        assert!(!session.is_authenticated());
    }
}
