use super::TestApp;
use uuid::Uuid;

/// Authenticated test caller.
pub struct TestUser {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Issue a one-hour token for a fresh user.
pub fn register_test_user(app: &TestApp, username: &str) -> TestUser {
    let user_id = Uuid::new_v4();
    let token = app
        .jwt
        .issue_token(user_id, username, chrono::Duration::hours(1))
        .expect("Failed to issue test token");
    TestUser {
        user_id,
        username: username.to_string(),
        token,
    }
}
