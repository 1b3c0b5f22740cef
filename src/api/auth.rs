//! Login, registration and token verification

use super::models::{LoginRequest, LoginResponse, RegisterRequest, Role, User};
use super::ApiClient;
use crate::error::ApiError;

impl ApiClient {
    /// Exchange credentials for a token and the user profile
    pub fn login(&self, username: &str, password: &str) -> Result<(String, User), ApiError> {
        let response: LoginResponse = self.post(
            "/api/auth/login",
            Some(&LoginRequest { username, password }),
        )?;

        match (response.token, response.user) {
            (Some(token), Some(user)) if !token.is_empty() => Ok((token, user)),
            _ => Err(ApiError::Decode(
                "Login response is missing the token or user".to_string(),
            )),
        }
    }

    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<serde_json::Value, ApiError> {
        self.post(
            "/api/auth/register",
            Some(&RegisterRequest {
                username,
                email,
                password,
                role,
            }),
        )
    }

    /// Check the stored token with the server
    pub fn verify(&self) -> Result<serde_json::Value, ApiError> {
        self.require_auth()?;
        self.get("/api/auth/verify", &[])
    }
}
