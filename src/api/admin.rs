//! Administrator endpoints: dashboard, users and reports
//!
//! The server enforces the role; the CLI also checks the stored user's
//! role first so non-admins get a clear message without a round trip.

use super::models::{
    ActiveUpdate, CreateUserRequest, DashboardStats, QuickStats, Role, RoleUpdate, User,
};
use super::ApiClient;
use crate::error::ApiError;

/// Optional reporting window, RFC 3339 timestamps
#[derive(Debug, Clone, Default)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    fn query(&self) -> Vec<(&str, &str)> {
        let mut query = Vec::new();
        if let Some(ref start) = self.start {
            query.push(("startDate", start.as_str()));
        }
        if let Some(ref end) = self.end {
            query.push(("endDate", end.as_str()));
        }
        query
    }
}

impl ApiClient {
    pub fn dashboard_stats(&self, range: &DateRange) -> Result<DashboardStats, ApiError> {
        self.require_auth()?;
        self.get("/api/Admin/dashboard/stats", &range.query())
    }

    pub fn quick_stats(&self) -> Result<QuickStats, ApiError> {
        self.require_auth()?;
        self.get("/api/Admin/stats/quick", &[])
    }

    pub fn users(&self) -> Result<Vec<User>, ApiError> {
        self.require_auth()?;
        self.get_list("/api/Admin/users", &[])
    }

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<serde_json::Value, ApiError> {
        self.require_auth()?;
        self.post(
            "/api/Admin/users",
            Some(&CreateUserRequest {
                username,
                email,
                password,
                role,
            }),
        )
    }

    pub fn set_user_role(&self, id: i64, role: Role) -> Result<serde_json::Value, ApiError> {
        self.require_auth()?;
        self.put(&format!("/api/Admin/users/{}/role", id), &RoleUpdate { role })
    }

    pub fn set_user_active(&self, id: i64, is_active: bool) -> Result<serde_json::Value, ApiError> {
        self.require_auth()?;
        self.put(
            &format!("/api/Admin/users/{}/status", id),
            &ActiveUpdate { is_active },
        )
    }

    /// Shipment report; the shape is server-defined so it is passed through
    pub fn shipment_report(&self, range: &DateRange) -> Result<serde_json::Value, ApiError> {
        self.require_auth()?;
        self.get("/api/Admin/reports/shipments", &range.query())
    }
}
