//! Transport companies (carriers)

use super::models::{TransportCompany, TransportCompanyInput};
use super::ApiClient;
use crate::error::ApiError;

impl ApiClient {
    pub fn transport_companies(&self, active_only: bool) -> Result<Vec<TransportCompany>, ApiError> {
        self.require_auth()?;
        let active = if active_only { "true" } else { "false" };
        self.get_list("/api/TransportCompany", &[("activeOnly", active)])
    }

    pub fn transport_company(&self, id: i64) -> Result<TransportCompany, ApiError> {
        self.require_auth()?;
        self.get(&format!("/api/TransportCompany/{}", id), &[])
    }

    pub fn search_transport_by_plate(&self, plate: &str) -> Result<Vec<TransportCompany>, ApiError> {
        self.require_auth()?;
        self.get_list("/api/TransportCompany/search", &[("plate", plate)])
    }

    /// Create a carrier; the admin endpoint skips the per-user ownership
    pub fn create_transport_company(
        &self,
        input: &TransportCompanyInput,
        as_admin: bool,
    ) -> Result<TransportCompany, ApiError> {
        self.require_auth()?;
        let path = if as_admin {
            "/api/TransportCompany"
        } else {
            "/api/TransportCompany/user"
        };
        self.post(path, Some(input))
    }

    pub fn update_transport_company(
        &self,
        id: i64,
        input: &TransportCompanyInput,
    ) -> Result<serde_json::Value, ApiError> {
        self.require_auth()?;
        self.put(&format!("/api/TransportCompany/{}", id), input)
    }

    pub fn delete_transport_company(&self, id: i64) -> Result<(), ApiError> {
        self.require_auth()?;
        self.delete(&format!("/api/TransportCompany/{}", id))
    }

    pub fn toggle_transport_company(&self, id: i64) -> Result<serde_json::Value, ApiError> {
        self.require_auth()?;
        self.patch::<(), _>(&format!("/api/TransportCompany/{}/toggle-status", id), None)
    }
}
