//! Wire types for the shipment API
//!
//! Field names follow the server's camelCase JSON. Timestamps are kept as
//! the strings the server sends; [`crate::format`] renders them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    User,
    Admin,
    Scanner,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "scanner" => Ok(Role::Scanner),
            other => Err(format!(
                "Unknown role '{}'. Expected user, admin or scanner",
                other
            )),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::Scanner => "Scanner",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_scans: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_products_scanned: Option<u64>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Login succeeds only when both token and user come back
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ShipmentStatus {
    /// Whether scans may still be recorded against the shipment
    pub fn is_open(self) -> bool {
        matches!(self, ShipmentStatus::Pending | ShipmentStatus::InProgress)
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "pending" => Ok(ShipmentStatus::Pending),
            "inprogress" => Ok(ShipmentStatus::InProgress),
            "completed" => Ok(ShipmentStatus::Completed),
            "cancelled" | "canceled" => Ok(ShipmentStatus::Cancelled),
            other => Err(format!("Unknown shipment status '{}'", other)),
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShipmentStatus::Pending => "Pending",
            ShipmentStatus::InProgress => "In progress",
            ShipmentStatus::Completed => "Completed",
            ShipmentStatus::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// Carrier details embedded in a shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierSummary {
    pub name: String,
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub license_plate: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: i64,
    pub shipment_number: String,
    pub status: ShipmentStatus,
    #[serde(default)]
    pub transport_company_id: Option<i64>,
    #[serde(default)]
    pub transport_company: Option<CarrierSummary>,
    #[serde(default)]
    pub product_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub estimated_departure: Option<String>,
    #[serde(default)]
    pub actual_departure: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    pub shipment_number: String,
    pub transport_company_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_departure: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartShipmentRequest<'a> {
    pub shipment_number: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: ShipmentStatus,
}

/// Filters for `GET /api/Shipment/search`; unset fields are not sent
#[derive(Debug, Clone, Default)]
pub struct ShipmentSearch {
    pub status: Option<ShipmentStatus>,
    pub shipment_number: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl ShipmentSearch {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            // The server expects the enum name, not the display form
            let name = serde_json::to_value(status)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            query.push(("status", name));
        }
        if let Some(ref number) = self.shipment_number {
            query.push(("shipmentNumber", number.clone()));
        }
        if let Some(ref from) = self.date_from {
            query.push(("dateFrom", from.clone()));
        }
        if let Some(ref to) = self.date_to {
            query.push(("dateTo", to.clone()));
        }
        query
    }
}

/// Body of `POST /api/Shipment/scan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub shipment_id: i64,
    pub barcode: String,
    pub quantity: u32,
}

/// Response to a recorded scan; the server may return the product or a message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ScanResponse {
    /// Product name to show the operator, if the server sent one
    pub fn product_name(&self) -> Option<&str> {
        self.product
            .as_ref()
            .map(|p| p.name.as_str())
            .or(self.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: i64,
    pub barcode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub scanned_at: Option<String>,
    #[serde(default)]
    pub shipment_id: Option<i64>,
}

/// Product count per category within a shipment
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportCompany {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub license_plate: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub total_shipments: Option<u64>,
    #[serde(default)]
    pub total_products: Option<u64>,
}

/// Create/update body for a transport company
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportCompanyInput {
    pub name: String,
    pub driver_name: String,
    pub license_plate: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUpdate {
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Period {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_shipments: u64,
    #[serde(default)]
    pub total_products_scanned: u64,
    #[serde(default)]
    pub total_users_active: u64,
    #[serde(default)]
    pub avg_products_per_shipment: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCompany {
    #[serde(default)]
    pub company_id: i64,
    pub company_name: String,
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub shipment_count: u64,
    #[serde(default)]
    pub product_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUser {
    #[serde(default)]
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub scan_count: u64,
    #[serde(default)]
    pub total_products_scanned: u64,
    #[serde(default)]
    pub last_scan: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub barcode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_quantity: u64,
    #[serde(default)]
    pub shipment_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCount {
    pub status: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: String,
    #[serde(default)]
    pub scan_operations: u64,
    #[serde(default)]
    pub products_scanned: u64,
}

/// `GET /api/Admin/dashboard/stats`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub summary: DashboardSummary,
    #[serde(default)]
    pub top_transport_companies: Vec<TopCompany>,
    #[serde(default)]
    pub top_users: Vec<TopUser>,
    #[serde(default)]
    pub top_products: Vec<TopProduct>,
    #[serde(default)]
    pub shipments_by_status: Vec<StatusCount>,
    #[serde(default)]
    pub daily_activity: Vec<DailyActivity>,
}

impl DashboardStats {
    pub fn status_count(&self, status: &str) -> u64 {
        self.shipments_by_status
            .iter()
            .find(|s| s.status.eq_ignore_ascii_case(status))
            .map(|s| s.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    #[serde(default)]
    pub shipments: u64,
    #[serde(default)]
    pub products_scanned: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    #[serde(default)]
    pub active_users: u64,
    #[serde(default)]
    pub pending_shipments: u64,
    #[serde(default)]
    pub in_progress_shipments: u64,
}

/// `GET /api/Admin/stats/quick`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuickStats {
    #[serde(default)]
    pub today: TodayStats,
    #[serde(default)]
    pub system: SystemStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_decoding() {
        let json = r#"{
            "id": 5,
            "username": "bodega1",
            "email": "b@example.com",
            "role": "Admin",
            "isActive": true,
            "createdAt": "2024-03-01T10:00:00Z",
            "totalScans": 12
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.is_admin());
        assert_eq!(user.total_scans, Some(12));
        assert!(user.last_login.is_none());
    }

    #[test]
    fn test_shipment_decoding() {
        let json = r#"{
            "id": 3,
            "shipmentNumber": "ENV-003",
            "status": "InProgress",
            "transportCompanyId": 2,
            "transportCompany": {"name": "Coordinadora", "licensePlate": "ABC123"},
            "productCount": 14,
            "createdAt": "2024-03-01T10:00:00"
        }"#;
        let shipment: Shipment = serde_json::from_str(json).unwrap();
        assert_eq!(shipment.status, ShipmentStatus::InProgress);
        assert!(shipment.status.is_open());
        assert_eq!(
            shipment.transport_company.unwrap().license_plate,
            "ABC123"
        );
    }

    #[test]
    fn test_scan_request_body() {
        let body = ScanRequest {
            shipment_id: 3,
            barcode: "7501031311309".into(),
            quantity: 1,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"shipmentId":3,"barcode":"7501031311309","quantity":1}"#
        );
    }

    #[test]
    fn test_scan_response_product_name() {
        let r: ScanResponse =
            serde_json::from_str(r#"{"product":{"barcode":"1","name":"Monitor"}}"#).unwrap();
        assert_eq!(r.product_name(), Some("Monitor"));
        let r: ScanResponse = serde_json::from_str(r#"{"name":"Cable"}"#).unwrap();
        assert_eq!(r.product_name(), Some("Cable"));
        let r: ScanResponse = serde_json::from_str(r#"{"message":"ok"}"#).unwrap();
        assert_eq!(r.product_name(), None);
    }

    #[test]
    fn test_role_and_status_parsing() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(
            "in-progress".parse::<ShipmentStatus>().unwrap(),
            ShipmentStatus::InProgress
        );
        assert_eq!(
            "canceled".parse::<ShipmentStatus>().unwrap(),
            ShipmentStatus::Cancelled
        );
    }

    #[test]
    fn test_search_query_uses_wire_names() {
        let search = ShipmentSearch {
            status: Some(ShipmentStatus::InProgress),
            shipment_number: Some("ENV".into()),
            ..Default::default()
        };
        assert_eq!(
            search.query(),
            vec![
                ("status", "InProgress".to_string()),
                ("shipmentNumber", "ENV".to_string())
            ]
        );
    }

    #[test]
    fn test_dashboard_tolerates_missing_sections() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{"summary":{"totalShipments":9},"shipmentsByStatus":[{"status":"Completed","count":4,"percentage":44.4}]}"#,
        )
        .unwrap();
        assert_eq!(stats.summary.total_shipments, 9);
        assert_eq!(stats.status_count("completed"), 4);
        assert_eq!(stats.status_count("Pending"), 0);
        assert!(stats.top_users.is_empty());
    }
}
