//! Scan consumers
//!
//! Every accepted scan is handed to exactly one [`ScanReporter`]. The
//! daemon runs the report in its own task so the decoder is never held up
//! by the network.

use crate::api::models::ScanRequest;
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::session::Scan;

/// What the consumer learned about a recorded scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReceipt {
    pub product_name: Option<String>,
}

/// Trait for scan consumers
#[async_trait::async_trait]
pub trait ScanReporter: Send + Sync {
    /// Record one accepted scan
    async fn report(&self, scan: &Scan) -> Result<ScanReceipt, ApiError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Records scans through `POST /api/Shipment/scan`
pub struct ApiReporter {
    client: ApiClient,
}

impl ApiReporter {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ScanReporter for ApiReporter {
    async fn report(&self, scan: &Scan) -> Result<ScanReceipt, ApiError> {
        let client = self.client.clone();
        let request = ScanRequest {
            shipment_id: scan.shipment.id,
            barcode: scan.barcode.clone(),
            quantity: 1,
        };

        // ureq blocks; keep it off the runtime threads
        let response = tokio::task::spawn_blocking(move || client.record_scan(&request))
            .await
            .map_err(|e| ApiError::Network(format!("Report task failed: {}", e)))??;

        Ok(ScanReceipt {
            product_name: response.product_name().map(str::to_string),
        })
    }

    fn name(&self) -> &'static str {
        "api"
    }
}

/// Logs scans without contacting the server
pub struct OfflineReporter;

#[async_trait::async_trait]
impl ScanReporter for OfflineReporter {
    async fn report(&self, scan: &Scan) -> Result<ScanReceipt, ApiError> {
        tracing::info!(
            "[offline] {} -> shipment {}{}",
            scan.barcode,
            scan.shipment,
            if scan.manual { " (manual)" } else { "" }
        );
        Ok(ScanReceipt::default())
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::selection::ShipmentRef;

    fn scan() -> Scan {
        Scan {
            barcode: "7501031311309".into(),
            shipment: ShipmentRef::new(4, None),
            manual: false,
        }
    }

    #[tokio::test]
    async fn test_offline_reporter_always_succeeds() {
        let reporter = OfflineReporter;
        assert_eq!(reporter.report(&scan()).await.unwrap(), ScanReceipt::default());
        assert_eq!(reporter.name(), "offline");
    }

    #[tokio::test]
    async fn test_api_reporter_requires_login() {
        // No token: fails locally before any request is made
        let reporter = ApiReporter::new(ApiClient::new(&ApiConfig::default()));
        let err = reporter.report(&scan()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotLoggedIn));
    }
}
