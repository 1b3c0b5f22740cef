//! Products recorded against shipments

use super::models::{CategoryCount, Product};
use super::ApiClient;
use crate::error::ApiError;

impl ApiClient {
    pub fn shipment_products(&self, shipment_id: i64) -> Result<Vec<Product>, ApiError> {
        self.require_auth()?;
        self.get_list(&format!("/api/Product/shipment/{}", shipment_id), &[])
    }

    pub fn product_by_barcode(&self, barcode: &str) -> Result<Product, ApiError> {
        self.require_auth()?;
        self.get_url(&self.endpoint_with("/api/Product/barcode", barcode)?, &[])
    }

    pub fn shipment_categories(&self, shipment_id: i64) -> Result<Vec<CategoryCount>, ApiError> {
        self.require_auth()?;
        self.get_list(
            &format!("/api/Product/shipment/{}/categories", shipment_id),
            &[],
        )
    }
}
