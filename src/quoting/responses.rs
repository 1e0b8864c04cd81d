//! Response DTOs for quoting API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::calculators::{InvoiceLine, PackageDeclaration, ShippablePackage};
use super::models::PackageRow;
use super::tracking::TrackingStatus;

/// Response for a quote, stored or not
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub package: ShippablePackage,
    pub status_label: &'static str,
}

impl QuoteResponse {
    pub fn new(id: Option<Uuid>, package: ShippablePackage) -> Self {
        let status_label = package.status.label();
        Self {
            id,
            package,
            status_label,
        }
    }
}

/// Response for a stored package
#[derive(Debug, Serialize)]
pub struct PackageResponse {
    pub id: Uuid,
    pub tracking_code: String,
    pub user_id: Uuid,
    pub locker_id: Uuid,
    pub factor_id: i32,
    #[serde(flatten)]
    pub declaration: PackageDeclaration,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub invoice: Vec<InvoiceLine>,
    pub status: TrackingStatus,
    pub status_label: &'static str,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PackageRow> for PackageResponse {
    type Error = String;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        let status: TrackingStatus = row.status.parse()?;
        Ok(Self {
            id: row.id,
            tracking_code: row.tracking_code,
            user_id: row.user_id,
            locker_id: row.locker_id,
            factor_id: row.factor_id,
            declaration: PackageDeclaration {
                description: row.description,
                declared_value: row.declared_value,
                category_id: row.category_id,
                weight: row.weight,
                length: row.length,
                width: row.width,
                height: row.height,
                address_id: row.address_id,
            },
            total: row.total,
            invoice: row.invoice.0,
            status,
            status_label: status.label(),
            active: row.active,
            created_at: row.created_at,
        })
    }
}

/// Response for a status change
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub tracking_code: String,
    pub previous: TrackingStatus,
    pub status: TrackingStatus,
    pub status_label: &'static str,
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
