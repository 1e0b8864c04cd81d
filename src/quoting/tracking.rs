//! Package tracking status lifecycle.
//!
//! Packages move forward one step at a time from `Received` to `Delivered`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tracking status of a shippable package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    /// Initial status assigned when the package is quoted
    #[default]
    Received,
    InTransit,
    InCustoms,
    ReadyForDelivery,
    Delivered,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Received => "received",
            TrackingStatus::InTransit => "in_transit",
            TrackingStatus::InCustoms => "in_customs",
            TrackingStatus::ReadyForDelivery => "ready_for_delivery",
            TrackingStatus::Delivered => "delivered",
        }
    }

    /// Customer facing label
    pub fn label(&self) -> &'static str {
        match self {
            TrackingStatus::Received => "Recibido en casillero",
            TrackingStatus::InTransit => "En tránsito",
            TrackingStatus::InCustoms => "En aduana",
            TrackingStatus::ReadyForDelivery => "Listo para entrega",
            TrackingStatus::Delivered => "Entregado",
        }
    }

    /// The status that follows this one, `None` once delivered
    pub fn next(&self) -> Option<TrackingStatus> {
        match self {
            TrackingStatus::Received => Some(TrackingStatus::InTransit),
            TrackingStatus::InTransit => Some(TrackingStatus::InCustoms),
            TrackingStatus::InCustoms => Some(TrackingStatus::ReadyForDelivery),
            TrackingStatus::ReadyForDelivery => Some(TrackingStatus::Delivered),
            TrackingStatus::Delivered => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(TrackingStatus::Received),
            "in_transit" => Ok(TrackingStatus::InTransit),
            "in_customs" => Ok(TrackingStatus::InCustoms),
            "ready_for_delivery" => Ok(TrackingStatus::ReadyForDelivery),
            "delivered" => Ok(TrackingStatus::Delivered),
            other => Err(format!("unknown tracking status '{}'", other)),
        }
    }
}

/// Check whether a package may move from `from` to `to`.
pub fn can_transition(from: TrackingStatus, to: TrackingStatus) -> bool {
    from.next() == Some(to)
}
