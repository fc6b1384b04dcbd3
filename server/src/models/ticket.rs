use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::unknown_variant;
use crate::utils::error::AppError;

/// `Active` until the first successful check-in, then `Used` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Used,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Active => "active",
            TicketStatus::Used => "used",
        }
    }
}

impl FromStr for TicketStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TicketStatus::Active),
            "used" => Ok(TicketStatus::Used),
            other => Err(unknown_variant("ticket status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub qr_code: String,
    pub order_id: String,
    pub event_id: Uuid,
    pub ticket_type: String,
    pub price: Decimal,
    pub status: TicketStatus,
    pub checked_in_time: Option<DateTime<Utc>>,
    pub checked_in_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_checked_in(&self) -> bool {
        self.checked_in_time.is_some()
    }
}

/// Row of the organizer's attendee list: a ticket joined with its order's customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub qr_code: String,
    pub order_id: String,
    pub ticket_type: String,
    pub status: TicketStatus,
    pub checked_in_time: Option<DateTime<Utc>>,
    pub customer_name: String,
    pub customer_email: String,
}
