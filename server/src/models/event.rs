use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::unknown_variant;
use crate::utils::error::AppError;

/// Stored lifecycle. `Completed` is never written: it is derived at read time
/// from the earliest timing, see [`Event::effective_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Active,
    Completed,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Active => "active",
            EventStatus::Completed => "completed",
        }
    }
}

impl FromStr for EventStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "active" => Ok(EventStatus::Active),
            "completed" => Ok(EventStatus::Completed),
            other => Err(unknown_variant("event status", other)),
        }
    }
}

/// Who carries a fee: the buyer pays it on top of the ticket price, the
/// organizer absorbs it from the payout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeePayer {
    Organizer,
    #[default]
    User,
}

impl FeePayer {
    pub fn as_str(self) -> &'static str {
        match self {
            FeePayer::Organizer => "organizer",
            FeePayer::User => "user",
        }
    }
}

impl FromStr for FeePayer {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organizer" => Ok(FeePayer::Organizer),
            "user" => Ok(FeePayer::User),
            other => Err(unknown_variant("fee payer", other)),
        }
    }
}

impl fmt::Display for FeePayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeAllocation {
    pub platform_fee: FeePayer,
    pub payment_gateway_fee: FeePayer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTiming {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketVariant {
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Flat,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_order_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub venue_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub status: EventStatus,
    pub timings: Vec<EventTiming>,
    pub ticket_variants: Vec<TicketVariant>,
    pub promo_codes: Vec<PromoCode>,
    pub platform_fee: FeePayer,
    pub payment_gateway_fee: FeePayer,
    pub tickets_sold: i64,
    pub revenue: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn earliest_timing(&self) -> Option<&EventTiming> {
        self.timings
            .iter()
            .min_by_key(|t| (t.date, t.start_time))
    }

    /// An active event reads as completed once its earliest timing has started.
    /// Timings are wall-clock UTC.
    pub fn effective_status(&self, now: DateTime<Utc>) -> EventStatus {
        match self.status {
            EventStatus::Active => match self.earliest_timing() {
                Some(timing) if timing.date.and_time(timing.start_time).and_utc() <= now => {
                    EventStatus::Completed
                }
                _ => EventStatus::Active,
            },
            other => other,
        }
    }

    pub fn is_owned_by(&self, organizer_id: Uuid) -> bool {
        self.organizer_id == organizer_id
    }

    pub fn variant(&self, ticket_type: &str) -> Option<&TicketVariant> {
        self.ticket_variants
            .iter()
            .find(|v| v.ticket_type == ticket_type)
    }

    /// Promo codes match case-insensitively.
    pub fn promo_code(&self, code: &str) -> Option<&PromoCode> {
        let code = code.trim();
        self.promo_codes
            .iter()
            .find(|p| p.code.eq_ignore_ascii_case(code))
    }

    pub fn fee_allocation(&self) -> FeeAllocation {
        FeeAllocation {
            platform_fee: self.platform_fee,
            payment_gateway_fee: self.payment_gateway_fee,
        }
    }

    /// Copy for anonymous readers: derived status, no promo codes.
    pub fn public_view(&self, now: DateTime<Utc>) -> Event {
        Event {
            status: self.effective_status(now),
            promo_codes: Vec::new(),
            ..self.clone()
        }
    }

    pub fn owner_view(&self, now: DateTime<Utc>) -> Event {
        Event {
            status: self.effective_status(now),
            ..self.clone()
        }
    }
}
