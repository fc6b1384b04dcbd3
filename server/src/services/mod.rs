pub mod checkin;
pub mod checkout;
pub mod coupon;
pub mod dashboard;
pub mod materializer;
pub mod pricing;
