mod checkouts;
mod dashboard;
mod events;
mod orders;
mod payment_configs;
mod tickets;
mod users;
mod venues;

pub use checkouts::PgCheckoutRepository;
pub use dashboard::PgDashboardRepository;
pub use events::PgEventRepository;
pub use orders::PgOrderRepository;
pub use payment_configs::PgPaymentConfigRepository;
pub use tickets::PgTicketRepository;
pub use users::PgUserRepository;
pub use venues::PgVenueRepository;
