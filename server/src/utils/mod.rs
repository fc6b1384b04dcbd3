pub mod error;
pub mod extract;
pub mod ids;
pub mod response;
