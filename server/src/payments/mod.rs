pub mod credentials;
pub mod gateway;
pub mod signature;

pub use credentials::{CredentialCipher, GatewayCredentials};
pub use gateway::{
    CreateGatewayOrder, GatewayError, GatewayOrder, MockPaymentGateway, PaymentGateway,
    RazorpayGateway,
};
