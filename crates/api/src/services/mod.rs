//! Services: business logic on top of the repositories.

pub mod auth;
pub mod cart;
pub mod currency;
pub mod email;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use currency::CurrencyConverter;
pub use email::{EmailError, EmailService};
pub use orders::{OrderError, OrderService};
