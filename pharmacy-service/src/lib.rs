pub mod error;
pub mod state;
pub mod orders;
pub mod cart;
pub mod payments;
pub mod notifications;
pub mod stock;
pub mod seed;

pub use error::ServiceError;
pub use state::AppState;
