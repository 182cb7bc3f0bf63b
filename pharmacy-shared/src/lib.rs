pub mod models;
pub mod money;
pub mod pii;

pub use money::Cents;
pub use pii::Masked;
