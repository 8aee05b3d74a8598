pub mod reqid;
pub mod respond;
pub mod security;
pub mod telemetry;

pub use reqid::*;
pub use respond::*;
pub use security::*;
pub use telemetry::*;
