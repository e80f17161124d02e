#![forbid(unsafe_code)]

pub mod error;
pub mod routes;
pub mod telemetry;

pub use error::AppError;
pub use routes::router;
