pub mod catalog;
pub mod error;
pub mod handlers;
pub mod rankings;
pub mod reference;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
