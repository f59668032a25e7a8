pub mod articles;
pub mod batches;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod uploads;

pub use routes::create_router;
