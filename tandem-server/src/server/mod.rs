pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AppState;
pub use middleware::ResponseCache;
pub use router::create_router;
