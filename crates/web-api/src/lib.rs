pub mod handlers;
pub mod server;

pub use handlers::{HealthResponse, WebhookResponse};
pub use server::ApiServer;
