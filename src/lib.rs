pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod guard;
pub mod models;
pub mod query;
pub mod session;
pub mod shell;
pub mod stats;
pub mod sync;
pub mod telemetry;

pub use api::ApiClient;
pub use config::AppConfig;
pub use error::{ApiError, SessionError};
pub use query::{QueryCache, QueryKey, QueryStatus};
pub use session::SessionManager;
pub use sync::FinanceClient;
