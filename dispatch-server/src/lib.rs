//! Dispatch Server - multi-vendor order dispatch and delivery assignment
//!
//! # Architecture overview
//!
//! - **Checkout** (`dispatch::splitter`): one flat cart splits into one
//!   order per shop, created atomically as a group
//! - **Assignment** (`dispatch::arbiter`): delivery agents compete for
//!   orders; a compare-and-set picks exactly one winner
//! - **Lifecycle** (`dispatch::lifecycle`): guarded status transitions,
//!   delivery confirmation, cancellations and refunds
//! - **Compensation** (`dispatch::compensator`): at-most-once stock
//!   restoration when orders die
//! - **Notifications** (`notify`, `dispatch::broadcaster`): fire-and-forget
//!   fan-out through an external push gateway
//!
//! # Module structure
//!
//! ```text
//! dispatch-server/src/
//! ├── core/          # configuration, state, HTTP server
//! ├── api/           # HTTP routes and handlers
//! ├── dispatch/      # the order workflow
//! ├── notify/        # push gateway abstraction
//! ├── db/            # embedded SurrealDB storage
//! └── utils/         # errors, logging
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod dispatch;
pub mod notify;
pub mod utils;

// Re-export public types
pub use core::{AppType, Config, Server, ServerState};
pub use dispatch::{DispatchError, DispatchResult};
pub use utils::{AppError, AppResponse, AppResult};

/// Load .env, create the working directory and initialize logging
pub fn setup_environment() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;

    let log_dir = std::path::PathBuf::from(&config.work_dir).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    if config.is_production() {
        utils::logger::init_logger_with_file(Some(&level), log_dir.to_str());
    } else {
        utils::logger::init_logger_with_file(Some(&level), None);
    }
    Ok(())
}
