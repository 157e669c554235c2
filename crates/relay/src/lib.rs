pub mod captcha;
pub mod dispatcher;
pub mod formatter;
pub mod metrics;
pub mod server;
pub mod sink;
pub mod types;
pub mod validation;


pub use dispatcher::RelayDispatcher;
pub use server::{build_dispatcher, create_router, start_spill_server};
