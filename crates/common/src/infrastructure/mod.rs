pub mod error;
pub use error::Error;

pub mod http_client;
pub use http_client::HttpClientFactory;

pub mod utils;
pub use utils::{parse_and_validate_url, request_body_limit};
