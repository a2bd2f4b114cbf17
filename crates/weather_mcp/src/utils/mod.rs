mod http_client;
pub use http_client::build_client;

pub mod logging;
