pub mod metrics;
pub mod tracing;

pub use self::metrics::{UNMATCHED_PATH, metrics_middleware};
pub use self::tracing::{REQUEST_ID_HEADER, request_id_middleware};
