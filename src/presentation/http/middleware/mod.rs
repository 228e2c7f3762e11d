pub mod ingress;
pub mod logging;
pub mod rate_limit;
pub mod request_id;
