pub mod relay;
pub mod security;
pub mod storage;
