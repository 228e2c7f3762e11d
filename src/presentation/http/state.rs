use crate::{
    application::submit_ticket::use_case::SubmitTicketUseCase,
    config::Config,
    infrastructure::{
        security::{RateLimiter, UploadPolicy},
        storage::scratch_storage::ScratchStorage,
    },
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub scratch: Arc<ScratchStorage>,
    pub upload_policy: UploadPolicy,
    pub rate_limiter: Arc<RateLimiter>,
    pub submit_ticket: Arc<SubmitTicketUseCase>,
}
