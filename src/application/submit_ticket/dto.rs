use crate::{
    domain::submission::entity::Submission,
    infrastructure::storage::scratch_storage::TempUpload,
};

/// A validated submission together with the stored proof it owns.
///
/// Dropping the request removes the proof file from scratch storage.
#[derive(Debug)]
pub struct SubmitTicketRequest {
    pub submission: Submission,
    pub proof: TempUpload,
}
