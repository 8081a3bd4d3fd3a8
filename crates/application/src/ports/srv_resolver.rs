use async_trait::async_trait;
use dclocate_domain::DomainError;

use crate::services::CandidateDirectory;

#[async_trait]
pub trait SrvResolver: Send + Sync {
    /// Resolves `<service>.<domain>` and fills `directory` with the usable
    /// SRV targets, each carrying an address.
    ///
    /// Returns the number of candidates inserted. Zero is never returned as
    /// `Ok`; an empty answer is `DomainError::NoSrvRecords`.
    async fn lookup(
        &self,
        service: &str,
        domain: &str,
        directory: &mut CandidateDirectory,
    ) -> Result<usize, DomainError>;
}
