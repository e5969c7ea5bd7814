use thiserror::Error;

use crate::{PartitionLabel, QueryStatus};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to verify {account} credentials for profile '{profile}': {message}")]
    CredentialVerification {
        account: PartitionLabel,
        profile: String,
        message: String,
    },

    #[error("{0} credentials not configured or insufficient permissions for log analytics")]
    LogsUnavailable(PartitionLabel),

    #[error("Failed to start log query for {partition}: {message}")]
    QueryStart {
        partition: PartitionLabel,
        message: String,
    },

    #[error("{0} log query not found")]
    QueryNotFound(PartitionLabel),

    #[error("{partition} log query {status}")]
    QueryFailed {
        partition: PartitionLabel,
        status: QueryStatus,
    },

    #[error("{partition} log query timed out after {seconds}s")]
    QueryTimeout {
        partition: PartitionLabel,
        seconds: u64,
    },
}
