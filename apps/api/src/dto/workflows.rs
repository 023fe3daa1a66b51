use serde::Serialize;
use ts_rs::TS;

/// Outcome of clearing every integration link of a workflow.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/removed-links-response.ts"
)]
pub struct RemovedLinksResponse {
    #[ts(type = "number")]
    pub removed: u64,
}
