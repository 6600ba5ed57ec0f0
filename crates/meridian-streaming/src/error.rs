use meridian_core::AssetId;

/// Errors that can occur while acquiring a streamed asset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamingError {
    /// The catalog does not know the key. Raised before any request is issued.
    #[error("invalid {asset}: not in the asset catalog")]
    InvalidAsset { asset: AssetId },

    /// The asset did not finish loading within its budget. The host request
    /// is left running.
    #[error("timed out after {budget_ms} ms waiting for {asset}")]
    Timeout { asset: AssetId, budget_ms: u64 },
}
