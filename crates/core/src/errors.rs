use thiserror::Error;

/// Unified error type for the entire pegasus-client-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Aggregation / Reconciliation ────────────────────────────────
    #[error("Failed to load {view}: {message}")]
    PrimaryFetch {
        view: &'static str,
        message: String,
    },

    // ── Mutations ───────────────────────────────────────────────────
    #[error("A removal for {target_id} is already in progress")]
    MutationInProgress { target_id: String },

    #[error("Removal of {target_id} was rejected by the server: {message}")]
    MutationRemote {
        target_id: String,
        message: String,
    },

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({operation}): {message}")]
    Api {
        operation: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs to prevent
        // token leakage. reqwest errors often contain full URLs with secrets.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
