use serde::{Deserialize, Serialize};

/// Liveness body served at `/health`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Health {
    pub status: &'static str,
}
