//! Serialization formats for persisted fallback records.

use serde::{Deserialize, Serialize};

/// How a failed wire request is rendered into the fallback file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackFormat {
    /// Newline-delimited JSON: one human-readable line per failed request.
    #[default]
    Ndjson,
    /// Length-delimited protobuf bytes, one framed message per failed
    /// request.
    Protobuf,
}

impl std::str::FromStr for FallbackFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ndjson" => Ok(Self::Ndjson),
            "protobuf" => Ok(Self::Protobuf),
            other => Err(format!("unsupported fallback format: {other}")),
        }
    }
}

impl FallbackFormat {
    /// Renders a wire message as one appendable record.
    ///
    /// Best-effort: a message that cannot be rendered yields an empty
    /// buffer (and a warning), which callers skip.
    pub fn render<M>(self, message: &M) -> Vec<u8>
    where
        M: prost::Message + Serialize,
    {
        match self {
            Self::Ndjson => match serde_json::to_vec(message) {
                Ok(mut line) => {
                    line.push(b'\n');
                    line
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to render fallback record as JSON");
                    Vec::new()
                }
            },
            Self::Protobuf => message.encode_length_delimited_to_vec(),
        }
    }
}
