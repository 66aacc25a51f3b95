//! Synchronous stream parameters

use crate::defaults;
use serde::{Deserialize, Serialize};

/// Parameters handed to the driver's synchronous RX interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamParams {
    /// Number of sample buffers
    #[serde(default = "default_num_buffers")]
    pub num_buffers: u32,

    /// Samples per buffer (multiple of 1024)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: u32,

    /// Number of in-flight transfers (less than `num_buffers`)
    #[serde(default = "default_num_transfers")]
    pub num_transfers: u32,

    /// Stream timeout, also used for every receive call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            num_buffers: default_num_buffers(),
            buffer_size: default_buffer_size(),
            num_transfers: default_num_transfers(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StreamParams {
    /// Number of i16 values the sample buffer must hold (I and Q per sample)
    pub fn sample_buffer_len(&self) -> usize {
        self.buffer_size as usize * 2
    }
}

fn default_num_buffers() -> u32 {
    defaults::NUM_BUFFERS
}

fn default_buffer_size() -> u32 {
    defaults::BUFFER_SIZE
}

fn default_num_transfers() -> u32 {
    defaults::NUM_TRANSFERS
}

fn default_timeout_ms() -> u32 {
    defaults::TIMEOUT_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = StreamParams::default();
        assert_eq!(params.num_buffers, 16);
        assert_eq!(params.buffer_size, 65536);
        assert_eq!(params.num_transfers, 8);
        assert_eq!(params.timeout_ms, 1000);
        assert_eq!(params.sample_buffer_len(), 131072);
    }

    #[test]
    fn test_partial_deserialization() {
        let params: StreamParams = serde_json::from_str(r#"{"buffer_size": 8192}"#).unwrap();
        assert_eq!(params.buffer_size, 8192);
        assert_eq!(params.num_buffers, 16);
    }
}
