// In: src/config.rs

//! The single source of truth for a run's global I/O defaults.
//!
//! This module defines the `SessionConfig` struct, which is created once at
//! the application boundary (from the parsed command line) and then threaded
//! explicitly into the binding resolver. Resolution is therefore a pure
//! function of (config, binding tokens, declared ports) — there is no
//! ambient mutable state.

use serde::{Deserialize, Serialize};

use crate::codec::Format;

//==================================================================================
// I. Core Configuration Enums & Structs
//==================================================================================

/// The buffering policy applied to a channel, derived from the `-b/--buffer`
/// flag. Buffering changes only the granularity of underlying I/O calls,
/// never the logical value sequence.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockPolicy {
    /// **Default:** the flag is absent. Values are handed to ordinary
    /// byte-level buffering (a `BufWriter`/`BufReader` over the handle) and
    /// reach the OS whenever that buffer fills.
    #[default]
    Buffered,

    /// The flag is `0`. Every value is passed through and flushed
    /// immediately; used for low-latency or interactive pipelines.
    PerValue,

    /// The flag is `N > 0`. Values are grouped into chunks of up to N; a
    /// chunk is flushed as soon as it is full, and the final partial chunk
    /// is flushed on close.
    Grouped(usize),
}

impl BlockPolicy {
    /// Maps the raw flag value onto a policy. `None` means the flag was
    /// absent.
    pub fn from_flag(flag: Option<usize>) -> Self {
        match flag {
            None => BlockPolicy::Buffered,
            Some(0) => BlockPolicy::PerValue,
            Some(n) => BlockPolicy::Grouped(n),
        }
    }
}

//==================================================================================
// II. The Unified SessionConfig
//==================================================================================

/// The global defaults for one run. Per-port binding specifications may
/// override the format; the block policy applies to every channel.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// The format used by any channel without an explicit `:format`
    /// annotation. `None` falls back to text.
    #[serde(default)]
    pub default_format: Option<Format>,

    /// The buffering policy for every channel in the run.
    #[serde(default)]
    pub block: BlockPolicy,
}

impl SessionConfig {
    /// The format a channel receives when its binding carries no explicit
    /// annotation: the global flag if present, otherwise text.
    pub fn fallback_format(&self) -> Format {
        self.default_format.unwrap_or(Format::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_policy_from_flag() {
        assert_eq!(BlockPolicy::from_flag(None), BlockPolicy::Buffered);
        assert_eq!(BlockPolicy::from_flag(Some(0)), BlockPolicy::PerValue);
        assert_eq!(BlockPolicy::from_flag(Some(4)), BlockPolicy::Grouped(4));
    }

    #[test]
    fn test_fallback_format_prefers_global_flag() {
        let config = SessionConfig::default();
        assert_eq!(config.fallback_format(), Format::Text);

        let config = SessionConfig {
            default_format: Some(Format::Raw),
            ..Default::default()
        };
        assert_eq!(config.fallback_format(), Format::Raw);
    }
}
