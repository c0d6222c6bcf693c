use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::CoreError;

pub const DEFAULT_TEMP_PREFIX: &str = "temp";
pub const DEFAULT_MAX_HINT_LEN: usize = 32;
const FALLBACK_HINT: &str = "entity";

/// Key of a pending operation: the entity's server id once it has one,
/// otherwise a locally synthesized placeholder.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationKey {
    Real(String),
    Temp(String),
}

impl OperationKey {
    pub fn real(id: impl Into<String>) -> Self {
        Self::Real(id.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Real(id) | Self::Temp(id) => id,
        }
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, Self::Temp(_))
    }
}

impl fmt::Debug for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(id) => write!(f, "Real({id})"),
            Self::Temp(id) => write!(f, "Temp({id})"),
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issues `<prefix>-<hint>-<wall_ms>` keys, with a `-<counter>` suffix for
/// every key after the first within the same millisecond.
///
/// Keys stay strictly ordered even when the wall clock stalls or steps
/// backwards: the last millisecond is reused and the counter advances.
pub struct TempKeyGenerator {
    prefix: String,
    max_hint_len: usize,
    last_ms: u64,
    counter: u32,
}

impl Default for TempKeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TEMP_PREFIX, DEFAULT_MAX_HINT_LEN)
    }
}

impl TempKeyGenerator {
    pub fn new(prefix: impl Into<String>, max_hint_len: usize) -> Self {
        Self {
            prefix: prefix.into(),
            max_hint_len,
            last_ms: 0,
            counter: 0,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_key(&mut self, hint: &str) -> Result<OperationKey, CoreError> {
        let (ms, counter) = self.advance()?;
        let hint = sanitize_hint(hint, self.max_hint_len);
        let key = if counter == 0 {
            format!("{}-{}-{}", self.prefix, hint, ms)
        } else {
            format!("{}-{}-{}-{}", self.prefix, hint, ms, counter)
        };
        Ok(OperationKey::Temp(key))
    }

    fn advance(&mut self) -> Result<(u64, u32), CoreError> {
        let now = wall_ms()?;
        if now > self.last_ms {
            self.last_ms = now;
            self.counter = 0;
        } else {
            self.counter = self.counter.checked_add(1).ok_or_else(|| {
                CoreError::InvalidData(format!(
                    "temp key counter exhausted at {}ms",
                    self.last_ms
                ))
            })?;
        }
        Ok((self.last_ms, self.counter))
    }
}

fn wall_ms() -> Result<u64, CoreError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .map_err(|_| CoreError::InvalidData("system clock before epoch".into()))
}

fn sanitize_hint(hint: &str, max_len: usize) -> String {
    let cleaned: String = hint
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .take(max_len)
        .collect();
    if cleaned.is_empty() {
        FALLBACK_HINT.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn temp_key_carries_prefix_and_hint() {
        let mut keys = TempKeyGenerator::default();
        let key = keys.next_key("New").unwrap();
        assert!(key.is_temp());
        assert!(key.as_str().starts_with("temp-New-"), "got {key}");
    }

    #[test]
    fn rapid_keys_never_collide() {
        let mut keys = TempKeyGenerator::default();
        let issued: HashSet<_> = (0..500).map(|_| keys.next_key("Same").unwrap()).collect();
        assert_eq!(issued.len(), 500);
    }

    #[test]
    fn stalled_clock_advances_the_counter() {
        let mut keys = TempKeyGenerator::default();
        // Park the generator in the future so the wall clock lags behind
        let future_ms = wall_ms().unwrap() + 100_000;
        keys.last_ms = future_ms;

        let first = keys.next_key("Draft").unwrap();
        let second = keys.next_key("Draft").unwrap();
        assert_eq!(first.as_str(), format!("temp-Draft-{future_ms}-1"));
        assert_eq!(second.as_str(), format!("temp-Draft-{future_ms}-2"));
    }

    #[test]
    fn counter_overflow_is_an_error() {
        let mut keys = TempKeyGenerator::default();
        keys.last_ms = wall_ms().unwrap() + 100_000;
        keys.counter = u32::MAX;

        match keys.next_key("Draft") {
            Err(CoreError::InvalidData(msg)) => assert!(msg.contains("exhausted")),
            other => panic!("expected InvalidData, got {other:?}"),
        }
    }

    #[test]
    fn hint_is_sanitized_and_truncated() {
        assert_eq!(sanitize_hint("Q3 launch-plan", 32), "Q3_launch_plan");
        assert_eq!(sanitize_hint("abcdef", 3), "abc");
        assert_eq!(sanitize_hint("", 8), "entity");
        assert_eq!(sanitize_hint("anything", 0), "entity");
    }

    #[test]
    fn custom_prefix() {
        let mut keys = TempKeyGenerator::new("draft", 8);
        let key = keys.next_key("Roadmap review").unwrap();
        assert!(key.as_str().starts_with("draft-Roadmap_-"), "got {key}");
    }

    #[test]
    fn display_is_raw_key() {
        assert_eq!(OperationKey::real("42").to_string(), "42");
        assert_eq!(format!("{:?}", OperationKey::real("42")), "Real(42)");
    }
}
