//! Round-robin rotation over a fixed pool of AI-service credentials.
//!
//! Credentials that fail with quota/auth errors are excluded from selection.
//! Once every credential has been excluded the exclusion set is cleared on the
//! next selection. That reset is a heuristic: it assumes upstream quota windows
//! have rolled over in the meantime, which this process cannot observe.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::{info, warn};

/// Opaque API key. `Debug` and `Display` only ever show a short prefix.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
  pub fn new(secret: impl Into<String>) -> Self {
    Self(secret.into())
  }

  pub fn expose(&self) -> &str {
    &self.0
  }

  /// Log-safe form: first few characters, then an ellipsis.
  pub fn redacted(&self) -> String {
    let head: String = self.0.chars().take(4).collect();
    format!("{head}…")
  }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Credential({})", self.redacted())
  }
}

impl fmt::Display for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.redacted())
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotatorError {
  #[error("credential pool is empty")]
  PoolExhausted,
}

#[derive(Default)]
struct RotationState {
  cursor: usize,
  excluded: HashSet<Credential>,
}

/// Shared across requests; all mutation happens under one lock so cursor
/// advancement and the exclusion set stay consistent.
pub struct CredentialRotator {
  pool: Vec<Credential>,
  state: Mutex<RotationState>,
}

impl CredentialRotator {
  pub fn new(pool: Vec<Credential>) -> Self {
    Self { pool, state: Mutex::new(RotationState::default()) }
  }

  pub fn len(&self) -> usize {
    self.pool.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pool.is_empty()
  }

  fn lock(&self) -> MutexGuard<'_, RotationState> {
    // State is a cursor and a set; a panic mid-update cannot leave it unusable.
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Next usable credential, round-robin over the non-excluded ones.
  pub fn next(&self) -> Result<Credential, RotatorError> {
    if self.pool.is_empty() {
      return Err(RotatorError::PoolExhausted);
    }
    let mut st = self.lock();

    let mut available: Vec<&Credential> =
      self.pool.iter().filter(|c| !st.excluded.contains(*c)).collect();
    if available.is_empty() {
      info!(target: "generator", pool = self.pool.len(), "All credentials excluded; resetting failure set");
      st.excluded.clear();
      available = self.pool.iter().collect();
    }

    let chosen = available[st.cursor % available.len()].clone();
    st.cursor = (st.cursor + 1) % available.len();
    Ok(chosen)
  }

  /// Exclude `credential` until the next pool-wide reset. Unknown credentials are ignored.
  pub fn mark_failed(&self, credential: &Credential) {
    if !self.pool.contains(credential) {
      return;
    }
    let mut st = self.lock();
    if st.excluded.insert(credential.clone()) {
      warn!(target: "generator", credential = %credential, excluded = st.excluded.len(), pool = self.pool.len(), "Credential marked as failed");
    }
  }

  #[cfg(test)]
  fn excluded_count(&self) -> usize {
    self.lock().excluded.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;
  use std::sync::Arc;

  fn pool(keys: &[&str]) -> CredentialRotator {
    CredentialRotator::new(keys.iter().map(|k| Credential::new(*k)).collect())
  }

  #[test]
  fn test_cycles_in_pool_order() {
    let r = pool(&["a", "b", "c"]);
    let got: Vec<String> = (0..6).map(|_| r.next().unwrap().expose().to_string()).collect();
    assert_eq!(got, vec!["a", "b", "c", "a", "b", "c"]);
  }

  #[test]
  fn test_single_key_pool() {
    let r = pool(&["only"]);
    for _ in 0..3 {
      assert_eq!(r.next().unwrap().expose(), "only");
    }
  }

  #[test]
  fn test_empty_pool_fails() {
    let r = pool(&[]);
    assert_eq!(r.next(), Err(RotatorError::PoolExhausted));
  }

  #[test]
  fn test_failed_key_is_skipped_until_reset() {
    let r = pool(&["a", "b", "c"]);
    r.mark_failed(&Credential::new("b"));
    for _ in 0..10 {
      assert_ne!(r.next().unwrap().expose(), "b");
    }

    r.mark_failed(&Credential::new("a"));
    for _ in 0..5 {
      assert_eq!(r.next().unwrap().expose(), "c");
    }
    assert_eq!(r.excluded_count(), 2);

    // Last one fails too: the next selection clears the exclusion set.
    r.mark_failed(&Credential::new("c"));
    assert_eq!(r.excluded_count(), 3);
    let after_reset = r.next().unwrap();
    assert_eq!(r.excluded_count(), 0);
    assert!(["a", "b", "c"].contains(&after_reset.expose()));
  }

  #[test]
  fn test_unknown_credential_is_ignored() {
    let r = pool(&["a", "b"]);
    r.mark_failed(&Credential::new("zzz"));
    assert_eq!(r.excluded_count(), 0);
  }

  #[test]
  fn test_marking_twice_is_idempotent() {
    let r = pool(&["a", "b"]);
    r.mark_failed(&Credential::new("a"));
    r.mark_failed(&Credential::new("a"));
    assert_eq!(r.excluded_count(), 1);
    assert_eq!(r.next().unwrap().expose(), "b");
  }

  #[test]
  fn test_redaction_hides_secret() {
    let c = Credential::new("AIzaSySECRETSECRET");
    assert_eq!(format!("{c:?}"), "Credential(AIza…)");
    assert!(!c.to_string().contains("SECRET"));
  }

  #[test]
  fn test_concurrent_callers_see_fair_rotation() {
    let r = Arc::new(pool(&["a", "b", "c", "d"]));
    let handles: Vec<_> = (0..4)
      .map(|_| {
        let r = r.clone();
        std::thread::spawn(move || {
          (0..100).map(|_| r.next().unwrap().expose().to_string()).collect::<Vec<_>>()
        })
      })
      .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for h in handles {
      for k in h.join().unwrap() {
        *counts.entry(k).or_default() += 1;
      }
    }
    assert_eq!(counts.len(), 4);
    assert!(counts.values().all(|&n| n == 100));
  }
}
