//! Per-key parser cache shared by concurrent extraction tasks.
//!
//! One parser exists per key for the lifetime of the cache and is never evicted.
//! The map lock is only held while looking up or inserting an entry; each entry
//! has its own lock that serializes construction and every use of that parser,
//! so different keys proceed in parallel.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Error;

/// A stateful parser that can be built from a key and reused across calls.
pub trait CachedParser: Sized + Send {
    /// What identifies the source unit: a file path or a literal text.
    type Key: Clone + Debug + Eq + Hash + Send;

    /// Build the parser for `key` (open, read, lex, parse).
    ///
    /// # Errors
    ///
    /// Returns whatever error prevents the source unit from being parsed.
    fn build(key: &Self::Key) -> Result<Self, Error>;

    /// Rewind internal cursor state before the parser is reused.
    fn reset(&mut self);
}

/// Lazily-built parser slot guarded by its own lock.
type Slot<P> = Arc<Mutex<Option<P>>>;

/// Cache of parsers keyed by source unit.
pub struct ParserCache<P: CachedParser> {
    /// Entries by key. The outer lock covers insertion only.
    entries: Mutex<HashMap<P::Key, Slot<P>>>,
}

impl<P: CachedParser> Default for ParserCache<P> {
    fn default() -> Self {
        return Self { entries: Mutex::new(HashMap::new()) };
    }
}

impl<P: CachedParser> ParserCache<P> {
    /// Number of keys seen so far, built or not.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        return self.entries.lock().unwrap_or_else(PoisonError::into_inner).len();
    }

    /// Get or insert the slot for `key`, holding the map lock only for this.
    fn slot(&self, key: &P::Key) -> Slot<P> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        return Arc::clone(entries.entry(key.clone()).or_default());
    }

    /// Run `action` with exclusive access to the parser for `key`, building it
    /// on first use. The parser is reset before `action` sees it.
    ///
    /// A poisoned slot is recovered: the parser is reset before every use, so a
    /// panic in an earlier action leaves nothing behind that matters.
    ///
    /// # Errors
    ///
    /// Returns the build error on first use, or whatever `action` returns.
    pub fn with_parser<R>(
        &self,
        key: &P::Key,
        action: impl FnOnce(&mut P) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let slot = self.slot(key);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if guard.is_none() {
            tracing::debug!(?key, "building parser");
            *guard = Some(P::build(key)?);
        }
        let Some(parser) = guard.as_mut() else {
            return Err(Error::ParseFailed {
                file: format!("{key:?}").into(),
                reason: "parser slot empty after build".to_string(),
            });
        };

        parser.reset();
        return action(parser);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    /// Records builds, resets and uses; detects overlapping use.
    struct CountingParser {
        in_use: bool,
        resets: usize,
        uses: usize,
    }

    impl CachedParser for CountingParser {
        type Key = String;

        fn build(key: &String) -> Result<Self, Error> {
            if key == "missing" {
                return Err(Error::FileNotFound { path: key.into() });
            }
            BUILDS.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(Self { in_use: false, resets: 0, uses: 0 })
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    #[test]
    fn concurrent_first_use_builds_once_and_serializes() {
        let cache: ParserCache<CountingParser> = ParserCache::default();
        let key = "concurrent".to_string();
        let before = BUILDS.load(Ordering::SeqCst);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    cache
                        .with_parser(&key, |parser| {
                            assert!(!parser.in_use, "parser used concurrently");
                            parser.in_use = true;
                            thread::sleep(Duration::from_millis(2));
                            parser.uses += 1;
                            parser.in_use = false;
                            Ok(())
                        })
                        .unwrap();
                });
            }
        });

        assert_eq!(BUILDS.load(Ordering::SeqCst) - before, 1);
        let (uses, resets) = cache
            .with_parser(&key, |parser| Ok((parser.uses, parser.resets)))
            .unwrap();
        assert_eq!(uses, 8);
        assert_eq!(resets, 9);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn build_failure_propagates_and_leaves_slot_empty() {
        let cache: ParserCache<CountingParser> = ParserCache::default();
        let key = "missing".to_string();
        let first = cache.with_parser(&key, |_| Ok(()));
        assert!(matches!(first, Err(Error::FileNotFound { .. })));
        let second = cache.with_parser(&key, |_| Ok(()));
        assert!(matches!(second, Err(Error::FileNotFound { .. })));
    }
}
