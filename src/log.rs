use crate::engine::Term;
use crate::error::Result;
use crate::storage;

use bincode::Options as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::Bound;

/// A log index. Starts at 1, indicates no index if 0.
pub type Index = u64;

/// A log entry, carrying a state machine command of type C. None (noop)
/// commands are appended when a leader is elected, to commit entries from
/// previous terms (see section 5.4.2 in the Raft paper).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry<C> {
    /// The entry index.
    pub index: Index,
    /// The term in which the entry was added.
    pub term: Term,
    /// The state machine command, or None for a noop.
    pub command: Option<C>,
}

/// The replicated Raft log: a sequence of commands replicated across the
/// cluster and applied in order to each replica's state machine. Entries are
/// stored bincode-encoded in a key/value storage engine, keyed by big-endian
/// index so they sort in index order.
///
/// In the steady state the log is append-only: the leader appends client
/// commands via [`Log::append`] and replicates them to followers, who append
/// them via [`Log::append_entry`]. Once an index is replicated to a majority
/// of replicas it becomes committed and immutable; uncommitted entries may
/// still be replaced if a new leader overwrites them.
///
/// The log maintains the following invariants:
///
/// * Entry indexes are contiguous starting at 1 (no index gaps).
/// * Entry terms never decrease from the previous entry.
/// * Committed entries are never changed or removed.
/// * Entries with the same index/term contain the same command.
/// * If two logs contain a matching index/term, all previous entries
///   are identical (see section 5.3 in the Raft paper).
///
/// The commit index is volatile: committed entries are recovered from a
/// quorum of logs, so it does not need to survive a restart.
pub struct Log<C> {
    /// The underlying storage engine. Uses a trait object instead of
    /// generics, to allow runtime selection of the engine and avoid
    /// propagating the generic type parameter throughout the crate.
    engine: Box<dyn storage::Engine>,
    /// The index of the last stored entry.
    last_index: Index,
    /// The term of the last stored entry.
    last_term: Term,
    /// The index of the last committed entry.
    commit_index: Index,
    _command: PhantomData<C>,
}

/// Encodes an entry index as a big-endian storage key.
fn key(index: Index) -> Vec<u8> {
    index.to_be_bytes().to_vec()
}

/// Encodes an entry as a storage value. Entries use bincode with
/// variable-length integers, which keeps the typically small indexes and
/// terms compact (unlike bincode's top-level fixed-length defaults).
fn encode<C: Serialize>(entry: &Entry<C>) -> Result<Vec<u8>> {
    Ok(bincode::DefaultOptions::new().serialize(entry)?)
}

/// Decodes an entry from a storage value.
fn decode<C: DeserializeOwned>(bytes: &[u8]) -> Result<Entry<C>> {
    Ok(bincode::DefaultOptions::new().deserialize(bytes)?)
}

impl<C: Serialize + DeserializeOwned> Log<C> {
    /// Initializes a log using the given storage engine, recovering the last
    /// index and term from any entries already stored in it.
    pub fn new(mut engine: Box<dyn storage::Engine>) -> Result<Self> {
        let (last_index, last_term) = engine
            .scan_dyn((Bound::Unbounded, Bound::Unbounded))
            .last()
            .transpose()?
            .map(|(_, value)| decode::<C>(&value))
            .transpose()?
            .map(|entry| (entry.index, entry.term))
            .unwrap_or((0, 0));
        Ok(Self { engine, last_index, last_term, commit_index: 0, _command: PhantomData })
    }

    /// Returns the index of the last stored entry, or 0 if none.
    pub fn last_index(&self) -> Index {
        self.last_index
    }

    /// Returns the term of the last stored entry, or 0 if none.
    pub fn last_term(&self) -> Term {
        self.last_term
    }

    /// Returns the index of the last committed entry, or 0 if none.
    pub fn commit_index(&self) -> Index {
        self.commit_index
    }

    /// Advances the commit index. Regressions are ignored, so the commit
    /// index is monotone. The index must be in the log.
    pub fn set_commit_index(&mut self, index: Index) {
        if index <= self.commit_index {
            return;
        }
        assert!(index <= self.last_index, "commit index {index} not in log");
        self.commit_index = index;
    }

    /// Fetches the entry at an index, or None if it does not exist.
    pub fn entry(&mut self, index: Index) -> Result<Option<Entry<C>>> {
        self.engine.get(&key(index))?.map(|value| decode(&value)).transpose()
    }

    /// Returns the term of the entry at an index, or 0 if the index is 0 or
    /// beyond the log.
    pub fn term_at(&mut self, index: Index) -> Result<Term> {
        // Fast path: the last entry's term is cached.
        if index == 0 || index > self.last_index {
            return Ok(0);
        }
        if index == self.last_index {
            return Ok(self.last_term);
        }
        Ok(self.entry(index)?.map(|entry| entry.term).unwrap_or(0))
    }

    /// Checks whether the log is consistent with the given index/term pair,
    /// i.e. whether it holds that exact entry. Index 0 with term 0 is
    /// consistent with any log (the empty prefix).
    pub fn is_consistent_with(&mut self, index: Index, term: Term) -> Result<bool> {
        if index == 0 {
            return Ok(term == 0);
        }
        Ok(term != 0 && self.term_at(index)? == term)
    }

    /// Returns up to max entries starting at the given index, in order.
    pub fn entries_from(&mut self, start: Index, max: usize) -> Result<Vec<Entry<C>>> {
        self.engine
            .scan_dyn((Bound::Included(key(start)), Bound::Unbounded))
            .take(max)
            .map(|result| result.and_then(|(_, value)| decode(&value)))
            .collect()
    }

    /// Appends a command (or noop) to the log at the given term, as the
    /// leader does for new proposals. Returns false if the term is 0 or
    /// regresses from the last entry's term.
    pub fn append(&mut self, term: Term, command: Option<C>) -> Result<bool> {
        if term == 0 || term < self.last_term {
            return Ok(false);
        }
        let entry = Entry { index: self.last_index + 1, term, command };
        self.store(entry)?;
        Ok(true)
    }

    /// Appends a replicated entry to the log, as followers do for entries
    /// received from a leader. Entries already in the log with a matching
    /// term are accepted without modification. An entry that conflicts with
    /// an uncommitted suffix of the log truncates that suffix and replaces
    /// it. Returns false without modifying the log if the entry conflicts
    /// with a committed entry, leaves a gap, or regresses the term.
    pub fn append_entry(&mut self, entry: Entry<C>) -> Result<bool> {
        if entry.index == 0 || entry.term == 0 {
            return Ok(false);
        }
        if entry.index > self.last_index + 1 {
            return Ok(false);
        }
        if entry.term < self.term_at(entry.index - 1)? {
            return Ok(false);
        }
        if entry.index <= self.last_index {
            if self.term_at(entry.index)? == entry.term {
                return Ok(true);
            }
            if entry.index <= self.commit_index {
                return Ok(false);
            }
            self.truncate_from(entry.index)?;
        }
        self.store(entry)?;
        Ok(true)
    }

    /// Writes an entry at last_index + 1 and flushes it to storage.
    fn store(&mut self, entry: Entry<C>) -> Result<()> {
        assert_eq!(entry.index, self.last_index + 1, "entry index gap");
        self.engine.set(&key(entry.index), encode(&entry)?)?;
        self.engine.flush()?;
        self.last_index = entry.index;
        self.last_term = entry.term;
        Ok(())
    }

    /// Removes entries from the given index to the end of the log. The
    /// index must be above the commit index.
    fn truncate_from(&mut self, index: Index) -> Result<()> {
        assert!(index > self.commit_index, "truncating committed entries");
        for i in index..=self.last_index {
            self.engine.delete(&key(i))?;
        }
        self.engine.flush()?;
        self.last_index = index - 1;
        self.last_term = self.term_at(index - 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Memory;

    use test_case::test_case;

    fn entry(index: Index, term: Term, command: Option<&str>) -> Entry<String> {
        Entry { index, term, command: command.map(String::from) }
    }

    fn log_with(entries: &[(Index, Term)]) -> Log<String> {
        let mut log = Log::new(Box::new(Memory::new())).expect("log init failed");
        for &(index, term) in entries {
            assert!(log.append_entry(entry(index, term, Some("x"))).unwrap());
        }
        log
    }

    #[test]
    fn empty() -> Result<()> {
        let mut log: Log<String> = Log::new(Box::new(Memory::new()))?;
        assert_eq!(log.last_index(), 0);
        assert_eq!(log.last_term(), 0);
        assert_eq!(log.commit_index(), 0);
        assert_eq!(log.entry(1)?, None);
        assert_eq!(log.term_at(0)?, 0);
        assert!(log.is_consistent_with(0, 0)?);
        assert!(!log.is_consistent_with(1, 1)?);
        Ok(())
    }

    #[test]
    fn append() -> Result<()> {
        let mut log: Log<String> = Log::new(Box::new(Memory::new()))?;
        assert!(!log.append(0, Some("a".into()))?); // term 0 invalid

        assert!(log.append(1, Some("a".into()))?);
        assert!(log.append(1, None)?); // noop
        assert!(log.append(3, Some("b".into()))?); // term skip is fine
        assert!(!log.append(2, Some("c".into()))?); // term regression

        assert_eq!(log.last_index(), 3);
        assert_eq!(log.last_term(), 3);
        assert_eq!(log.entry(2)?, Some(entry(2, 1, None)));
        Ok(())
    }

    // Appending the next index works, including across a term bump.
    #[test_case(&[(1,1),(2,1)], (3, 1) => (true, 3, 1); "next index")]
    #[test_case(&[(1,1),(2,1)], (3, 2) => (true, 3, 2); "next index new term")]
    // Duplicates with a matching term are idempotent.
    #[test_case(&[(1,1),(2,1),(3,2)], (2, 1) => (true, 3, 2); "duplicate")]
    // A term conflict truncates the tail and replaces it.
    #[test_case(&[(1,1),(2,1),(3,2)], (3, 3) => (true, 3, 3); "conflict replaces")]
    #[test_case(&[(1,1),(2,1),(3,2)], (2, 3) => (true, 2, 3); "conflict truncates tail")]
    // Gaps, term regressions, and zero index/term are refused.
    #[test_case(&[(1,1)], (3, 1) => (false, 1, 1); "gap")]
    #[test_case(&[(1,1),(2,2)], (3, 1) => (false, 2, 2); "term regression")]
    #[test_case(&[], (0, 1) => (false, 0, 0); "index zero")]
    #[test_case(&[], (1, 0) => (false, 0, 0); "term zero")]
    fn append_entry(existing: &[(Index, Term)], (index, term): (Index, Term)) -> (bool, Index, Term) {
        let mut log = log_with(existing);
        let ok = log.append_entry(entry(index, term, Some("y"))).unwrap();
        (ok, log.last_index(), log.last_term())
    }

    #[test]
    fn append_entry_committed_conflict() -> Result<()> {
        let mut log = log_with(&[(1, 1), (2, 1)]);
        log.set_commit_index(2);

        // A conflict at or below the commit index must refuse and leave the
        // log untouched.
        assert!(!log.append_entry(entry(2, 2, Some("y")))?);
        assert_eq!(log.last_index(), 2);
        assert_eq!(log.term_at(2)?, 1);

        // A duplicate of a committed entry is still fine.
        assert!(log.append_entry(entry(2, 1, Some("x")))?);
        Ok(())
    }

    #[test]
    fn commit_index_monotone() {
        let mut log = log_with(&[(1, 1), (2, 1), (3, 1)]);
        log.set_commit_index(2);
        assert_eq!(log.commit_index(), 2);
        log.set_commit_index(1); // regression ignored
        assert_eq!(log.commit_index(), 2);
        log.set_commit_index(2); // noop
        assert_eq!(log.commit_index(), 2);
        log.set_commit_index(3);
        assert_eq!(log.commit_index(), 3);
    }

    #[test]
    #[should_panic(expected = "not in log")]
    fn commit_index_beyond_log() {
        let mut log = log_with(&[(1, 1)]);
        log.set_commit_index(2);
    }

    #[test]
    fn entries_from() -> Result<()> {
        let mut log = log_with(&[(1, 1), (2, 1), (3, 2), (4, 2)]);

        let indexes =
            |entries: Vec<Entry<String>>| entries.into_iter().map(|e| e.index).collect::<Vec<_>>();
        assert_eq!(indexes(log.entries_from(1, 10)?), vec![1, 2, 3, 4]);
        assert_eq!(indexes(log.entries_from(3, 10)?), vec![3, 4]);
        assert_eq!(indexes(log.entries_from(2, 2)?), vec![2, 3]);
        assert_eq!(indexes(log.entries_from(5, 10)?), Vec::<Index>::new());
        Ok(())
    }

    #[test]
    fn consistency() -> Result<()> {
        let mut log = log_with(&[(1, 1), (2, 2)]);
        assert!(log.is_consistent_with(0, 0)?);
        assert!(log.is_consistent_with(1, 1)?);
        assert!(log.is_consistent_with(2, 2)?);
        assert!(!log.is_consistent_with(2, 1)?);
        assert!(!log.is_consistent_with(3, 2)?);
        assert!(!log.is_consistent_with(0, 1)?);
        Ok(())
    }

    #[test]
    fn recovery() -> Result<()> {
        // A log reopened on an engine with existing entries recovers the
        // last index and term, but not the (volatile) commit index.
        let mut log: Log<String> = Log::new(Box::new(Memory::new()))?;
        assert!(log.append(1, Some("a".into()))?);
        assert!(log.append(2, Some("b".into()))?);
        log.set_commit_index(1);

        let log: Log<String> = Log::new(log.engine)?;
        assert_eq!(log.last_index(), 2);
        assert_eq!(log.last_term(), 2);
        assert_eq!(log.commit_index(), 0);
        Ok(())
    }
}
