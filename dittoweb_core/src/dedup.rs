//! Bounded suppression of replayed updates.
//!
//! During backlog replay the server re-delivers recent updates. The ring
//! keeps the last 8 distinct update ids with a SHA-256 of the payload they
//! arrived in, which is enough to tell a replay from fresh content.

/// Ring capacity; load-bearing for correctness during backlog replay.
const RING_SIZE: usize = 8;

/// Circular buffer of `(update id, payload hash)` pairs.
#[derive(Debug)]
pub struct DedupRing {
    entries: [Option<(String, [u8; 32])>; RING_SIZE],
    cursor: usize,
}

impl DedupRing {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Default::default(),
            cursor: 0,
        }
    }

    /// Check one update against the ring.
    ///
    /// Returns `false` when the same id was already seen with the same
    /// payload hash, in which case the caller must drop the whole batch.
    /// A known id with a different hash stops the scan and records the
    /// new pair; unknown ids are recorded at the cursor.
    pub fn check(&mut self, update_id: &str, hash: [u8; 32]) -> bool {
        for entry in self.entries.iter().flatten() {
            if entry.0 == update_id {
                if entry.1 == hash {
                    return false;
                }
                self.insert(update_id, hash);
                return true;
            }
        }
        self.insert(update_id, hash);
        true
    }

    fn insert(&mut self, update_id: &str, hash: [u8; 32]) {
        self.entries[self.cursor] = Some((update_id.to_owned(), hash));
        self.cursor = (self.cursor + 1) % RING_SIZE;
    }
}

impl Default for DedupRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(n: u8) -> [u8; 32] {
        [n; 32]
    }

    #[test]
    fn repeats_with_same_hash_are_dropped() {
        let mut ring = DedupRing::new();
        assert!(ring.check("u1", hash(1)));
        assert!(!ring.check("u1", hash(1)));
        assert!(!ring.check("u1", hash(1)));
    }

    #[test]
    fn same_id_with_new_hash_passes() {
        let mut ring = DedupRing::new();
        assert!(ring.check("u1", hash(1)));
        assert!(ring.check("u1", hash(2)));
        assert!(!ring.check("u1", hash(2)));
    }

    #[test]
    fn distinct_ids_pass() {
        let mut ring = DedupRing::new();
        for i in 0..RING_SIZE as u8 {
            assert!(ring.check(&format!("u{i}"), hash(i)));
        }
    }

    #[test]
    fn old_entries_are_evicted_after_eight_distinct_ids() {
        let mut ring = DedupRing::new();
        assert!(ring.check("first", hash(0)));
        for i in 0..RING_SIZE as u8 {
            assert!(ring.check(&format!("filler-{i}"), hash(i)));
        }
        // "first" was evicted by the eight fillers, so it passes again.
        assert!(ring.check("first", hash(0)));
    }
}
