use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    Account, AccountDirectory, DirectoryError, MAX_PROBE_ATTEMPTS, MemberIdAllocator,
    MemoryDirectory, Result, TimeSource,
};

struct FixedTime {
    millis: u64,
}

impl TimeSource<u64> for FixedTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

fn allocator(millis: u64) -> MemberIdAllocator<FixedTime> {
    MemberIdAllocator::new(FixedTime { millis })
}

fn account(name: &str) -> Account {
    Account::new(name, format!("{name}@example.com"), "hash", 0)
}

fn labeled(name: &str, member_id: &str) -> Account {
    let mut a = account(name);
    a.member_id = Some(member_id.to_string());
    a
}

/// Wraps a [`MemoryDirectory`] and counts store traffic, so tests can assert
/// how many reads and writes an operation performed.
#[derive(Default)]
struct CountingDirectory {
    inner: MemoryDirectory,
    reads: AtomicUsize,
    persists: AtomicUsize,
}

impl CountingDirectory {
    fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn persists(&self) -> usize {
        self.persists.load(Ordering::Relaxed)
    }
}

impl AccountDirectory for CountingDirectory {
    fn count(&self) -> Result<u64> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.count()
    }

    fn assigned_count(&self) -> Result<u64> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.assigned_count()
    }

    fn member_id_taken(&self, member_id: &str) -> Result<bool> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.member_id_taken(member_id)
    }

    fn unlabeled(&self) -> Result<Vec<Account>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.unlabeled()
    }

    fn persist(&self, account: &mut Account) -> Result<()> {
        self.persists.fetch_add(1, Ordering::Relaxed);
        self.inner.persist(account)
    }
}

/// A directory whose every read fails, as if the store were offline.
struct UnavailableDirectory;

impl UnavailableDirectory {
    fn offline<T>() -> Result<T> {
        Err(DirectoryError::Read {
            context: "store offline".into(),
        })
    }
}

impl AccountDirectory for UnavailableDirectory {
    fn count(&self) -> Result<u64> {
        Self::offline()
    }

    fn assigned_count(&self) -> Result<u64> {
        Self::offline()
    }

    fn member_id_taken(&self, _member_id: &str) -> Result<bool> {
        Self::offline()
    }

    fn unlabeled(&self) -> Result<Vec<Account>> {
        Self::offline()
    }

    fn persist(&self, _account: &mut Account) -> Result<()> {
        Err(DirectoryError::Write {
            context: "store offline".into(),
        })
    }
}

/// Reads succeed but probes fail, exercising the mid-loop error path.
struct ProbeFailingDirectory;

impl AccountDirectory for ProbeFailingDirectory {
    fn count(&self) -> Result<u64> {
        Ok(3)
    }

    fn assigned_count(&self) -> Result<u64> {
        Ok(3)
    }

    fn member_id_taken(&self, _member_id: &str) -> Result<bool> {
        Err(DirectoryError::Read {
            context: "probe timeout".into(),
        })
    }

    fn unlabeled(&self) -> Result<Vec<Account>> {
        Ok(Vec::new())
    }

    fn persist(&self, _account: &mut Account) -> Result<()> {
        Ok(())
    }
}

#[test]
fn mint_with_empty_store_starts_at_one() {
    let dir = MemoryDirectory::new();
    assert_eq!(allocator(0).mint(&dir), "MK001");
}

#[test]
fn sequential_candidates_are_zero_padded() {
    let dir = MemoryDirectory::new();
    let alloc = allocator(0);

    for count in 0..=998 {
        assert_eq!(alloc.mint_from(&dir, count), format!("MK{:03}", count + 1));
    }
}

#[test]
fn namespace_widens_past_three_digits() {
    let dir = MemoryDirectory::new();
    let alloc = allocator(0);

    assert_eq!(alloc.mint_from(&dir, 999), "MK1000");
    assert_eq!(alloc.mint_from(&dir, 12_344), "MK12345");
}

#[test]
fn occupied_candidate_probes_next_slot() {
    let dir = MemoryDirectory::new();
    dir.persist(&mut labeled("holder", "MK002")).unwrap();

    // One record exists, so the first candidate is MK002 - already taken.
    assert_eq!(allocator(0).mint(&dir), "MK003");
}

#[test]
fn stale_count_resolves_by_reprobing() {
    let dir = MemoryDirectory::new();
    dir.persist(&mut labeled("winner", "MK001")).unwrap();

    // A racing caller that read count 0 before the winner persisted lands on
    // the next free slot instead of colliding.
    assert_eq!(allocator(0).mint_from(&dir, 0), "MK002");
}

#[test]
fn exhausted_probes_fall_back_to_timestamp() {
    let dir = MemoryDirectory::new();
    for i in 1..=MAX_PROBE_ATTEMPTS {
        dir.persist(&mut labeled(&format!("a{i}"), &format!("MK{i:03}")))
            .unwrap();
    }

    let id = allocator(1_722_443_123_456).mint_from(&dir, 0);
    assert_eq!(id, "MK123456");
}

#[test]
fn count_error_falls_back_to_timestamp() {
    let dir = UnavailableDirectory;
    assert_eq!(allocator(1_722_443_000_042).mint(&dir), "MK000042");
}

#[test]
fn probe_error_falls_back_to_timestamp() {
    assert_eq!(
        allocator(1_722_443_654_321).mint(&ProbeFailingDirectory),
        "MK654321"
    );
}

#[test]
fn fallback_keeps_short_timestamps_unpadded() {
    let dir = UnavailableDirectory;
    assert_eq!(allocator(123).mint(&dir), "MK123");
}

#[test]
fn creation_completes_even_with_store_offline() {
    let dir = UnavailableDirectory;
    let mut fresh = account("ada");

    let id = allocator(1_722_443_999_999).ensure(&dir, &mut fresh).unwrap();
    assert_eq!(id, "MK999999");
    assert_eq!(fresh.member_id.as_deref(), Some("MK999999"));
}

#[test]
fn ensure_is_idempotent_without_store_traffic() {
    let dir = CountingDirectory::default();
    let alloc = allocator(0);
    let mut a = labeled("ada", "MK007");

    assert_eq!(alloc.ensure(&dir, &mut a).unwrap(), "MK007");
    assert_eq!(alloc.ensure(&dir, &mut a).unwrap(), "MK007");
    assert_eq!(dir.reads(), 0);
    assert_eq!(dir.persists(), 0);
}

#[test]
fn ensure_assigns_before_first_persist() {
    let dir = CountingDirectory::default();
    let mut fresh = account("ada");

    let id = allocator(0).ensure(&dir, &mut fresh).unwrap();

    assert_eq!(id, "MK001");
    assert_eq!(fresh.member_id.as_deref(), Some("MK001"));
    assert!(fresh.key.is_none());
    assert_eq!(dir.persists(), 0);
}

#[test]
fn ensure_persists_retroactive_assignments() {
    let dir = CountingDirectory::default();
    let mut legacy = account("ada");
    dir.persist(&mut legacy).unwrap();
    let persists_before = dir.persists();

    let id = allocator(0).ensure(&dir, &mut legacy).unwrap();

    assert_eq!(id, "MK001");
    assert_eq!(dir.persists(), persists_before + 1);
    assert!(dir.member_id_taken("MK001").unwrap());
}

#[test]
fn sequential_allocations_stay_distinct() {
    let dir = MemoryDirectory::new();
    let alloc = allocator(0);
    let mut ids = Vec::new();

    for i in 0..8 {
        let mut a = account(&format!("user{i}"));
        ids.push(alloc.ensure(&dir, &mut a).unwrap());
        dir.persist(&mut a).unwrap();
    }

    let expected: Vec<String> = (1..=8).map(|i| format!("MK{i:03}")).collect();
    assert_eq!(ids, expected);
}

#[test]
fn backfill_labels_unlabeled_in_key_order() {
    let dir = MemoryDirectory::new();
    for i in 0..5 {
        dir.persist(&mut account(&format!("legacy{i}"))).unwrap();
    }

    let updated = allocator(0).backfill(&dir).unwrap();
    assert_eq!(updated, 5);

    let ids: Vec<String> = dir
        .all()
        .unwrap()
        .into_iter()
        .map(|a| a.member_id.unwrap())
        .collect();
    let expected: Vec<String> = (1..=5).map(|i| format!("MK{i:03}")).collect();
    assert_eq!(ids, expected);
}

#[test]
fn backfill_skips_labeled_records() {
    let dir = MemoryDirectory::new();
    dir.persist(&mut labeled("old", "MK001")).unwrap();
    dir.persist(&mut account("legacy")).unwrap();

    assert_eq!(allocator(0).backfill(&dir).unwrap(), 1);
    assert_eq!(dir.assigned_count().unwrap(), 2);
}

#[test]
fn backfill_is_a_noop_when_everything_is_labeled() {
    let dir = MemoryDirectory::new();
    for i in 0..3 {
        dir.persist(&mut account(&format!("legacy{i}"))).unwrap();
    }

    assert_eq!(allocator(0).backfill(&dir).unwrap(), 3);
    assert_eq!(allocator(0).backfill(&dir).unwrap(), 0);
}
