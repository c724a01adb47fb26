use tracing::{debug, warn};

use crate::{Account, AccountDirectory, Result, TimeSource, WallClock};

/// ASCII prefix shared by sequential and fallback member IDs.
pub const MEMBER_ID_PREFIX: &str = "MK";

/// Minimum zero-padded width of the sequential counter. Values past the
/// namespace simply widen (`MK1000`), they are never truncated.
pub const MEMBER_ID_PAD: usize = 3;

/// Probe attempts before the allocator abandons the sequential namespace.
pub const MAX_PROBE_ATTEMPTS: u32 = 10;

/// Digits of the millisecond timestamp kept by the fallback identifier.
const FALLBACK_DIGITS: usize = 6;

/// Mints short, human-readable member IDs for account records.
///
/// Candidates are derived from the live record count (`MK001`, `MK002`, ...)
/// and verified unused against the directory before acceptance. When the
/// bounded probe loop cannot resolve a free slot, or the directory errors
/// mid-probe, allocation degrades to a timestamp-derived identifier so the
/// operation always completes with *some* value.
///
/// Two concurrent allocations may read the same count and race for the same
/// candidate; the per-candidate existence probe pushes the loser onto the
/// next slot. The allocator holds no lock and keeps no state between calls
/// beyond its clock.
///
/// # Example
///
/// ```
/// use minikart::{Account, MemberIdAllocator, MemoryDirectory};
///
/// let dir = MemoryDirectory::new();
/// let allocator = MemberIdAllocator::default();
///
/// let mut account = Account::new("Ada", "ada@example.com", "", 0);
/// let id = allocator.ensure(&dir, &mut account)?;
/// assert_eq!(id, "MK001");
/// # Ok::<(), minikart::DirectoryError>(())
/// ```
pub struct MemberIdAllocator<C = WallClock> {
    clock: C,
}

impl Default for MemberIdAllocator<WallClock> {
    fn default() -> Self {
        Self::new(WallClock)
    }
}

impl<C> MemberIdAllocator<C>
where
    C: TimeSource<u64>,
{
    /// Creates an allocator over the given clock. The clock is only
    /// consulted on the fallback path.
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Returns the account's member ID, minting one if absent.
    ///
    /// Idempotent: a populated record is returned as-is without consulting
    /// the directory. A record awaiting its first persist (no store key yet)
    /// seeds the probe from the total record count and is only updated in
    /// place, so the identifier lands in the store together with the rest of
    /// the document. A record already in the store seeds the probe from the
    /// count of records holding an identifier and is persisted immediately.
    ///
    /// # Errors
    ///
    /// Only the retroactive persist can fail; probe and count errors are
    /// absorbed by the fallback.
    pub fn ensure(&self, dir: &dyn AccountDirectory, account: &mut Account) -> Result<String> {
        if let Some(id) = &account.member_id {
            return Ok(id.clone());
        }

        let count = match account.key {
            None => dir.count(),
            Some(_) => dir.assigned_count(),
        };
        let id = match count {
            Ok(count) => self.mint_from(dir, count),
            Err(e) => {
                warn!("member-id count read failed, using fallback: {e}");
                self.fallback()
            }
        };

        account.member_id = Some(id.clone());
        if account.key.is_some() {
            dir.persist(account)?;
        }
        Ok(id)
    }

    /// Mints an identifier from the live total record count.
    ///
    /// Never fails: a count error skips straight to the timestamp fallback.
    pub fn mint(&self, dir: &dyn AccountDirectory) -> String {
        match dir.count() {
            Ok(count) => self.mint_from(dir, count),
            Err(e) => {
                warn!("member-id count read failed, using fallback: {e}");
                self.fallback()
            }
        }
    }

    /// Probes sequential candidates starting at `count + 1`.
    ///
    /// The starting count is an explicit parameter so callers and tests can
    /// thread a known value instead of re-reading ambient store state. Each
    /// occupied candidate bumps the count by one; after
    /// [`MAX_PROBE_ATTEMPTS`] occupied slots, or on any probe error, the
    /// sequential scheme is abandoned for the timestamp fallback.
    pub fn mint_from(&self, dir: &dyn AccountDirectory, count: u64) -> String {
        let mut next = count;
        for _ in 0..MAX_PROBE_ATTEMPTS {
            let candidate = format!("{MEMBER_ID_PREFIX}{:0width$}", next + 1, width = MEMBER_ID_PAD);
            match dir.member_id_taken(&candidate) {
                Ok(false) => return candidate,
                Ok(true) => next += 1,
                Err(e) => {
                    warn!("member-id probe failed, using fallback: {e}");
                    return self.fallback();
                }
            }
        }

        debug!("sequential namespace exhausted after {MAX_PROBE_ATTEMPTS} probes");
        self.fallback()
    }

    /// Backfills member IDs onto records that predate allocation.
    ///
    /// Scans accounts lacking an identifier in stable key order and persists
    /// each assignment before visiting the next record, so later allocations
    /// observe the incremented count. Returns the number of records updated.
    ///
    /// # Errors
    ///
    /// Fails on the first record whose persist fails; records already
    /// updated keep their identifiers, the rest are picked up by the next
    /// run.
    pub fn backfill(&self, dir: &dyn AccountDirectory) -> Result<usize> {
        let mut updated = 0;
        for mut account in dir.unlabeled()? {
            self.ensure(dir, &mut account)?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Timestamp-derived identifier: the prefix followed by the last
    /// [`FALLBACK_DIGITS`] decimal digits of the current Unix-epoch
    /// milliseconds. A short timestamp contributes fewer digits; no padding
    /// is applied.
    fn fallback(&self) -> String {
        let millis = self.clock.current_millis().to_string();
        let tail = &millis[millis.len().saturating_sub(FALLBACK_DIGITS)..];
        format!("{MEMBER_ID_PREFIX}{tail}")
    }
}
