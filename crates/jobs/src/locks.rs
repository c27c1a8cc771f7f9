use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use types::DateRange;

#[derive(Default)]
struct LockTable {
    held: Mutex<Vec<(u64, DateRange)>>,
    next_id: Mutex<u64>,
    released: Notify,
}

/// Advisory locks over date ranges. Two holders never have intersecting
/// ranges; a caller whose range intersects a held one waits for its release.
#[derive(Clone, Default)]
pub struct RangeLocks {
    inner: Arc<LockTable>,
}

impl RangeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, range: DateRange) -> RangeGuard {
        loop {
            let released = self.inner.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            if let Some(guard) = self.try_acquire(range) {
                return guard;
            }
            released.await;
        }
    }

    pub fn try_acquire(&self, range: DateRange) -> Option<RangeGuard> {
        let mut held = self.inner.held.lock();
        if held.iter().any(|(_, r)| r.intersects(&range)) {
            return None;
        }
        let id = {
            let mut next = self.inner.next_id.lock();
            *next += 1;
            *next
        };
        held.push((id, range));
        Some(RangeGuard {
            id,
            range,
            table: self.inner.clone(),
        })
    }

    pub fn held(&self) -> usize {
        self.inner.held.lock().len()
    }
}

#[must_use = "the range is released when the guard is dropped"]
pub struct RangeGuard {
    id: u64,
    range: DateRange,
    table: Arc<LockTable>,
}

impl RangeGuard {
    pub fn range(&self) -> DateRange {
        self.range
    }
}

impl Drop for RangeGuard {
    fn drop(&mut self) {
        self.table.held.lock().retain(|(id, _)| *id != self.id);
        self.table.released.notify_waiters();
    }
}
