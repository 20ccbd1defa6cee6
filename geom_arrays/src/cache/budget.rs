use super::polyline_cache::ReclaimTicket;
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Default)]
struct BudgetState {
    /// Oldest released buffer first.
    queue: VecDeque<ReclaimTicket>,
    resident: usize,
}

/// Memory bound shared by several [PolylineCache](super::PolylineCache) instances.
///
/// When a cache's last reader releases its buffer the buffer becomes reclaimable and is queued
/// here. Whenever the reclaimable buffers hold more than `max_ordinates` ordinates in total, the
/// least recently released ones are dropped. A dropped buffer is rebuilt from source the next
/// time it is requested.
#[derive(Debug)]
pub struct CacheBudget {
    max_ordinates: usize,
    state: Mutex<BudgetState>,
}

impl CacheBudget {
    pub fn new(max_ordinates: usize) -> Self {
        CacheBudget {
            max_ordinates,
            state: Mutex::new(BudgetState::default()),
        }
    }

    #[inline]
    pub fn max_ordinates(&self) -> usize {
        self.max_ordinates
    }

    /// Ordinates held by buffers currently queued as reclaimable.
    pub fn resident_ordinates(&self) -> usize {
        self.state.lock().resident
    }

    /// Forget queued buffers that were requested again (or replaced) since their release.
    ///
    /// Returns the number of queue entries dropped.
    pub fn sweep(&self) -> usize {
        let mut state = self.state.lock();
        let before = state.queue.len();
        state.queue.retain(ReclaimTicket::is_current);
        state.resident = state.queue.iter().map(ReclaimTicket::ordinates).sum();
        before - state.queue.len()
    }

    /// Queue a released buffer and evict the oldest buffers while over budget.
    pub(crate) fn register(&self, ticket: ReclaimTicket) {
        let evicted = {
            let mut state = self.state.lock();
            state.queue.retain(ReclaimTicket::is_current);
            state.queue.push_back(ticket);
            state.resident = state.queue.iter().map(ReclaimTicket::ordinates).sum();

            let mut evicted = Vec::new();
            while state.resident > self.max_ordinates {
                let Some(oldest) = state.queue.pop_front() else {
                    break;
                };
                state.resident -= oldest.ordinates();
                evicted.push(oldest);
            }
            evicted
        };

        // reclaim outside of the budget lock, reclaiming locks the owning cache
        for ticket in evicted {
            let ordinates = ticket.ordinates();
            if ticket.reclaim() {
                tracing::debug!(ordinates, "evicted reclaimable rendering buffer");
            }
        }
    }
}
