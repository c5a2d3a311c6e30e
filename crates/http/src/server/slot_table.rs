use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

/// Identifies one occupancy of a slot.
///
/// The generation changes on every claim, so an id kept past its release can never
/// free the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: usize,
    generation: u64,
}

impl SlotId {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug)]
struct Occupant {
    peer: SocketAddr,
    worker: Option<JoinHandle<()>>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    occupant: Option<Occupant>,
}

/// Fixed number of connection slots bounding how many connections are served at once.
///
/// Every operation runs under one mutex; none of them awaits while holding it.
#[derive(Debug)]
pub struct SlotTable {
    slots: Mutex<Vec<Slot>>,
}

impl SlotTable {
    pub fn new(capacity: usize) -> Self {
        Self { slots: Mutex::new((0..capacity).map(|_| Slot::default()).collect()) }
    }

    pub fn capacity(&self) -> usize {
        self.lock().len()
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.lock().iter().filter(|slot| slot.occupant.is_some()).count()
    }

    /// Finds a free slot and occupies it in one step; `None` when every slot is taken.
    pub fn claim(&self, peer: SocketAddr) -> Option<SlotId> {
        let mut slots = self.lock();
        let (index, slot) = slots.iter_mut().enumerate().find(|(_, slot)| slot.occupant.is_none())?;

        slot.generation = slot.generation.wrapping_add(1);
        slot.occupant = Some(Occupant { peer, worker: None });
        Some(SlotId { index, generation: slot.generation })
    }

    /// Records the worker serving the slot.
    ///
    /// Returns false when the slot was already released, in which case the handle is
    /// dropped and the finished worker detached.
    pub fn attach(&self, id: SlotId, worker: JoinHandle<()>) -> bool {
        match self.lock().get_mut(id.index) {
            Some(Slot { generation, occupant: Some(occupant) }) if *generation == id.generation => {
                occupant.worker = Some(worker);
                true
            }
            _ => false,
        }
    }

    /// Frees the slot if `id` still names its current occupancy.
    pub fn release(&self, id: SlotId) -> bool {
        match self.lock().get_mut(id.index) {
            Some(slot) if slot.generation == id.generation && slot.occupant.is_some() => {
                slot.occupant = None;
                true
            }
            _ => false,
        }
    }

    /// Takes the handle of every recorded worker, leaving the slots occupied until
    /// their workers release them.
    pub fn drain(&self) -> Vec<(SocketAddr, JoinHandle<()>)> {
        self.lock()
            .iter_mut()
            .filter_map(|slot| slot.occupant.as_mut())
            .filter_map(|occupant| occupant.worker.take().map(|worker| (occupant.peer, worker)))
            .collect()
    }

    /// Frees every slot.
    pub fn clear(&self) {
        for slot in self.lock().iter_mut() {
            slot.occupant = None;
        }
    }

    // slot state is consistent at the end of every critical section, so a poisoned
    // lock is still usable
    fn lock(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases its slot when dropped, including when the worker owning it panics.
#[derive(Debug)]
pub(crate) struct SlotGuard {
    slots: Arc<SlotTable>,
    id: SlotId,
}

impl SlotGuard {
    pub(crate) fn new(slots: Arc<SlotTable>, id: SlotId) -> Self {
        Self { slots, id }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slots.release(self.id);
    }
}
