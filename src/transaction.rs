use codec::message::{TransactionId, methods::Method};

use crate::credentials::IntegrityKey;

/// How many outstanding requests an agent keeps track of.
pub const MAX_SAVED_TRANSACTIONS: usize = 16;

/// A request this agent has sent and not yet seen an answer for.
#[derive(Debug, Clone)]
pub struct SavedTransaction {
    pub id: TransactionId,
    pub method: Method,
    /// The key the request was signed with, used to check its answer.
    pub key: Option<IntegrityKey>,
    sequence: u64,
}

/// The outstanding requests of an agent.
///
/// A fixed array of slots, an empty slot being `None`. When every slot is
/// taken the oldest request is evicted, in the order the requests were
/// inserted. A transaction id is never held by two slots at once.
///
/// # Test
///
/// ```
/// use stun_agent::transaction::*;
/// use stun_agent::codec::message::{TransactionId, methods::Method};
///
/// let mut cache = TransactionCache::default();
/// let id = TransactionId::with_cookie([1; 12]);
///
/// assert!(cache.insert(id, Method::Binding).is_none());
/// assert!(cache.find(&id, Method::Binding).is_some());
/// assert!(cache.find(&id, Method::Allocate).is_none());
///
/// assert!(cache.consume(&id).is_some());
/// assert!(cache.find(&id, Method::Binding).is_none());
/// ```
#[derive(Debug)]
pub struct TransactionCache {
    slots: [Option<SavedTransaction>; MAX_SAVED_TRANSACTIONS],
    sequence: u64,
}

impl Default for TransactionCache {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            sequence: 0,
        }
    }
}

impl TransactionCache {
    /// Record a request, returning the entry evicted to make room for it.
    ///
    /// Inserting an id that is already outstanding replaces that entry.
    pub fn insert(&mut self, id: TransactionId, method: Method) -> Option<SavedTransaction> {
        self.sequence += 1;

        let entry = SavedTransaction {
            id,
            method,
            key: None,
            sequence: self.sequence,
        };

        if let Some(slot) = self.slots.iter_mut().flatten().find(|it| it.id == id) {
            *slot = entry;
            return None;
        }

        let index = match self.slots.iter().position(Option::is_none) {
            Some(index) => index,
            None => self.oldest()?,
        };

        let evicted = self.slots[index].replace(entry);
        if let Some(it) = &evicted {
            log::warn!(
                "transaction evicted before its answer arrived: id={:?}, method={:?}",
                it.id,
                it.method
            );
        }

        evicted
    }

    /// The outstanding request with this id and method.
    pub fn find(&self, id: &TransactionId, method: Method) -> Option<&SavedTransaction> {
        self.get(id)
            .filter(|it| u16::from(it.method) == u16::from(method))
    }

    pub fn get(&self, id: &TransactionId) -> Option<&SavedTransaction> {
        self.slots.iter().flatten().find(|it| &it.id == id)
    }

    pub fn get_mut(&mut self, id: &TransactionId) -> Option<&mut SavedTransaction> {
        self.slots.iter_mut().flatten().find(|it| &it.id == id)
    }

    /// Take the entry out of the cache, its slot becomes free.
    pub fn consume(&mut self, id: &TransactionId) -> Option<SavedTransaction> {
        self.slots
            .iter_mut()
            .find(|it| it.as_ref().is_some_and(|it| &it.id == id))?
            .take()
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        self.get(id).is_some()
    }

    /// Outstanding requests, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SavedTransaction> {
        let mut items = self.slots.iter().flatten().collect::<Vec<_>>();
        items.sort_by_key(|it| it.sequence);
        items.into_iter()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        MAX_SAVED_TRANSACTIONS
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|it| *it = None);
    }

    fn oldest(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, it)| it.as_ref().map(|it| (index, it.sequence)))
            .min_by_key(|(_, sequence)| *sequence)
            .map(|(index, _)| index)
    }
}
