use std::collections::HashSet;
use std::sync::RwLock;

/// The caller-specified set of accounts to watch for balance movement.
///
/// Insertion-only: addresses can be added at any time but never removed.
/// The set is guarded by a lock because the caller mutates it while any
/// number of in-flight detector tasks read it; detectors take a snapshot at
/// dispatch so one block sees a single consistent membership.
#[derive(Debug, Default)]
pub struct TrackedAddresses {
    inner: RwLock<HashSet<String>>,
}

impl TrackedAddresses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert each address; idempotent per address.
    pub fn add<I, S>(&self, addresses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = self.inner.write().expect("tracked address lock poisoned");
        for addr in addresses {
            set.insert(addr.into());
        }
    }

    /// Current membership, unordered.
    pub fn list(&self) -> Vec<String> {
        let set = self.inner.read().expect("tracked address lock poisoned");
        set.iter().cloned().collect()
    }

    pub fn contains(&self, address: &str) -> bool {
        let set = self.inner.read().expect("tracked address lock poisoned");
        set.contains(address)
    }

    /// Copy of the membership for one block's processing.
    pub fn snapshot(&self) -> HashSet<String> {
        let set = self.inner.read().expect("tracked address lock poisoned");
        set.clone()
    }

    pub fn len(&self) -> usize {
        let set = self.inner.read().expect("tracked address lock poisoned");
        set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
