//! Exclusively owned engine model handles

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::network::Network;
use crate::error::{Result, TabRegError};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// In-memory wrapper around a network.
///
/// A handle starts empty (reserved) or loaded, and ends released. Release is
/// final: it drops the network and later `attach` calls fail.
pub struct ModelHandle {
    name: String,
    serial: u64,
    network: RwLock<Option<Network>>,
    released: AtomicBool,
}

impl ModelHandle {
    /// Empty handle reserving `name` until a network is attached
    pub fn reserve(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            network: RwLock::new(None),
            released: AtomicBool::new(false),
        }
    }

    pub fn loaded(name: impl Into<String>, network: Network) -> Self {
        let handle = Self::reserve(name);
        *handle.network.write() = Some(network);
        handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Process-unique id distinguishing handles with the same name
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn attach(&self, network: Network) -> Result<()> {
        let mut guard = self.network.write();
        if self.is_released() {
            return Err(TabRegError::HandleReleased(self.name.clone()));
        }
        *guard = Some(network);
        Ok(())
    }

    /// Drop the network; returns `false` if already released
    pub fn release(&self) -> bool {
        let mut guard = self.network.write();
        let first = !self.released.swap(true, Ordering::SeqCst);
        *guard = None;
        first
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.network.read().is_some()
    }

    /// Run `f` against the network
    pub fn with_network<R>(&self, f: impl FnOnce(&Network) -> R) -> Result<R> {
        let guard = self.network.read();
        match guard.as_ref() {
            Some(network) => Ok(f(network)),
            None if self.is_released() => Err(TabRegError::HandleReleased(self.name.clone())),
            None => Err(TabRegError::ModelNotBuilt),
        }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.name)
            .field("serial", &self.serial)
            .field("loaded", &self.is_loaded())
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NetworkTopology;

    fn network() -> Network {
        Network::new(NetworkTopology::new(2, 1, vec![3]), Some(1)).unwrap()
    }

    #[test]
    fn test_lifecycle() {
        let handle = ModelHandle::reserve("m");
        assert!(!handle.is_loaded());
        assert!(matches!(handle.with_network(|_| ()), Err(TabRegError::ModelNotBuilt)));

        handle.attach(network()).unwrap();
        assert_eq!(handle.with_network(|n| n.input_dim()).unwrap(), 2);

        assert!(handle.release());
        assert!(!handle.release());
        assert!(matches!(handle.with_network(|_| ()), Err(TabRegError::HandleReleased(_))));
        assert!(handle.attach(network()).is_err());
    }

    #[test]
    fn test_serials_are_unique() {
        let a = ModelHandle::reserve("m");
        let b = ModelHandle::loaded("m", network());
        assert_ne!(a.serial(), b.serial());
        assert!(b.is_loaded());
    }
}
