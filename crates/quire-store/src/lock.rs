use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};

/// Single-writer, multi-reader gate around store state.
///
/// Readers share the lock; a writer holds it exclusively from the first
/// working-copy mutation until the commit is recorded. With a timeout set,
/// acquisition gives up with [`StoreError::LockTimeout`].
#[derive(Debug)]
pub struct Serializer<T> {
    state: RwLock<T>,
    timeout: Option<Duration>,
}

impl<T> Serializer<T> {
    pub fn new(state: T, timeout: Option<Duration>) -> Self {
        Self {
            state: RwLock::new(state),
            timeout,
        }
    }

    /// Acquire shared access for a read.
    pub fn shared(&self) -> StoreResult<RwLockReadGuard<'_, T>> {
        match self.timeout {
            Some(limit) => self
                .state
                .try_read_for(limit)
                .ok_or(StoreError::LockTimeout(limit)),
            None => Ok(self.state.read()),
        }
    }

    /// Acquire exclusive access for a write.
    pub fn exclusive(&self) -> StoreResult<RwLockWriteGuard<'_, T>> {
        match self.timeout {
            Some(limit) => self
                .state
                .try_write_for(limit)
                .ok_or(StoreError::LockTimeout(limit)),
            None => Ok(self.state.write()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_share() {
        let s = Serializer::new(7u32, Some(Duration::from_millis(50)));
        let a = s.shared().unwrap();
        let b = s.shared().unwrap();
        assert_eq!(*a + *b, 14);
    }

    #[test]
    fn writer_excludes_readers() {
        let s = Serializer::new(0u32, Some(Duration::from_millis(20)));
        let _w = s.exclusive().unwrap();
        assert!(matches!(s.shared(), Err(StoreError::LockTimeout(_))));
    }

    #[test]
    fn reader_excludes_writer() {
        let s = Serializer::new(0u32, Some(Duration::from_millis(20)));
        let _r = s.shared().unwrap();
        let err = s.exclusive().unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout(d) if d == Duration::from_millis(20)));
    }

    #[test]
    fn writes_are_visible_after_release() {
        let s = Serializer::new(Vec::new(), None);
        s.exclusive().unwrap().push(1);
        s.exclusive().unwrap().push(2);
        assert_eq!(*s.shared().unwrap(), vec![1, 2]);
    }
}
