//! Scoped session: logged in on open, logged out on drop.
//!
//! A run opens exactly one [`Session`] and passes it to every fetch, so a
//! failure inside the per-symbol loop (or a panic) still releases it.

use super::provider::{DataError, DataSource, QueryRequest, RowCursor, SessionHandle};
use std::mem::{self, ManuallyDrop};
use tracing::{info, warn};

pub struct Session<'a> {
    source: &'a dyn DataSource,
    handle: SessionHandle,
}

impl<'a> Session<'a> {
    /// Log in to `source`.
    pub fn open(source: &'a dyn DataSource) -> Result<Self, DataError> {
        let handle = source.login()?;
        info!(source = source.name(), "session opened");
        Ok(Self { source, handle })
    }

    /// Run one query on this session.
    pub fn query(&self, request: &QueryRequest) -> Result<Box<dyn RowCursor + 'a>, DataError> {
        self.source.query(&self.handle, request)
    }

    /// Log out explicitly, surfacing the logout error.
    pub fn close(self) -> Result<(), DataError> {
        let mut this = ManuallyDrop::new(self);
        let handle = mem::take(&mut this.handle);
        this.source.logout(handle)
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        let handle = mem::take(&mut self.handle);
        match self.source.logout(handle) {
            Ok(()) => info!(source = self.source.name(), "session closed"),
            Err(e) => warn!(source = self.source.name(), error = %e, "logout failed"),
        }
    }
}
