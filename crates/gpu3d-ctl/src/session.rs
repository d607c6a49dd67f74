//! Vendor sessions.
//!
//! A [`ControlLibrary`] wraps one backend for the lifetime of a loaded
//! plugin. Each request opens its own [`Session`] from it; the session is
//! closed exactly once, either explicitly with [`Session::close`] or when it
//! is dropped on an early return.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{ControlApi, InitArgs};
use crate::error::CtlError;
use crate::sized::BufferLedger;
use crate::types::{ApiHandle, CtlResult};

/// A vendor control backend plus the ledger of buffers allocated through it.
pub struct ControlLibrary {
    api: Arc<dyn ControlApi>,
    ledger: BufferLedger,
}

impl ControlLibrary {
    pub fn new(api: Arc<dyn ControlApi>) -> Self {
        Self {
            api,
            ledger: BufferLedger::new(),
        }
    }

    pub fn api(&self) -> &dyn ControlApi {
        self.api.as_ref()
    }

    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }

    /// Open a session with the default [`InitArgs`]. Any non-success status
    /// is returned as [`CtlError::SessionInitFailed`]; there is no retry.
    pub fn open(&self) -> Result<Session<'_>, CtlError> {
        match self.api.init(&InitArgs::default()) {
            Ok(handle) => {
                debug!(handle = handle.0, "control session opened");
                Ok(Session {
                    library: self,
                    handle,
                    closed: false,
                })
            }
            Err(result) => {
                warn!(%result, "control session init failed");
                Err(CtlError::SessionInitFailed(result))
            }
        }
    }
}

impl fmt::Debug for ControlLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlLibrary")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

/// One open vendor session, scoped to a single request.
#[derive(Debug)]
pub struct Session<'a> {
    library: &'a ControlLibrary,
    handle: ApiHandle,
    closed: bool,
}

impl<'a> Session<'a> {
    pub fn handle(&self) -> ApiHandle {
        self.handle
    }

    pub(crate) fn api(&self) -> &'a dyn ControlApi {
        self.library.api.as_ref()
    }

    pub(crate) fn ledger(&self) -> &'a BufferLedger {
        &self.library.ledger
    }

    /// Close the session and return the vendor's status.
    pub fn close(mut self) -> CtlResult {
        self.release()
    }

    fn release(&mut self) -> CtlResult {
        if self.closed {
            return CtlResult::SUCCESS;
        }
        self.closed = true;
        let result = self.api().close(self.handle);
        if result.is_success() {
            debug!(handle = self.handle.0, "control session closed");
        } else {
            warn!(handle = self.handle.0, %result, "control session close failed");
        }
        result
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Result of a read whose failure is deliberately not an error.
///
/// Returned by best-effort calls such as the read that precedes an
/// endurance gaming write: the caller may use the value when present and
/// must carry on either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort<T> {
    Read(T),
    Skipped(CtlResult),
}

impl<T> BestEffort<T> {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Read(_))
    }

    pub fn value(self) -> Option<T> {
        match self {
            Self::Read(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BestEffort<U> {
        match self {
            Self::Read(value) => BestEffort::Read(f(value)),
            Self::Skipped(result) => BestEffort::Skipped(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UnavailableControlApi;
    use crate::simulated::{CallRecord, SimulatedConfig, SimulatedControlApi};

    #[test]
    fn open_and_close_once() {
        let sim = Arc::new(SimulatedControlApi::new(SimulatedConfig::default()));
        let library = ControlLibrary::new(sim.clone());

        let session = library.open().unwrap();
        assert_eq!(sim.open_sessions(), 1);
        assert!(session.close().is_success());
        assert_eq!(sim.open_sessions(), 0);

        let closes = sim
            .calls()
            .into_iter()
            .filter(|c| matches!(c, CallRecord::Close))
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn drop_closes_session() {
        let sim = Arc::new(SimulatedControlApi::new(SimulatedConfig::default()));
        let library = ControlLibrary::new(sim.clone());
        {
            let _session = library.open().unwrap();
            assert_eq!(sim.open_sessions(), 1);
        }
        assert_eq!(sim.open_sessions(), 0);
    }

    #[test]
    fn init_failure_is_session_init_failed() {
        let config = SimulatedConfig {
            fail_init: Some(CtlResult::ERROR_INSUFFICIENT_PERMISSIONS),
            ..SimulatedConfig::default()
        };
        let library = ControlLibrary::new(Arc::new(SimulatedControlApi::new(config)));
        let err = library.open().unwrap_err();
        assert!(matches!(
            err,
            CtlError::SessionInitFailed(CtlResult::ERROR_INSUFFICIENT_PERMISSIONS)
        ));
    }

    #[test]
    fn unavailable_backend_never_opens() {
        let library = ControlLibrary::new(Arc::new(UnavailableControlApi::new("missing")));
        assert!(matches!(library.open(), Err(CtlError::SessionInitFailed(_))));
    }

    #[test]
    fn best_effort_accessors() {
        let read: BestEffort<u32> = BestEffort::Read(3);
        assert!(read.succeeded());
        assert_eq!(read.clone().map(|v| v * 2), BestEffort::Read(6));
        assert_eq!(read.value(), Some(3));

        let skipped: BestEffort<u32> = BestEffort::Skipped(CtlResult::ERROR_DEVICE_LOST);
        assert!(!skipped.succeeded());
        assert_eq!(skipped.value(), None);
    }
}
