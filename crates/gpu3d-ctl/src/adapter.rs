//! Adapter enumeration.

use tracing::{debug, warn};

use crate::error::CtlError;
use crate::session::Session;
use crate::sized::{SizedBuffer, SizedFetchError, sized_fetch};
use crate::types::AdapterHandle;

/// Adapters enumerated by one session, in vendor order.
///
/// Borrows the session, so it is always released before the session closes.
#[derive(Debug)]
pub struct AdapterList<'s> {
    handles: SizedBuffer<'s, AdapterHandle>,
}

impl AdapterList<'_> {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Adapter 0, the only one single-adapter tools touch.
    pub fn first(&self) -> Option<AdapterHandle> {
        self.handles.first().copied()
    }

    /// `(index, handle)` pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, AdapterHandle)> + '_ {
        self.handles.iter().copied().enumerate()
    }
}

impl<'a> Session<'a> {
    /// Discover every adapter using the two-call sizing protocol.
    ///
    /// The count probe is checked before anything is allocated. A failed
    /// probe, a zero count, or a failed fill all yield
    /// [`CtlError::NoDeviceFound`].
    pub fn enumerate_adapters(&self) -> Result<AdapterList<'_>, CtlError> {
        let api = self.api();
        let handle = self.handle();
        let fetched = sized_fetch::<AdapterHandle, _>(self.ledger(), |count, devices| {
            api.enumerate_devices(handle, count, devices)
        });

        match fetched {
            Ok(handles) if handles.is_empty() => {
                debug!("enumeration reported zero adapters");
                Err(CtlError::NoDeviceFound)
            }
            Ok(handles) => {
                debug!(count = handles.len(), "adapters enumerated");
                Ok(AdapterList { handles })
            }
            Err(SizedFetchError::Probe(result)) => {
                warn!(%result, "adapter count probe failed");
                Err(CtlError::NoDeviceFound)
            }
            Err(SizedFetchError::Fill(result)) => {
                warn!(%result, "adapter enumeration failed");
                Err(CtlError::NoDeviceFound)
            }
        }
    }
}
