use crate::SensorHandle;

/// Lifecycle of the one device handle a driver may own.
///
/// A `Ready` handle has been reset exactly once and not failed since.
#[derive(Debug)]
pub enum HandleState<H> {
    Absent,
    Ready(H),
}

impl<H> Default for HandleState<H> {
    fn default() -> Self {
        HandleState::Absent
    }
}

impl<H: SensorHandle> HandleState<H> {
    /// Return the ready handle, opening and resetting one first if there is none.
    ///
    /// If `open` or the reset fails the state stays `Absent` and the
    /// partially built handle is dropped. Reset failures are converted into
    /// the opener's error type.
    pub fn acquire<E, F>(&mut self, open: F) -> Result<&mut H, E>
    where
        E: From<H::Error>,
        F: FnOnce() -> Result<H, E>,
    {
        if let HandleState::Absent = self {
            let mut handle = open()?;
            handle.reset()?;
            *self = HandleState::Ready(handle);
        }
        let HandleState::Ready(handle) = self else {
            unreachable!("handle was opened above")
        };
        Ok(handle)
    }

    /// Drop the current handle, if any. Pins stay claimed.
    pub fn invalidate(&mut self) -> Option<H> {
        match core::mem::replace(self, HandleState::Absent) {
            HandleState::Ready(handle) => Some(handle),
            HandleState::Absent => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, HandleState::Ready(_))
    }
}
