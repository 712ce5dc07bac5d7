//! Cancellable handle for the self-rescheduling draw loop

use std::fmt;

use crate::error::HostError;
use crate::host::FrameHost;

/// Tracks the single outstanding frame request of a running viewport
#[derive(Debug)]
pub struct FrameTask<T> {
    pending: Option<T>,
    cancelled: bool,
    requested: u64,
}

impl<T: Copy + fmt::Debug> FrameTask<T> {
    pub fn new() -> Self {
        Self {
            pending: None,
            cancelled: false,
            requested: 0,
        }
    }

    /// Request the next frame unless the task was cancelled.
    ///
    /// Returns `Ok(false)` when cancelled; nothing is requested in that case.
    pub fn schedule<H>(&mut self, host: &mut H) -> Result<bool, HostError>
    where
        H: FrameHost<FrameHandle = T>,
    {
        if self.cancelled {
            return Ok(false);
        }
        if let Some(stale) = self.pending.take() {
            host.cancel_frame(stale);
        }
        self.pending = Some(host.request_frame()?);
        self.requested += 1;
        Ok(true)
    }

    /// Mark the outstanding request as delivered.
    ///
    /// Returns `false` for callbacks nobody is waiting on: after cancellation,
    /// or when no request is outstanding.
    pub fn fire(&mut self) -> bool {
        self.pending.take().is_some() && !self.cancelled
    }

    /// Cancel the outstanding request and refuse any further scheduling
    pub fn cancel<H>(&mut self, host: &mut H)
    where
        H: FrameHost<FrameHandle = T>,
    {
        self.cancelled = true;
        if let Some(handle) = self.pending.take() {
            host.cancel_frame(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Total frame requests made over the task's lifetime
    pub fn requested(&self) -> u64 {
        self.requested
    }
}

impl<T: Copy + fmt::Debug> Default for FrameTask<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingHost {
        next: u32,
        outstanding: Vec<u32>,
        cancelled: Vec<u32>,
    }

    impl FrameHost for CountingHost {
        type FrameHandle = u32;
        type ListenerHandle = ();

        fn request_frame(&mut self) -> Result<u32, HostError> {
            self.next += 1;
            self.outstanding.push(self.next);
            Ok(self.next)
        }

        fn cancel_frame(&mut self, handle: u32) {
            self.outstanding.retain(|h| *h != handle);
            self.cancelled.push(handle);
        }

        fn attach_resize(&mut self) -> Result<(), HostError> {
            Ok(())
        }

        fn detach_resize(&mut self, _listener: ()) {}
    }

    #[test]
    fn test_schedule_fire_cycle() {
        let mut host = CountingHost::default();
        let mut task = FrameTask::new();

        assert!(task.schedule(&mut host).unwrap());
        assert!(task.is_pending());
        assert!(task.fire());
        assert!(!task.is_pending());
        assert!(!task.fire());
        assert_eq!(task.requested(), 1);
    }

    #[test]
    fn test_cancel_blocks_reschedule() {
        let mut host = CountingHost::default();
        let mut task = FrameTask::new();

        task.schedule(&mut host).unwrap();
        task.cancel(&mut host);
        assert_eq!(host.cancelled, vec![1]);
        assert!(!task.fire());
        assert!(!task.schedule(&mut host).unwrap());
        assert_eq!(host.next, 1);
    }

    #[test]
    fn test_double_schedule_keeps_one_outstanding() {
        let mut host = CountingHost::default();
        let mut task = FrameTask::new();

        task.schedule(&mut host).unwrap();
        task.schedule(&mut host).unwrap();
        assert_eq!(host.outstanding, vec![2]);
    }
}
