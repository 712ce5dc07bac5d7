//! Terminal-backed container and frame scheduling

use crossterm::terminal;
use gyroview_core::{Container, FrameHost, HostError, ViewportSize};

use crate::renderer::CELL_ASPECT;

/// The terminal window, minus the rows reserved for the status line
pub struct TerminalContainer {
    reserved_rows: u16,
}

impl TerminalContainer {
    pub fn new(reserved_rows: u16) -> Self {
        Self { reserved_rows }
    }

    /// Logical size of a `cols` x `rows` terminal
    pub fn logical_size(&self, cols: u16, rows: u16) -> ViewportSize {
        let rows = rows.saturating_sub(self.reserved_rows);
        ViewportSize::new(cols as u32, rows as u32 * CELL_ASPECT)
    }
}

impl Container for TerminalContainer {
    fn measure(&self) -> ViewportSize {
        match terminal::size() {
            Ok((cols, rows)) => self.logical_size(cols, rows),
            Err(e) => {
                log::warn!("could not query terminal size: {e}");
                ViewportSize::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Frame and resize signals for a fixed-cadence event loop.
///
/// The loop polls [`TerminalHost::take_due`] on every tick and only forwards
/// resize events while [`TerminalHost::resize_attached`] holds.
#[derive(Debug, Default)]
pub struct TerminalHost {
    next_frame: u64,
    due: Option<u64>,
    next_listener: u64,
    listener: Option<ListenerId>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the outstanding frame request, if any
    pub fn take_due(&mut self) -> bool {
        self.due.take().is_some()
    }

    pub fn resize_attached(&self) -> bool {
        self.listener.is_some()
    }
}

impl FrameHost for TerminalHost {
    type FrameHandle = u64;
    type ListenerHandle = ListenerId;

    fn request_frame(&mut self) -> Result<u64, HostError> {
        self.next_frame += 1;
        self.due = Some(self.next_frame);
        Ok(self.next_frame)
    }

    fn cancel_frame(&mut self, handle: u64) {
        if self.due == Some(handle) {
            self.due = None;
        }
    }

    fn attach_resize(&mut self) -> Result<ListenerId, HostError> {
        if self.listener.is_some() {
            return Err(HostError("resize listener already attached".into()));
        }
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listener = Some(id);
        Ok(id)
    }

    fn detach_resize(&mut self, listener: ListenerId) {
        if self.listener == Some(listener) {
            self.listener = None;
        } else {
            log::warn!("detach of unknown resize listener {listener:?}");
        }
    }
}
