//! Open/closed state shared by every sender
//!
//! A session is Closed until a handle is installed by `open` and returns to
//! Closed when `close` hands the handle back for release.

use crate::error::{Result, SendError};

#[derive(Debug)]
pub struct Session<H> {
    handle: Option<H>,
}

impl<H> Default for Session<H> {
    fn default() -> Self {
        Self { handle: None }
    }
}

impl<H> Session<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Fails with `AlreadyOpen` and keeps the existing handle when already open
    pub fn open(&mut self, handle: H) -> Result<()> {
        if self.is_open() {
            return Err(SendError::AlreadyOpen);
        }
        self.handle = Some(handle);
        Ok(())
    }

    /// Fail unless closed; lets senders check before dialing a connection
    pub fn ensure_closed(&self) -> Result<()> {
        if self.is_open() { Err(SendError::AlreadyOpen) } else { Ok(()) }
    }

    pub fn close(&mut self) -> Result<H> {
        self.handle.take().ok_or(SendError::NotOpen)
    }

    pub fn handle_mut(&mut self) -> Result<&mut H> {
        self.handle.as_mut().ok_or(SendError::NotOpen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_closed() {
        let mut session: Session<u32> = Session::new();
        assert!(!session.is_open());
        assert!(matches!(session.handle_mut(), Err(SendError::NotOpen)));
        assert!(matches!(session.close(), Err(SendError::NotOpen)));
    }

    #[test]
    fn test_second_open_keeps_first_handle() {
        let mut session = Session::new();
        session.open(1).unwrap();
        assert!(matches!(session.open(2), Err(SendError::AlreadyOpen)));
        assert!(matches!(session.ensure_closed(), Err(SendError::AlreadyOpen)));
        assert_eq!(*session.handle_mut().unwrap(), 1);
    }

    #[test]
    fn test_close_returns_handle_once() {
        let mut session = Session::new();
        session.open("conn").unwrap();
        assert_eq!(session.close().unwrap(), "conn");
        assert!(matches!(session.close(), Err(SendError::NotOpen)));
        assert!(session.ensure_closed().is_ok());
    }

    #[test]
    fn test_reopen_after_close() {
        let mut session = Session::new();
        session.open(1).unwrap();
        session.close().unwrap();
        session.open(2).unwrap();
        assert_eq!(*session.handle_mut().unwrap(), 2);
    }
}
