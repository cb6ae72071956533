//! Recording transport for unit tests

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::protocol::Direction;
use crate::transport::ControlTransport;

/// One recorded control transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub direction: Direction,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    /// Payload for writes, empty for reads
    pub data: Vec<u8>,
    /// wLength of the setup packet
    pub length: u16,
}

/// Records every transfer and answers reads from a queue of canned responses
/// (zero-filled when the queue is empty)
#[derive(Default)]
pub struct MockTransport {
    transfers: RefCell<Vec<Transfer>>,
    responses: RefCell<VecDeque<Vec<u8>>>,
    failure: RefCell<Option<&'static str>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, data: Vec<u8>) {
        self.responses.borrow_mut().push_back(data);
    }

    pub fn fail_next(&self, msg: &'static str) {
        *self.failure.borrow_mut() = Some(msg);
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.transfers.borrow().clone()
    }

    pub fn writes(&self) -> Vec<Transfer> {
        self.transfers
            .borrow()
            .iter()
            .filter(|t| t.direction == Direction::Write)
            .cloned()
            .collect()
    }

    fn take_failure(&self) -> Result<()> {
        match self.failure.borrow_mut().take() {
            Some(msg) => Err(Error::transport(msg)),
            None => Ok(()),
        }
    }
}

impl ControlTransport for MockTransport {
    fn control_read(&self, request: u8, value: u16, index: u16, length: u16) -> Result<Vec<u8>> {
        self.transfers.borrow_mut().push(Transfer {
            direction: Direction::Read,
            request,
            value,
            index,
            data: Vec::new(),
            length,
        });
        self.take_failure()?;
        Ok(self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| vec![0; length as usize]))
    }

    fn control_write(&self, request: u8, value: u16, index: u16, data: &[u8]) -> Result<()> {
        self.transfers.borrow_mut().push(Transfer {
            direction: Direction::Write,
            request,
            value,
            index,
            data: data.to_vec(),
            length: data.len() as u16,
        });
        self.take_failure()
    }
}
