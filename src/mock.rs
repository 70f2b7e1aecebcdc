//! Register fakes for unit tests.
//!
//! [`RegisterMock`] follows the `embedded-hal-mock` pattern: it is created
//! with the exact list of expected register transactions, panics on the first
//! mismatch and must be closed with [`RegisterMock::done`].
//! [`MemoryRegisters`] is a plain two-word register file for tests that only
//! care about end state.

extern crate alloc;

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::{RegAddr, RegisterAccess};

/// One expected register access.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Transaction {
    Read { offset: usize, value: u32 },
    Write { offset: usize, value: u32 },
}

impl Transaction {
    /// Expect a read of `reg` and answer it with `value`.
    pub(crate) fn read(reg: RegAddr, value: u32) -> Self {
        Transaction::Read {
            offset: reg.offset(),
            value,
        }
    }

    /// Expect `value` to be written to `reg`.
    pub(crate) fn write(reg: RegAddr, value: u32) -> Self {
        Transaction::Write {
            offset: reg.offset(),
            value,
        }
    }
}

#[derive(Debug)]
pub(crate) struct RegisterMock {
    expected: VecDeque<Transaction>,
    seen: Vec<Transaction>,
}

impl RegisterMock {
    pub(crate) fn new(expectations: &[Transaction]) -> Self {
        Self {
            expected: expectations.iter().copied().collect(),
            seen: Vec::new(),
        }
    }

    /// Asserts that every expected transaction happened.
    pub(crate) fn done(&mut self) {
        assert!(
            self.expected.is_empty(),
            "not all expected transactions were performed: seen {:?}, remaining {:?}",
            self.seen,
            self.expected
        );
    }

    fn next(&mut self) -> Transaction {
        match self.expected.pop_front() {
            Some(t) => t,
            None => panic!("unexpected register access after {:?}", self.seen),
        }
    }
}

impl RegisterAccess for RegisterMock {
    fn read32(&mut self, offset: usize) -> u32 {
        match self.next() {
            Transaction::Read {
                offset: expected,
                value,
            } if expected == offset => {
                self.seen.push(Transaction::Read { offset, value });
                value
            }
            other => panic!("expected {:?}, got read of offset {:#x}", other, offset),
        }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        let actual = Transaction::Write { offset, value };
        let expected = self.next();
        assert_eq!(expected, actual, "unexpected register write");
        self.seen.push(actual);
    }
}

/// In-memory TIME/DATE register file.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MemoryRegisters {
    words: [u32; 2],
}

impl MemoryRegisters {
    pub(crate) fn new(time: u32, date: u32) -> Self {
        Self {
            words: [time, date],
        }
    }

    pub(crate) fn word(&self, reg: RegAddr) -> u32 {
        self.words[reg.offset() / 4]
    }
}

impl RegisterAccess for MemoryRegisters {
    fn read32(&mut self, offset: usize) -> u32 {
        self.words[offset / 4]
    }

    fn write32(&mut self, offset: usize, value: u32) {
        self.words[offset / 4] = value;
    }
}

/// Delay that only records how long it was asked to wait.
#[derive(Debug, Default)]
pub(crate) struct RecordingDelay {
    pub(crate) total_ns: u64,
    pub(crate) calls: usize,
}

impl embedded_hal::delay::DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }
}
