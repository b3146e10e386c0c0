//! In-memory bus transport and instrumented delay shared by the integration tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use ee24::asynchronous::AsyncMemBus;
use ee24::blocking::MemBus;
use ee24::error::BusError;

/// A single bus operation as seen by the fake device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Op {
    pub write: bool,
    pub device: u8,
    pub offset: u16,
    pub len: usize,
    pub timeout_ms: u32,
}

/// Fault injected into the fake bus.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Busy,
    Timeout,
}

impl From<Fault> for BusError<()> {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Busy => BusError::Busy,
            Fault::Timeout => BusError::Timeout,
        }
    }
}

/// 64 KiB of fake EEPROM plus a journal of every operation issued against it.
pub struct FakeBus {
    pub mem: Vec<u8>,
    pub ops: Vec<Op>,
    /// Fail the nth operation, counting from zero.
    pub fail_at: Option<(usize, Fault)>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self {
            mem: vec![0xFF; 0x1_0000],
            ops: Vec::new(),
            fail_at: None,
        }
    }

    pub fn writes(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter().filter(|op| op.write)
    }

    fn journal(&mut self, op: Op) -> Result<(), BusError<()>> {
        let index = self.ops.len();
        self.ops.push(op);
        match self.fail_at {
            Some((n, fault)) if n == index => Err(fault.into()),
            _ => Ok(()),
        }
    }
}

impl MemBus for FakeBus {
    type Error = ();

    fn mem_write(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &[u8],
        timeout_ms: u32,
    ) -> Result<(), BusError<()>> {
        self.journal(Op {
            write: true,
            device,
            offset,
            len: bytes.len(),
            timeout_ms,
        })?;
        let offset = offset as usize;
        self.mem[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn mem_read(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), BusError<()>> {
        self.journal(Op {
            write: false,
            device,
            offset,
            len: bytes.len(),
            timeout_ms,
        })?;
        let offset = offset as usize;
        bytes.copy_from_slice(&self.mem[offset..offset + bytes.len()]);
        Ok(())
    }
}

impl AsyncMemBus for FakeBus {
    type Error = ();

    async fn mem_write(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &[u8],
        timeout_ms: u32,
    ) -> Result<(), BusError<()>> {
        MemBus::mem_write(self, device, offset, bytes, timeout_ms)
    }

    async fn mem_read(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), BusError<()>> {
        MemBus::mem_read(self, device, offset, bytes, timeout_ms)
    }
}

/// Counts millisecond waits instead of sleeping. The shared counter survives the
/// driver taking ownership of the delay.
#[derive(Clone, Default)]
pub struct CountingDelay(pub Rc<Cell<u32>>);

impl CountingDelay {
    pub fn count(&self) -> u32 {
        self.0.get()
    }
}

impl embedded_hal::delay::DelayNs for CountingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, _ms: u32) {
        self.0.set(self.0.get() + 1);
    }
}

impl embedded_hal_async::delay::DelayNs for CountingDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, _ms: u32) {
        self.0.set(self.0.get() + 1);
    }
}
