#![cfg_attr(not(test), no_std)]
//! This is a platform agnostic library for paged, I2C addressed EEPROMs (24 series style
//! parts with a 16-bit memory address) using [embedded-hal](https://github.com/rust-embedded/embedded-hal).
//!
//! The driver splits an arbitrary length buffer into page sized chunks, sequences them
//! over the device address space with the settle time the medium needs between page
//! writes, and can guard every transfer with a 32-bit checksum record stored in the page
//! following the data span.
//!
//! Two flavours are provided:
//! * [`blocking::Ee24`], built on [`embedded_hal`]
//! * [`asynchronous::AsyncEe24`], built on [`embedded_hal_async`]
//!
//! Both are generic over a memory addressed bus transport, a checksum engine and a delay
//! so the driver can sit on top of any HAL. An adapter for plain `I2c` buses and a
//! software checksum engine are included.

pub mod asynchronous;
pub mod blocking;
pub mod checksum;
pub mod error;

use crate::error::Error;

/// Factory bus address of most 24 series parts, in 8-bit form.
pub const DEFAULT_ADDRESS: u8 = 0xA0;
/// Page size of the common 32/64 Kbit parts, in bytes.
pub const DEFAULT_PAGE_SIZE: u16 = 64;
/// Timeout handed to the transport for a single bus operation.
pub const DEFAULT_BUS_TIMEOUT_MS: u32 = 50;
/// Time the medium needs to commit a page write before the next addressed operation.
pub const DEFAULT_WRITE_SETTLE_MS: u32 = 5;

/// Runtime configuration of a device instance.
///
/// Replacing it wholesale through `reconfigure` is supported; there is no merge.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Device bus address in 8-bit form, i.e. the 7-bit address shifted left by one.
    pub device_address: u8,
    /// Device page size in bytes. Must be non zero.
    pub page_size: u16,
    /// Timeout for a single bus operation, in milliseconds.
    pub bus_timeout_ms: u32,
    /// Settle delay applied after each page write, in milliseconds.
    pub write_settle_ms: u32,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            device_address: DEFAULT_ADDRESS,
            page_size: DEFAULT_PAGE_SIZE,
            bus_timeout_ms: DEFAULT_BUS_TIMEOUT_MS,
            write_settle_ms: DEFAULT_WRITE_SETTLE_MS,
        }
    }

    pub const fn with_device_address(mut self, device_address: u8) -> Self {
        self.device_address = device_address;
        self
    }

    pub const fn with_page_size(mut self, page_size: u16) -> Self {
        self.page_size = page_size;
        self
    }

    pub const fn with_bus_timeout_ms(mut self, bus_timeout_ms: u32) -> Self {
        self.bus_timeout_ms = bus_timeout_ms;
        self
    }

    pub const fn with_write_settle_ms(mut self, write_settle_ms: u32) -> Self {
        self.write_settle_ms = write_settle_ms;
        self
    }

    /// Number of device pages a buffer of `len` bytes spans.
    ///
    /// Always rounds one page past an exact multiple: a buffer of exactly two pages is
    /// reported as spanning three. The checksum record of a transfer starting at page `p`
    /// lives at page `p + pages_spanned(len)`, so both sides of the protocol must agree
    /// on this rule.
    pub const fn pages_spanned(&self, len: u16) -> u16 {
        len / self.page_size + 1
    }

    /// Byte address of a logical page. The device address space is 16 bits wide, the
    /// arithmetic wraps rather than panics.
    pub(crate) const fn page_address(&self, page: u16) -> u16 {
        page.wrapping_mul(self.page_size)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn check_config<E>(config: &Config) -> Result<(), Error<E>> {
    if config.page_size == 0 {
        return Err(Error::NotInitialized);
    }
    Ok(())
}

/// One directional transfer over successive device pages.
pub(crate) enum Io<'a> {
    Write(&'a [u8]),
    Read(&'a mut [u8]),
}

impl Io<'_> {
    pub(crate) fn len(&self) -> usize {
        match self {
            Io::Write(bytes) => bytes.len(),
            Io::Read(bytes) => bytes.len(),
        }
    }
}
