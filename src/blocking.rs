//! Blocking flavour of the driver.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::{
    check_config,
    checksum::Checksum,
    error::{classify_i2c, BusError, Error, I2cBusError},
    Config, Io,
};

/// Blocking memory addressed bus transport.
///
/// One call performs one complete addressed operation on the device: select it at
/// `device`, point at the 16-bit memory offset `offset`, then move `bytes` in the
/// requested direction. How `timeout_ms` is honoured is up to the implementation;
/// transports without hardware timeout support may ignore it and rely on the HAL's
/// own bus recovery.
pub trait MemBus {
    type Error;

    /// Write `bytes` to the device starting at `offset`.
    fn mem_write(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &[u8],
        timeout_ms: u32,
    ) -> Result<(), BusError<Self::Error>>;

    /// Read into `bytes` starting at `offset`.
    fn mem_read(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), BusError<Self::Error>>;
}

/// Adapter exposing any [`embedded_hal::i2c::I2c`] bus as a [`MemBus`].
///
/// Writes are staged as `[offset_be, data...]` frames, so `SCRATCH` must hold the two
/// address bytes plus the largest chunk the driver issues: at least `page_size + 2`.
/// The default fits the default 64 byte page.
pub struct I2cMemBus<I2C, const SCRATCH: usize = 66> {
    i2c: I2C,
}

impl<I2C, const SCRATCH: usize> I2cMemBus<I2C, SCRATCH> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Release the underlying bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c, const SCRATCH: usize> MemBus for I2cMemBus<I2C, SCRATCH> {
    type Error = I2cBusError<I2C::Error>;

    fn mem_write(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &[u8],
        _timeout_ms: u32,
    ) -> Result<(), BusError<Self::Error>> {
        if bytes.len() + 2 > SCRATCH {
            return Err(BusError::Other(I2cBusError::ChunkTooLarge));
        }
        let mut frame = [0; SCRATCH];
        frame[..2].copy_from_slice(&offset.to_be_bytes());
        frame[2..bytes.len() + 2].copy_from_slice(bytes);
        self.i2c
            .write(device >> 1, &frame[..bytes.len() + 2])
            .map_err(classify_i2c)
    }

    fn mem_read(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &mut [u8],
        _timeout_ms: u32,
    ) -> Result<(), BusError<Self::Error>> {
        self.i2c
            .write_read(device >> 1, &offset.to_be_bytes(), bytes)
            .map_err(classify_i2c)
    }
}

/// The blocking paged EEPROM driver.
///
/// Generic over a memory addressed bus transport, a checksum engine and a delay. One
/// logical owner of the device at a time; concurrent use must be serialized by the
/// caller.
pub struct Ee24<BUS, C, D> {
    bus: BUS,
    crc: C,
    delay: D,
    config: Config,
}

impl<BUS, C, D, E> Ee24<BUS, C, D>
where
    BUS: MemBus<Error = E>,
    C: Checksum,
    D: DelayNs,
{
    /// Create a driver instance. Fails with [`Error::NotInitialized`] when the
    /// configuration names a zero page size.
    pub fn new(bus: BUS, crc: C, delay: D, config: Config) -> Result<Self, Error<E>> {
        check_config(&config)?;
        Ok(Self {
            bus,
            crc,
            delay,
            config,
        })
    }

    /// Replace the configuration wholesale. A rejected configuration leaves the
    /// previous one in effect.
    pub fn reconfigure(&mut self, config: Config) -> Result<(), Error<E>> {
        check_config(&config)?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of device pages a buffer of `len` bytes spans. See
    /// [`Config::pages_spanned`] for the rounding rule.
    pub fn pages_spanned(&self, len: u16) -> u16 {
        self.config.pages_spanned(len)
    }

    /// Release the bus, the checksum engine and the delay.
    pub fn release(self) -> (BUS, C, D) {
        (self.bus, self.crc, self.delay)
    }

    /// Write `data` starting at `page`, then store a checksum record in the page
    /// following the data span.
    ///
    /// The checksum domain is `data` truncated to whole 32-bit words; size buffers to
    /// a multiple of 4 when integrity checking matters.
    pub fn write(&mut self, page: u16, data: &[u8]) -> Result<(), Error<E>> {
        self.write_raw(page, data)?;
        let record_page = page.wrapping_add(self.config.pages_spanned(data.len() as u16));
        self.append_checksum(record_page, data)?;
        Ok(())
    }

    /// Write `data` starting at `page` without a checksum record.
    pub fn write_raw(&mut self, page: u16, data: &[u8]) -> Result<(), Error<E>> {
        let settle_ms = self.config.write_settle_ms;
        self.transfer(page, &mut Io::Write(data), settle_ms)?;
        Ok(())
    }

    /// Read into `buf` starting at `page`, then verify the trailing checksum record.
    ///
    /// On [`Error::InvalidCrc`] the buffer still holds the raw bytes that were read;
    /// inspect the status before trusting them.
    pub fn read(&mut self, page: u16, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.read_raw(page, buf)?;
        let record_page = page.wrapping_add(self.config.pages_spanned(buf.len() as u16));
        let expected = self.read_checksum(record_page)?;
        if expected != self.data_checksum(buf) {
            return Err(Error::InvalidCrc);
        }
        Ok(())
    }

    /// Read into `buf` starting at `page` without checksum verification.
    pub fn read_raw(&mut self, page: u16, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.transfer(page, &mut Io::Read(buf), 0)?;
        Ok(())
    }

    fn data_checksum(&mut self, data: &[u8]) -> u32 {
        let whole_words = data.len() / 4 * 4;
        self.crc.checksum(&data[..whole_words])
    }

    /// Single bus write of the record, no settle delay.
    fn append_checksum(&mut self, page: u16, data: &[u8]) -> Result<(), BusError<E>> {
        let record = self.data_checksum(data).to_le_bytes();
        self.bus.mem_write(
            self.config.device_address,
            self.config.page_address(page),
            &record,
            self.config.bus_timeout_ms,
        )
    }

    fn read_checksum(&mut self, page: u16) -> Result<u32, BusError<E>> {
        let mut record = [0; 4];
        self.bus.mem_read(
            self.config.device_address,
            self.config.page_address(page),
            &mut record,
            self.config.bus_timeout_ms,
        )?;
        Ok(u32::from_le_bytes(record))
    }

    /// Drive the bus over successive pages until `io` is fully transferred.
    ///
    /// Both the memory address and the buffer cursor advance by a full page per chunk;
    /// the final chunk merely moves fewer bytes. `settle_ms` is waited after every
    /// successful chunk, zero skips the wait. The first failing chunk aborts the whole
    /// transfer and its outcome is propagated untranslated.
    fn transfer(&mut self, page: u16, io: &mut Io<'_>, settle_ms: u32) -> Result<(), BusError<E>> {
        let Config {
            device_address,
            page_size,
            bus_timeout_ms,
            ..
        } = self.config;
        let stride = page_size as usize;
        let mut address = self.config.page_address(page);
        let mut offset = 0;
        let mut remaining = io.len();
        while remaining > 0 {
            let chunk = remaining.min(stride);
            match io {
                Io::Write(data) => self.bus.mem_write(
                    device_address,
                    address,
                    &data[offset..offset + chunk],
                    bus_timeout_ms,
                )?,
                Io::Read(buf) => self.bus.mem_read(
                    device_address,
                    address,
                    &mut buf[offset..offset + chunk],
                    bus_timeout_ms,
                )?,
            }
            if settle_ms != 0 {
                self.delay.delay_ms(settle_ms);
            }
            remaining -= chunk;
            address = address.wrapping_add(page_size);
            offset += stride;
        }
        Ok(())
    }
}
