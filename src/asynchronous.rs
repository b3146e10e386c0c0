//! Async flavour of the driver, mirroring [`crate::blocking`] on top of
//! [`embedded_hal_async`].

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::{
    check_config,
    checksum::Checksum,
    error::{classify_i2c, BusError, Error, I2cBusError},
    Config, Io,
};

/// Async memory addressed bus transport. See [`crate::blocking::MemBus`] for the
/// contract; only the suspension points differ.
#[allow(async_fn_in_trait)]
pub trait AsyncMemBus {
    type Error;

    /// Write `bytes` to the device starting at `offset`.
    async fn mem_write(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &[u8],
        timeout_ms: u32,
    ) -> Result<(), BusError<Self::Error>>;

    /// Read into `bytes` starting at `offset`.
    async fn mem_read(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), BusError<Self::Error>>;
}

/// Adapter exposing any [`embedded_hal_async::i2c::I2c`] bus as an [`AsyncMemBus`].
///
/// `SCRATCH` must hold the two address bytes plus the largest chunk the driver
/// issues, so at least `page_size + 2`.
pub struct AsyncI2cMemBus<I2C, const SCRATCH: usize = 66> {
    i2c: I2C,
}

impl<I2C, const SCRATCH: usize> AsyncI2cMemBus<I2C, SCRATCH> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Release the underlying bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c, const SCRATCH: usize> AsyncMemBus for AsyncI2cMemBus<I2C, SCRATCH> {
    type Error = I2cBusError<I2C::Error>;

    async fn mem_write(
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
            .await
            .map_err(classify_i2c)
    }

    async fn mem_read(
        &mut self,
        device: u8,
        offset: u16,
        bytes: &mut [u8],
        _timeout_ms: u32,
    ) -> Result<(), BusError<Self::Error>> {
        self.i2c
            .write_read(device >> 1, &offset.to_be_bytes(), bytes)
            .await
            .map_err(classify_i2c)
    }
}

/// The async paged EEPROM driver.
pub struct AsyncEe24<BUS, C, D> {
    bus: BUS,
    crc: C,
    delay: D,
    config: Config,
}

impl<BUS, C, D, E> AsyncEe24<BUS, C, D>
where
    BUS: AsyncMemBus<Error = E>,
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
    pub async fn write(&mut self, page: u16, data: &[u8]) -> Result<(), Error<E>> {
        self.write_raw(page, data).await?;
        let record_page = page.wrapping_add(self.config.pages_spanned(data.len() as u16));
        self.append_checksum(record_page, data).await?;
        Ok(())
    }

    /// Write `data` starting at `page` without a checksum record.
    pub async fn write_raw(&mut self, page: u16, data: &[u8]) -> Result<(), Error<E>> {
        let settle_ms = self.config.write_settle_ms;
        self.transfer(page, &mut Io::Write(data), settle_ms).await?;
        Ok(())
    }

    /// Read into `buf` starting at `page`, then verify the trailing checksum record.
    ///
    /// On [`Error::InvalidCrc`] the buffer still holds the raw bytes that were read;
    /// inspect the status before trusting them.
    pub async fn read(&mut self, page: u16, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.read_raw(page, buf).await?;
        let record_page = page.wrapping_add(self.config.pages_spanned(buf.len() as u16));
        let expected = self.read_checksum(record_page).await?;
        if expected != self.data_checksum(buf) {
            return Err(Error::InvalidCrc);
        }
        Ok(())
    }

    /// Read into `buf` starting at `page` without checksum verification.
    pub async fn read_raw(&mut self, page: u16, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.transfer(page, &mut Io::Read(buf), 0).await?;
        Ok(())
    }

    fn data_checksum(&mut self, data: &[u8]) -> u32 {
        let whole_words = data.len() / 4 * 4;
        self.crc.checksum(&data[..whole_words])
    }

    /// Single bus write of the record, no settle delay.
    async fn append_checksum(&mut self, page: u16, data: &[u8]) -> Result<(), BusError<E>> {
        let record = self.data_checksum(data).to_le_bytes();
        self.bus
            .mem_write(
                self.config.device_address,
                self.config.page_address(page),
                &record,
                self.config.bus_timeout_ms,
            )
            .await
    }

    async fn read_checksum(&mut self, page: u16) -> Result<u32, BusError<E>> {
        let mut record = [0; 4];
        self.bus
            .mem_read(
                self.config.device_address,
                self.config.page_address(page),
                &mut record,
                self.config.bus_timeout_ms,
            )
            .await?;
        Ok(u32::from_le_bytes(record))
    }

    /// Same fixed-stride page loop as the blocking flavour, with suspension points at
    /// the bus operation and the settle delay.
    async fn transfer(
        &mut self,
        page: u16,
        io: &mut Io<'_>,
        settle_ms: u32,
    ) -> Result<(), BusError<E>> {
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
                Io::Write(data) => {
                    self.bus
                        .mem_write(
                            device_address,
                            address,
                            &data[offset..offset + chunk],
                            bus_timeout_ms,
                        )
                        .await?
                }
                Io::Read(buf) => {
                    self.bus
                        .mem_read(
                            device_address,
                            address,
                            &mut buf[offset..offset + chunk],
                            bus_timeout_ms,
                        )
                        .await?
                }
            }
            if settle_ms != 0 {
                self.delay.delay_ms(settle_ms).await;
            }
            remaining -= chunk;
            address = address.wrapping_add(page_size);
            offset += stride;
        }
        Ok(())
    }
}
