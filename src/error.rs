/// Outcome of a single transport operation that did not succeed.
///
/// This is what the bus seam speaks; the transfer loop propagates it untranslated and
/// the driver facade converts it to [`Error`] in one place.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError<E> {
    /// The bus or the device is busy.
    Busy,

    /// The operation did not complete within its timeout.
    Timeout,

    /// Any other transport failure.
    Other(E),
}

/// All possible errors emitted by the driver
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// The configuration was rejected, the driver cannot operate.
    NotInitialized,

    /// The bus or the device reported busy. The caller may retry the whole operation,
    /// the driver itself never does.
    Busy,

    /// A bus operation timed out. The caller may retry the whole operation.
    Timeout,

    /// The stored checksum does not match the data that was read back. The output
    /// buffer holds the raw bytes of the transfer, they must not be trusted.
    InvalidCrc,

    /// Transport failure that is neither busy nor timeout.
    Bus(E),
}

impl<E> From<BusError<E>> for Error<E> {
    fn from(err: BusError<E>) -> Self {
        match err {
            BusError::Busy => Error::Busy,
            BusError::Timeout => Error::Timeout,
            BusError::Other(e) => Error::Bus(e),
        }
    }
}

/// Failure of the bundled I2C bus adapters.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cBusError<E> {
    /// Underlying I2C error.
    I2c(E),

    /// A write chunk did not fit the adapter's staging buffer.
    ChunkTooLarge,
}

/// Classify an I2C error into a transport outcome. Parts signal an in-progress write
/// cycle by not acknowledging their address, which callers may treat as a retryable
/// busy condition.
pub(crate) fn classify_i2c<E: embedded_hal::i2c::Error>(err: E) -> BusError<I2cBusError<E>> {
    match err.kind() {
        embedded_hal::i2c::ErrorKind::NoAcknowledge(_) => BusError::Busy,
        _ => BusError::Other(I2cBusError::I2c(err)),
    }
}
