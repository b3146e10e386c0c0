//! Wire-level checks of the I2C adapter against `embedded-hal-mock`.

use ee24::blocking::{Ee24, I2cMemBus, MemBus};
use ee24::checksum::{Checksum, Crc32Mpeg2};
use ee24::error::{BusError, Error, I2cBusError};
use ee24::Config;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

#[test]
fn write_frames_carry_big_endian_offset_and_data() {
    let data = [1, 2, 3, 4];
    let record = Crc32Mpeg2.checksum(&data).to_le_bytes();

    // 0xA0 in 8-bit form is 0x50 on the wire; the record of a 4 byte transfer at
    // page 0 lands in page 1, offset 64.
    let expectations = [
        I2cTransaction::write(0x50, vec![0, 0, 1, 2, 3, 4]),
        I2cTransaction::write(0x50, vec![0, 64, record[0], record[1], record[2], record[3]]),
    ];
    let bus = I2cMemBus::<_, 66>::new(I2cMock::new(&expectations));
    let mut drv = Ee24::new(bus, Crc32Mpeg2, NoopDelay, Config::new()).unwrap();

    drv.write(0, &data).unwrap();

    let (bus, _, _) = drv.release();
    bus.release().done();
}

#[test]
fn reads_use_write_read_with_the_offset_preamble() {
    let data = [9, 8, 7, 6];
    let record = Crc32Mpeg2.checksum(&data).to_le_bytes();

    let expectations = [
        I2cTransaction::write_read(0x50, vec![0, 0], data.to_vec()),
        I2cTransaction::write_read(0x50, vec![0, 64], record.to_vec()),
    ];
    let bus = I2cMemBus::<_, 66>::new(I2cMock::new(&expectations));
    let mut drv = Ee24::new(bus, Crc32Mpeg2, NoopDelay, Config::new()).unwrap();

    let mut back = [0; 4];
    drv.read(0, &mut back).unwrap();
    assert_eq!(back, data);

    let (bus, _, _) = drv.release();
    bus.release().done();
}

#[test]
fn nack_is_reported_as_busy() {
    let expectations = [I2cTransaction::write(0x50, vec![0, 0, 0xAB])
        .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))];
    let bus = I2cMemBus::<_, 66>::new(I2cMock::new(&expectations));
    let mut drv = Ee24::new(bus, Crc32Mpeg2, NoopDelay, Config::new()).unwrap();

    assert_eq!(drv.write_raw(0, &[0xAB]), Err(Error::Busy));

    let (bus, _, _) = drv.release();
    bus.release().done();
}

#[test]
fn other_bus_errors_are_passed_through() {
    let expectations =
        [I2cTransaction::write(0x50, vec![0, 0, 0xAB]).with_error(ErrorKind::ArbitrationLoss)];
    let bus = I2cMemBus::<_, 66>::new(I2cMock::new(&expectations));
    let mut drv = Ee24::new(bus, Crc32Mpeg2, NoopDelay, Config::new()).unwrap();

    assert_eq!(
        drv.write_raw(0, &[0xAB]),
        Err(Error::Bus(I2cBusError::I2c(ErrorKind::ArbitrationLoss)))
    );

    let (bus, _, _) = drv.release();
    bus.release().done();
}

#[test]
fn oversized_chunk_is_refused_before_touching_the_bus() {
    let mut bus = I2cMemBus::<_, 4>::new(I2cMock::new(&[]));
    assert_eq!(
        bus.mem_write(0xA0, 0, &[1, 2, 3], 50),
        Err(BusError::Other(I2cBusError::ChunkTooLarge))
    );
    bus.release().done();
}
