// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{BigEndian, ByteOrder};
use log::Log;
use std::error::Error;
use std::io;

use crate::diag::{HexBytes, GLOBAL_LOGGER};

/// Interface to an I2C Slave Device from an I2C Master
///
/// Typical implementations will store state with references to the bus
/// in use and the address of the slave device.  The trait is based on the
/// Linux i2cdev interface: an implementation only has to move raw bytes,
/// the register accessors are provided on top of `read` and `write`.
///
/// Register accessors select a register by writing its address and then
/// read the payload, relying on the peripheral to auto-increment its
/// internal pointer for multi-byte values.  The two steps are separate
/// transfers, so sharing one device between threads requires external
/// locking around each call.
///
/// The fixed-width accessors fail with `io::ErrorKind::UnexpectedEof` when
/// the device delivers fewer bytes than the value needs.
pub trait I2CDevice {
    type Error: Error + From<io::Error>;

    /// Read data from the device to fill the provided slice
    ///
    /// Returns the number of bytes read.
    fn read(&mut self, data: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write the provided buffer to the device
    ///
    /// Returns the number of bytes written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Sink receiving the debug traces of this device
    fn logger(&self) -> &dyn Log {
        &GLOBAL_LOGGER
    }

    /// Write `data` verbatim, tracing the bytes sent
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        diag!(self, "Write {} hex bytes: [{}]", data.len(), HexBytes(data));
        self.write(data)
    }

    /// Read up to `data.len()` bytes, tracing the buffer afterwards
    ///
    /// The trace covers the whole of `data`, not only the bytes filled in
    /// by this read.  On a short read the tail still holds whatever the
    /// caller put there.
    fn read_bytes(&mut self, data: &mut [u8]) -> Result<usize, Self::Error> {
        let count = self.read(data)?;
        diag!(self, "Read {} hex bytes: [{}]", data.len(), HexBytes(data));
        Ok(count)
    }

    /// Read `len` bytes starting at `register`
    ///
    /// Returns the zero-initialized buffer together with the number of
    /// bytes the device actually delivered.
    fn read_reg_bytes(&mut self, register: u8, len: usize) -> Result<(Vec<u8>, usize), Self::Error> {
        diag!(self, "Read {} bytes starting from reg 0x{:02X}...", len, register);
        self.write_bytes(&[register])?;
        let mut buf = vec![0; len];
        let count = self.read_bytes(&mut buf)?;
        Ok((buf, count))
    }

    /// Read a single byte from `register`
    fn read_reg_u8(&mut self, register: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        read_reg_exact(self, register, &mut buf)?;
        diag!(self, "Read U8 {} from reg 0x{:02X}", buf[0], register);
        Ok(buf[0])
    }

    /// Write a single byte to `register`
    fn write_reg_u8(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.write_bytes(&[register, value])?;
        diag!(self, "Write U8 {} to reg 0x{:02X}", value, register);
        Ok(())
    }

    /// Read an unsigned word stored MSB first
    fn read_reg_u16_be(&mut self, register: u8) -> Result<u16, Self::Error> {
        let mut buf = [0u8; 2];
        read_reg_exact(self, register, &mut buf)?;
        let value = BigEndian::read_u16(&buf);
        diag!(self, "Read U16 {} from reg 0x{:02X}", value, register);
        Ok(value)
    }

    /// Read an unsigned word stored LSB first
    fn read_reg_u16_le(&mut self, register: u8) -> Result<u16, Self::Error> {
        self.read_reg_u16_be(register).map(u16::swap_bytes)
    }

    /// Read a signed word stored MSB first
    fn read_reg_s16_be(&mut self, register: u8) -> Result<i16, Self::Error> {
        let mut buf = [0u8; 2];
        read_reg_exact(self, register, &mut buf)?;
        let value = BigEndian::read_i16(&buf);
        diag!(self, "Read S16 {} from reg 0x{:02X}", value, register);
        Ok(value)
    }

    /// Read a signed word stored LSB first
    fn read_reg_s16_le(&mut self, register: u8) -> Result<i16, Self::Error> {
        self.read_reg_s16_be(register).map(i16::swap_bytes)
    }

    /// Write an unsigned word MSB first
    fn write_reg_u16_be(&mut self, register: u8, value: u16) -> Result<(), Self::Error> {
        let mut buf = [register, 0, 0];
        BigEndian::write_u16(&mut buf[1..], value);
        self.write_bytes(&buf)?;
        diag!(self, "Write U16 [{}] to reg 0x{:02X}", HexBytes(&buf), register);
        Ok(())
    }

    /// Write an unsigned word LSB first
    fn write_reg_u16_le(&mut self, register: u8, value: u16) -> Result<(), Self::Error> {
        self.write_reg_u16_be(register, value.swap_bytes())
    }

    /// Write a signed word MSB first
    fn write_reg_s16_be(&mut self, register: u8, value: i16) -> Result<(), Self::Error> {
        let mut buf = [register, 0, 0];
        BigEndian::write_i16(&mut buf[1..], value);
        self.write_bytes(&buf)?;
        diag!(self, "Write S16 {} to reg 0x{:02X}", value, register);
        Ok(())
    }

    /// Write a signed word LSB first
    fn write_reg_s16_le(&mut self, register: u8, value: i16) -> Result<(), Self::Error> {
        self.write_reg_s16_be(register, value.swap_bytes())
    }
}

// select `register`, then fill all of `buf` or fail
fn read_reg_exact<D>(dev: &mut D, register: u8, buf: &mut [u8]) -> Result<(), D::Error>
where
    D: I2CDevice + ?Sized,
{
    dev.write_bytes(&[register])?;
    let count = dev.read_bytes(buf)?;
    if count < buf.len() {
        let msg = format!(
            "short read from reg 0x{:02X}: {} of {} bytes",
            register,
            count,
            buf.len()
        );
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, msg).into());
    }
    Ok(())
}
