// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use bitflags::bitflags;
use nix::errno::Errno;
use std::os::unix::prelude::*;

bitflags! {
    /// Adapter capabilities reported by the `I2C_FUNCS` ioctl
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct I2CFunctions: u32 {
        const I2C = 0x0000_0001;
        const TEN_BIT_ADDR = 0x0000_0002;
        const PROTOCOL_MANGLING = 0x0000_0004; /* I2C_M_IGNORE_NAK etc. */
        const SMBUS_PEC = 0x0000_0008;
        const NOSTART = 0x0000_0010; /* I2C_M_NOSTART */
        const SLAVE = 0x0000_0020;
        const SMBUS_BLOCK_PROC_CALL = 0x0000_8000; /* SMBus 2.0 */
        const SMBUS_QUICK = 0x0001_0000;
        const SMBUS_READ_BYTE = 0x0002_0000;
        const SMBUS_WRITE_BYTE = 0x0004_0000;
        const SMBUS_READ_BYTE_DATA = 0x0008_0000;
        const SMBUS_WRITE_BYTE_DATA = 0x0010_0000;
        const SMBUS_READ_WORD_DATA = 0x0020_0000;
        const SMBUS_WRITE_WORD_DATA = 0x0040_0000;
        const SMBUS_PROC_CALL = 0x0080_0000;
        const SMBUS_READ_BLOCK_DATA = 0x0100_0000;
        const SMBUS_WRITE_BLOCK_DATA = 0x0200_0000;
        const SMBUS_READ_I2C_BLOCK = 0x0400_0000; /* I2C-like block xfer  */
        const SMBUS_WRITE_I2C_BLOCK = 0x0800_0000; /* w/ 1-byte reg. addr. */
        const SMBUS_HOST_NOTIFY = 0x1000_0000;

        const SMBUS_BYTE = Self::SMBUS_READ_BYTE.bits() | Self::SMBUS_WRITE_BYTE.bits();
        const SMBUS_BYTE_DATA = Self::SMBUS_READ_BYTE_DATA.bits() | Self::SMBUS_WRITE_BYTE_DATA.bits();
        const SMBUS_WORD_DATA = Self::SMBUS_READ_WORD_DATA.bits() | Self::SMBUS_WRITE_WORD_DATA.bits();
        const SMBUS_BLOCK_DATA = Self::SMBUS_READ_BLOCK_DATA.bits() | Self::SMBUS_WRITE_BLOCK_DATA.bits();
        const SMBUS_I2C_BLOCK = Self::SMBUS_READ_I2C_BLOCK.bits() | Self::SMBUS_WRITE_I2C_BLOCK.bits();
    }
}

impl I2CFunctions {
    /// Whether plain `read(2)`/`write(2)` transfers are supported
    ///
    /// Every register accessor in this crate needs this.
    pub fn supports_raw_transfers(self) -> bool {
        self.contains(I2CFunctions::I2C)
    }
}

// from include/uapi/linux/i2c-dev.h
const I2C_SLAVE: u16 = 0x0703;
const I2C_FUNCS: u16 = 0x0705;

mod ioctl {
    use super::{I2C_FUNCS, I2C_SLAVE};

    ioctl_write_int_bad!(set_i2c_slave_address, I2C_SLAVE);
    ioctl_read_bad!(get_functionality, I2C_FUNCS, libc::c_ulong);
}

pub fn i2c_set_slave_address(fd: RawFd, slave_address: u16) -> Result<(), nix::Error> {
    unsafe {
        ioctl::set_i2c_slave_address(fd, i32::from(slave_address))?;
    }
    Ok(())
}

pub fn i2c_get_functionality(fd: RawFd) -> Result<I2CFunctions, nix::Error> {
    let mut funcs: libc::c_ulong = 0;
    unsafe {
        ioctl::get_functionality(fd, &mut funcs)?;
    }
    Ok(I2CFunctions::from_bits_truncate(funcs as u32))
}

/// Close `fd`, reporting the error `File`'s drop would swallow
///
/// The descriptor is released even when an error is returned; it must
/// not be closed again.
pub fn i2c_close(fd: RawFd) -> Result<(), nix::Error> {
    Errno::result(unsafe { libc::close(fd) }).map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_functions() {
        let funcs = I2CFunctions::SMBUS_READ_BYTE_DATA | I2CFunctions::SMBUS_WRITE_BYTE_DATA;
        assert_eq!(funcs, I2CFunctions::SMBUS_BYTE_DATA);
        assert!(!funcs.supports_raw_transfers());
        assert!((funcs | I2CFunctions::I2C).supports_raw_transfers());
    }

    #[test]
    fn test_unknown_bits_truncated() {
        let funcs = I2CFunctions::from_bits_truncate(0x8000_0001);
        assert_eq!(funcs, I2CFunctions::I2C);
    }
}
