// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! # i2creg
//!
//! The `i2creg` crate provides register-level access to I2C peripherals
//! under Linux.  It wraps the kernel interface for interacting with i2c
//! in userspace:
//! https://www.kernel.org/doc/Documentation/i2c/dev-interface
//!
//! A `LinuxI2CDevice` opens `/dev/i2c-<bus>`, binds the descriptor to one
//! slave address, and then moves raw bytes with `read(2)`/`write(2)`.
//! The `I2CDevice` trait layers SMBus-style register accessors on top:
//! a one byte register select followed by an 8 or 16 bit payload in the
//! byte order the peripheral documents.
//!
//! ```rust,no_run
//! use i2creg::core::I2CDevice;
//! use i2creg::linux::LinuxI2CDevice;
//!
//! # fn main() -> Result<(), i2creg::linux::LinuxI2CError> {
//! let mut dev = LinuxI2CDevice::open(1, 0x48)?;
//! let raw = dev.read_reg_s16_be(0x00)?;
//! dev.write_reg_u8(0x01, 0x60)?;
//! dev.close()?;
//! # let _ = raw;
//! # Ok(())
//! # }
//! ```
//!
//! Traces of every transfer are emitted at debug level through the `log`
//! facade, or through any `log::Log` handed to `set_logger`.

#[macro_use]
extern crate nix;

#[macro_use]
mod diag;
mod ffi;

pub mod core;
pub mod linux;
pub mod mock;

pub use crate::diag::{GlobalLogger, HexBytes};
