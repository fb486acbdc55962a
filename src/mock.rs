// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory stand-ins for testing register drivers without hardware

use log::Log;
use std::io;

use crate::core::I2CDevice;
use crate::diag::GlobalLogger;

/// A peripheral with 256 byte-wide registers and an auto-incrementing
/// register pointer
///
/// The first byte of every write moves the pointer; any further bytes
/// are stored starting there.  Reads return bytes from the pointer
/// onwards.  The pointer wraps from 0xFF back to 0x00.
pub struct I2CRegisterMap {
    registers: [u8; 0x100],
    offset: u8,
}

impl Default for I2CRegisterMap {
    fn default() -> Self {
        Self::new()
    }
}

impl I2CRegisterMap {
    pub fn new() -> I2CRegisterMap {
        I2CRegisterMap {
            registers: [0x00; 0x100],
            offset: 0,
        }
    }

    /// Preload registers starting at `offset`, bypassing the bus
    pub fn write_regs(&mut self, offset: u8, data: &[u8]) {
        let mut reg = offset;
        for &byte in data {
            self.registers[reg as usize] = byte;
            reg = reg.wrapping_add(1);
        }
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.registers[reg as usize]
    }

    /// Current register pointer
    pub fn offset(&self) -> u8 {
        self.offset
    }
}

impl I2CDevice for I2CRegisterMap {
    type Error = io::Error;

    fn read(&mut self, data: &mut [u8]) -> io::Result<usize> {
        for byte in data.iter_mut() {
            *byte = self.registers[self.offset as usize];
            self.offset = self.offset.wrapping_add(1);
        }
        Ok(data.len())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        // an empty write is an address-only probe; the pointer stays put
        if let Some((&offset, rest)) = data.split_first() {
            self.write_regs(offset, rest);
            self.offset = offset.wrapping_add(rest.len() as u8);
        }
        Ok(data.len())
    }
}

/// One completed transfer as seen by a `MockI2CDevice`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTransaction {
    /// Bytes written
    Write(Vec<u8>),
    /// Length of the buffer handed to the read
    Read(usize),
}

/// Test double for `I2CDevice`
///
/// Backed by an `I2CRegisterMap` and records every successful transfer
/// in order.  Faults and short reads can be injected for the next call;
/// a failed transfer is not recorded.
pub struct MockI2CDevice {
    pub regmap: I2CRegisterMap,
    transactions: Vec<MockTransaction>,
    write_fault: Option<io::ErrorKind>,
    read_fault: Option<io::ErrorKind>,
    short_read: Option<usize>,
    logger: Box<dyn Log>,
}

impl Default for MockI2CDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockI2CDevice {
    pub fn new() -> MockI2CDevice {
        MockI2CDevice {
            regmap: I2CRegisterMap::new(),
            transactions: Vec::new(),
            write_fault: None,
            read_fault: None,
            short_read: None,
            logger: Box::new(GlobalLogger),
        }
    }

    /// Replace the diagnostic sink
    pub fn set_logger(&mut self, logger: Box<dyn Log>) {
        self.logger = logger;
    }

    pub fn transactions(&self) -> &[MockTransaction] {
        &self.transactions
    }

    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    /// Make the next write fail with `kind`
    pub fn fail_next_write(&mut self, kind: io::ErrorKind) {
        self.write_fault = Some(kind);
    }

    /// Make the next read fail with `kind`
    pub fn fail_next_read(&mut self, kind: io::ErrorKind) {
        self.read_fault = Some(kind);
    }

    /// Deliver at most `len` bytes on the next read
    pub fn short_next_read(&mut self, len: usize) {
        self.short_read = Some(len);
    }
}

impl I2CDevice for MockI2CDevice {
    type Error = io::Error;

    fn read(&mut self, data: &mut [u8]) -> io::Result<usize> {
        if let Some(kind) = self.read_fault.take() {
            return Err(io::Error::new(kind, "injected read fault"));
        }
        let requested = data.len();
        let len = match self.short_read.take() {
            Some(limit) if limit < requested => limit,
            _ => requested,
        };
        let count = self.regmap.read(&mut data[..len])?;
        self.transactions.push(MockTransaction::Read(requested));
        Ok(count)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_fault.take() {
            return Err(io::Error::new(kind, "injected write fault"));
        }
        let count = self.regmap.write(data)?;
        self.transactions.push(MockTransaction::Write(data.to_vec()));
        Ok(count)
    }

    fn logger(&self) -> &dyn Log {
        &*self.logger
    }
}
