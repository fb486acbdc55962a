// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Dumps (or sets) registers of a single peripheral via Linux i2c-dev

extern crate docopt;
extern crate i2creg;
extern crate log;

use docopt::Docopt;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::env::args;
use std::process;

#[cfg(any(target_os = "linux", target_os = "android"))]
use i2creg::core::I2CDevice;
#[cfg(any(target_os = "linux", target_os = "android"))]
use i2creg::linux::{LinuxI2CDevice, LinuxI2CError};

const USAGE: &str = "
Reads or writes registers of an I2C peripheral via Linux i2cdev.

Addresses, registers and values are hexadecimal, with or without 0x.

Usage:
  regdump [-v] <bus> <addr> [--start=<reg>] [--count=<n>]
  regdump [-v] <bus> <addr> --set=<reg> --value=<byte>
  regdump [-v] <bus> <addr> --word=<reg> [--le]
  regdump (-h | --help)
  regdump --version

Options:
  -h --help        Show this help text.
  --version        Show version.
  -v --verbose     Print bus traces to stderr.
  --start=<reg>    First register to dump [default: 00].
  --count=<n>      Number of registers to dump (decimal) [default: 16].
  --set=<reg>      Register to write a single byte to.
  --value=<byte>   Byte to write.
  --word=<reg>     Read a 16-bit word from this register.
  --le             Treat the word as little-endian.
";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn parse_hex(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value {:?}: {}", s, e))
}

fn parse_u8(s: &str) -> Result<u8, String> {
    let v = parse_hex(s)?;
    if v > 0xFF {
        return Err(format!("{:?} does not fit in a byte", s));
    }
    Ok(v as u8)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn main() {}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn main() {
    let args = Docopt::new(USAGE)
        .and_then(|d| d.argv(args()).version(Some("0.1.0".to_string())).parse())
        .unwrap_or_else(|e| e.exit());

    if args.get_bool("--verbose") {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Debug);
        }
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn run(args: &docopt::ArgvMap) -> Result<(), String> {
    let bus: u32 = args
        .get_str("<bus>")
        .parse()
        .map_err(|e| format!("invalid bus number: {}", e))?;
    let addr = parse_hex(args.get_str("<addr>"))?;

    let mut dev = LinuxI2CDevice::open(bus, addr).map_err(|e| e.to_string())?;
    println!("Opened /dev/i2c-{} at address 0x{:02x}", bus, dev.address());
    if let Ok(funcs) = dev.functionality() {
        if !funcs.supports_raw_transfers() {
            return Err("adapter does not support plain I2C transfers".to_string());
        }
    }

    let result = if !args.get_str("--set").is_empty() {
        let reg = parse_u8(args.get_str("--set"))?;
        let value = parse_u8(args.get_str("--value"))?;
        dev.write_reg_u8(reg, value)
            .map(|()| println!("0x{:02x} <- 0x{:02x}", reg, value))
    } else if !args.get_str("--word").is_empty() {
        let reg = parse_u8(args.get_str("--word"))?;
        let word = if args.get_bool("--le") {
            dev.read_reg_u16_le(reg)
        } else {
            dev.read_reg_u16_be(reg)
        };
        word.map(|w| println!("0x{:02x} = 0x{:04x} ({})", reg, w, w))
    } else {
        let start = parse_u8(args.get_str("--start"))?;
        let count: usize = args
            .get_str("--count")
            .parse()
            .map_err(|e| format!("invalid count: {}", e))?;
        dump(&mut dev, start, count)
    };
    result.map_err(|e| e.to_string())?;

    dev.close().map_err(|e| e.to_string())
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn dump(dev: &mut LinuxI2CDevice, start: u8, count: usize) -> Result<(), LinuxI2CError> {
    let (data, read) = dev.read_reg_bytes(start, count)?;
    if read < count {
        println!("Short read: {} of {} bytes", read, count);
    }
    for (row, chunk) in data[..read].chunks(16).enumerate() {
        let mut line = format!("{:02x}:", start.wrapping_add((row * 16) as u8));
        for byte in chunk {
            line = format!("{} {:02x}", line, byte);
        }
        println!("{}", line);
    }
    Ok(())
}
