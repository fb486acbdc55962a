// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Diagnostic sink plumbing
//!
//! Every device carries a `log::Log` implementation that receives
//! debug-level traces of the bytes moved across the bus and of the
//! register values decoded from them.  By default that sink is the
//! process-wide `log` facade, so an application that installs a logger
//! sees the traces and one that does not pays nothing for them.

use log::{Level, Log, Metadata, Record};
use std::fmt;

/// Target attached to every record emitted by this crate
pub const TARGET: &str = "i2creg";

/// Sink that forwards to whatever logger is installed globally
///
/// Honours `log::max_level()` the same way the `log!` macros do.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalLogger;

impl Log for GlobalLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            log::logger().log(record);
        }
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

pub(crate) static GLOBAL_LOGGER: GlobalLogger = GlobalLogger;

/// Formats a byte slice as contiguous lowercase hex, e.g. `1234ab`
pub struct HexBytes<'a>(pub &'a [u8]);

impl<'a> fmt::Display for HexBytes<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Emit a debug record to `sink` if it is interested in one
pub(crate) fn debug(sink: &dyn Log, args: fmt::Arguments) {
    let metadata = Metadata::builder()
        .level(Level::Debug)
        .target(TARGET)
        .build();
    if !sink.enabled(&metadata) {
        return;
    }
    sink.log(
        &Record::builder()
            .metadata(metadata)
            .args(args)
            .module_path_static(Some(module_path!()))
            .build(),
    );
}

macro_rules! diag {
    ($dev:expr, $($arg:tt)+) => {
        $crate::diag::debug($dev.logger(), format_args!($($arg)+))
    };
}
