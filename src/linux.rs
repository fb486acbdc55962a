// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use log::Log;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::prelude::*;
use std::os::unix::prelude::*;
use std::path::{Path, PathBuf};

use crate::core::I2CDevice;
use crate::diag::GlobalLogger;
use crate::ffi;

pub use crate::ffi::I2CFunctions;

/// Handle to a single peripheral on a Linux i2c-dev bus
///
/// The descriptor is bound to one slave address when the handle is
/// created and stays bound to it; talking to another address needs
/// another handle.
pub struct LinuxI2CDevice {
    devfile: File,
    slave_address: u16,
    logger: Box<dyn Log>,
}

/// Linux I2C errors
#[derive(Debug)]
pub enum LinuxI2CError {
    /// The bus device node could not be opened
    Open { path: PathBuf, source: io::Error },
    /// The kernel refused to bind the descriptor to the address
    Bind { address: u16, source: nix::Error },
    /// A read or write on the bound descriptor failed
    Io(io::Error),
    /// Any other device-control or descriptor call failed
    Nix(nix::Error),
}

impl From<nix::Error> for LinuxI2CError {
    fn from(e: nix::Error) -> Self {
        LinuxI2CError::Nix(e)
    }
}

impl From<io::Error> for LinuxI2CError {
    fn from(e: io::Error) -> Self {
        LinuxI2CError::Io(e)
    }
}

impl From<LinuxI2CError> for io::Error {
    fn from(e: LinuxI2CError) -> io::Error {
        match e {
            LinuxI2CError::Open { source, .. } => source,
            LinuxI2CError::Io(e) => e,
            LinuxI2CError::Bind { source, .. } | LinuxI2CError::Nix(source) => source.into(),
        }
    }
}

impl fmt::Display for LinuxI2CError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinuxI2CError::Open { path, source } => {
                write!(f, "unable to open {}: {}", path.display(), source)
            }
            LinuxI2CError::Bind { address, source } => {
                write!(f, "unable to bind slave address 0x{:02x}: {}", address, source)
            }
            LinuxI2CError::Io(e) => fmt::Display::fmt(e, f),
            LinuxI2CError::Nix(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl Error for LinuxI2CError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LinuxI2CError::Open { source, .. } => Some(source),
            LinuxI2CError::Bind { source, .. } => Some(source),
            LinuxI2CError::Io(e) => Some(e),
            LinuxI2CError::Nix(e) => Some(e),
        }
    }
}

impl AsRawFd for LinuxI2CDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.devfile.as_raw_fd()
    }
}

impl fmt::Debug for LinuxI2CDevice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LinuxI2CDevice")
            .field("devfile", &self.devfile)
            .field("slave_address", &self.slave_address)
            .finish()
    }
}

impl LinuxI2CDevice {
    /// Open `/dev/i2c-<bus>` and bind it to `slave_address`
    ///
    /// The `i2c-dev` kernel module has to be loaded for the node to
    /// exist (`modprobe i2c-dev`).
    pub fn open(bus: u32, slave_address: u16) -> Result<LinuxI2CDevice, LinuxI2CError> {
        LinuxI2CDevice::new(format!("/dev/i2c-{}", bus), slave_address)
    }

    /// Create a new I2CDevice for the specified path
    ///
    /// Typically the address is expected to be 7-bits.  Little validation
    /// is done in Rust as the kernel is good at making sure things are
    /// valid; a rejected address is reported as `LinuxI2CError::Bind`.
    pub fn new<P: AsRef<Path>>(
        path: P,
        slave_address: u16,
    ) -> Result<LinuxI2CDevice, LinuxI2CError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| LinuxI2CError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        ffi::i2c_set_slave_address(file.as_raw_fd(), slave_address).map_err(|source| {
            LinuxI2CError::Bind {
                address: slave_address,
                source,
            }
        })?;
        Ok(LinuxI2CDevice {
            devfile: file,
            slave_address,
            logger: Box::new(GlobalLogger),
        })
    }

    /// Replace the diagnostic sink, builder style
    pub fn with_logger(mut self, logger: Box<dyn Log>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the diagnostic sink
    pub fn set_logger(&mut self, logger: Box<dyn Log>) {
        self.logger = logger;
    }

    /// Slave address this handle is bound to
    pub fn address(&self) -> u16 {
        self.slave_address
    }

    /// Query the adapter's capabilities
    pub fn functionality(&self) -> Result<I2CFunctions, LinuxI2CError> {
        let funcs = ffi::i2c_get_functionality(self.as_raw_fd())?;
        Ok(funcs)
    }

    /// Release the descriptor
    ///
    /// Unlike dropping the handle, this reports a failing `close(2)`.
    /// The handle is consumed, so it cannot be used or closed again.
    pub fn close(self) -> Result<(), LinuxI2CError> {
        let LinuxI2CDevice { devfile, .. } = self;
        ffi::i2c_close(devfile.into_raw_fd())?;
        Ok(())
    }
}

impl I2CDevice for LinuxI2CDevice {
    type Error = LinuxI2CError;

    /// Read data from the device to fill the provided slice
    ///
    /// End of file on a non-empty buffer is reported as
    /// `io::ErrorKind::UnexpectedEof`.
    fn read(&mut self, data: &mut [u8]) -> Result<usize, LinuxI2CError> {
        let count = self.devfile.read(data)?;
        if count == 0 && !data.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no data from slave address 0x{:02x}", self.slave_address),
            )
            .into());
        }
        Ok(count)
    }

    /// Write the provided buffer to the device
    fn write(&mut self, data: &[u8]) -> Result<usize, LinuxI2CError> {
        self.devfile.write(data).map_err(From::from)
    }

    fn logger(&self) -> &dyn Log {
        &*self.logger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::capture::CaptureLogger;

    // /dev/null reads as empty and swallows writes, which is enough to
    // exercise the byte-stream path of a handle that skipped the bind
    fn unbound_device(path: &str) -> LinuxI2CDevice {
        LinuxI2CDevice {
            devfile: OpenOptions::new().read(true).write(true).open(path).unwrap(),
            slave_address: 0x20,
            logger: Box::new(GlobalLogger),
        }
    }

    #[test]
    fn test_open_missing_node() {
        let err = LinuxI2CDevice::new("/dev/i2c-does-not-exist", 0x20).unwrap_err();
        match err {
            LinuxI2CError::Open { ref path, ref source } => {
                assert_eq!(path, Path::new("/dev/i2c-does-not-exist"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            ref other => panic!("unexpected error {:?}", other),
        }
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/dev/i2c-does-not-exist"));
    }

    #[test]
    fn test_bind_rejected_by_non_i2c_node() {
        let err = LinuxI2CDevice::new("/dev/null", 0x20).unwrap_err();
        match err {
            LinuxI2CError::Bind { address, source } => {
                assert_eq!(address, 0x20);
                assert_eq!(source, nix::errno::Errno::ENOTTY);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_error_into_io_error() {
        let err = LinuxI2CError::Bind {
            address: 0x80,
            source: nix::errno::Errno::EINVAL,
        };
        let io_err: io::Error = err.into();
        assert_eq!(io_err.raw_os_error(), Some(libc::EINVAL));
    }

    #[test]
    fn test_byte_stream_on_descriptor() {
        let sink = CaptureLogger::default();
        let mut dev = unbound_device("/dev/null").with_logger(Box::new(sink.clone()));
        assert_eq!(dev.address(), 0x20);
        assert_eq!(dev.write_bytes(&[0x10, 0xAB]).unwrap(), 2);

        let mut buf = [0xEE; 2];
        match dev.read_bytes(&mut buf) {
            Err(LinuxI2CError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(dev.read_bytes(&mut []).unwrap(), 0);
        assert_eq!(
            sink.lines(),
            vec!["Write 2 hex bytes: [10ab]", "Read 0 hex bytes: []"]
        );
    }

    #[test]
    fn test_register_reads_fail_without_data() {
        let mut dev = unbound_device("/dev/null");
        for result in &[
            dev.read_reg_u8(0x10).map(i32::from),
            dev.read_reg_s16_be(0x10).map(i32::from),
            dev.read_reg_u16_le(0x10).map(i32::from),
        ] {
            match result {
                Err(LinuxI2CError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
                other => panic!("unexpected result {:?}", other),
            }
        }
        match dev.read_reg_bytes(0x10, 4) {
            Err(LinuxI2CError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_functionality_on_non_i2c_node() {
        let dev = unbound_device("/dev/null");
        match dev.functionality() {
            Err(LinuxI2CError::Nix(e)) => assert_eq!(e, nix::errno::Errno::ENOTTY),
            other => panic!("unexpected result {:?}", other),
        }
    }

    fn fd_is_open(fd: RawFd) -> Result<(), nix::Error> {
        nix::errno::Errno::result(unsafe { libc::fcntl(fd, libc::F_GETFD) }).map(drop)
    }

    #[test]
    fn test_close_releases_descriptor_once() {
        // park the descriptor well above the ones other tests are handed,
        // so its number cannot be reused while we look at it
        let low = File::open("/dev/null").unwrap();
        let fd = nix::errno::Errno::result(unsafe {
            libc::fcntl(low.as_raw_fd(), libc::F_DUPFD_CLOEXEC, 512)
        })
        .unwrap();
        drop(low);
        let dev = LinuxI2CDevice {
            devfile: unsafe { File::from_raw_fd(fd) },
            slave_address: 0x20,
            logger: Box::new(GlobalLogger),
        };
        assert_eq!(dev.as_raw_fd(), fd);
        assert_eq!(fd_is_open(fd), Ok(()));

        // close consumes the handle, so it cannot be closed through it again
        dev.close().unwrap();
        assert_eq!(fd_is_open(fd), Err(nix::errno::Errno::EBADF));
        assert_eq!(ffi::i2c_close(fd), Err(nix::errno::Errno::EBADF));
    }

    #[test]
    fn test_close_of_stale_descriptor_is_reported() {
        assert_eq!(ffi::i2c_close(-1), Err(nix::errno::Errno::EBADF));
    }
}
