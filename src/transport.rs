//! Device access over the serial line.
//!
//! `DeviceTransport` is the blocking register/coil interface the rest of the
//! crate talks to. The line is a single half-duplex bus and is not safe for
//! concurrent use, so every user goes through a [`SerialLine`], which owns the
//! transport behind one mutex and hands out exclusive access per operation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::error::TransportError;
use crate::registers::Address;

/// Register and coil access to the charge controller. All calls block until
/// the device answers or the line fails; nothing here retries.
pub trait DeviceTransport: Send {
    /// Function 0x04.
    fn read_input_registers(&mut self, addr: Address, count: u16)
        -> Result<Vec<u16>, TransportError>;

    /// Function 0x03.
    fn read_holding_registers(
        &mut self,
        addr: Address,
        count: u16,
    ) -> Result<Vec<u16>, TransportError>;

    /// Function 0x10.
    fn write_registers(&mut self, addr: Address, words: &[u16]) -> Result<(), TransportError>;

    /// Function 0x01, single coil.
    fn read_coil(&mut self, addr: Address) -> Result<bool, TransportError>;

    /// Function 0x05.
    fn write_coil(&mut self, addr: Address, value: bool) -> Result<(), TransportError>;

    /// Holding-register write of one word.
    fn write_register(&mut self, addr: Address, word: u16) -> Result<(), TransportError> {
        self.write_registers(addr, &[word])
    }
}

impl<T: DeviceTransport + ?Sized> DeviceTransport for Box<T> {
    fn read_input_registers(
        &mut self,
        addr: Address,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        (**self).read_input_registers(addr, count)
    }
    fn read_holding_registers(
        &mut self,
        addr: Address,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        (**self).read_holding_registers(addr, count)
    }
    fn write_registers(&mut self, addr: Address, words: &[u16]) -> Result<(), TransportError> {
        (**self).write_registers(addr, words)
    }
    fn read_coil(&mut self, addr: Address) -> Result<bool, TransportError> {
        (**self).read_coil(addr)
    }
    fn write_coil(&mut self, addr: Address, value: bool) -> Result<(), TransportError> {
        (**self).write_coil(addr, value)
    }
}

/// Shared, serialized handle to one transport. Cloning shares the line.
pub struct SerialLine<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for SerialLine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: DeviceTransport> SerialLine<T> {
    pub fn new(transport: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transport)),
        }
    }

    /// Run `f` with exclusive access to the line. Whoever holds the line
    /// finishes its whole operation (e.g. a three-register time write) before
    /// anyone else gets on the bus.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let started = Instant::now();
        // a panic in another holder leaves the transport itself usable
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let waited = started.elapsed();
        if waited.as_millis() > 500 {
            log::debug!("[LINE] waited {waited:?} for serial line");
        }
        f(&mut guard)
    }

    /// Take the transport back once every other handle is gone.
    pub fn into_inner(self) -> Option<T> {
        Arc::try_unwrap(self.inner)
            .ok()
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Hex dump of a register run for debug logging.
pub(crate) fn words_hex(words: &[u16]) -> String {
    words
        .iter()
        .map(|w| format!("{w:04X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(feature = "rtu")]
pub mod rtu {
    //! Modbus RTU backend on a real serial port.

    use std::time::Duration;

    use tokio_modbus::client::sync::{self, Context, Reader, Writer};
    use tokio_modbus::Slave;

    use super::{words_hex, DeviceTransport};
    use crate::config::SerialSettings;
    use crate::error::TransportError;
    use crate::registers::Address;

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    pub struct RtuTransport {
        ctx: Context,
        port: String,
    }

    impl std::fmt::Debug for RtuTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RtuTransport")
                .field("port", &self.port)
                .finish_non_exhaustive()
        }
    }

    fn flatten<T>(res: tokio_modbus::Result<T>) -> Result<T, TransportError> {
        match res {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(code)) => Err(TransportError::Exception(code.to_string())),
            Err(e) => Err(TransportError::Protocol(e.to_string())),
        }
    }

    impl RtuTransport {
        /// Open `settings.port` as 8N1 at `settings.baud` and address `settings.slave_id`.
        pub fn open(settings: &SerialSettings) -> Result<Self, TransportError> {
            log::info!(
                "Opening {}, {} 8N1, slave 0x{:02X}",
                settings.port,
                settings.baud,
                settings.slave_id
            );
            let builder = tokio_serial::new(&settings.port, settings.baud)
                .data_bits(tokio_serial::DataBits::Eight)
                .parity(tokio_serial::Parity::None)
                .stop_bits(tokio_serial::StopBits::One);
            let mut ctx = sync::rtu::connect_slave(&builder, Slave(settings.slave_id))?;
            ctx.set_timeout(Some(DEFAULT_TIMEOUT));
            Ok(Self {
                ctx,
                port: settings.port.clone(),
            })
        }
    }

    impl DeviceTransport for RtuTransport {
        fn read_input_registers(
            &mut self,
            addr: Address,
            count: u16,
        ) -> Result<Vec<u16>, TransportError> {
            let words = flatten(self.ctx.read_input_registers(addr, count))?;
            log::debug!("[RTU recv input 0x{addr:04X}] {}", words_hex(&words));
            Ok(words)
        }

        fn read_holding_registers(
            &mut self,
            addr: Address,
            count: u16,
        ) -> Result<Vec<u16>, TransportError> {
            let words = flatten(self.ctx.read_holding_registers(addr, count))?;
            log::debug!("[RTU recv holding 0x{addr:04X}] {}", words_hex(&words));
            Ok(words)
        }

        fn write_registers(&mut self, addr: Address, words: &[u16]) -> Result<(), TransportError> {
            log::debug!("[RTU send 0x{addr:04X}] {}", words_hex(words));
            flatten(self.ctx.write_multiple_registers(addr, words))
        }

        fn read_coil(&mut self, addr: Address) -> Result<bool, TransportError> {
            let coils = flatten(self.ctx.read_coils(addr, 1))?;
            coils
                .first()
                .copied()
                .ok_or_else(|| TransportError::Protocol(format!("empty coil read at 0x{addr:04X}")))
        }

        fn write_coil(&mut self, addr: Address, value: bool) -> Result<(), TransportError> {
            log::debug!("[RTU coil 0x{addr:04X}] {value}");
            flatten(self.ctx.write_single_coil(addr, value))
        }
    }
}
