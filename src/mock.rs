//! In-memory controller for tests and demos.
//!
//! `MockDevice` keeps input registers, holding registers and coils in maps,
//! records every successful write in order and can be told to fail specific
//! operations.

use std::collections::{BTreeMap, HashSet};

use crate::error::TransportError;
use crate::registers::Address;
use crate::transport::{words_hex, DeviceTransport};

/// One write the device accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRecord {
    Register { addr: Address, word: u16 },
    Coil { addr: Address, value: bool },
}

#[derive(Debug, Default)]
pub struct MockDevice {
    input: BTreeMap<Address, u16>,
    holding: BTreeMap<Address, u16>,
    coils: BTreeMap<Address, bool>,
    journal: Vec<WriteRecord>,
    write_attempts: usize,
    fail_write_numbers: HashSet<usize>,
    fail_addresses: HashSet<Address>,
    fail_reads: bool,
}

impl MockDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload input registers starting at `addr`.
    #[must_use]
    pub fn with_input(mut self, addr: Address, words: &[u16]) -> Self {
        self.set_input(addr, words);
        self
    }

    /// Preload holding registers starting at `addr`.
    #[must_use]
    pub fn with_holding(mut self, addr: Address, words: &[u16]) -> Self {
        for (a, w) in (addr..).zip(words) {
            self.holding.insert(a, *w);
        }
        self
    }

    /// The `n`th write attempt (1-based, registers and coils counted together)
    /// fails with a protocol error.
    #[must_use]
    pub fn fail_nth_write(mut self, n: usize) -> Self {
        self.fail_write_numbers.insert(n);
        self
    }

    /// Every access to `addr` fails.
    #[must_use]
    pub fn fail_address(mut self, addr: Address) -> Self {
        self.fail_addresses.insert(addr);
        self
    }

    /// Every register and coil read fails.
    #[must_use]
    pub fn fail_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn set_input(&mut self, addr: Address, words: &[u16]) {
        for (a, w) in (addr..).zip(words) {
            self.input.insert(a, *w);
        }
    }

    #[must_use]
    pub fn holding(&self, addr: Address) -> Option<u16> {
        self.holding.get(&addr).copied()
    }

    #[must_use]
    pub fn coil(&self, addr: Address) -> Option<bool> {
        self.coils.get(&addr).copied()
    }

    /// Successful writes in the order they happened.
    #[must_use]
    pub fn journal(&self) -> &[WriteRecord] {
        &self.journal
    }

    /// Writes attempted, failed ones included.
    #[must_use]
    pub const fn write_attempts(&self) -> usize {
        self.write_attempts
    }

    fn failing_address(&self, addr: Address, count: u16) -> Option<Address> {
        (addr..addr.saturating_add(count)).find(|a| self.fail_addresses.contains(a))
    }

    fn check_read(&self, addr: Address, count: u16) -> Result<(), TransportError> {
        if self.fail_reads {
            return Err(TransportError::Protocol(format!(
                "injected read failure at 0x{addr:04X}"
            )));
        }
        if let Some(bad) = self.failing_address(addr, count) {
            return Err(TransportError::Exception(format!(
                "illegal data address 0x{bad:04X}"
            )));
        }
        Ok(())
    }

    fn begin_write(&mut self, addr: Address, count: u16) -> Result<(), TransportError> {
        self.write_attempts += 1;
        if self.fail_write_numbers.contains(&self.write_attempts) {
            return Err(TransportError::Protocol(format!(
                "injected failure on write #{} (0x{addr:04X})",
                self.write_attempts
            )));
        }
        if let Some(bad) = self.failing_address(addr, count) {
            return Err(TransportError::Exception(format!(
                "illegal data address 0x{bad:04X}"
            )));
        }
        Ok(())
    }

    fn read_map(map: &BTreeMap<Address, u16>, addr: Address, count: u16) -> Vec<u16> {
        (addr..addr.saturating_add(count))
            .map(|a| map.get(&a).copied().unwrap_or(0))
            .collect()
    }
}

impl DeviceTransport for MockDevice {
    fn read_input_registers(
        &mut self,
        addr: Address,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        self.check_read(addr, count)?;
        let words = Self::read_map(&self.input, addr, count);
        log::debug!("[MOCK input 0x{addr:04X}] {}", words_hex(&words));
        Ok(words)
    }

    fn read_holding_registers(
        &mut self,
        addr: Address,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        self.check_read(addr, count)?;
        let words = Self::read_map(&self.holding, addr, count);
        log::debug!("[MOCK holding 0x{addr:04X}] {}", words_hex(&words));
        Ok(words)
    }

    fn write_registers(&mut self, addr: Address, words: &[u16]) -> Result<(), TransportError> {
        let count = u16::try_from(words.len())
            .map_err(|_| TransportError::Protocol(format!("{} words in one write", words.len())))?;
        self.begin_write(addr, count)?;
        log::debug!("[MOCK write 0x{addr:04X}] {}", words_hex(words));
        for (a, w) in (addr..).zip(words) {
            self.holding.insert(a, *w);
            self.journal.push(WriteRecord::Register { addr: a, word: *w });
        }
        Ok(())
    }

    fn read_coil(&mut self, addr: Address) -> Result<bool, TransportError> {
        self.check_read(addr, 1)?;
        Ok(self.coils.get(&addr).copied().unwrap_or(false))
    }

    fn write_coil(&mut self, addr: Address, value: bool) -> Result<(), TransportError> {
        self.begin_write(addr, 1)?;
        log::debug!("[MOCK coil 0x{addr:04X}] {value}");
        self.coils.insert(addr, value);
        self.journal.push(WriteRecord::Coil { addr, value });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nth_write_failure_is_counted() {
        let mut dev = MockDevice::new().fail_nth_write(2);
        assert!(dev.write_register(0x9000, 1).is_ok());
        assert!(dev.write_register(0x9001, 2).is_err());
        assert!(dev.write_coil(0x0000, true).is_ok());
        assert_eq!(dev.write_attempts(), 3);
        assert_eq!(dev.journal().len(), 2);
        assert_eq!(dev.holding(0x9001), None);
    }

    #[test]
    fn reads_return_preloaded_words() {
        let mut dev = MockDevice::new().with_input(0x3100, &[1, 2, 3]);
        assert_eq!(dev.read_input_registers(0x3101, 3).unwrap(), vec![2, 3, 0]);
    }

    #[test]
    fn failing_address_inside_read_range() {
        let mut dev = MockDevice::new().fail_address(0x3112);
        assert!(dev.read_input_registers(0x3100, 0x13).is_err());
        assert!(dev.read_input_registers(0x3100, 0x12).is_ok());
    }
}
