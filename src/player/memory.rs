// Flat 64 KiB bus with SID write interception.
//
// Every store commits to RAM first so later loads observe it, then is
// classified: stores landing in the SID register window ($D400-$D7FF,
// mirrored every 32 bytes) additionally forward the low 5 address bits
// and the value to the chip driver. Reads pass through untouched except
// for the CIA2 interrupt control register at $DD0D, which clears on
// read like the hardware latch it models.

use crate::cpu::Bus;
use crate::sid_device::SidDevice;

/// Base of the SID register window.
pub const SID_BASE: u16 = 0xD400;
/// High-bit mask selecting the $D400-$D7FF window.
const SID_WINDOW_MASK: u16 = 0xFC00;
/// CIA2 interrupt control register, self-clearing on read.
const CIA2_ICR: u16 = 0xDD0D;

pub struct SidMemory<D: SidDevice> {
    pub ram: Box<[u8; 65536]>,
    pub device: D,
}

impl<D: SidDevice> SidMemory<D> {
    pub fn new(device: D) -> Self {
        Self {
            ram: Box::new([0u8; 65536]),
            device,
        }
    }

    /// Zero the whole address space.
    pub fn clear(&mut self) {
        self.ram.fill(0);
    }

    /// Copy a program image in at `addr`, truncating at the top of memory.
    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        let end = (start + data.len()).min(65536);
        self.ram[start..end].copy_from_slice(&data[..end - start]);
    }
}

impl<D: SidDevice> Bus for SidMemory<D> {
    fn get_byte(&mut self, address: u16) -> u8 {
        if address == CIA2_ICR {
            self.ram[address as usize] = 0;
        }
        self.ram[address as usize]
    }

    fn set_byte(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
        if address & SID_WINDOW_MASK == SID_BASE {
            self.device.write_register((address & 0x1F) as u8, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sid_device::ShadowSid;

    #[test]
    fn test_sid_window_store_forwards_once_and_reads_back() {
        let mut mem = SidMemory::new(ShadowSid::new());
        mem.set_byte(0xD404, 0x0F);
        assert_eq!(mem.device.writes, 1);
        assert_eq!(mem.device.regs[4], 0x0F);
        assert_eq!(mem.get_byte(0xD404), 0x0F);
    }

    #[test]
    fn test_window_is_mirrored_every_32_bytes() {
        let mut mem = SidMemory::new(ShadowSid::new());
        mem.set_byte(0xD420 + 4, 0x33);
        mem.set_byte(0xD7E0 + 4, 0x44);
        assert_eq!(mem.device.regs[4], 0x44);
        assert_eq!(mem.device.writes, 2);
    }

    #[test]
    fn test_stores_outside_window_do_not_forward() {
        let mut mem = SidMemory::new(ShadowSid::new());
        mem.set_byte(0xD3FF, 0x55);
        mem.set_byte(0xD800, 0x55);
        mem.set_byte(0x1234, 0x55);
        assert_eq!(mem.device.writes, 0);
        assert_eq!(mem.get_byte(0x1234), 0x55);
    }

    #[test]
    fn test_cia2_icr_clears_on_read() {
        let mut mem = SidMemory::new(ShadowSid::new());
        mem.set_byte(0xDD0D, 0x7F);
        assert_eq!(mem.get_byte(0xDD0D), 0);
        assert_eq!(mem.ram[0xDD0D], 0);
    }

    #[test]
    fn test_load_truncates_at_top_of_memory() {
        let mut mem = SidMemory::new(ShadowSid::new());
        mem.load(0xFFFE, &[1, 2, 3, 4]);
        assert_eq!(mem.ram[0xFFFE], 1);
        assert_eq!(mem.ram[0xFFFF], 2);
    }
}
