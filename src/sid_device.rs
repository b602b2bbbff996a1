// Chip driver boundary.
//
// The playback core forwards every store that lands in the SID register
// window as exactly one `write_register` call, in program order. What
// happens behind the trait — real hardware, a software synth, a test
// double — is not the core's concern, and the call has no failure mode
// visible to it.

/// A SID register sink. `reg` is the offset within the 32-register
/// window (0–31), `value` the byte the tune stored there.
pub trait SidDevice {
    fn write_register(&mut self, reg: u8, value: u8);
}

/// Virtual backend that keeps the last value written to each register,
/// the way a visualizer-facing shadow register file would. Doubles as
/// the test device: `writes` counts every forwarded store.
#[derive(Debug, Default)]
pub struct ShadowSid {
    pub regs: [u8; 32],
    pub writes: usize,
}

impl ShadowSid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Master volume (low nibble of register $18).
    pub fn volume(&self) -> u8 {
        self.regs[0x18] & 0x0F
    }
}

impl SidDevice for ShadowSid {
    fn write_register(&mut self, reg: u8, value: u8) {
        log::trace!("sid write reg={:#04x} val={:#04x}", reg, value);
        self.regs[(reg & 0x1F) as usize] = value;
        self.writes += 1;
    }
}
