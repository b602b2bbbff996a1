// NMOS 6502 interpreter used to run PSID init/play routines.
//
// Semantics follow the TinySID lineage that SID tunes were authored
// against, including its simplified overflow formula for ADC/SBC
// (V = C xor N after the operation). Decimal mode is tracked as a flag
// but never consulted by arithmetic; PSID music routines do not use it.

pub mod opcodes;

use bitflags::bitflags;

use opcodes::{Instr, Mode, Op, INSTRUCTIONS};

/// Byte-addressable memory seen by the CPU. The player's bus implements
/// this to intercept stores into the SID register window.
pub trait Bus {
    fn get_byte(&mut self, address: u16) -> u8;
    fn set_byte(&mut self, address: u16, value: u8);
}

bitflags! {
    /// 6502 status register. Decimal is stored but has no effect on
    /// ADC/SBC in this core.
    pub struct Status: u8 {
        const NEGATIVE  = 0x80;
        const OVERFLOW  = 0x40;
        const BREAK     = 0x10;
        const DECIMAL   = 0x08;
        const INTERRUPT = 0x04;
        const ZERO      = 0x02;
        const CARRY     = 0x01;
    }
}

/// Reset vector location.
const RESET_VECTOR: u16 = 0xFFFC;
/// BRK/IRQ vector location.
const IRQ_VECTOR: u16 = 0xFFFE;

// ─────────────────────────────────────────────────────────────────────────────
//  CPU core
// ─────────────────────────────────────────────────────────────────────────────

pub struct Cpu<M: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub status: Status,
    pub pc: u16,
    pub memory: M,
    /// Cycle cost accumulated by the instruction currently executing.
    cycles: u32,
}

impl<M: Bus> Cpu<M> {
    pub fn new(memory: M) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFF,
            status: Status::empty(),
            pc: 0,
            memory,
            cycles: 0,
        }
    }

    /// Reset registers and reload PC from the reset vector.
    pub fn reset(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.status = Status::empty();
        self.sp = 0xFF;
        self.pc = self.read_word(RESET_VECTOR);
    }

    /// Invoke a routine as if called from native code: registers are
    /// primed, a 0x0000 return address is pushed as a sentinel, and the
    /// interpreter runs until an RTS pops it (PC becomes exactly 0x0000).
    ///
    /// `budget` bounds the number of steps; `None` runs unbounded, which
    /// matches the original player and means a routine that never
    /// returns hangs the caller. Returns false if the budget ran out.
    pub fn call(&mut self, address: u16, accumulator: u8, budget: Option<u32>) -> bool {
        self.a = accumulator;
        self.x = 0;
        self.y = 0;
        self.status = Status::empty();
        self.sp = 0xFF;
        self.pc = address;

        // Sentinel return address 0x0000.
        self.push(0x00);
        self.push(0x00);

        match budget {
            None => {
                while self.pc != 0 {
                    self.step();
                }
                true
            }
            Some(max) => {
                let mut steps = 0;
                while self.pc != 0 {
                    if steps == max {
                        return false;
                    }
                    self.step();
                    steps += 1;
                }
                true
            }
        }
    }

    /// Fetch, decode and execute one instruction. Returns its cycle cost
    /// including any page-crossing and branch penalties.
    pub fn step(&mut self) -> u32 {
        self.cycles = 0;
        let opcode = self.fetch_byte();
        let Instr { op, mode } = INSTRUCTIONS[opcode as usize];
        self.execute(op, mode);
        self.cycles
    }

    // ── Memory and stack helpers ─────────────────────────────────────────

    fn read(&mut self, address: u16) -> u8 {
        self.memory.get_byte(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory.set_byte(address, value);
    }

    fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.read(address) as u16;
        let hi = self.read(address.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    fn fetch_byte(&mut self) -> u8 {
        let value = self.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte() as u16;
        let hi = self.fetch_byte() as u16;
        (hi << 8) | lo
    }

    // The stack lives in page 1 and the pointer wraps within it.
    fn push(&mut self, value: u8) {
        self.write(0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.read(0x0100 | self.sp as u16)
    }

    fn push_word(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }

    fn pop_word(&mut self) -> u16 {
        let lo = self.pop() as u16;
        let hi = self.pop() as u16;
        (hi << 8) | lo
    }

    // ── Addressing resolver ──────────────────────────────────────────────

    /// Fetch the operand for a read-class access, advancing PC past the
    /// operand bytes and accounting cycles. Indexed reads pay one extra
    /// cycle when the effective address crosses a page boundary.
    fn fetch_operand(&mut self, mode: Mode) -> u8 {
        match mode {
            Mode::Implied => {
                self.cycles += 2;
                0
            }
            Mode::Immediate | Mode::Relative => {
                self.cycles += 2;
                self.fetch_byte()
            }
            Mode::Absolute => {
                self.cycles += 4;
                let addr = self.fetch_word();
                self.read(addr)
            }
            Mode::AbsoluteX => {
                self.cycles += 4;
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.x as u16);
                if addr & 0xFF00 != base & 0xFF00 {
                    self.cycles += 1;
                }
                self.read(addr)
            }
            Mode::AbsoluteY => {
                self.cycles += 4;
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.y as u16);
                if addr & 0xFF00 != base & 0xFF00 {
                    self.cycles += 1;
                }
                self.read(addr)
            }
            Mode::ZeroPage => {
                self.cycles += 3;
                let addr = self.fetch_byte() as u16;
                self.read(addr)
            }
            Mode::ZeroPageX => {
                self.cycles += 4;
                let addr = self.fetch_byte().wrapping_add(self.x) as u16;
                self.read(addr)
            }
            Mode::ZeroPageY => {
                self.cycles += 4;
                let addr = self.fetch_byte().wrapping_add(self.y) as u16;
                self.read(addr)
            }
            Mode::IndirectX => {
                self.cycles += 6;
                let zp = self.fetch_byte().wrapping_add(self.x);
                let lo = self.read(zp as u16) as u16;
                let hi = self.read(zp.wrapping_add(1) as u16) as u16;
                let addr = (hi << 8) | lo;
                self.read(addr)
            }
            Mode::IndirectY => {
                self.cycles += 5;
                let zp = self.fetch_byte();
                let lo = self.read(zp as u16) as u16;
                let hi = self.read(zp.wrapping_add(1) as u16) as u16;
                let base = (hi << 8) | lo;
                let addr = base.wrapping_add(self.y as u16);
                if addr & 0xFF00 != base & 0xFF00 {
                    self.cycles += 1;
                }
                self.read(addr)
            }
            Mode::Accumulator => {
                self.cycles += 2;
                self.a
            }
            // JMP decodes its own operand.
            Mode::Indirect => 0,
        }
    }

    /// Write back the result of a read-modify-write instruction. PC has
    /// already advanced past the operand bytes, so they are re-read from
    /// behind it. The crossing penalty paid by the preceding fetch is
    /// refunded, keeping RMW cost constant across page boundaries.
    fn write_back(&mut self, mode: Mode, value: u8) {
        match mode {
            Mode::Absolute => {
                self.cycles += 2;
                let lo = self.read(self.pc.wrapping_sub(2)) as u16;
                let hi = self.read(self.pc.wrapping_sub(1)) as u16;
                self.write((hi << 8) | lo, value);
            }
            Mode::AbsoluteX => {
                self.cycles += 3;
                let lo = self.read(self.pc.wrapping_sub(2)) as u16;
                let hi = self.read(self.pc.wrapping_sub(1)) as u16;
                let base = (hi << 8) | lo;
                let addr = base.wrapping_add(self.x as u16);
                if addr & 0xFF00 != base & 0xFF00 {
                    self.cycles -= 1;
                }
                self.write(addr, value);
            }
            Mode::ZeroPage => {
                self.cycles += 2;
                let addr = self.read(self.pc.wrapping_sub(1)) as u16;
                self.write(addr, value);
            }
            Mode::ZeroPageX => {
                self.cycles += 2;
                let addr = self.read(self.pc.wrapping_sub(1)).wrapping_add(self.x) as u16;
                self.write(addr, value);
            }
            Mode::Accumulator => {
                self.a = value;
            }
            _ => {}
        }
    }

    /// Store a fresh value (STA/STX/STY). Store-class accesses use a
    /// fixed cost: no page-crossing penalty, unlike reads.
    fn store_operand(&mut self, mode: Mode, value: u8) {
        match mode {
            Mode::Absolute => {
                self.cycles += 4;
                let addr = self.fetch_word();
                self.write(addr, value);
            }
            Mode::AbsoluteX => {
                self.cycles += 4;
                let addr = self.fetch_word().wrapping_add(self.x as u16);
                self.write(addr, value);
            }
            Mode::AbsoluteY => {
                self.cycles += 4;
                let addr = self.fetch_word().wrapping_add(self.y as u16);
                self.write(addr, value);
            }
            Mode::ZeroPage => {
                self.cycles += 3;
                let addr = self.fetch_byte() as u16;
                self.write(addr, value);
            }
            Mode::ZeroPageX => {
                self.cycles += 4;
                let addr = self.fetch_byte().wrapping_add(self.x) as u16;
                self.write(addr, value);
            }
            Mode::ZeroPageY => {
                self.cycles += 4;
                let addr = self.fetch_byte().wrapping_add(self.y) as u16;
                self.write(addr, value);
            }
            Mode::IndirectX => {
                self.cycles += 6;
                let zp = self.fetch_byte().wrapping_add(self.x);
                let lo = self.read(zp as u16) as u16;
                let hi = self.read(zp.wrapping_add(1) as u16) as u16;
                self.write((hi << 8) | lo, value);
            }
            Mode::IndirectY => {
                self.cycles += 5;
                let zp = self.fetch_byte();
                let lo = self.read(zp as u16) as u16;
                let hi = self.read(zp.wrapping_add(1) as u16) as u16;
                let addr = ((hi << 8) | lo).wrapping_add(self.y as u16);
                self.write(addr, value);
            }
            Mode::Accumulator => {
                self.cycles += 2;
                self.a = value;
            }
            _ => {}
        }
    }

    // ── Flag helpers ─────────────────────────────────────────────────────

    fn set_zn(&mut self, value: u8) {
        self.status.set(Status::ZERO, value == 0);
        self.status.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    /// Signed offset branch. Taken branches cost one extra cycle, two if
    /// the target lands on the other side of a page boundary.
    fn branch(&mut self, condition: bool) {
        let dist = self.fetch_operand(Mode::Immediate) as i8;
        let target = self.pc.wrapping_add(dist as i16 as u16);
        if condition {
            self.cycles += if (self.pc ^ target) & 0x0100 != 0 { 2 } else { 1 };
            self.pc = target;
        }
    }

    /// Shared ADC/SBC tail. Carry comes from bit 8 of the 9-bit sum and
    /// overflow uses the simplified V = C xor N formula that the tune
    /// corpus was authored against.
    fn add_with_carry(&mut self, operand: u8) {
        let carry_in = self.status.contains(Status::CARRY) as u16;
        let sum = self.a as u16 + operand as u16 + carry_in;
        self.status.set(Status::CARRY, sum & 0x100 != 0);
        self.a = sum as u8;
        self.set_zn(self.a);
        let v = self.status.contains(Status::CARRY) ^ self.status.contains(Status::NEGATIVE);
        self.status.set(Status::OVERFLOW, v);
    }

    // ── Execute ──────────────────────────────────────────────────────────

    fn execute(&mut self, op: Op, mode: Mode) {
        match op {
            Op::Adc => {
                let operand = self.fetch_operand(mode);
                self.add_with_carry(operand);
            }
            Op::Sbc => {
                let operand = self.fetch_operand(mode) ^ 0xFF;
                self.add_with_carry(operand);
            }
            Op::And => {
                let operand = self.fetch_operand(mode);
                self.a &= operand;
                self.set_zn(self.a);
            }
            Op::Ora => {
                let operand = self.fetch_operand(mode);
                self.a |= operand;
                self.set_zn(self.a);
            }
            Op::Eor => {
                let operand = self.fetch_operand(mode);
                self.a ^= operand;
                self.set_zn(self.a);
            }
            Op::Asl => {
                let shifted = (self.fetch_operand(mode) as u16) << 1;
                self.write_back(mode, shifted as u8);
                self.status.set(Status::ZERO, shifted == 0);
                self.status.set(Status::NEGATIVE, shifted & 0x80 != 0);
                self.status.set(Status::CARRY, shifted & 0x100 != 0);
            }
            Op::Lsr => {
                let operand = self.fetch_operand(mode);
                let shifted = operand >> 1;
                self.write_back(mode, shifted);
                self.set_zn(shifted);
                self.status.set(Status::CARRY, operand & 0x01 != 0);
            }
            Op::Rol => {
                let operand = self.fetch_operand(mode);
                let carry_in = self.status.contains(Status::CARRY) as u8;
                self.status.set(Status::CARRY, operand & 0x80 != 0);
                let rotated = (operand << 1) | carry_in;
                self.write_back(mode, rotated);
                self.set_zn(rotated);
            }
            Op::Ror => {
                let operand = self.fetch_operand(mode);
                let carry_in = self.status.contains(Status::CARRY) as u8;
                self.status.set(Status::CARRY, operand & 0x01 != 0);
                let rotated = (operand >> 1) | (carry_in << 7);
                self.write_back(mode, rotated);
                self.set_zn(rotated);
            }
            Op::Bit => {
                let operand = self.fetch_operand(mode);
                self.status.set(Status::ZERO, self.a & operand == 0);
                self.status.set(Status::NEGATIVE, operand & 0x80 != 0);
                self.status.set(Status::OVERFLOW, operand & 0x40 != 0);
            }
            Op::Cmp => {
                let operand = self.fetch_operand(mode);
                self.set_zn(self.a.wrapping_sub(operand));
                self.status.set(Status::CARRY, self.a >= operand);
            }
            Op::Cpx => {
                let operand = self.fetch_operand(mode);
                self.set_zn(self.x.wrapping_sub(operand));
                self.status.set(Status::CARRY, self.x >= operand);
            }
            Op::Cpy => {
                let operand = self.fetch_operand(mode);
                self.set_zn(self.y.wrapping_sub(operand));
                self.status.set(Status::CARRY, self.y >= operand);
            }
            Op::Dec => {
                let value = self.fetch_operand(mode).wrapping_sub(1);
                self.write_back(mode, value);
                self.set_zn(value);
            }
            Op::Inc => {
                let value = self.fetch_operand(mode).wrapping_add(1);
                self.write_back(mode, value);
                self.set_zn(value);
            }
            Op::Lda => {
                self.a = self.fetch_operand(mode);
                self.set_zn(self.a);
            }
            Op::Ldx => {
                self.x = self.fetch_operand(mode);
                self.set_zn(self.x);
            }
            Op::Ldy => {
                self.y = self.fetch_operand(mode);
                self.set_zn(self.y);
            }
            Op::Sta => {
                let a = self.a;
                self.store_operand(mode, a);
            }
            Op::Stx => {
                let x = self.x;
                self.store_operand(mode, x);
            }
            Op::Sty => {
                let y = self.y;
                self.store_operand(mode, y);
            }
            Op::Jmp => {
                self.cycles += 3;
                let target = self.fetch_word();
                if mode == Mode::Indirect {
                    self.pc = self.read_word(target);
                    self.cycles += 2;
                } else {
                    self.pc = target;
                }
            }
            Op::Jsr => {
                self.cycles += 6;
                let target = self.fetch_word();
                self.push_word(self.pc);
                self.pc = target;
            }
            Op::Rts => {
                // No +1: the call sentinel 0x0000 must come back verbatim.
                self.pc = self.pop_word();
                self.cycles += 6;
            }
            Op::Rti => {
                self.status = Status::from_bits_truncate(self.pop());
                self.pc = self.pop_word();
                self.cycles += 6;
            }
            Op::Brk => {
                let pc = self.pc;
                self.push_word(pc);
                let bits = self.status.bits();
                self.push(bits);
                self.status.insert(Status::BREAK);
                self.pc = self.read_word(IRQ_VECTOR);
                self.cycles += 7;
            }
            Op::Bcc => self.branch(!self.status.contains(Status::CARRY)),
            Op::Bcs => self.branch(self.status.contains(Status::CARRY)),
            Op::Bne => self.branch(!self.status.contains(Status::ZERO)),
            Op::Beq => self.branch(self.status.contains(Status::ZERO)),
            Op::Bpl => self.branch(!self.status.contains(Status::NEGATIVE)),
            Op::Bmi => self.branch(self.status.contains(Status::NEGATIVE)),
            Op::Bvc => self.branch(!self.status.contains(Status::OVERFLOW)),
            Op::Bvs => self.branch(self.status.contains(Status::OVERFLOW)),
            Op::Pha => {
                let a = self.a;
                self.push(a);
                self.cycles += 3;
            }
            Op::Php => {
                let bits = self.status.bits();
                self.push(bits);
                self.cycles += 3;
            }
            Op::Pla => {
                self.a = self.pop();
                self.set_zn(self.a);
                self.cycles += 4;
            }
            Op::Plp => {
                self.status = Status::from_bits_truncate(self.pop());
                self.cycles += 4;
            }
            Op::Clc => {
                self.cycles += 2;
                self.status.remove(Status::CARRY);
            }
            Op::Cld => {
                self.cycles += 2;
                self.status.remove(Status::DECIMAL);
            }
            Op::Cli => {
                self.cycles += 2;
                self.status.remove(Status::INTERRUPT);
            }
            Op::Clv => {
                self.cycles += 2;
                self.status.remove(Status::OVERFLOW);
            }
            Op::Sec => {
                self.cycles += 2;
                self.status.insert(Status::CARRY);
            }
            Op::Sed => {
                self.cycles += 2;
                self.status.insert(Status::DECIMAL);
            }
            Op::Sei => {
                self.cycles += 2;
                self.status.insert(Status::INTERRUPT);
            }
            Op::Tax => {
                self.x = self.a;
                self.set_zn(self.x);
                self.cycles += 2;
            }
            Op::Tay => {
                self.y = self.a;
                self.set_zn(self.y);
                self.cycles += 2;
            }
            Op::Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
                self.cycles += 2;
            }
            Op::Txa => {
                self.a = self.x;
                self.set_zn(self.a);
                self.cycles += 2;
            }
            Op::Txs => {
                self.sp = self.x;
                self.cycles += 2;
            }
            Op::Tya => {
                self.a = self.y;
                self.set_zn(self.a);
                self.cycles += 2;
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
                self.cycles += 2;
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
                self.cycles += 2;
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
                self.cycles += 2;
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
                self.cycles += 2;
            }
            Op::Nop => {
                self.cycles += 2;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
//  Tests
// ─────────────────────────────────────────────────────────────────────────────
