// 6502 opcode dispatch table.
//
// One 256-entry table of {operation, addressing mode} records keeps the
// decode association atomic: every opcode byte maps to exactly one pair.
// Undocumented opcodes decode to an implied NOP so stray bytes in a tune
// never abort playback.

/// The 56 documented 6502 operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

/// The 13 addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Immediate,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Indirect,
    IndirectX,
    IndirectY,
    Accumulator,
    Relative,
}

/// Decoded opcode: what to do and how to reach the operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr {
    pub op: Op,
    pub mode: Mode,
}

const fn i(op: Op, mode: Mode) -> Instr {
    Instr { op, mode }
}

use Mode::*;
use Op::*;

/// Undocumented opcode slot.
const XXX: Instr = i(Nop, Implied);

#[rustfmt::skip]
pub static INSTRUCTIONS: [Instr; 256] = [
    // 0x00
    i(Brk, Implied),   i(Ora, IndirectX), XXX, XXX,
    XXX,               i(Ora, ZeroPage),  i(Asl, ZeroPage),  XXX,
    i(Php, Implied),   i(Ora, Immediate), i(Asl, Accumulator), XXX,
    XXX,               i(Ora, Absolute),  i(Asl, Absolute),  XXX,
    // 0x10
    i(Bpl, Relative),  i(Ora, IndirectY), XXX, XXX,
    XXX,               i(Ora, ZeroPageX), i(Asl, ZeroPageX), XXX,
    i(Clc, Implied),   i(Ora, AbsoluteY), XXX, XXX,
    XXX,               i(Ora, AbsoluteX), i(Asl, AbsoluteX), XXX,
    // 0x20
    i(Jsr, Absolute),  i(And, IndirectX), XXX, XXX,
    i(Bit, ZeroPage),  i(And, ZeroPage),  i(Rol, ZeroPage),  XXX,
    i(Plp, Implied),   i(And, Immediate), i(Rol, Accumulator), XXX,
    i(Bit, Absolute),  i(And, Absolute),  i(Rol, Absolute),  XXX,
    // 0x30
    i(Bmi, Relative),  i(And, IndirectY), XXX, XXX,
    XXX,               i(And, ZeroPageX), i(Rol, ZeroPageX), XXX,
    i(Sec, Implied),   i(And, AbsoluteY), XXX, XXX,
    XXX,               i(And, AbsoluteX), i(Rol, AbsoluteX), XXX,
    // 0x40
    i(Rti, Implied),   i(Eor, IndirectX), XXX, XXX,
    XXX,               i(Eor, ZeroPage),  i(Lsr, ZeroPage),  XXX,
    i(Pha, Implied),   i(Eor, Immediate), i(Lsr, Accumulator), XXX,
    i(Jmp, Absolute),  i(Eor, Absolute),  i(Lsr, Absolute),  XXX,
    // 0x50
    i(Bvc, Relative),  i(Eor, IndirectY), XXX, XXX,
    XXX,               i(Eor, ZeroPageX), i(Lsr, ZeroPageX), XXX,
    i(Cli, Implied),   i(Eor, AbsoluteY), XXX, XXX,
    XXX,               i(Eor, AbsoluteX), i(Lsr, AbsoluteX), XXX,
    // 0x60
    i(Rts, Implied),   i(Adc, IndirectX), XXX, XXX,
    XXX,               i(Adc, ZeroPage),  i(Ror, ZeroPage),  XXX,
    i(Pla, Implied),   i(Adc, Immediate), i(Ror, Accumulator), XXX,
    i(Jmp, Indirect),  i(Adc, Absolute),  i(Ror, Absolute),  XXX,
    // 0x70
    i(Bvs, Relative),  i(Adc, IndirectY), XXX, XXX,
    XXX,               i(Adc, ZeroPageX), i(Ror, ZeroPageX), XXX,
    i(Sei, Implied),   i(Adc, AbsoluteY), XXX, XXX,
    XXX,               i(Adc, AbsoluteX), i(Ror, AbsoluteX), XXX,
    // 0x80
    XXX,               i(Sta, IndirectX), XXX, XXX,
    i(Sty, ZeroPage),  i(Sta, ZeroPage),  i(Stx, ZeroPage),  XXX,
    i(Dey, Implied),   XXX,               i(Txa, Implied),   XXX,
    i(Sty, Absolute),  i(Sta, Absolute),  i(Stx, Absolute),  XXX,
    // 0x90
    i(Bcc, Relative),  i(Sta, IndirectY), XXX, XXX,
    i(Sty, ZeroPageX), i(Sta, ZeroPageX), i(Stx, ZeroPageY), XXX,
    i(Tya, Implied),   i(Sta, AbsoluteY), i(Txs, Implied),   XXX,
    XXX,               i(Sta, AbsoluteX), XXX,               XXX,
    // 0xA0
    i(Ldy, Immediate), i(Lda, IndirectX), i(Ldx, Immediate), XXX,
    i(Ldy, ZeroPage),  i(Lda, ZeroPage),  i(Ldx, ZeroPage),  XXX,
    i(Tay, Implied),   i(Lda, Immediate), i(Tax, Implied),   XXX,
    i(Ldy, Absolute),  i(Lda, Absolute),  i(Ldx, Absolute),  XXX,
    // 0xB0
    i(Bcs, Relative),  i(Lda, IndirectY), XXX, XXX,
    i(Ldy, ZeroPageX), i(Lda, ZeroPageX), i(Ldx, ZeroPageY), XXX,
    i(Clv, Implied),   i(Lda, AbsoluteY), i(Tsx, Implied),   XXX,
    i(Ldy, AbsoluteX), i(Lda, AbsoluteX), i(Ldx, AbsoluteY), XXX,
    // 0xC0
    i(Cpy, Immediate), i(Cmp, IndirectX), XXX, XXX,
    i(Cpy, ZeroPage),  i(Cmp, ZeroPage),  i(Dec, ZeroPage),  XXX,
    i(Iny, Implied),   i(Cmp, Immediate), i(Dex, Implied),   XXX,
    i(Cpy, Absolute),  i(Cmp, Absolute),  i(Dec, Absolute),  XXX,
    // 0xD0
    i(Bne, Relative),  i(Cmp, IndirectY), XXX, XXX,
    XXX,               i(Cmp, ZeroPageX), i(Dec, ZeroPageX), XXX,
    i(Cld, Implied),   i(Cmp, AbsoluteY), XXX, XXX,
    XXX,               i(Cmp, AbsoluteX), i(Dec, AbsoluteX), XXX,
    // 0xE0
    i(Cpx, Immediate), i(Sbc, IndirectX), XXX, XXX,
    i(Cpx, ZeroPage),  i(Sbc, ZeroPage),  i(Inc, ZeroPage),  XXX,
    i(Inx, Implied),   i(Sbc, Immediate), i(Nop, Implied),   XXX,
    i(Cpx, Absolute),  i(Sbc, Absolute),  i(Inc, Absolute),  XXX,
    // 0xF0
    i(Beq, Relative),  i(Sbc, IndirectY), XXX, XXX,
    XXX,               i(Sbc, ZeroPageX), i(Inc, ZeroPageX), XXX,
    i(Sed, Implied),   i(Sbc, AbsoluteY), XXX, XXX,
    XXX,               i(Sbc, AbsoluteX), i(Inc, AbsoluteX), XXX,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_spot_checks() {
        assert_eq!(INSTRUCTIONS[0x00], i(Brk, Implied));
        assert_eq!(INSTRUCTIONS[0x20], i(Jsr, Absolute));
        assert_eq!(INSTRUCTIONS[0x60], i(Rts, Implied));
        assert_eq!(INSTRUCTIONS[0x6C], i(Jmp, Indirect));
        assert_eq!(INSTRUCTIONS[0x8D], i(Sta, Absolute));
        assert_eq!(INSTRUCTIONS[0x91], i(Sta, IndirectY));
        assert_eq!(INSTRUCTIONS[0xA9], i(Lda, Immediate));
        assert_eq!(INSTRUCTIONS[0xBE], i(Ldx, AbsoluteY));
        assert_eq!(INSTRUCTIONS[0xD0], i(Bne, Relative));
        assert_eq!(INSTRUCTIONS[0xEA], i(Nop, Implied));
    }

    #[test]
    fn test_undocumented_opcodes_decode_to_nop() {
        // A few well-known illegal slots: they must be harmless.
        for opcode in [0x02u8, 0x03, 0x42, 0x7F, 0x9C, 0xFF] {
            assert_eq!(INSTRUCTIONS[opcode as usize], i(Nop, Implied));
        }
    }

    #[test]
    fn test_branches_are_relative() {
        for opcode in [0x10u8, 0x30, 0x50, 0x70, 0x90, 0xB0, 0xD0, 0xF0] {
            assert_eq!(INSTRUCTIONS[opcode as usize].mode, Relative);
        }
    }
}
