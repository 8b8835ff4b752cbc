use bimap::BiMap;
use once_cell::sync::Lazy;

use crate::{
    mode::{AddrMode, Form},
    op::Mnemonic,
};

static OPCODE: Lazy<BiMap<(Mnemonic, AddrMode), u8>> = Lazy::new(|| {
    use AddrMode::*;
    use Mnemonic::*;

    let mut map = BiMap::new();
    let mut put = |op: Mnemonic, entries: &[(AddrMode, u8)]| {
        for (mode, code) in entries {
            map.insert((op, *mode), *code);
        }
    };

    // Group one ALU instructions share the same eight modes
    let alu = |imm: u8, zp: u8, zpx: u8, abs: u8, absx: u8, absy: u8, indx: u8, indy: u8, zpind: u8| {
        [
            (Immediate, imm),
            (ZeroPage, zp),
            (ZeroPageX, zpx),
            (Absolute, abs),
            (AbsoluteX, absx),
            (AbsoluteY, absy),
            (IndirectX, indx),
            (IndirectY, indy),
            (ZeroPageIndirect, zpind),
        ]
    };
    put(ADC, &alu(0x69, 0x65, 0x75, 0x6D, 0x7D, 0x79, 0x61, 0x71, 0x72));
    put(AND, &alu(0x29, 0x25, 0x35, 0x2D, 0x3D, 0x39, 0x21, 0x31, 0x32));
    put(CMP, &alu(0xC9, 0xC5, 0xD5, 0xCD, 0xDD, 0xD9, 0xC1, 0xD1, 0xD2));
    put(EOR, &alu(0x49, 0x45, 0x55, 0x4D, 0x5D, 0x59, 0x41, 0x51, 0x52));
    put(LDA, &alu(0xA9, 0xA5, 0xB5, 0xAD, 0xBD, 0xB9, 0xA1, 0xB1, 0xB2));
    put(ORA, &alu(0x09, 0x05, 0x15, 0x0D, 0x1D, 0x19, 0x01, 0x11, 0x12));
    put(SBC, &alu(0xE9, 0xE5, 0xF5, 0xED, 0xFD, 0xF9, 0xE1, 0xF1, 0xF2));
    put(
        STA,
        &[
            (ZeroPage, 0x85),
            (ZeroPageX, 0x95),
            (Absolute, 0x8D),
            (AbsoluteX, 0x9D),
            (AbsoluteY, 0x99),
            (IndirectX, 0x81),
            (IndirectY, 0x91),
            (ZeroPageIndirect, 0x92),
        ],
    );

    // Read-modify-write
    let rmw = |acc: u8, zp: u8, zpx: u8, abs: u8, absx: u8| {
        [
            (Accumulator, acc),
            (ZeroPage, zp),
            (ZeroPageX, zpx),
            (Absolute, abs),
            (AbsoluteX, absx),
        ]
    };
    put(ASL, &rmw(0x0A, 0x06, 0x16, 0x0E, 0x1E));
    put(LSR, &rmw(0x4A, 0x46, 0x56, 0x4E, 0x5E));
    put(ROL, &rmw(0x2A, 0x26, 0x36, 0x2E, 0x3E));
    put(ROR, &rmw(0x6A, 0x66, 0x76, 0x6E, 0x7E));
    put(DEC, &rmw(0x3A, 0xC6, 0xD6, 0xCE, 0xDE));
    put(INC, &rmw(0x1A, 0xE6, 0xF6, 0xEE, 0xFE));

    // Branches
    put(BCC, &[(Relative, 0x90)]);
    put(BCS, &[(Relative, 0xB0)]);
    put(BEQ, &[(Relative, 0xF0)]);
    put(BMI, &[(Relative, 0x30)]);
    put(BNE, &[(Relative, 0xD0)]);
    put(BPL, &[(Relative, 0x10)]);
    put(BRA, &[(Relative, 0x80)]);
    put(BVC, &[(Relative, 0x50)]);
    put(BVS, &[(Relative, 0x70)]);

    put(
        BIT,
        &[
            (Immediate, 0x89),
            (ZeroPage, 0x24),
            (ZeroPageX, 0x34),
            (Absolute, 0x2C),
            (AbsoluteX, 0x3C),
        ],
    );
    put(CPX, &[(Immediate, 0xE0), (ZeroPage, 0xE4), (Absolute, 0xEC)]);
    put(CPY, &[(Immediate, 0xC0), (ZeroPage, 0xC4), (Absolute, 0xCC)]);
    put(JMP, &[(Absolute, 0x4C), (Indirect, 0x6C)]);
    put(JSR, &[(Absolute, 0x20)]);
    put(
        LDX,
        &[
            (Immediate, 0xA2),
            (ZeroPage, 0xA6),
            (ZeroPageY, 0xB6),
            (Absolute, 0xAE),
            (AbsoluteY, 0xBE),
        ],
    );
    put(
        LDY,
        &[
            (Immediate, 0xA0),
            (ZeroPage, 0xA4),
            (ZeroPageX, 0xB4),
            (Absolute, 0xAC),
            (AbsoluteX, 0xBC),
        ],
    );
    put(STX, &[(ZeroPage, 0x86), (ZeroPageY, 0x96), (Absolute, 0x8E)]);
    put(STY, &[(ZeroPage, 0x84), (ZeroPageX, 0x94), (Absolute, 0x8C)]);
    put(
        STZ,
        &[
            (ZeroPage, 0x64),
            (ZeroPageX, 0x74),
            (Absolute, 0x9C),
            (AbsoluteX, 0x9E),
        ],
    );
    put(TRB, &[(ZeroPage, 0x14), (Absolute, 0x1C)]);
    put(TSB, &[(ZeroPage, 0x04), (Absolute, 0x0C)]);

    // Single byte
    for (op, code) in [
        (BRK, 0x00u8),
        (CLC, 0x18),
        (CLD, 0xD8),
        (CLI, 0x58),
        (CLV, 0xB8),
        (DEX, 0xCA),
        (DEY, 0x88),
        (INX, 0xE8),
        (INY, 0xC8),
        (NOP, 0xEA),
        (PHA, 0x48),
        (PHP, 0x08),
        (PHX, 0xDA),
        (PHY, 0x5A),
        (PLA, 0x68),
        (PLP, 0x28),
        (PLX, 0xFA),
        (PLY, 0x7A),
        (RTI, 0x40),
        (RTS, 0x60),
        (SEC, 0x38),
        (SED, 0xF8),
        (SEI, 0x78),
        (TAX, 0xAA),
        (TAY, 0xA8),
        (TSX, 0xBA),
        (TXA, 0x8A),
        (TXS, 0x9A),
        (TYA, 0x98),
    ] {
        put(op, &[(Implied, code)]);
    }
    map
});

pub fn opcode(op: Mnemonic, mode: AddrMode) -> Option<u8> {
    OPCODE.get_by_left(&(op, mode)).copied()
}

pub fn decode(code: u8) -> Option<(Mnemonic, AddrMode)> {
    OPCODE.get_by_right(&code).copied()
}

pub fn supports(op: Mnemonic, mode: AddrMode) -> bool {
    OPCODE.contains_left(&(op, mode))
}

/// Pick the addressing mode for an operand form.
/// `value` is the operand value when it is already known; unknown operands
/// get the absolute form so that later passes can only shrink the instruction.
pub fn select(op: Mnemonic, form: Form, value: Option<i64>) -> Option<AddrMode> {
    let fits = matches!(value, Some(v) if (0..0x100).contains(&v));
    let pick = |zp: AddrMode, abs: AddrMode| -> Option<AddrMode> {
        if fits && supports(op, zp) {
            Some(zp)
        } else if supports(op, abs) {
            Some(abs)
        } else if supports(op, zp) {
            Some(zp)
        } else {
            None
        }
    };

    let mode = match form {
        Form::Implied => {
            if supports(op, AddrMode::Implied) {
                Some(AddrMode::Implied)
            } else if supports(op, AddrMode::Accumulator) {
                Some(AddrMode::Accumulator)
            } else {
                None
            }
        }
        Form::Accumulator => Some(AddrMode::Accumulator),
        Form::Immediate => Some(AddrMode::Immediate),
        Form::Direct if op.is_branch() => Some(AddrMode::Relative),
        Form::Direct => pick(AddrMode::ZeroPage, AddrMode::Absolute),
        Form::DirectX => pick(AddrMode::ZeroPageX, AddrMode::AbsoluteX),
        Form::DirectY => pick(AddrMode::ZeroPageY, AddrMode::AbsoluteY),
        Form::Indirect => {
            if supports(op, AddrMode::Indirect) {
                Some(AddrMode::Indirect)
            } else {
                Some(AddrMode::ZeroPageIndirect)
            }
        }
        Form::IndirectX => Some(AddrMode::IndirectX),
        Form::IndirectY => Some(AddrMode::IndirectY),
    }?;
    supports(op, mode).then_some(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes() {
        assert_eq!(opcode(Mnemonic::LDA, AddrMode::Immediate), Some(0xA9));
        assert_eq!(opcode(Mnemonic::JMP, AddrMode::Indirect), Some(0x6C));
        assert_eq!(decode(0x60), Some((Mnemonic::RTS, AddrMode::Implied)));
        assert_eq!(opcode(Mnemonic::STA, AddrMode::Immediate), None);
    }

    #[test]
    fn selection() {
        let lda = Mnemonic::LDA;
        assert_eq!(select(lda, Form::Direct, Some(0xFB)), Some(AddrMode::ZeroPage));
        assert_eq!(select(lda, Form::Direct, Some(0x1234)), Some(AddrMode::Absolute));
        assert_eq!(select(lda, Form::Direct, None), Some(AddrMode::Absolute));
        assert_eq!(select(Mnemonic::LDX, Form::DirectY, Some(2)), Some(AddrMode::ZeroPageY));
        assert_eq!(select(Mnemonic::BNE, Form::Direct, None), Some(AddrMode::Relative));
        assert_eq!(select(Mnemonic::ASL, Form::Implied, None), Some(AddrMode::Accumulator));
        assert_eq!(select(Mnemonic::STA, Form::Immediate, None), None);
        assert_eq!(select(Mnemonic::STX, Form::DirectX, Some(2)), None);
    }
}
