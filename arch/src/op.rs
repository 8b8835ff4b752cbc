use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mnemonic {
    ADC,
    AND,
    ASL,
    BCC,
    BCS,
    BEQ,
    BIT,
    BMI,
    BNE,
    BPL,
    BRA,
    BRK,
    BVC,
    BVS,
    CLC,
    CLD,
    CLI,
    CLV,
    CMP,
    CPX,
    CPY,
    DEC,
    DEX,
    DEY,
    EOR,
    INC,
    INX,
    INY,
    JMP,
    JSR,
    LDA,
    LDX,
    LDY,
    LSR,
    NOP,
    ORA,
    PHA,
    PHP,
    PHX,
    PHY,
    PLA,
    PLP,
    PLX,
    PLY,
    ROL,
    ROR,
    RTI,
    RTS,
    SBC,
    SEC,
    SED,
    SEI,
    STA,
    STX,
    STY,
    STZ,
    TAX,
    TAY,
    TRB,
    TSB,
    TSX,
    TXA,
    TXS,
    TYA,
}

impl Mnemonic {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<Self>().ok()
    }

    /// Relative branches take a signed 8-bit displacement from the next instruction.
    pub fn is_branch(&self) -> bool {
        use Mnemonic::*;
        matches!(self, BCC | BCS | BEQ | BMI | BNE | BPL | BRA | BVC | BVS)
    }

    pub fn description(&self) -> &'static str {
        DESCRIPTION.get(self).copied().unwrap_or("")
    }
}

static DESCRIPTION: Lazy<HashMap<Mnemonic, &'static str>> = Lazy::new(|| {
    use Mnemonic::*;
    let mut map = HashMap::new();
    map.insert(ADC, "Add memory to accumulator with carry");
    map.insert(AND, "AND memory with accumulator");
    map.insert(ASL, "Shift one bit left");
    map.insert(BCC, "Branch on carry clear");
    map.insert(BCS, "Branch on carry set");
    map.insert(BEQ, "Branch on result zero");
    map.insert(BIT, "Test bits in memory with accumulator");
    map.insert(BMI, "Branch on result minus");
    map.insert(BNE, "Branch on result not zero");
    map.insert(BPL, "Branch on result plus");
    map.insert(BRA, "Branch always (65C02)");
    map.insert(BRK, "Force break");
    map.insert(BVC, "Branch on overflow clear");
    map.insert(BVS, "Branch on overflow set");
    map.insert(CLC, "Clear carry flag");
    map.insert(CLD, "Clear decimal mode");
    map.insert(CLI, "Clear interrupt disable bit");
    map.insert(CLV, "Clear overflow flag");
    map.insert(CMP, "Compare memory with accumulator");
    map.insert(CPX, "Compare memory and index X");
    map.insert(CPY, "Compare memory and index Y");
    map.insert(DEC, "Decrement by one");
    map.insert(DEX, "Decrement index X by one");
    map.insert(DEY, "Decrement index Y by one");
    map.insert(EOR, "Exclusive-OR memory with accumulator");
    map.insert(INC, "Increment by one");
    map.insert(INX, "Increment index X by one");
    map.insert(INY, "Increment index Y by one");
    map.insert(JMP, "Jump to new location");
    map.insert(JSR, "Jump to subroutine");
    map.insert(LDA, "Load accumulator with memory");
    map.insert(LDX, "Load index X with memory");
    map.insert(LDY, "Load index Y with memory");
    map.insert(LSR, "Shift one bit right");
    map.insert(NOP, "No operation");
    map.insert(ORA, "OR memory with accumulator");
    map.insert(PHA, "Push accumulator on stack");
    map.insert(PHP, "Push processor status on stack");
    map.insert(PHX, "Push index X on stack (65C02)");
    map.insert(PHY, "Push index Y on stack (65C02)");
    map.insert(PLA, "Pull accumulator from stack");
    map.insert(PLP, "Pull processor status from stack");
    map.insert(PLX, "Pull index X from stack (65C02)");
    map.insert(PLY, "Pull index Y from stack (65C02)");
    map.insert(ROL, "Rotate one bit left");
    map.insert(ROR, "Rotate one bit right");
    map.insert(RTI, "Return from interrupt");
    map.insert(RTS, "Return from subroutine");
    map.insert(SBC, "Subtract memory from accumulator with borrow");
    map.insert(SEC, "Set carry flag");
    map.insert(SED, "Set decimal flag");
    map.insert(SEI, "Set interrupt disable status");
    map.insert(STA, "Store accumulator in memory");
    map.insert(STX, "Store index X in memory");
    map.insert(STY, "Store index Y in memory");
    map.insert(STZ, "Store zero in memory (65C02)");
    map.insert(TAX, "Transfer accumulator to index X");
    map.insert(TAY, "Transfer accumulator to index Y");
    map.insert(TRB, "Test and reset bits (65C02)");
    map.insert(TSB, "Test and set bits (65C02)");
    map.insert(TSX, "Transfer stack pointer to index X");
    map.insert(TXA, "Transfer index X to accumulator");
    map.insert(TXS, "Transfer index X to stack register");
    map.insert(TYA, "Transfer index Y to accumulator");
    map
});

#[test]
fn test() {
    assert_eq!(Mnemonic::parse("lda"), Some(Mnemonic::LDA));
    assert_eq!(Mnemonic::parse("LdA"), Some(Mnemonic::LDA));
    assert_eq!(Mnemonic::parse("hoge"), None);
    assert_eq!(Mnemonic::BNE.to_string(), "bne");
    assert!(Mnemonic::BRA.is_branch());
    assert!(!Mnemonic::JMP.is_branch());
}
