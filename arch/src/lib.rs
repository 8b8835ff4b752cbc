pub mod inst;
pub mod mode;
pub mod op;

pub use inst::{decode, opcode, select, supports};
pub use mode::{AddrMode, Form};
pub use op::Mnemonic;
