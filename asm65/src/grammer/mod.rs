pub mod ast;
pub mod expr;
pub mod file;
pub mod lexer;
pub mod parsercore;
pub mod stmt;
pub mod token;

pub use expr::parse_expression;
pub use file::{parse_file, parse_lines, Block, ParsedFile};
pub use lexer::tokenize;
pub use stmt::parse_statement;
