use asm65::dialect::{get_dialect, DialectId, DialectId::*};
use asm65::eval::{eval, ConstContext};
use asm65::grammer::{parse_expression, tokenize};

fn assert(code: &str, dialect: DialectId, expect: i64) {
    let dialect = get_dialect(dialect);
    let tokens = tokenize(code, dialect).tokens;

    println!(" {code}");
    for (idx, token) in tokens.iter().enumerate() {
        println!("{:>2}: {:?}", idx, token.kind);
    }

    let (expr, rest) = parse_expression(&tokens, dialect).unwrap();
    assert!(rest.is_empty(), "unparsed: {:?}", rest);
    assert_eq!(eval(&expr, dialect, &mut ConstContext), Ok(expect));
}

macro_rules! case {
    ($name:ident, $code:expr, $dialect:expr, $expect:expr) => {
        #[test]
        fn $name() {
            assert($code, $dialect, $expect);
        }
    };
}

// ---- Precedence ----
case!(acme_mul_binds_tighter, "1+2*3", Acme, 7);
case!(ca65_mul_binds_tighter, "1+2*3", Ca65, 7);
case!(merlin_left_to_right, "1+2*3", Merlin, 9);
case!(dasm_brackets_group, "[1+2]*3", Dasm, 9);
case!(acme_parens_group, "(1+2)*3", Acme, 9);

// ---- Associativity ----
case!(acme_power_right_assoc, "2^3^2", Acme, 512);
case!(tass64_power, "2**10", Tass64, 1024);
case!(acme_sub_left_assoc, "10-4-3", Acme, 3);

// ---- Dialect-specific operators ----
case!(ca65_not, ".not. 1", Ca65, 0);
case!(ca65_caret_is_xor, "2 ^ 3", Ca65, 1);
case!(acme_lo_byte, "<$1234", Acme, 0x34);
case!(acme_hi_byte, ">$1234", Acme, 0x12);

// ---- Literals ----
case!(hex_literal, "$ff", Acme, 255);
case!(binary_literal, "%1010", Ca65, 10);
case!(char_literal, "'a'", Ca65, 97);

// ---- Functions ----
case!(kick_max, "max(1, 5)", Kick, 5);
