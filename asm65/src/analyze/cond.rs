use crate::grammer::ast::{Stmt, StmtKind};

/// One arm of an if-chain: the heading statement and the body after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arm {
    pub head: usize,
    pub body: (usize, usize),
}

/// Index just past the block opened at `idx`, or the end of `stmts` for a
/// block that was never closed.
pub fn block_end(stmts: &[Stmt], idx: usize) -> usize {
    stmts[idx].end.unwrap_or(stmts.len()).min(stmts.len())
}

/// Split the if-chain opened at `start` into its arms. Nested blocks are
/// skipped whole, so their `else` branches do not split this chain.
pub fn arms(stmts: &[Stmt], start: usize) -> Vec<Arm> {
    let end = block_end(stmts, start);
    let mut heads = vec![start];
    let mut i = start + 1;
    while i < end {
        if let Some(e) = stmts[i].end.filter(|e| *e > i) {
            i = e + 1;
            continue;
        }
        if matches!(stmts[i].kind, StmtKind::ElseIf(_) | StmtKind::Else) {
            heads.push(i);
        }
        i += 1;
    }
    heads
        .iter()
        .enumerate()
        .map(|(n, &head)| Arm {
            head,
            body: (head + 1, heads.get(n + 1).copied().unwrap_or(end)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get_dialect, DialectId};
    use crate::grammer::parse_file;

    #[test]
    fn test() {
        let src = "\
.if 1
  .if 0
    nop
  .else
    brk
  .endif
.elseif 2
  nop
.else
  rts
.endif
";
        let parsed = parse_file(0, src, get_dialect(DialectId::Ca65));
        let arms = arms(&parsed.stmts, 0);
        let heads: Vec<usize> = arms.iter().map(|a| a.head).collect();
        assert_eq!(heads, vec![0, 6, 8]);
        assert_eq!(arms[0].body, (1, 6));
        assert_eq!(arms[2].body, (9, 10));
    }
}
