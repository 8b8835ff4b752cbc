use crate::dialect::AnonStyle;
use crate::grammer::token::{AnonMark, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnonDef {
    // Statement order within the pass
    pub seq: usize,
    pub mark: AnonMark,
    pub value: Option<i64>,
    pub span: Span,
}

/// Anonymous labels of one unit.
///
/// Backward references look at definitions made so far in this pass.
/// Forward references look at the previous pass, where everything after
/// the reference has already been seen.
#[derive(Debug, Clone)]
pub struct AnonTable {
    style: AnonStyle,
    current: Vec<AnonDef>,
    previous: Vec<AnonDef>,
}

impl AnonTable {
    pub fn new(style: AnonStyle) -> Self {
        AnonTable {
            style,
            current: Vec::new(),
            previous: Vec::new(),
        }
    }

    pub fn begin_pass(&mut self) {
        self.previous = std::mem::take(&mut self.current);
    }

    pub fn define(&mut self, seq: usize, mark: AnonMark, value: Option<i64>, span: Span) {
        self.current.push(AnonDef {
            seq,
            mark,
            value,
            span,
        });
    }

    pub fn defs(&self) -> &[AnonDef] {
        &self.current
    }

    fn matches(&self, def: &AnonDef, mark: AnonMark) -> bool {
        match self.style {
            AnonStyle::Runs => def.mark == mark,
            _ => def.mark.sign.is_none(),
        }
    }

    // Runs match one definition exactly, the other styles count outward
    fn nth(&self, mark: AnonMark) -> usize {
        match self.style {
            AnonStyle::Runs => 0,
            _ => mark.count.saturating_sub(1),
        }
    }

    /// Definition a reference at `seq` refers to
    pub fn resolve(&self, seq: usize, mark: AnonMark) -> Option<&AnonDef> {
        match mark.sign {
            Some('-') => self
                .current
                .iter()
                .rev()
                .filter(|d| d.seq <= seq && self.matches(d, mark))
                .nth(self.nth(mark)),
            Some('+') => self
                .previous
                .iter()
                .filter(|d| d.seq > seq && self.matches(d, mark))
                .nth(self.nth(mark)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(sign: Option<char>, count: usize) -> AnonMark {
        AnonMark { sign, count }
    }

    #[test]
    fn test() {
        let span = Span::default();
        let mut runs = AnonTable::new(AnonStyle::Runs);
        runs.define(1, mark(Some('-'), 1), Some(0x1000), span);
        runs.define(5, mark(Some('+'), 1), Some(0x1010), span);
        runs.begin_pass();
        runs.define(1, mark(Some('-'), 1), Some(0x1000), span);
        assert_eq!(runs.resolve(3, mark(Some('-'), 1)).map(|d| d.value), Some(Some(0x1000)));
        assert_eq!(runs.resolve(3, mark(Some('+'), 1)).map(|d| d.value), Some(Some(0x1010)));
        assert_eq!(runs.resolve(3, mark(Some('-'), 2)), None);

        let mut colon = AnonTable::new(AnonStyle::Colon);
        colon.begin_pass();
        colon.define(1, mark(None, 1), Some(0x10), span);
        colon.define(2, mark(None, 1), Some(0x20), span);
        assert_eq!(colon.resolve(3, mark(Some('-'), 1)).map(|d| d.value), Some(Some(0x20)));
        assert_eq!(colon.resolve(3, mark(Some('-'), 2)).map(|d| d.value), Some(Some(0x10)));
    }
}
