use crate::dialect::DialectConfig;
use crate::error::Error;
use crate::grammer::ast::MacroParam;
use crate::grammer::token::FileId;

pub const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub struct MacroDef {
    pub name: String,
    pub params: Vec<MacroParam>,
    pub body: Vec<String>,
    pub file: FileId,
    // Source line of the first body line
    pub line: usize,
}

impl MacroDef {
    /// Body lines with the formals replaced by `args`.
    ///
    /// Named formals match whole identifiers, `\name` and `\n` work in every
    /// dialect, `{n}` and `]n` are the positional forms of DASM and Merlin.
    /// Text inside string literals is left alone.
    pub fn expand(&self, args: &[String], dialect: &DialectConfig) -> Result<Vec<String>, Error> {
        if !self.params.is_empty() && args.len() > self.params.len() {
            return Err(Error::ArgumentCount(
                self.name.clone(),
                self.params.len().to_string(),
            ));
        }
        let bound: Vec<(String, String)> = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let value = args
                    .get(i)
                    .filter(|a| !a.is_empty())
                    .cloned()
                    .or_else(|| p.default.clone())
                    .unwrap_or_default();
                (dialect.fold(&p.name), value)
            })
            .collect();
        let mut by_len = bound.clone();
        by_len.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));

        let subst = Subst {
            dialect,
            args,
            named: &by_len,
        };
        Ok(self.body.iter().map(|line| subst.line(line)).collect())
    }
}

struct Subst<'a> {
    dialect: &'a DialectConfig,
    args: &'a [String],
    named: &'a [(String, String)],
}

impl<'a> Subst<'a> {
    fn positional(&self, n: usize) -> &str {
        n.checked_sub(1)
            .and_then(|i| self.args.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn named(&self, chars: &[char], at: usize) -> Option<(&str, usize)> {
        let lex = &self.dialect.lex;
        if at > 0 && lex.is_symbol_char(chars[at - 1]) {
            return None;
        }
        self.named.iter().find_map(|(name, value)| {
            let len = name.chars().count();
            let end = at + len;
            if end > chars.len() {
                return None;
            }
            let word: String = chars[at..end].iter().collect();
            let boundary = chars.get(end).map_or(true, |c| !lex.is_symbol_char(*c));
            (boundary && self.dialect.fold(&word) == *name).then_some((value.as_str(), len))
        })
    }

    fn line(&self, line: &str) -> String {
        let chars: Vec<char> = line.chars().collect();
        let digits = |from: usize| {
            let len = chars[from..].iter().take_while(|c| c.is_ascii_digit()).count();
            let n: String = chars[from..from + len].iter().collect();
            (n.parse::<usize>().ok(), len)
        };

        let mut out = String::with_capacity(line.len());
        let mut quote: Option<char> = None;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if let Some(q) = quote {
                out.push(c);
                if c == q {
                    quote = None;
                }
                i += 1;
                continue;
            }
            if self.dialect.lex.quotes.contains(c) {
                quote = Some(c);
                out.push(c);
                i += 1;
                continue;
            }

            match c {
                '\\' if i + 1 < chars.len() => {
                    if let (Some(n), len) = digits(i + 1) {
                        out.push_str(self.positional(n));
                        i += 1 + len;
                        continue;
                    }
                    if let Some((value, len)) = self.named(&chars, i + 1) {
                        out.push_str(value);
                        i += 1 + len;
                        continue;
                    }
                }
                '{' => {
                    if let (Some(n), len) = digits(i + 1) {
                        if chars.get(i + 1 + len) == Some(&'}') {
                            out.push_str(self.positional(n));
                            i += len + 2;
                            continue;
                        }
                    }
                }
                ']' if self.named.is_empty() => {
                    if let (Some(n), len) = digits(i + 1) {
                        out.push_str(self.positional(n));
                        i += 1 + len;
                        continue;
                    }
                }
                _ => {}
            }
            if let Some((value, len)) = self.named(&chars, i) {
                out.push_str(value);
                i += len;
                continue;
            }
            out.push(c);
            i += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get_dialect, DialectId};

    fn def(params: &[&str], body: &[&str]) -> MacroDef {
        MacroDef {
            name: "m".into(),
            params: params
                .iter()
                .map(|p| MacroParam {
                    name: p.to_string(),
                    default: None,
                })
                .collect(),
            body: body.iter().map(|l| l.to_string()).collect(),
            file: 0,
            line: 1,
        }
    }

    #[test]
    fn test() {
        let args = vec!["$fb".to_string(), "2".to_string()];
        let m = def(&["addr", "n"], &["  lda addr+n", "  sta addrx ; \"addr\""]);
        assert_eq!(
            m.expand(&args, get_dialect(DialectId::Ca65)).unwrap(),
            vec!["  lda $fb+2", "  sta addrx ; \"addr\""]
        );

        let m = def(&[], &["  lda {1}", "  ldx {2}"]);
        assert_eq!(
            m.expand(&args, get_dialect(DialectId::Dasm)).unwrap(),
            vec!["  lda $fb", "  ldx 2"]
        );

        let m = def(&[], &[" LDA ]1", " STA \\2"]);
        assert_eq!(
            m.expand(&args, get_dialect(DialectId::Merlin)).unwrap(),
            vec![" LDA $fb", " STA 2"]
        );

        let m = def(&["a"], &["  nop"]);
        assert!(matches!(
            m.expand(&args, get_dialect(DialectId::Acme)),
            Err(Error::ArgumentCount(..))
        ));
    }
}
