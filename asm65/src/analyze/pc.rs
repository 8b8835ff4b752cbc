use indexmap::IndexMap;

enum Saved {
    // pc to restore when the dummy section ends
    Dummy(Option<i64>),
    // physical pc and logical start of a relocated section
    Pseudo {
        physical: Option<i64>,
        start: Option<i64>,
    },
}

/// Program counter across segments, dummy sections and pseudo-pc sections.
pub struct Pc {
    segments: IndexMap<String, Option<i64>>,
    current: String,
    pc: Option<i64>,
    stack: Vec<Saved>,
    origin: i64,
}

impl Pc {
    pub fn new(origin: i64) -> Self {
        Pc {
            segments: IndexMap::new(),
            current: String::new(),
            pc: Some(origin),
            stack: Vec::new(),
            origin,
        }
    }

    pub fn get(&self) -> Option<i64> {
        self.pc
    }

    pub fn segment(&self) -> &str {
        &self.current
    }

    pub fn advance(&mut self, bytes: i64) {
        self.pc = self.pc.map(|pc| pc + bytes);
    }

    pub fn org(&mut self, value: Option<i64>) {
        self.pc = value;
    }

    /// Switch segment, resuming where it left off
    pub fn switch(&mut self, name: &str) {
        if name == self.current {
            return;
        }
        let pc = self.pc;
        self.segments.insert(std::mem::take(&mut self.current), pc);
        self.pc = self.segments.get(name).copied().unwrap_or(Some(self.origin));
        self.current = name.to_string();
    }

    pub fn dummy(&mut self, value: Option<Option<i64>>) {
        self.stack.push(Saved::Dummy(self.pc));
        if let Some(v) = value {
            self.pc = v;
        }
    }

    pub fn pseudo(&mut self, value: Option<i64>) {
        self.stack.push(Saved::Pseudo {
            physical: self.pc,
            start: value,
        });
        self.pc = value;
    }

    pub fn end_dummy(&mut self) {
        if let Some(pos) = self.stack.iter().rposition(|s| matches!(s, Saved::Dummy(_))) {
            if let Some(Saved::Dummy(pc)) = self.stack.drain(pos..).next() {
                self.pc = pc;
            }
        }
    }

    /// Back to the physical pc, advanced by what the section emitted
    pub fn end_pseudo(&mut self) {
        let Some(pos) = self
            .stack
            .iter()
            .rposition(|s| matches!(s, Saved::Pseudo { .. }))
        else {
            return;
        };
        if let Some(Saved::Pseudo { physical, start }) = self.stack.drain(pos..).next() {
            self.pc = match (physical, start, self.pc) {
                (Some(p), Some(s), Some(now)) => Some(p + (now - s)),
                _ => None,
            };
        }
    }

    /// Padding needed to reach the next multiple of `align`
    pub fn pad_to(&self, align: i64) -> i64 {
        match self.pc {
            Some(pc) if align > 0 => (align - pc.rem_euclid(align)) % align,
            _ => 0,
        }
    }

    /// Padding until `pc & mask == value`
    pub fn pad_mask(&self, mask: i64, value: i64) -> i64 {
        let Some(pc) = self.pc else {
            return 0;
        };
        (0..0x10000)
            .find(|k| (pc + k) & mask == value)
            .unwrap_or(0)
    }
}

#[test]
fn test() {
    let mut pc = Pc::new(0x1000);
    pc.advance(3);
    pc.pseudo(Some(0x0400));
    pc.advance(0x10);
    assert_eq!(pc.get(), Some(0x0410));
    pc.end_pseudo();
    assert_eq!(pc.get(), Some(0x1013));

    pc.switch("DATA");
    assert_eq!(pc.get(), Some(0x1000));
    pc.org(Some(0x2000));
    pc.switch("");
    assert_eq!(pc.get(), Some(0x1013));
    pc.switch("DATA");
    assert_eq!(pc.get(), Some(0x2000));
    assert_eq!(pc.segment(), "DATA");

    pc.dummy(Some(Some(0)));
    pc.advance(4);
    pc.end_dummy();
    assert_eq!(pc.get(), Some(0x2000));
    assert_eq!(pc.pad_to(0x100), 0);
    pc.advance(1);
    assert_eq!(pc.pad_to(0x100), 0xFF);
    assert_eq!(pc.pad_mask(0xFF, 0x80), 0x7F);
}
