//! The format machine
//!
//! A format representation is a short template over unit letters,
//! separators, and designators: `YYYY-MM-DD`, `hh:mm:ss±hh:mm`,
//! `Pnn̲Ynn̲Mnn̲DTnn̲Hnn̲Mnn̲S`. [`FormatReprParser`] compiles a template into a
//! list of micro-ops (fops); [`Format`] executes the ops in either
//! direction — writing a [`TimeRep`] out as a string, or reading a string
//! into a [`TimeRep`] through a stack machine driven by the merge rules.
//!
//! # Template notation
//!
//! A run of the same unit letter gives the element's digit width. A
//! combining low line (U+0332) after the last letter — or the ASCII
//! spelling `_X` — lifts the upper bound: `nn̲` means "one digit or more".
//! `±` before the first letter marks the element signed. `,` or `.` after
//! the last letter introduces a fractional digit group in the same
//! notation.
//!
//! # Reading
//!
//! Reading is lenient about literals: a separator or designator that does
//! not match simply does not consume anything, which is what lets one
//! format read both the basic and extended images, and a full-accuracy
//! format read a reduced-accuracy prefix. Elements push units onto a
//! stack; after every push the top two entries are merged when the algebra
//! defines a merge. Whatever remains at the end is merged bottom-up;
//! residue that will not merge is an error.

use crate::error::FormatError;
use crate::merge::{merge, merge_residual, Component};
use crate::regex_cache;
use crate::syntax::{self, DesignatorTarget, SyntaxClass};
use crate::timerep::{
    Date, DateTime, Duration, IntervalPart, RecurringTimeInterval, Time, TimeDuration,
    TimeInterval, TimeRep, UTCOffset,
};
use crate::units::{Fraction, TimeUnit, UnitKind};

/// Digit-width bounds of an element or fraction group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Width {
    /// Minimum number of digits
    pub min: usize,
    /// Maximum number of digits; `None` is unbounded
    pub max: Option<usize>,
}

/// An element op: reads or writes one unit's digits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    /// The unit kind this element carries
    pub kind: UnitKind,
    /// Integer digit widths
    pub width: Width,
    /// Whether a sign is written/required
    pub signed: bool,
    /// Fractional digit widths, if the element takes a fraction
    pub frac: Option<Width>,
}

/// A format micro-op
#[derive(Debug, Clone, PartialEq)]
pub enum Fop {
    /// A designator covering a region of ops (`P`, `T` of a date-time, `R`)
    ///
    /// Written only when some element inside `idx..region_end` is written.
    Designator {
        /// The literal character
        lit: String,
        /// Exclusive end of the op region this designator covers
        region_end: usize,
    },
    /// A marker tied to the next element (`W` of a week date)
    Marker {
        /// The literal character
        lit: String,
    },
    /// An element separator
    Separator {
        /// The literal character
        lit: String,
        /// Soft separators punctuate; hard ones also block merging
        soft: bool,
    },
    /// A postfix coercion: retypes the element before it
    Coerce {
        /// The literal character
        lit: String,
        /// The kind the element is retyped to
        kind: UnitKind,
    },
    /// The UTC designator `Z`
    Utc,
    /// A digit element
    Element(ElementSpec),
}

/// Compiler from a format representation to a fop list
///
/// Keeps a stack of syntax classes. Designators may push a nested syntax;
/// separators pop back to the level they belong to; unit letters are
/// interpreted in the syntax on top.
pub struct FormatReprParser {
    chars: Vec<char>,
    pos: usize,
    stack: Vec<SyntaxClass>,
    /// op index of each open syntax-pushing designator, aligned with
    /// `stack[1..]`
    open: Vec<usize>,
    ops: Vec<Fop>,
}

impl FormatReprParser {
    /// Create a compiler for a template interpreted under `root`
    pub fn new(root: SyntaxClass, repr: &str) -> Self {
        Self {
            chars: normalize_repr(repr),
            pos: 0,
            stack: vec![root],
            open: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Compile the template into its op list
    pub fn parse(mut self) -> Result<Vec<Fop>, FormatError> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if self.designator(ch) || self.separator(ch) {
                self.pos += 1;
                continue;
            }
            self.element(ch)?;
        }
        // Any syntax still open extends to the end of the op list.
        let end = self.ops.len();
        for idx in self.open.drain(..) {
            if let Fop::Designator { region_end, .. } = &mut self.ops[idx] {
                *region_end = end;
            }
        }
        for op in &mut self.ops {
            if let Fop::Designator { region_end, .. } = op {
                if *region_end == usize::MAX {
                    *region_end = end;
                }
            }
        }
        Ok(self.ops)
    }

    fn top(&self) -> SyntaxClass {
        *self.stack.last().unwrap_or(&SyntaxClass::RecurringTimeInterval)
    }

    /// Match a designator in the current syntax, possibly pushing a new one
    fn designator(&mut self, ch: char) -> bool {
        let target = match syntax::designator(self.top(), ch) {
            Some(t) => t,
            None => return false,
        };
        match target {
            // R designates the whole representation, not the next element.
            DesignatorTarget::Marker if ch == 'R' => self.ops.push(Fop::Designator {
                lit: ch.to_string(),
                region_end: usize::MAX,
            }),
            DesignatorTarget::Marker => self.ops.push(Fop::Marker {
                lit: ch.to_string(),
            }),
            DesignatorTarget::Syntax(cls) => {
                self.open.push(self.ops.len());
                self.stack.push(cls);
                self.ops.push(Fop::Designator {
                    lit: ch.to_string(),
                    region_end: usize::MAX,
                });
            }
            DesignatorTarget::Coerce(kind) => {
                // Back-propagate the concrete kind onto the untyped digits.
                if let Some(Fop::Element(spec)) = self
                    .ops
                    .iter_mut()
                    .rev()
                    .find(|op| matches!(op, Fop::Element(_)))
                {
                    if spec.kind == UnitKind::Number {
                        spec.kind = kind;
                    }
                }
                self.ops.push(Fop::Coerce {
                    lit: ch.to_string(),
                    kind,
                });
            }
            DesignatorTarget::Utc => self.ops.push(Fop::Utc),
        }
        true
    }

    /// Match a separator at any open syntax level, popping back to it
    fn separator(&mut self, ch: char) -> bool {
        for level in 0..self.stack.len() {
            let cls = self.stack[self.stack.len() - 1 - level];
            if let Some(soft) = syntax::separator(cls, ch) {
                let here = self.ops.len();
                for _ in 0..level {
                    self.stack.pop();
                    if let Some(idx) = self.open.pop() {
                        if let Fop::Designator { region_end, .. } = &mut self.ops[idx] {
                            *region_end = here;
                        }
                    }
                }
                self.ops.push(Fop::Separator {
                    lit: ch.to_string(),
                    soft,
                });
                return true;
            }
        }
        false
    }

    /// Consume a (possibly signed) run of one unit letter as an element
    fn element(&mut self, mut ch: char) -> Result<(), FormatError> {
        let start = self.pos;
        let mut signed = false;
        if ch == '±' {
            signed = true;
            self.pos += 1;
            ch = *self
                .chars
                .get(self.pos)
                .ok_or(FormatError::InvalidRepr { pos: start, ch })?;
        }
        let kind = syntax::digit(self.top(), ch)
            .ok_or(FormatError::InvalidRepr { pos: self.pos, ch })?;
        let width = self.width_run(ch);
        let frac = match self.chars.get(self.pos + 1) {
            Some(&mark) if mark == ',' || mark == '.' => {
                self.pos += 1;
                match self.chars.get(self.pos + 1) {
                    Some(&c) if c == ch => {
                        self.pos += 1;
                        Some(self.width_run(ch))
                    }
                    _ => {
                        return Err(FormatError::InvalidRepr {
                            pos: self.pos,
                            ch: mark,
                        })
                    }
                }
            }
            _ => None,
        };
        self.pos += 1;
        self.ops.push(Fop::Element(ElementSpec {
            kind,
            width,
            signed,
            frac,
        }));
        Ok(())
    }

    /// Count a run of `ch` starting at `self.pos`, handling the low line
    ///
    /// Leaves `self.pos` on the last character of the run (underline
    /// included).
    fn width_run(&mut self, ch: char) -> Width {
        let mut n = 1;
        while self.chars.get(self.pos + 1) == Some(&ch) {
            n += 1;
            self.pos += 1;
        }
        if self.chars.get(self.pos + 1) == Some(&'\u{0332}') {
            self.pos += 1;
            // The underlined letter marks repetition, not width.
            Width {
                min: n - 1,
                max: None,
            }
        } else {
            Width {
                min: n,
                max: Some(n),
            }
        }
    }
}

/// Convert the ASCII `_X` spelling to `X` + combining low line
fn normalize_repr(repr: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(repr.len());
    let mut chars = repr.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_' {
            if let Some(next) = chars.next() {
                out.push(next);
                out.push('\u{0332}');
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Where a stream element sits, to disambiguate time from offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Plain,
    OffsetHour,
    OffsetMinute,
}

#[derive(Debug, Clone, Copy)]
struct StreamItem {
    unit: Option<TimeUnit>,
    slot: Slot,
    /// Which hard-separated part of the representation this element
    /// belongs to; element ops only bind within their own part
    group: usize,
}

impl StreamItem {
    fn plain(unit: Option<TimeUnit>) -> Self {
        Self {
            unit,
            slot: Slot::Plain,
            group: 0,
        }
    }
}

fn set_group(items: &mut [StreamItem], from: usize, group: usize) {
    for item in &mut items[from..] {
        item.group = group;
    }
}

/// A compiled, executable format representation
///
/// # Example
///
/// ```
/// use tempus::format::Format;
/// use tempus::timerep::{CalendarDate, Date, TimeRep};
///
/// let f = Format::new("YYYY-MM-DD").unwrap();
/// let date = TimeRep::Date(Date::Calendar(CalendarDate::from_ymd(1985, 4, 12).unwrap()));
/// assert_eq!(f.format(&date).unwrap(), "1985-04-12");
/// assert_eq!(f.read("1985-04-12").unwrap(), date);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    root: SyntaxClass,
    repr: String,
    ops: Vec<Fop>,
}

impl Format {
    /// Compile a format representation under the default root syntax
    ///
    /// The default root is the recurring time interval, whose composed
    /// tables answer for every representation this crate writes.
    pub fn new(repr: &str) -> Result<Self, FormatError> {
        Self::with_root(SyntaxClass::RecurringTimeInterval, repr)
    }

    /// Compile a format representation under an explicit root syntax
    pub fn with_root(root: SyntaxClass, repr: &str) -> Result<Self, FormatError> {
        let ops = FormatReprParser::new(root, repr).parse()?;
        Ok(Self {
            root,
            repr: repr.to_string(),
            ops,
        })
    }

    /// The compiled op list
    pub fn ops(&self) -> &[Fop] {
        &self.ops
    }

    /// The source representation
    pub fn repr(&self) -> &str {
        &self.repr
    }

    /// Write a representation out through this format
    ///
    /// Elements absent from the value are skipped silently, along with the
    /// separators and designators that exist only for them; this is how a
    /// reduced-accuracy date avoids a trailing separator.
    pub fn format(&self, rep: &TimeRep) -> Result<String, FormatError> {
        let stream = element_stream(rep);
        let mut consumed = vec![false; stream.len()];
        let mut renders: Vec<Option<String>> = vec![None; self.ops.len()];

        // Ops between hard separators only bind elements of the matching
        // part of the representation.
        let mut op_groups = Vec::with_capacity(self.ops.len());
        let mut group = 0;
        for op in &self.ops {
            op_groups.push(group);
            if matches!(op, Fop::Separator { soft: false, .. }) {
                group += 1;
            }
        }

        // First pass: bind elements to stream items and render them.
        for (idx, op) in self.ops.iter().enumerate() {
            match op {
                Fop::Element(spec) => {
                    let found = stream.iter().enumerate().find(|(j, item)| {
                        !consumed[*j]
                            && item.group == op_groups[idx]
                            && item.unit.map_or(false, |u| kind_matches(spec, &u, item.slot))
                    });
                    if let Some((j, item)) = found {
                        if let Some(unit) = item.unit {
                            consumed[j] = true;
                            renders[idx] = Some(render_element(spec, &unit));
                        }
                    }
                }
                Fop::Utc => {
                    let found = stream.iter().enumerate().find(|(j, item)| {
                        !consumed[*j]
                            && item.group == op_groups[idx]
                            && item.slot == Slot::OffsetHour
                    });
                    if let Some((j, item)) = found {
                        if let Some(oh) = item.unit {
                            let om = stream.get(j + 1).and_then(|it| {
                                if it.slot == Slot::OffsetMinute {
                                    it.unit
                                } else {
                                    None
                                }
                            });
                            let is_utc =
                                oh.value() == 0 && om.map_or(true, |m| m.value() == 0);
                            if !is_utc {
                                return Err(FormatError::Element {
                                    expected: UnitKind::Hour,
                                    got: "a non-UTC offset under a Z designator".to_string(),
                                });
                            }
                            consumed[j] = true;
                            if stream.get(j + 1).map(|it| it.slot) == Some(Slot::OffsetMinute) {
                                consumed[j + 1] = true;
                            }
                            renders[idx] = Some("Z".to_string());
                        }
                    }
                }
                _ => {}
            }
        }

        // Second pass: assemble literals around the elements that rendered.
        let emits = |idx: usize| renders[idx].is_some();
        let prev_element_emits = |idx: usize| {
            self.ops[..idx]
                .iter()
                .enumerate()
                .rev()
                .find(|(_, op)| matches!(op, Fop::Element(_) | Fop::Utc))
                .map_or(false, |(j, _)| emits(j))
        };
        let next_element_emits = |idx: usize| {
            self.ops[idx + 1..]
                .iter()
                .enumerate()
                .find(|(_, op)| matches!(op, Fop::Element(_) | Fop::Utc))
                .map_or(false, |(j, _)| emits(idx + 1 + j))
        };
        let any_element_emits = |from: usize, to: usize| {
            (from..to.min(self.ops.len())).any(|j| {
                matches!(self.ops[j], Fop::Element(_) | Fop::Utc) && emits(j)
            })
        };

        let mut out = String::new();
        for (idx, op) in self.ops.iter().enumerate() {
            match op {
                Fop::Element(_) | Fop::Utc => {
                    if let Some(s) = &renders[idx] {
                        out.push_str(s);
                    }
                }
                Fop::Coerce { lit, .. } => {
                    if prev_element_emits(idx) {
                        out.push_str(lit);
                    }
                }
                Fop::Marker { lit } => {
                    if next_element_emits(idx) {
                        out.push_str(lit);
                    }
                }
                Fop::Designator { lit, region_end } => {
                    if any_element_emits(idx, *region_end) {
                        out.push_str(lit);
                    }
                }
                Fop::Separator { lit, soft: true } => {
                    if prev_element_emits(idx) && next_element_emits(idx) {
                        out.push_str(lit);
                    }
                }
                Fop::Separator { lit, soft: false } => {
                    if any_element_emits(idx + 1, self.ops.len()) {
                        out.push_str(lit);
                    }
                }
            }
        }

        if out.is_empty() && stream.iter().any(|it| it.unit.is_some()) {
            return Err(FormatError::Element {
                expected: self
                    .ops
                    .iter()
                    .find_map(|op| match op {
                        Fop::Element(spec) => Some(spec.kind),
                        _ => None,
                    })
                    .unwrap_or(UnitKind::Number),
                got: format!("a {} under format {:?}", rep.kind_name(), self.repr),
            });
        }
        Ok(out)
    }

    /// Read a string into a representation through this format
    pub fn read(&self, input: &str) -> Result<TimeRep, FormatError> {
        let input = input.to_uppercase();
        let mut i = 0usize;
        let mut stack: Vec<StackEntry> = Vec::new();
        let mut last_expected: Option<String> = None;

        for op in &self.ops {
            if i >= input.len() {
                break;
            }
            match op {
                Fop::Designator { lit, .. } | Fop::Marker { lit } => {
                    if input[i..].starts_with(lit.as_str()) {
                        i += lit.len();
                    } else {
                        last_expected = Some(format!("{:?}", lit));
                    }
                }
                Fop::Separator { lit, soft } => {
                    if input[i..].starts_with(lit.as_str()) {
                        i += lit.len();
                        if !soft {
                            stack.push(StackEntry::Barrier);
                        }
                    } else {
                        last_expected = Some(format!("{:?}", lit));
                    }
                }
                Fop::Coerce { lit, kind } => {
                    if input[i..].starts_with(lit.as_str()) {
                        i += lit.len();
                        coerce_top(&mut stack, *kind)?;
                        merge_top(&mut stack);
                    } else {
                        last_expected = Some(format!("{:?}", lit));
                    }
                }
                Fop::Utc => {
                    if input[i..].starts_with('Z') {
                        i += 1;
                        stack.push(StackEntry::Comp(Component::Rep(TimeRep::Offset(
                            UTCOffset::utc(),
                        ))));
                        merge_top(&mut stack);
                    } else {
                        last_expected = Some("\"Z\"".to_string());
                    }
                }
                Fop::Element(spec) => match read_element(spec, &input, i)? {
                    Some((unit, consumed)) => {
                        i += consumed;
                        stack.push(StackEntry::Comp(Component::Unit(unit)));
                        if unit.kind() != UnitKind::Number {
                            merge_top(&mut stack);
                        }
                    }
                    None => {
                        last_expected = Some(format!("{} digits", spec.kind.name()));
                    }
                },
            }
        }

        if i < input.len() {
            return Err(FormatError::Read {
                pos: i,
                expected: last_expected.unwrap_or_else(|| "end of input".to_string()),
                got: input[i..].chars().take(8).collect(),
            });
        }

        // Bottom-up merge of the residual stack, barriers removed.
        let comps: Vec<Component> = stack
            .into_iter()
            .filter_map(|e| match e {
                StackEntry::Comp(c) => Some(c),
                StackEntry::Barrier => None,
            })
            .collect();
        let mut iter = comps.into_iter();
        let mut acc = iter.next().ok_or_else(|| FormatError::Read {
            pos: 0,
            expected: "at least one element".to_string(),
            got: input.chars().take(8).collect(),
        })?;
        for c in iter {
            acc = merge_residual(&acc, &c).ok_or_else(|| FormatError::UnmergeableStack {
                top: c.describe(),
                below: acc.describe(),
            })?;
        }
        acc.promote().map_err(FormatError::Rep)
    }
}

#[derive(Debug, Clone)]
enum StackEntry {
    Comp(Component),
    Barrier,
}

fn merge_top(stack: &mut Vec<StackEntry>) {
    if stack.len() < 2 {
        return;
    }
    let n = stack.len();
    if let (StackEntry::Comp(below), StackEntry::Comp(top)) = (&stack[n - 2], &stack[n - 1]) {
        if let Some(merged) = merge(below, top) {
            stack.truncate(n - 2);
            stack.push(StackEntry::Comp(merged));
        }
    }
}

fn coerce_top(stack: &mut [StackEntry], kind: UnitKind) -> Result<(), FormatError> {
    if let Some(StackEntry::Comp(Component::Unit(u))) = stack.last_mut() {
        if u.kind() == UnitKind::Number || u.kind() == UnitKind::Day {
            *u = u.retype(kind)?;
        }
    }
    Ok(())
}

fn read_element(
    spec: &ElementSpec,
    input: &str,
    i: usize,
) -> Result<Option<(TimeUnit, usize)>, FormatError> {
    let max = spec.width.max.map(|m| m.to_string()).unwrap_or_default();
    let mut pat = String::from("^(");
    if spec.signed {
        pat.push_str("[+-]");
    }
    pat.push_str(&format!("[0-9]{{{},{}}}", spec.width.min, max));
    pat.push(')');
    if let Some(frac) = &spec.frac {
        let fmax = frac.max.map(|m| m.to_string()).unwrap_or_default();
        pat.push_str(&format!("(?:[.,]([0-9]{{{},{}}}))?", frac.min, fmax));
    }
    let re = match regex_cache::get_or_compile(&pat) {
        Some(re) => re,
        None => return Ok(None),
    };
    let caps = match re.captures(&input[i..]) {
        Some(c) => c,
        None => return Ok(None),
    };
    let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let digits = body.trim_start_matches(['+', '-']);
    if digits.is_empty() {
        return Ok(None);
    }
    let value: i64 = body.parse().map_err(|_| FormatError::Read {
        pos: i,
        expected: format!("{} digits", spec.kind.name()),
        got: body.to_string(),
    })?;
    let mut unit = if spec.signed {
        TimeUnit::new_signed(spec.kind, value)?
    } else {
        TimeUnit::new(spec.kind, value)?
    };
    if let Some(frac) = caps.get(2) {
        let fval: u32 = frac.as_str().parse().map_err(|_| FormatError::Read {
            pos: i,
            expected: "fraction digits".to_string(),
            got: frac.as_str().to_string(),
        })?;
        unit = unit.with_fraction(Fraction {
            value: fval,
            digits: frac.as_str().len() as u8,
        });
    }
    let consumed = caps.get(0).map(|m| m.as_str().len()).unwrap_or(0);
    Ok(Some((unit, consumed)))
}

fn kind_matches(spec: &ElementSpec, unit: &TimeUnit, slot: Slot) -> bool {
    match spec.kind {
        UnitKind::Number => unit.kind().is_cardinal(),
        UnitKind::Day => unit.kind().is_day(),
        UnitKind::Hour if spec.signed => slot == Slot::OffsetHour,
        UnitKind::Hour => slot == Slot::Plain && unit.kind() == UnitKind::Hour,
        UnitKind::Minute => {
            (slot == Slot::Plain || slot == Slot::OffsetMinute) && unit.kind() == UnitKind::Minute
        }
        k => slot == Slot::Plain && unit.kind() == k,
    }
}

fn render_element(spec: &ElementSpec, unit: &TimeUnit) -> String {
    let mut out = String::new();
    if spec.signed {
        out.push(if unit.value() < 0 { '-' } else { '+' });
    }
    let digits = format!("{:0width$}", unit.value().abs(), width = spec.width.min);
    match spec.width.max {
        // Truncation keeps the leading digits: a two-digit year is a century.
        Some(max) => out.push_str(&digits[..digits.len().min(max)]),
        None => out.push_str(&digits),
    }
    if let (Some(fw), Some(frac)) = (&spec.frac, unit.fraction()) {
        out.push('.');
        let fdigits = format!("{:0width$}", frac.value, width = fw.min.max(frac.digits as usize));
        match fw.max {
            Some(max) => out.push_str(&fdigits[..fdigits.len().min(max)]),
            None => out.push_str(&fdigits),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Element streams
// ---------------------------------------------------------------------------

/// Flatten a representation into its left-to-right element stream
fn element_stream(rep: &TimeRep) -> Vec<StreamItem> {
    let mut items = Vec::new();
    push_rep(&mut items, rep);
    items
}

fn push_rep(items: &mut Vec<StreamItem>, rep: &TimeRep) {
    match rep {
        TimeRep::Date(d) => push_date(items, d),
        TimeRep::Time(t) => push_time(items, t),
        TimeRep::Offset(o) => push_offset(items, Some(*o)),
        TimeRep::DateTime(dt) => push_datetime(items, dt),
        TimeRep::TimeDuration(td) => push_time_duration(items, Some(*td)),
        TimeRep::Duration(d) => push_duration(items, d),
        TimeRep::Interval(iv) => push_interval(items, iv),
        TimeRep::Recurring(r) => push_recurring(items, r),
    }
}

fn push_date(items: &mut Vec<StreamItem>, date: &Date) {
    match date {
        Date::Calendar(d) => {
            items.push(StreamItem::plain(d.year()));
            items.push(StreamItem::plain(d.month()));
            items.push(StreamItem::plain(d.day()));
        }
        Date::Ordinal(d) => {
            items.push(StreamItem::plain(d.year()));
            items.push(StreamItem::plain(d.day()));
        }
        Date::Week(d) => {
            items.push(StreamItem::plain(d.year()));
            items.push(StreamItem::plain(d.week()));
            items.push(StreamItem::plain(d.day()));
        }
    }
}

fn push_time(items: &mut Vec<StreamItem>, time: &Time) {
    items.push(StreamItem::plain(Some(time.hour())));
    items.push(StreamItem::plain(time.minute()));
    items.push(StreamItem::plain(time.second()));
    push_offset(items, time.offset());
}

fn push_offset(items: &mut Vec<StreamItem>, offset: Option<UTCOffset>) {
    items.push(StreamItem {
        unit: offset.map(|o| o.hour()),
        slot: Slot::OffsetHour,
        group: 0,
    });
    items.push(StreamItem {
        unit: offset.and_then(|o| o.minute()),
        slot: Slot::OffsetMinute,
        group: 0,
    });
}

fn push_datetime(items: &mut Vec<StreamItem>, dt: &DateTime) {
    push_date(items, dt.date());
    match dt.time() {
        Some(t) => push_time(items, t),
        None => {
            items.push(StreamItem::plain(None));
            items.push(StreamItem::plain(None));
            items.push(StreamItem::plain(None));
            push_offset(items, None);
        }
    }
}

fn push_time_duration(items: &mut Vec<StreamItem>, td: Option<TimeDuration>) {
    items.push(StreamItem::plain(td.and_then(|t| t.hours())));
    items.push(StreamItem::plain(td.and_then(|t| t.minutes())));
    items.push(StreamItem::plain(td.and_then(|t| t.seconds())));
}

fn push_duration(items: &mut Vec<StreamItem>, d: &Duration) {
    match d {
        Duration::Calendar {
            years,
            months,
            days,
            time,
        } => {
            items.push(StreamItem::plain(*years));
            items.push(StreamItem::plain(*months));
            items.push(StreamItem::plain(*days));
            push_time_duration(items, *time);
        }
        Duration::Weeks(w) => items.push(StreamItem::plain(Some(*w))),
    }
}

fn push_interval(items: &mut Vec<StreamItem>, iv: &TimeInterval) {
    match iv {
        TimeInterval::StartEnd(a, b) => {
            push_datetime(items, a);
            let mid = items.len();
            push_datetime(items, b);
            set_group(items, mid, 1);
        }
        TimeInterval::Duration(d) => push_duration(items, d),
        TimeInterval::StartDuration(a, d) => {
            push_datetime(items, a);
            let mid = items.len();
            push_duration(items, d);
            set_group(items, mid, 1);
        }
        TimeInterval::DurationEnd(d, b) => {
            push_duration(items, d);
            let mid = items.len();
            push_datetime(items, b);
            set_group(items, mid, 1);
        }
    }
}

fn push_recurring(items: &mut Vec<StreamItem>, r: &RecurringTimeInterval) {
    items.push(StreamItem::plain(r.count()));
    if let Some(part) = r.first() {
        let from = items.len();
        push_part(items, part);
        set_group(items, from, 1);
    }
    if let Some(part) = r.second() {
        let from = items.len();
        push_part(items, part);
        set_group(items, from, 2);
    }
}

fn push_part(items: &mut Vec<StreamItem>, part: &IntervalPart) {
    match part {
        IntervalPart::Point(dt) => push_datetime(items, dt),
        IntervalPart::Span(d) => push_duration(items, d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timerep::CalendarDate;

    fn date_rep(y: impl Into<Option<i64>>, m: impl Into<Option<i64>>, d: impl Into<Option<i64>>) -> TimeRep {
        TimeRep::Date(Date::Calendar(CalendarDate::from_ymd(y, m, d).unwrap()))
    }

    // ------------------------------------------------------------------
    // Representation compiler
    // ------------------------------------------------------------------

    fn first_op(repr: &str) -> Fop {
        Format::with_root(SyntaxClass::TimeInterval, &format!("P{}", repr))
            .unwrap()
            .ops()[1]
            .clone()
    }

    #[test]
    fn test_element_widths() {
        let el = |min, max: Option<usize>| {
            Fop::Element(ElementSpec {
                kind: UnitKind::Number,
                width: Width { min, max },
                signed: false,
                frac: None,
            })
        };
        assert_eq!(first_op("n\u{0332}"), el(0, None));
        assert_eq!(first_op("_n"), el(0, None));
        assert_eq!(first_op("n"), el(1, Some(1)));
        assert_eq!(first_op("nn\u{0332}"), el(1, None));
        assert_eq!(first_op("n_n"), el(1, None));
        assert_eq!(first_op("nnn\u{0332}"), el(2, None));
        assert_eq!(first_op("nn_n"), el(2, None));
        assert_eq!(first_op("nn"), el(2, Some(2)));
    }

    #[test]
    fn test_signed_element() {
        let f = Format::new("±YYYY").unwrap();
        assert_eq!(
            f.ops()[0],
            Fop::Element(ElementSpec {
                kind: UnitKind::Year,
                width: Width { min: 4, max: Some(4) },
                signed: true,
                frac: None,
            })
        );
    }

    #[test]
    fn test_separator_op() {
        let f = Format::new("YYYY-MM").unwrap();
        assert_eq!(
            f.ops()[1],
            Fop::Separator {
                lit: "-".to_string(),
                soft: true
            }
        );
    }

    #[test]
    fn test_invalid_letter_rejected() {
        assert!(Format::new("QQ").is_err());
    }

    // ------------------------------------------------------------------
    // Formatting
    // ------------------------------------------------------------------

    #[test]
    fn test_format_calendar_date() {
        let f = Format::new("YYYY-MM-DD").unwrap();
        assert_eq!(f.format(&date_rep(1985, 4, 12)).unwrap(), "1985-04-12");
        assert_eq!(f.format(&date_rep(1985, 4, None)).unwrap(), "1985-04");
        assert_eq!(f.format(&date_rep(1985, None, None)).unwrap(), "1985");
    }

    #[test]
    fn test_format_basic_image() {
        let f = Format::new("YYYYMMDD").unwrap();
        assert_eq!(f.format(&date_rep(1985, 4, 12)).unwrap(), "19850412");
    }

    #[test]
    fn test_format_century() {
        let f = Format::new("YY").unwrap();
        assert_eq!(f.format(&date_rep(19, None, None)).unwrap(), "19");
    }

    #[test]
    fn test_format_anchorless_date() {
        let f = Format::new("YYYY-MM-DD").unwrap();
        assert_eq!(f.format(&date_rep(None, 10, 25)).unwrap(), "10-25");
    }

    #[test]
    fn test_format_time_elision() {
        let f = Format::new("hh:mm").unwrap();
        let t = TimeRep::Time(Time::from_hms(23, None, None, None).unwrap());
        assert_eq!(f.format(&t).unwrap(), "23");
    }

    #[test]
    fn test_format_time_with_offset() {
        let f = Format::new("hh:mm:ss±hh:mm").unwrap();
        let t = TimeRep::Time(
            Time::from_hms(15, 27, 46, Some(UTCOffset::from_hm(-5, 0).unwrap())).unwrap(),
        );
        assert_eq!(f.format(&t).unwrap(), "15:27:46-05:00");
        let t = TimeRep::Time(
            Time::from_hms(15, 27, 46, Some(UTCOffset::from_hm(1, 0).unwrap())).unwrap(),
        );
        assert_eq!(f.format(&t).unwrap(), "15:27:46+01:00");
    }

    #[test]
    fn test_format_utc_designator() {
        let f = Format::new("hh:mm:ssZ").unwrap();
        let t = TimeRep::Time(Time::from_hms(23, 20, 50, Some(UTCOffset::utc())).unwrap());
        assert_eq!(f.format(&t).unwrap(), "23:20:50Z");
        // Local time: no Z.
        let t = TimeRep::Time(Time::from_hms(23, 20, 50, None).unwrap());
        assert_eq!(f.format(&t).unwrap(), "23:20:50");
    }

    #[test]
    fn test_format_week_date() {
        let f = Format::new("YYYY-Www-D").unwrap();
        let d = TimeRep::Date(Date::Week(
            crate::timerep::WeekDate::from_ywd(1985, 15, 5).unwrap(),
        ));
        assert_eq!(f.format(&d).unwrap(), "1985-W15-5");
        let d = TimeRep::Date(Date::Week(
            crate::timerep::WeekDate::from_ywd(1985, None, None).unwrap(),
        ));
        assert_eq!(f.format(&d).unwrap(), "1985");
    }

    #[test]
    fn test_format_duration() {
        let f = Format::new("Pnn\u{0332}Ynn\u{0332}Mnn\u{0332}DTnn\u{0332}Hnn\u{0332}Mnn\u{0332}S").unwrap();
        let d = TimeRep::Duration(Duration::from_ymdhms(2, 10, 15, 10, 30, 20).unwrap());
        assert_eq!(f.format(&d).unwrap(), "P2Y10M15DT10H30M20S");
        // Date-only duration drops the T and the time part.
        let d = TimeRep::Duration(Duration::from_ymdhms(1, 2, None, None, None, None).unwrap());
        assert_eq!(f.format(&d).unwrap(), "P1Y2M");
        // A partial duration only prints the components it has.
        let d = TimeRep::Duration(Duration::from_ymdhms(None, 2, None, None, None, None).unwrap());
        assert_eq!(f.format(&d).unwrap(), "P2M");
    }

    #[test]
    fn test_format_weeks_duration() {
        let f = Format::new("Pnn\u{0332}W").unwrap();
        let d = TimeRep::Duration(Duration::from_weeks(2).unwrap());
        assert_eq!(f.format(&d).unwrap(), "P2W");
    }

    #[test]
    fn test_format_datetime() {
        let f = Format::new("YYYY-MM-DDThh:mm:ss").unwrap();
        let dt = TimeRep::DateTime(
            DateTime::new(
                Date::Calendar(CalendarDate::from_ymd(1985, 4, 12).unwrap()),
                Some(Time::from_hms(10, 15, 30, None).unwrap()),
            )
            .unwrap(),
        );
        assert_eq!(f.format(&dt).unwrap(), "1985-04-12T10:15:30");
        // Date-only: the T goes away with the time.
        let dt = TimeRep::DateTime(DateTime::from_date(Date::Calendar(
            CalendarDate::from_ymd(1985, 4, 12).unwrap(),
        )));
        assert_eq!(f.format(&dt).unwrap(), "1985-04-12");
    }

    #[test]
    fn test_format_recurring() {
        let f = Format::new(
            "Rn\u{0332}/YYYYMMDDThhmmss/Pnn\u{0332}Ynn\u{0332}Mnn\u{0332}DTnn\u{0332}Hnn\u{0332}Mnn\u{0332}S",
        )
        .unwrap();
        let dt = DateTime::new(
            Date::Calendar(CalendarDate::from_ymd(1985, 4, 12).unwrap()),
            Some(Time::from_hms(23, 20, 50, None).unwrap()),
        )
        .unwrap();
        let dur = Duration::from_ymdhms(1, 2, 15, 12, 30, 0).unwrap();
        let r = TimeRep::Recurring(
            RecurringTimeInterval::new(
                Some(12),
                Some(IntervalPart::Point(dt)),
                Some(IntervalPart::Span(dur)),
            )
            .unwrap(),
        );
        assert_eq!(f.format(&r).unwrap(), "R12/19850412T232050/P1Y2M15DT12H30M0S");
    }

    #[test]
    fn test_format_unbounded_recurring() {
        let f = Format::new("Rn\u{0332}/Pnn\u{0332}Y").unwrap();
        let r = TimeRep::Recurring(
            RecurringTimeInterval::new(
                None,
                Some(IntervalPart::Span(
                    Duration::from_ymdhms(1, None, None, None, None, None).unwrap(),
                )),
                None,
            )
            .unwrap(),
        );
        assert_eq!(f.format(&r).unwrap(), "R/P1Y");
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    #[test]
    fn test_read_calendar_date() {
        let f = Format::new("YYYY-MM-DD").unwrap();
        assert_eq!(f.read("1985-04-12").unwrap(), date_rep(1985, 4, 12));
        // Reduced accuracy reads as a prefix.
        assert_eq!(f.read("1985-04").unwrap(), date_rep(1985, 4, None));
        assert_eq!(f.read("1985").unwrap(), date_rep(1985, None, None));
        // The same format reads the basic image.
        assert_eq!(f.read("19850412").unwrap(), date_rep(1985, 4, 12));
    }

    #[test]
    fn test_read_rejects_garbage() {
        let f = Format::new("YYYY-MM-DD").unwrap();
        assert!(f.read("banana").is_err());
        assert!(f.read("1985-04-12xx").is_err());
    }

    #[test]
    fn test_read_out_of_range() {
        let f = Format::new("YYYY-MM-DD").unwrap();
        assert!(f.read("1985-13-01").is_err());
    }

    #[test]
    fn test_read_time_with_offset() {
        let f = Format::new("hh:mm:ss±hh:mm").unwrap();
        let expected = TimeRep::Time(
            Time::from_hms(15, 27, 46, Some(UTCOffset::from_hm(-5, 0).unwrap())).unwrap(),
        );
        assert_eq!(f.read("15:27:46-05:00").unwrap(), expected);
    }

    #[test]
    fn test_read_hour_only_offset() {
        let f = Format::new("hhmmss±hh").unwrap();
        let expected = TimeRep::Time(
            Time::from_hms(15, 27, 46, Some(UTCOffset::from_hm(-5, None).unwrap())).unwrap(),
        );
        assert_eq!(f.read("152746-05").unwrap(), expected);
    }

    #[test]
    fn test_read_utc() {
        let f = Format::new("hh:mm:ssZ").unwrap();
        let t = f.read("23:20:50Z").unwrap();
        match t {
            TimeRep::Time(t) => assert!(t.offset().unwrap().is_utc()),
            other => panic!("unexpected read result: {:?}", other),
        }
    }

    #[test]
    fn test_read_duration() {
        let f = Format::new("Pnn\u{0332}Ynn\u{0332}Mnn\u{0332}DTnn\u{0332}Hnn\u{0332}Mnn\u{0332}S").unwrap();
        assert_eq!(
            f.read("P2Y10M15DT10H30M20S").unwrap(),
            TimeRep::Duration(Duration::from_ymdhms(2, 10, 15, 10, 30, 20).unwrap())
        );
        assert_eq!(
            f.read("P1Y2M").unwrap(),
            TimeRep::Duration(Duration::from_ymdhms(1, 2, None, None, None, None).unwrap())
        );
    }

    #[test]
    fn test_read_weeks_duration() {
        let f = Format::new("Pnn\u{0332}W").unwrap();
        assert_eq!(
            f.read("P2W").unwrap(),
            TimeRep::Duration(Duration::from_weeks(2).unwrap())
        );
    }

    #[test]
    fn test_read_datetime() {
        let f = Format::new("YYYY-MM-DDThh:mm:ss").unwrap();
        let expected = TimeRep::DateTime(
            DateTime::new(
                Date::Calendar(CalendarDate::from_ymd(1985, 4, 12).unwrap()),
                Some(Time::from_hms(10, 15, 30, None).unwrap()),
            )
            .unwrap(),
        );
        assert_eq!(f.read("1985-04-12T10:15:30").unwrap(), expected);
    }

    #[test]
    fn test_read_interval_start_end() {
        let f = Format::new("YYYYMMDDThhmmss/YYYYMMDDThhmmss").unwrap();
        let rep = f.read("19850412T232050/19850625T103000").unwrap();
        assert!(matches!(
            rep,
            TimeRep::Interval(TimeInterval::StartEnd(..))
        ));
    }

    #[test]
    fn test_read_recurring() {
        let f = Format::new(
            "Rn\u{0332}/YYYYMMDDThhmmss/Pnn\u{0332}Ynn\u{0332}Mnn\u{0332}DTnn\u{0332}Hnn\u{0332}Mnn\u{0332}S",
        )
        .unwrap();
        let rep = f.read("R12/19850412T232050/P1Y2M15DT12H30M0S").unwrap();
        let dt = DateTime::new(
            Date::Calendar(CalendarDate::from_ymd(1985, 4, 12).unwrap()),
            Some(Time::from_hms(23, 20, 50, None).unwrap()),
        )
        .unwrap();
        let dur = Duration::from_ymdhms(1, 2, 15, 12, 30, 0).unwrap();
        let expected = TimeRep::Recurring(
            RecurringTimeInterval::new(
                Some(12),
                Some(IntervalPart::Point(dt)),
                Some(IntervalPart::Span(dur)),
            )
            .unwrap(),
        );
        assert_eq!(rep, expected);
    }

    #[test]
    fn test_read_ordinal_date() {
        let f = Format::new("YYYY-DDD").unwrap();
        let rep = f.read("1985-102").unwrap();
        assert_eq!(
            rep,
            TimeRep::Date(Date::Ordinal(
                crate::timerep::OrdinalDate::from_yd(1985, 102).unwrap()
            ))
        );
    }

    #[test]
    fn test_read_week_date() {
        let f = Format::new("YYYY-Www-D").unwrap();
        let rep = f.read("1985-W15-5").unwrap();
        assert_eq!(
            rep,
            TimeRep::Date(Date::Week(
                crate::timerep::WeekDate::from_ywd(1985, 15, 5).unwrap()
            ))
        );
        // Basic image through the same format.
        assert_eq!(f.read("1985W155").unwrap(), rep);
    }

    #[test]
    fn test_round_trip() {
        let f = Format::new("YYYY-MM-DD").unwrap();
        for s in ["1985-04-12", "1985-04", "1985"] {
            assert_eq!(f.format(&f.read(s).unwrap()).unwrap(), s);
        }
        let f = Format::new("hh:mm:ss±hh:mm").unwrap();
        for s in ["15:27:46-05:00", "15:27:46+01:00"] {
            assert_eq!(f.format(&f.read(s).unwrap()).unwrap(), s);
        }
    }

    #[test]
    fn test_fraction_round_trip() {
        let f = Format::new("hh:mm:ss.ss\u{0332}").unwrap();
        let rep = f.read("15:27:46.25").unwrap();
        match &rep {
            TimeRep::Time(t) => {
                let frac = t.second().unwrap().fraction().unwrap();
                assert_eq!(frac.value, 25);
                assert_eq!(frac.digits, 2);
            }
            other => panic!("unexpected read result: {:?}", other),
        }
        assert_eq!(f.format(&rep).unwrap(), "15:27:46.25");
    }
}
