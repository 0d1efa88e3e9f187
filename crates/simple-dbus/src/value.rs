//! Host value types.
//!
//! [`Value`] models the dynamically typed values of a scripting host: nil,
//! booleans, numbers, strings and tables. Tables are associative with a
//! contiguous 1-based sequence part, so one type serves as list, record and
//! map.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// A dynamically typed host value.
///
/// Equality is numeric across `Integer` and `Number`: `Integer(1)` equals
/// `Number(1.0)`.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Nil,

    Boolean(bool),

    /// Integer number (exact for the full 64-bit range)
    Integer(i64),

    /// Floating point number
    Number(f64),

    String(String),

    Table(Table),
}

/// A number read from a host value, kept exact when it is an integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// Two's complement bit pattern after truncation toward zero, reduced
    /// modulo 2^64. Narrowing this with `as` gives wraparound at any width.
    pub fn wrapping_bits(self) -> u64 {
        match self {
            Number::Integer(n) => n as u64,
            Number::Float(f) => {
                if !f.is_finite() {
                    return 0;
                }
                let t = f.trunc();
                if t >= i64::MIN as f64 && t < i64::MAX as f64 {
                    t as i64 as u64
                } else {
                    t.rem_euclid(18_446_744_073_709_551_616.0) as u64
                }
            }
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Float(f) => f,
        }
    }
}

impl Value {
    /// Create a variant record: a table with `signature` and `value` fields.
    pub fn variant(signature: &str, value: impl Into<Value>) -> Value {
        let mut table = Table::new();
        table.set("signature", signature);
        table.set("value", value);
        Value::Table(table)
    }

    /// The host's name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Convert to a number the way the host does: numbers as is, strings
    /// when their trimmed text parses as a number.
    pub fn to_number(&self) -> Option<Number> {
        match self {
            Value::Integer(n) => Some(Number::Integer(*n)),
            Value::Number(f) => Some(Number::Float(*f)),
            Value::String(s) => parse_number(s),
            _ => None,
        }
    }

    /// Convert to a string the way the host does: strings as is, numbers
    /// formatted.
    pub fn to_str(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(s)),
            Value::Integer(n) => Some(Cow::Owned(n.to_string())),
            Value::Number(f) => Some(Cow::Owned(format_float(*f))),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Integer(n), Value::Number(f)) | (Value::Number(f), Value::Integer(n)) => {
                float_to_integer(*f) == Some(*n)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            _ => false,
        }
    }
}

/// The integer a float represents exactly, if any.
fn float_to_integer(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

/// Decimal (with optional fraction and exponent) or `0x` hex numerals only;
/// `inf`, `nan` and friends are not numbers to the host.
fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(Number::Integer(n));
    }
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let n = u64::from_str_radix(hex, 16).ok()? as i64;
        return Some(Number::Integer(if negative { n.wrapping_neg() } else { n }));
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    s.parse::<f64>().ok().map(Number::Float)
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Number(n) => f.write_str(&format_float(*n)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Table(t) => {
                f.write_str("{")?;
                for (i, (key, value)) in t.pairs().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "[{key}] = {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Table(items.into_iter().collect())
    }
}

// ============================================================================
// Table
// ============================================================================

/// An associative host table.
///
/// Entries with keys `1..=n` for the largest contiguous `n` live in the
/// sequence part, everything else in the associative part (kept in insertion
/// order). Assigning nil removes an entry.
#[derive(Clone, Default)]
pub struct Table {
    seq: Vec<Value>,
    map: Vec<(Value, Value)>,
    /// Position in `map` of every entry whose key has a [`SlotKey`].
    index: HashMap<SlotKey, usize>,
}

/// Hashable projection of a normalized key. Table keys have none and are
/// found by scanning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SlotKey {
    Boolean(bool),
    Integer(i64),
    Float(u64),
    String(String),
}

impl SlotKey {
    fn of(key: &Value) -> Option<SlotKey> {
        match key {
            Value::Boolean(b) => Some(SlotKey::Boolean(*b)),
            Value::Integer(n) => Some(SlotKey::Integer(*n)),
            Value::Number(f) => Some(SlotKey::Float(f.to_bits())),
            Value::String(s) => Some(SlotKey::String(s.clone())),
            Value::Nil | Value::Table(_) => None,
        }
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut table = Table::new();
        for (k, v) in pairs {
            table.set(k, v);
        }
        table
    }

    /// Length of the sequence part (the border of the table).
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty() && self.map.is_empty()
    }

    /// Total number of entries.
    pub fn entry_count(&self) -> usize {
        self.seq.len() + self.map.len()
    }

    /// Look up an entry; `None` when absent.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let key = normalize_key(key.clone())?;
        if let Value::Integer(i) = key {
            if i >= 1 && (i as u64) <= self.seq.len() as u64 {
                return self.seq.get(i as usize - 1);
            }
        }
        self.position(&key).map(|pos| &self.map[pos].1)
    }

    /// Look up the entry at a 1-based index.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        if index >= 1 && index <= self.seq.len() {
            return self.seq.get(index - 1);
        }
        self.get(&Value::Integer(index as i64))
    }

    /// Look up a string-keyed field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.index
            .get(&SlotKey::String(name.to_string()))
            .map(|&pos| &self.map[pos].1)
    }

    /// Set an entry. Nil values remove the entry; nil and NaN keys are
    /// ignored.
    pub fn set(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        let Some(key) = normalize_key(key.into()) else {
            return;
        };
        let value = value.into();

        if let Value::Integer(i) = key {
            let len = self.seq.len() as i64;
            if i >= 1 && i <= len {
                let idx = i as usize - 1;
                if value.is_nil() {
                    // Everything after the hole moves to the associative part
                    let tail = self.seq.split_off(idx + 1);
                    self.seq.pop();
                    for (offset, v) in tail.into_iter().enumerate() {
                        self.insert_entry(Value::Integer(i + 1 + offset as i64), v);
                    }
                } else {
                    self.seq[idx] = value;
                }
                return;
            }
            if i == len + 1 && !value.is_nil() {
                if let Some(pos) = self.position(&key) {
                    self.remove_entry(pos);
                }
                self.seq.push(value);
                self.migrate_sequence();
                return;
            }
        }

        match self.position(&key) {
            Some(pos) if value.is_nil() => {
                self.remove_entry(pos);
            }
            Some(pos) => self.map[pos].1 = value,
            None if value.is_nil() => {}
            None => self.insert_entry(key, value),
        }
    }

    /// Append to the end of the sequence part.
    pub fn push(&mut self, value: impl Into<Value>) {
        let next = self.seq.len() as i64 + 1;
        self.set(next, value);
    }

    /// Iterate the sequence part: indices 1, 2, ... up to the first absent one.
    pub fn sequence(&self) -> impl Iterator<Item = &Value> {
        self.seq.iter()
    }

    /// Iterate all entries: the sequence part first, then the associative
    /// part in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (Value, &Value)> {
        self.seq
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::Integer(i as i64 + 1), v))
            .chain(self.map.iter().map(|(k, v)| (k.clone(), v)))
    }

    fn migrate_sequence(&mut self) {
        loop {
            let next = Value::Integer(self.seq.len() as i64 + 1);
            match self.position(&next) {
                Some(pos) => {
                    let (_, v) = self.remove_entry(pos);
                    self.seq.push(v);
                }
                None => break,
            }
        }
    }

    /// Position of a normalized key in the associative part.
    fn position(&self, key: &Value) -> Option<usize> {
        match SlotKey::of(key) {
            Some(slot) => self.index.get(&slot).copied(),
            None => self.map.iter().position(|(k, _)| k == key),
        }
    }

    fn insert_entry(&mut self, key: Value, value: Value) {
        if let Some(slot) = SlotKey::of(&key) {
            self.index.insert(slot, self.map.len());
        }
        self.map.push((key, value));
    }

    fn remove_entry(&mut self, pos: usize) -> (Value, Value) {
        let entry = self.map.remove(pos);
        if let Some(slot) = SlotKey::of(&entry.0) {
            self.index.remove(&slot);
        }
        for p in self.index.values_mut() {
            if *p > pos {
                *p -= 1;
            }
        }
        entry
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("seq", &self.seq)
            .field("map", &self.map)
            .finish()
    }
}

/// Integral floats address the same slot as the equal integer.
fn normalize_key(key: Value) -> Option<Value> {
    match key {
        Value::Nil => None,
        Value::Number(f) if f.is_nan() => None,
        Value::Number(f) => Some(float_to_integer(f).map_or(Value::Number(f), Value::Integer)),
        other => Some(other),
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
            && self.map.len() == other.map.len()
            && self
                .map
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl FromIterator<Value> for Table {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut table = Table::new();
        for (i, value) in iter.into_iter().enumerate() {
            table.set(i as i64 + 1, value);
        }
        table
    }
}
