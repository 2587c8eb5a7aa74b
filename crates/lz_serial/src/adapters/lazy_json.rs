//! Self-contained JSON format with deferred scalar conversion.
//!
//! Leaves keep their source text (number literals, escaped string contents)
//! and are only converted when a field asks for them with a concrete type.
//! The parser never fails: it stops at the first position it cannot make
//! sense of and keeps everything built so far. Input whose top level is
//! not an object or an array reads as an empty object.
//!
//! Object members live in a hash map, so the key order of written documents
//! is unspecified.

use core::fmt::Write as _;
use std::io::{Read, Write};

use lz_utils::hash::HashMap;

use crate::SerialError;
use crate::document::{Adapter, Node, Scalar, ScalarKind};
use crate::format::Format;
use crate::multi::TypeDispatchTable;

/// Nesting deeper than this parses as `null`.
const MAX_DEPTH: usize = 256;

// -----------------------------------------------------------------------------
// Format

/// The built-in JSON format.
#[derive(Copy, Clone, Debug, Default)]
pub struct LazyJson;

impl Format for LazyJson {
    const NAME: &'static str = "lazy_json";

    type Adapter<'a> = LazyJsonAdapter<'a>;

    #[inline]
    fn reader<'a>(input: &'a mut dyn Read) -> LazyJsonAdapter<'a> {
        LazyJsonAdapter::from_reader(input)
    }

    #[inline]
    fn writer<'a>(output: &'a mut dyn Write) -> LazyJsonAdapter<'a> {
        LazyJsonAdapter::to_writer(output)
    }

    fn dispatch_table() -> &'static TypeDispatchTable {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new(LazyJson::NAME);
        &TABLE
    }
}

// -----------------------------------------------------------------------------
// Document

#[derive(Clone, Debug, PartialEq)]
enum JsonValue {
    Null,
    Bool(bool),
    /// Number literal as written.
    Number(String),
    /// String contents, still escaped.
    String(String),
    Object(HashMap<String, Node>),
    Array(Vec<Node>),
}

/// [`Adapter`] of the [`LazyJson`] format.
pub struct LazyJsonAdapter<'a> {
    nodes: Vec<JsonValue>,
    output: Option<&'a mut dyn Write>,
}

impl<'a> LazyJsonAdapter<'a> {
    /// Parses the whole of `input`.
    pub fn from_reader(input: &mut dyn Read) -> Self {
        let mut bytes = Vec::new();
        if let Err(err) = input.read_to_end(&mut bytes) {
            tracing::debug!(target: "lz_serial::lazy_json", error = %err, "input unreadable, using empty document");
            bytes.clear();
        }
        Self::parse(&String::from_utf8_lossy(&bytes))
    }

    /// Parses `text`.
    pub fn parse(text: &str) -> Self {
        let mut parser = Parser {
            bytes: text.as_bytes(),
            text,
            pos: 0,
            nodes: vec![JsonValue::Null],
        };
        let root = parser.value(0);
        let mut nodes = parser.nodes;
        nodes[0] = match root {
            root @ (JsonValue::Object(_) | JsonValue::Array(_)) => root,
            _ => {
                tracing::debug!(target: "lz_serial::lazy_json", "input is not a JSON object, using empty document");
                JsonValue::Object(HashMap::default())
            }
        };
        Self {
            nodes,
            output: None,
        }
    }

    /// Starts an empty object that is rendered into `output` on
    /// [`finish_serialization`](Adapter::finish_serialization).
    pub fn to_writer(output: &'a mut dyn Write) -> Self {
        Self {
            nodes: vec![JsonValue::Object(HashMap::default())],
            output: Some(output),
        }
    }

    /// Whether this adapter was opened for writing.
    #[inline]
    pub fn is_serializing(&self) -> bool {
        self.output.is_some()
    }

    /// Renders the current document as compact JSON.
    pub fn to_json_string(&self) -> String {
        let mut out = String::new();
        self.render(Node::ROOT, &mut out);
        out
    }

    fn get(&self, node: Node) -> &JsonValue {
        static NULL: JsonValue = JsonValue::Null;
        self.nodes.get(node.index()).unwrap_or(&NULL)
    }

    fn push(&mut self, value: JsonValue) -> Node {
        let node = Node::from_index(self.nodes.len());
        self.nodes.push(value);
        node
    }

    fn slot(&mut self, node: Node) -> Option<&mut JsonValue> {
        self.nodes.get_mut(node.index())
    }

    fn render(&self, node: Node, out: &mut String) {
        match self.get(node) {
            JsonValue::Null => out.push_str("null"),
            JsonValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            JsonValue::Number(raw) => out.push_str(raw),
            JsonValue::String(raw) => {
                out.push('"');
                out.push_str(raw);
                out.push('"');
            }
            JsonValue::Object(members) => {
                out.push('{');
                for (i, (key, child)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push('"');
                    escape_into(key, out);
                    out.push_str("\":");
                    self.render(*child, out);
                }
                out.push('}');
            }
            JsonValue::Array(elements) => {
                out.push('[');
                for (i, child) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.render(*child, out);
                }
                out.push(']');
            }
        }
    }
}

impl Adapter for LazyJsonAdapter<'_> {
    #[inline]
    fn root(&self) -> Node {
        Node::ROOT
    }

    fn child(&mut self, node: Node, key: &str) -> Option<Node> {
        if key.is_empty() {
            return Some(node);
        }
        match self.get(node) {
            JsonValue::Object(members) => members.get(key).copied(),
            _ => None,
        }
    }

    fn add_child(&mut self, node: Node, key: &str) -> Node {
        if key.is_empty() {
            return node;
        }
        let child = self.push(JsonValue::Null);
        if let Some(slot) = self.slot(node) {
            if !matches!(slot, JsonValue::Object(_)) {
                *slot = JsonValue::Object(HashMap::default());
            }
            if let JsonValue::Object(members) = slot {
                members.insert(key.to_owned(), child);
            }
        }
        child
    }

    fn is_object(&self, node: Node) -> bool {
        matches!(self.get(node), JsonValue::Object(_))
    }

    fn set_object(&mut self, node: Node) {
        if let Some(slot) = self.slot(node)
            && !matches!(slot, JsonValue::Object(_))
        {
            *slot = JsonValue::Object(HashMap::default());
        }
    }

    fn is_array(&self, node: Node) -> bool {
        matches!(self.get(node), JsonValue::Array(_))
    }

    fn set_array(&mut self, node: Node, len: usize) {
        match self.slot(node) {
            Some(JsonValue::Array(elements)) => elements.reserve(len),
            Some(slot) => *slot = JsonValue::Array(Vec::with_capacity(len)),
            None => {}
        }
    }

    fn array_len(&mut self, node: Node) -> usize {
        match self.get(node) {
            JsonValue::Array(elements) => elements.len(),
            _ => 0,
        }
    }

    fn array_element(&mut self, node: Node, index: usize) -> Option<Node> {
        match self.get(node) {
            JsonValue::Array(elements) => elements.get(index).copied(),
            _ => None,
        }
    }

    fn add_array_element(&mut self, node: Node) -> Node {
        let element = self.push(JsonValue::Null);
        if let Some(slot) = self.slot(node) {
            if !matches!(slot, JsonValue::Array(_)) {
                *slot = JsonValue::Array(Vec::new());
            }
            if let JsonValue::Array(elements) = slot {
                elements.push(element);
            }
        }
        element
    }

    fn get_scalar(&mut self, node: Node, kind: ScalarKind) -> Option<Scalar<'static>> {
        match (self.get(node), kind) {
            (JsonValue::String(raw), ScalarKind::Str) => Some(Scalar::Str(unescape(raw).into())),
            (JsonValue::Bool(v), ScalarKind::Bool) => Some(Scalar::Bool(*v)),
            (JsonValue::Number(raw), kind) if kind.is_integer() => number_as_integer(raw),
            (JsonValue::Number(raw), kind) if kind.is_float() => raw.parse().ok().map(Scalar::F64),
            _ => None,
        }
    }

    fn set_scalar(&mut self, node: Node, value: Scalar<'_>) {
        let value = match value {
            Scalar::Bool(v) => JsonValue::Bool(v),
            Scalar::Str(v) => {
                let mut raw = String::with_capacity(v.len());
                escape_into(&v, &mut raw);
                JsonValue::String(raw)
            }
            Scalar::F32(v) if !v.is_finite() => JsonValue::Null,
            Scalar::F64(v) if !v.is_finite() => JsonValue::Null,
            Scalar::F32(v) => JsonValue::Number(format!("{v:?}")),
            Scalar::F64(v) => JsonValue::Number(format!("{v:?}")),
            number => JsonValue::Number(number.to_string()),
        };
        if let Some(slot) = self.slot(node) {
            *slot = value;
        }
    }

    fn finish_serialization(&mut self) -> Result<(), SerialError> {
        let json = self.to_json_string();
        if let Some(output) = self.output.as_mut() {
            output.write_all(json.as_bytes())?;
            output.flush()?;
        }
        Ok(())
    }
}

/// Integer fields accept fractional literals, truncated toward zero.
fn number_as_integer(raw: &str) -> Option<Scalar<'static>> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(Scalar::I64(v));
    }
    if let Ok(v) = raw.parse::<u64>() {
        return Some(Scalar::U64(v));
    }
    let v = raw.parse::<f64>().ok()?;
    v.is_finite().then(|| Scalar::F64(v.trunc()))
}

// -----------------------------------------------------------------------------
// Parser

struct Parser<'t> {
    bytes: &'t [u8],
    text: &'t str,
    pos: usize,
    nodes: Vec<JsonValue>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_whitespace();
        let hit = self.peek() == Some(byte);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn push(&mut self, value: JsonValue) -> Node {
        let node = Node::from_index(self.nodes.len());
        self.nodes.push(value);
        node
    }

    fn value(&mut self, depth: usize) -> JsonValue {
        self.skip_whitespace();
        if depth > MAX_DEPTH {
            return JsonValue::Null;
        }
        match self.peek() {
            Some(b'{') => self.object(depth),
            Some(b'[') => self.array(depth),
            Some(b'"') => JsonValue::String(self.string().to_owned()),
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(_) => self.literal(),
            None => JsonValue::Null,
        }
    }

    fn object(&mut self, depth: usize) -> JsonValue {
        self.pos += 1;
        let mut members = HashMap::default();
        if self.eat(b'}') {
            return JsonValue::Object(members);
        }
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'"') {
                break;
            }
            let key = unescape(self.string());
            if !self.eat(b':') {
                break;
            }
            let value = self.value(depth + 1);
            let node = self.push(value);
            members.insert(key, node);
            if !self.eat(b',') {
                self.eat(b'}');
                break;
            }
        }
        JsonValue::Object(members)
    }

    fn array(&mut self, depth: usize) -> JsonValue {
        self.pos += 1;
        let mut elements = Vec::new();
        if self.eat(b']') {
            return JsonValue::Array(elements);
        }
        loop {
            let value = self.value(depth + 1);
            elements.push(self.push(value));
            if !self.eat(b',') {
                self.eat(b']');
                break;
            }
        }
        JsonValue::Array(elements)
    }

    /// Escaped contents of the string starting at `pos`.
    fn string(&mut self) -> &str {
        self.pos += 1;
        let start = self.pos;
        while let Some(byte) = self.peek() {
            match byte {
                b'"' => {
                    let end = self.pos;
                    self.pos += 1;
                    return self.text.get(start..end).unwrap_or_default();
                }
                b'\\' => self.pos += 2,
                _ => self.pos += 1,
            }
        }
        // Unterminated, keep what is there.
        self.pos = self.bytes.len();
        self.text.get(start..).unwrap_or_default()
    }

    fn number(&mut self) -> JsonValue {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')) {
            self.pos += 1;
        }
        JsonValue::Number(self.text.get(start..self.pos).unwrap_or_default().to_owned())
    }

    fn literal(&mut self) -> JsonValue {
        let rest = &self.bytes[self.pos..];
        let (value, len) = if rest.starts_with(b"true") {
            (JsonValue::Bool(true), 4)
        } else if rest.starts_with(b"false") {
            (JsonValue::Bool(false), 5)
        } else if rest.starts_with(b"null") {
            (JsonValue::Null, 4)
        } else {
            return JsonValue::Null;
        };
        self.pos += len;
        value
    }
}

// -----------------------------------------------------------------------------
// Escaping

fn escape_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
}

fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => out.push(unicode_escape(&mut chars)),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Decodes the `XXXX` of a `\uXXXX` escape, joining surrogate pairs.
fn unicode_escape(chars: &mut core::str::Chars<'_>) -> char {
    let Some(first) = hex4(chars) else {
        return char::REPLACEMENT_CHARACTER;
    };
    if !(0xD800..0xDC00).contains(&first) {
        return char::from_u32(first).unwrap_or(char::REPLACEMENT_CHARACTER);
    }
    let mut lookahead = chars.clone();
    if lookahead.next() == Some('\\')
        && lookahead.next() == Some('u')
        && let Some(second) = hex4(&mut lookahead)
        && (0xDC00..0xE000).contains(&second)
    {
        *chars = lookahead;
        let code = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
        return char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
    }
    char::REPLACEMENT_CHARACTER
}

fn hex4(chars: &mut core::str::Chars<'_>) -> Option<u32> {
    let mut code = 0;
    for _ in 0..4 {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(build: impl FnOnce(&mut dyn Adapter)) -> String {
        let mut out = Vec::new();
        {
            let mut writer = LazyJson::writer(&mut out);
            assert!(writer.is_serializing());
            build(&mut writer);
            writer.finish_serialization().unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn renders_nested_objects_and_arrays() {
        let json = write(|adapter| {
            let root = adapter.root();
            let child = adapter.add_child(root, "child");
            adapter.set_object(child);
            let id = adapter.add_child(child, "id");
            adapter.set_value(id, &999_i32);

            let list = adapter.add_child(root, "list");
            adapter.set_array(list, 2);
            for v in [1.5_f64, -2.0] {
                let e = adapter.add_array_element(list);
                adapter.set_value(e, &v);
            }
        });
        assert!(json.contains(r#""child":{"id":999}"#));
        assert!(json.contains(r#""list":[1.5,-2.0]"#));
    }

    #[test]
    fn lazy_numbers_follow_requested_type() {
        let mut adapter = LazyJsonAdapter::parse(r#"{"a": 42, "b": 3.75, "c": -1, "d": 1e400}"#);
        let adapter: &mut dyn Adapter = &mut adapter;
        let root = adapter.root();
        let a = adapter.child(root, "a").unwrap();
        let b = adapter.child(root, "b").unwrap();
        let c = adapter.child(root, "c").unwrap();
        let d = adapter.child(root, "d").unwrap();

        assert_eq!(adapter.get_value::<i32>(a), 42);
        assert_eq!(adapter.get_value::<f64>(a), 42.0);
        assert_eq!(adapter.get_value::<i32>(b), 3);
        assert_eq!(adapter.get_value::<f32>(b), 3.75);
        assert_eq!(adapter.get_value::<u32>(c), 0);
        assert_eq!(adapter.get_value::<i64>(d), 0);
        assert_eq!(adapter.get_value::<String>(a), "");
        assert!(!adapter.get_value::<bool>(a));
    }

    #[test]
    fn malformed_input_degrades() {
        for text in ["", "   ", "garbage", "42", "\"str\"", "nul"] {
            let adapter = LazyJsonAdapter::parse(text);
            assert!(adapter.is_object(Node::ROOT), "{text:?}");
            assert!(!adapter.is_serializing());
            assert_eq!(adapter.to_json_string(), "{}");
        }

        let mut partial = LazyJsonAdapter::parse(r#"{"kept": 1, "lost": "#);
        let root = partial.root();
        assert!(partial.child(root, "kept").is_some());
        let lost = partial.child(root, "lost").unwrap();
        assert_eq!(partial.get(lost), &JsonValue::Null);

        let mut truncated = LazyJsonAdapter::parse(r#"{"s": "unterminated"#);
        let s = truncated.child(Node::ROOT, "s").unwrap();
        let adapter: &mut dyn Adapter = &mut truncated;
        assert_eq!(adapter.get_value::<String>(s), "unterminated");
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let text = "[".repeat(MAX_DEPTH * 4);
        let adapter = LazyJsonAdapter::parse(&text);
        assert!(adapter.is_array(Node::ROOT));
    }

    #[test]
    fn string_escapes() {
        let mut raw = String::new();
        escape_into("q\"b\\\u{08}\u{0C}\n\r\t\u{01}é", &mut raw);
        assert_eq!(raw, r#"q\"b\\\b\f\n\r\t\u0001é"#);
        assert_eq!(unescape(&raw), "q\"b\\\u{08}\u{0C}\n\r\t\u{01}é");

        assert_eq!(unescape(r"\u00e9\/"), "é/");
        assert_eq!(unescape(r"\ud83d\ude00"), "\u{1F600}");
        assert_eq!(unescape(r"\ud83d!"), "\u{FFFD}!");
        assert_eq!(unescape(r"\ude00"), "\u{FFFD}");
        assert_eq!(unescape(r"\u12"), "\u{FFFD}");
    }

    #[test]
    fn add_child_replaces_existing_key() {
        let json = write(|adapter| {
            let root = adapter.root();
            let first = adapter.add_child(root, "k");
            adapter.set_value(first, &1_i32);
            let second = adapter.add_child(root, "k");
            adapter.set_value(second, &2_i32);
        });
        assert_eq!(json, r#"{"k":2}"#);
    }

    #[test]
    fn non_finite_floats_become_null() {
        let json = write(|adapter| {
            let root = adapter.root();
            let v = adapter.add_child(root, "v");
            adapter.set_value(v, &f64::NAN);
        });
        assert_eq!(json, r#"{"v":null}"#);
    }

    #[test]
    fn top_level_array() {
        let mut adapter = LazyJsonAdapter::parse("[true, false, null]");
        let root = adapter.root();
        assert_eq!(adapter.array_len(root), 3);
        let first = adapter.array_element(root, 0).unwrap();
        assert!(adapter.array_element(root, 3).is_none());
        let adapter: &mut dyn Adapter = &mut adapter;
        assert!(adapter.get_value::<bool>(first));
    }
}
