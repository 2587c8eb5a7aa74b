//! Line-oriented `path = value` format.
//!
//! ```text
//! # comment
//! name = "studio"
//! volume = 7
//! mixer.gain = 0.5
//! presets.count = 2
//! presets.0 = 1.5
//! presets.1 = 2
//! ```
//!
//! Nodes are dot-joined paths. Arrays carry a `<path>.count` entry next to
//! their `<path>.<index>` elements. Writing goes straight to the output as
//! fields are visited; reading loads every line into a sorted map first.
//!
//! Strings are double-quoted. Backslash, double quote, newline, carriage
//! return and tab are backslash-escaped on write and unescaped on read;
//! other escapes are kept verbatim.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::ops::Bound;

use lz_utils::hash::HashMap;

use crate::SerialError;
use crate::document::{Adapter, Node, Scalar, ScalarKind};
use crate::format::Format;
use crate::multi::TypeDispatchTable;

// -----------------------------------------------------------------------------
// Format

/// The `path = value` text format.
#[derive(Copy, Clone, Debug, Default)]
pub struct Text;

impl Format for Text {
    const NAME: &'static str = "text";

    type Adapter<'a> = TextAdapter<'a>;

    #[inline]
    fn reader<'a>(input: &'a mut dyn Read) -> TextAdapter<'a> {
        TextAdapter::from_reader(input)
    }

    #[inline]
    fn writer<'a>(output: &'a mut dyn Write) -> TextAdapter<'a> {
        TextAdapter::to_writer(output)
    }

    fn dispatch_table() -> &'static TypeDispatchTable {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new(Text::NAME);
        &TABLE
    }
}

// -----------------------------------------------------------------------------
// Adapter

enum Mode<'a> {
    Read(BTreeMap<String, String>),
    Write {
        output: &'a mut dyn Write,
        error: Option<io::Error>,
    },
}

/// [`Adapter`] of the [`Text`] format.
pub struct TextAdapter<'a> {
    /// Node `n` designates `paths[n]`. The root is the empty path.
    paths: Vec<String>,
    interned: HashMap<String, Node>,
    /// Next element index of every array being written.
    counters: HashMap<Node, usize>,
    mode: Mode<'a>,
}

impl<'a> TextAdapter<'a> {
    fn with_mode(mode: Mode<'a>) -> Self {
        let mut interned = HashMap::default();
        interned.insert(String::new(), Node::ROOT);
        Self {
            paths: vec![String::new()],
            interned,
            counters: HashMap::default(),
            mode,
        }
    }

    /// Reads the whole of `input` and parses it.
    ///
    /// An unreadable stream behaves like an empty document.
    pub fn from_reader(input: &mut dyn Read) -> Self {
        let mut bytes = Vec::new();
        if let Err(err) = input.read_to_end(&mut bytes) {
            tracing::debug!(target: "lz_serial::text", error = %err, "input unreadable, using empty document");
            bytes.clear();
        }
        Self::with_mode(Mode::Read(parse_lines(&String::from_utf8_lossy(&bytes))))
    }

    /// Starts a document written line by line into `output`.
    pub fn to_writer(output: &'a mut dyn Write) -> Self {
        Self::with_mode(Mode::Write {
            output,
            error: None,
        })
    }

    fn path(&self, node: Node) -> &str {
        self.paths.get(node.index()).map_or("", String::as_str)
    }

    fn join(&self, node: Node, key: &str) -> String {
        let parent = self.path(node);
        if parent.is_empty() {
            key.to_owned()
        } else {
            format!("{parent}.{key}")
        }
    }

    fn intern(&mut self, path: String) -> Node {
        if let Some(node) = self.interned.get(&path) {
            return *node;
        }
        let node = Node::from_index(self.paths.len());
        self.paths.push(path.clone());
        self.interned.insert(path, node);
        node
    }

    fn data(&self) -> Option<&BTreeMap<String, String>> {
        match &self.mode {
            Mode::Read(data) => Some(data),
            Mode::Write { .. } => None,
        }
    }

    fn raw(&self, node: Node) -> Option<&str> {
        self.data()?.get(self.path(node)).map(String::as_str)
    }

    fn has_prefix(data: &BTreeMap<String, String>, prefix: &str) -> bool {
        data.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .next()
            .is_some_and(|(key, _)| key.starts_with(prefix))
    }

    fn write_line(&mut self, path: &str, value: &str) {
        if let Mode::Write { output, error } = &mut self.mode
            && error.is_none()
            && let Err(err) = writeln!(output, "{path} = {value}")
        {
            *error = Some(err);
        }
    }
}

impl Adapter for TextAdapter<'_> {
    #[inline]
    fn root(&self) -> Node {
        Node::ROOT
    }

    fn child(&mut self, node: Node, key: &str) -> Option<Node> {
        if key.is_empty() {
            return Some(node);
        }
        let path = self.join(node, key);
        let data = self.data()?;
        if data.contains_key(&path) || Self::has_prefix(data, &format!("{path}.")) {
            Some(self.intern(path))
        } else {
            None
        }
    }

    fn add_child(&mut self, node: Node, key: &str) -> Node {
        if key.is_empty() {
            return node;
        }
        let path = self.join(node, key);
        self.intern(path)
    }

    fn is_object(&self, node: Node) -> bool {
        let path = self.path(node);
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}.")
        };
        self.data()
            .is_some_and(|data| Self::has_prefix(data, &prefix))
    }

    #[inline]
    fn set_object(&mut self, _node: Node) {
        // Objects are implied by their member paths.
    }

    fn is_array(&self, node: Node) -> bool {
        let count = format!("{}.count", self.path(node));
        self.data().is_some_and(|data| data.contains_key(&count))
    }

    fn set_array(&mut self, node: Node, len: usize) {
        if matches!(self.mode, Mode::Read(_)) {
            return;
        }
        let count = format!("{}.count", self.path(node));
        self.write_line(&count, &len.to_string());
        self.counters.insert(node, 0);
    }

    fn array_len(&mut self, node: Node) -> usize {
        let count = format!("{}.count", self.path(node));
        self.data()
            .and_then(|data| data.get(&count))
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    fn array_element(&mut self, node: Node, index: usize) -> Option<Node> {
        let path = self.join(node, &index.to_string());
        Some(self.intern(path))
    }

    fn add_array_element(&mut self, node: Node) -> Node {
        let counter = self.counters.entry(node).or_insert(0);
        let index = *counter;
        *counter += 1;
        let path = self.join(node, &index.to_string());
        self.intern(path)
    }

    fn get_scalar(&mut self, node: Node, kind: ScalarKind) -> Option<Scalar<'static>> {
        decode(self.raw(node)?, kind)
    }

    fn set_scalar(&mut self, node: Node, value: Scalar<'_>) {
        if matches!(self.mode, Mode::Read(_)) {
            return;
        }
        let text = match &value {
            Scalar::Str(s) => quote(s),
            other => other.to_string(),
        };
        let path = self.path(node).to_owned();
        self.write_line(&path, &text);
    }

    fn finish_serialization(&mut self) -> Result<(), SerialError> {
        match &mut self.mode {
            Mode::Read(_) => Ok(()),
            Mode::Write { output, error } => match error.take() {
                Some(err) => Err(err.into()),
                None => output.flush().map_err(SerialError::from),
            },
        }
    }
}

// -----------------------------------------------------------------------------
// Helpers

fn parse_lines(text: &str) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            tracing::trace!(target: "lz_serial::text", line, "skipping line without `=`");
            continue;
        };
        let key = key.trim();
        if !key.is_empty() {
            data.insert(key.to_owned(), value.trim().to_owned());
        }
    }
    data
}

fn decode(raw: &str, kind: ScalarKind) -> Option<Scalar<'static>> {
    Some(match kind {
        ScalarKind::Str => Scalar::Str(unquote(raw).into()),
        ScalarKind::Bool => Scalar::Bool(raw == "true"),
        ScalarKind::I8 => Scalar::I8(raw.parse().ok()?),
        ScalarKind::I16 => Scalar::I16(raw.parse().ok()?),
        ScalarKind::I32 => Scalar::I32(raw.parse().ok()?),
        ScalarKind::I64 => Scalar::I64(raw.parse().ok()?),
        ScalarKind::U8 => Scalar::U8(raw.parse().ok()?),
        ScalarKind::U16 => Scalar::U16(raw.parse().ok()?),
        ScalarKind::U32 => Scalar::U32(raw.parse().ok()?),
        ScalarKind::U64 => Scalar::U64(raw.parse().ok()?),
        ScalarKind::F32 => Scalar::F32(raw.parse().ok()?),
        ScalarKind::F64 => Scalar::F64(raw.parse().ok()?),
    })
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return raw.to_owned();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str) -> TextAdapter<'static> {
        TextAdapter::from_reader(&mut text.as_bytes())
    }

    #[test]
    fn writes_lines_as_fields_are_visited() {
        let mut out = Vec::new();
        {
            let mut writer = Text::writer(&mut out);
            let adapter: &mut dyn Adapter = &mut writer;
            let root = adapter.root();

            let name = adapter.add_child(root, "stringField");
            adapter.set_value(name, &"hello".to_string());
            let int = adapter.add_child(root, "intField");
            adapter.set_value(int, &42_i32);

            let nested = adapter.add_child(root, "nested");
            adapter.set_object(nested);
            let inner = adapter.add_child(nested, "intField");
            adapter.set_value(inner, &999_i32);

            adapter.finish_serialization().unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "stringField = \"hello\"\nintField = 42\nnested.intField = 999\n"
        );
    }

    #[test]
    fn array_counters_are_per_array() {
        let mut out = Vec::new();
        {
            let mut writer = Text::writer(&mut out);
            let adapter: &mut dyn Adapter = &mut writer;
            let root = adapter.root();

            let outer = adapter.add_child(root, "grid");
            adapter.set_array(outer, 2);
            for row in [[1_i32, 2], [3, 4]] {
                let row_node = adapter.add_array_element(outer);
                adapter.set_array(row_node, row.len());
                for value in row {
                    let cell = adapter.add_array_element(row_node);
                    adapter.set_value(cell, &value);
                }
            }
            adapter.finish_serialization().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "grid.count = 2\ngrid.0.count = 2\ngrid.0.0 = 1\ngrid.0.1 = 2\n\
             grid.1.count = 2\ngrid.1.0 = 3\ngrid.1.1 = 4\n"
        );
    }

    #[test]
    fn parsing_skips_comments_and_blank_lines() {
        let mut adapter = reader("# header\n\n  name =  \"a = b\"  \ncount=3\nbroken line\n");
        let adapter: &mut dyn Adapter = &mut adapter;
        let root = adapter.root();

        let name = adapter.child(root, "name").unwrap();
        assert_eq!(adapter.get_value::<String>(name), "a = b");
        let count = adapter.child(root, "count").unwrap();
        assert_eq!(adapter.get_value::<u8>(count), 3);
        assert!(adapter.child(root, "broken line").is_none());
    }

    #[test]
    fn objects_and_arrays_are_detected_by_path() {
        let mut adapter = reader("a.b = 1\nlist.count = 2\nlist.0 = 5\nlist.1 = 6\n");
        let root = adapter.root();

        let a = adapter.child(root, "a").unwrap();
        assert!(adapter.is_object(a));
        assert!(!adapter.is_array(a));

        let list = adapter.child(root, "list").unwrap();
        assert!(adapter.is_array(list));
        assert_eq!(adapter.array_len(list), 2);

        let second = adapter.array_element(list, 1).unwrap();
        let adapter: &mut dyn Adapter = &mut adapter;
        assert_eq!(adapter.get_value::<i64>(second), 6);
        assert!(adapter.child(root, "missing").is_none());
        assert_eq!(adapter.child(root, ""), Some(root));
    }

    #[test]
    fn mismatch_reads_default() {
        let mut adapter = reader("number = \"text\"\nflag = yes\nsmall = 300\n");
        let adapter: &mut dyn Adapter = &mut adapter;
        let root = adapter.root();

        let number = adapter.child(root, "number").unwrap();
        assert_eq!(adapter.get_value::<i32>(number), 0);
        let flag = adapter.child(root, "flag").unwrap();
        assert!(!adapter.get_value::<bool>(flag));
        let small = adapter.child(root, "small").unwrap();
        assert_eq!(adapter.get_value::<u8>(small), 0);
    }

    #[test]
    fn strings_are_escaped() {
        let original = "say \"hi\"\n\tpath\\to";
        assert_eq!(quote(original), r#""say \"hi\"\n\tpath\\to""#);
        assert_eq!(unquote(&quote(original)), original);
        assert_eq!(unquote(r#""keep \x""#), r"keep \x");
        assert_eq!(unquote("bare"), "bare");
    }

    #[test]
    fn floats_round_trip_exactly() {
        for value in [0.1_f64, 3.14159265358979, 1e-300, -2.5e17, f64::MAX] {
            let text = Scalar::F64(value).to_string();
            assert_eq!(decode(&text, ScalarKind::F64), Some(Scalar::F64(value)));
        }
    }

    #[test]
    fn writes_are_ignored_while_reading() {
        let mut adapter = reader("x = 1\n");
        let root = adapter.root();
        let x = adapter.add_child(root, "x");
        adapter.set_scalar(x, Scalar::I32(9));
        adapter.set_array(x, 4);
        let adapter: &mut dyn Adapter = &mut adapter;
        assert_eq!(adapter.get_value::<i32>(x), 1);
    }

    #[test]
    fn write_errors_surface_on_finish() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut sink = Broken;
        let mut writer = Text::writer(&mut sink);
        let root = writer.root();
        let node = writer.add_child(root, "a");
        writer.set_scalar(node, Scalar::Bool(true));
        assert!(matches!(
            writer.finish_serialization(),
            Err(SerialError::Io(_))
        ));
    }
}
