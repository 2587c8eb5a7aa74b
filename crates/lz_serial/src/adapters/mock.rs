//! Recording adapter for tests.
//!
//! [`MockAdapter`] keeps its document in memory and logs every shape or
//! value change as an `(operation, detail)` pair:
//!
//! | Operation | Detail |
//! |-----------|--------|
//! | `setObject` | node key |
//! | `setArray` | `key[len]` |
//! | `setValue` | `key=value` |
//!
//! Array elements have an empty key. The same adapter can be written and
//! then read back, which makes it handy for exercising codecs without a
//! wire format. Through [`Mock`] it ignores its input and writes the literal
//! `mock_output`.

use std::io::{Read, Write};

use lz_utils::hash::HashMap;

use crate::SerialError;
use crate::adapters::tree::{Shape, Tree};
use crate::document::{Adapter, Node, Scalar, ScalarKind};
use crate::format::Format;
use crate::multi::TypeDispatchTable;

/// The recording test format.
#[derive(Copy, Clone, Debug, Default)]
pub struct Mock;

impl Format for Mock {
    const NAME: &'static str = "mock";

    type Adapter<'a> = MockAdapter<'a>;

    fn reader<'a>(_input: &'a mut dyn Read) -> MockAdapter<'a> {
        MockAdapter::new()
    }

    fn writer<'a>(output: &'a mut dyn Write) -> MockAdapter<'a> {
        MockAdapter {
            output: Some(output),
            ..MockAdapter::new()
        }
    }

    fn dispatch_table() -> &'static TypeDispatchTable {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new(Mock::NAME);
        &TABLE
    }
}

/// [`Adapter`] of the [`Mock`] format.
#[derive(Default)]
pub struct MockAdapter<'a> {
    tree: Tree,
    keys: HashMap<Node, String>,
    operations: Vec<(String, String)>,
    output: Option<&'a mut dyn Write>,
}

impl MockAdapter<'_> {
    /// An adapter with an empty root object and no output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded `(operation, detail)` pair, oldest first.
    #[inline]
    pub fn operations(&self) -> &[(String, String)] {
        &self.operations
    }

    /// Whether `op` was recorded with a detail containing `detail`.
    ///
    /// An empty `detail` matches any detail.
    pub fn has_operation(&self, op: &str, detail: &str) -> bool {
        self.operations
            .iter()
            .any(|(o, d)| o == op && (detail.is_empty() || d.contains(detail)))
    }

    pub fn clear_operations(&mut self) {
        self.operations.clear();
    }

    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    fn key(&self, node: Node) -> &str {
        self.keys.get(&node).map_or("", String::as_str)
    }

    fn record(&mut self, op: &str, detail: String) {
        self.operations.push((op.to_owned(), detail));
    }
}

impl Adapter for MockAdapter<'_> {
    #[inline]
    fn root(&self) -> Node {
        Node::ROOT
    }

    fn child(&mut self, node: Node, key: &str) -> Option<Node> {
        if key.is_empty() {
            return Some(node);
        }
        self.tree.child(node, key)
    }

    fn add_child(&mut self, node: Node, key: &str) -> Node {
        if key.is_empty() {
            return node;
        }
        let child = self.tree.add_child(node, key);
        self.keys.insert(child, key.to_owned());
        child
    }

    fn is_object(&self, node: Node) -> bool {
        matches!(self.tree.shape(node), Shape::Object(_))
    }

    fn set_object(&mut self, node: Node) {
        self.tree.set_object(node);
        let key = self.key(node).to_owned();
        self.record("setObject", key);
    }

    fn is_array(&self, node: Node) -> bool {
        matches!(self.tree.shape(node), Shape::Array(_))
    }

    fn set_array(&mut self, node: Node, len: usize) {
        self.tree.set_array(node, len);
        let detail = format!("{}[{len}]", self.key(node));
        self.record("setArray", detail);
    }

    fn array_len(&mut self, node: Node) -> usize {
        self.tree.array_len(node)
    }

    fn array_element(&mut self, node: Node, index: usize) -> Option<Node> {
        self.tree.array_element(node, index)
    }

    fn add_array_element(&mut self, node: Node) -> Node {
        self.tree.add_array_element(node)
    }

    fn get_scalar(&mut self, node: Node, _kind: ScalarKind) -> Option<Scalar<'static>> {
        self.tree.scalar(node).cloned()
    }

    fn set_scalar(&mut self, node: Node, value: Scalar<'_>) {
        let detail = format!("{}={value}", self.key(node));
        self.tree.set_scalar(node, value);
        self.record("setValue", detail);
    }

    fn finish_serialization(&mut self) -> Result<(), SerialError> {
        if let Some(output) = self.output.as_mut() {
            output.write_all(b"mock_output")?;
            output.flush()?;
        }
        Ok(())
    }
}
