//! In-memory document shared by the formats that parse or render a whole
//! document at once.
//!
//! A [`Tree`] is an arena of [`Shape`]s addressed by [`Node`]. A
//! [`TreeSyntax`] converts it from and to bytes, and [`TreeAdapter`] puts
//! the two together into an [`Adapter`].

use core::marker::PhantomData;
use std::io::{Read, Write};

use crate::SerialError;
use crate::document::{Adapter, Node, Scalar, ScalarKind};

// -----------------------------------------------------------------------------
// Tree

/// What a node of a [`Tree`] holds.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Null,
    Scalar(Scalar<'static>),
    /// Members in insertion order.
    Object(Vec<(String, Node)>),
    Array(Vec<Node>),
}

/// Arena document. Slot `0` is the root, an empty object on creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    nodes: Vec<Shape>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Shape::Object(Vec::new())],
        }
    }

    pub fn shape(&self, node: Node) -> &Shape {
        static NULL: Shape = Shape::Null;
        self.nodes.get(node.index()).unwrap_or(&NULL)
    }

    /// Replaces the shape of `node`. Nodes no longer referenced stay allocated.
    pub fn set_shape(&mut self, node: Node, shape: Shape) {
        if let Some(slot) = self.nodes.get_mut(node.index()) {
            *slot = shape;
        }
    }

    fn push(&mut self, shape: Shape) -> Node {
        let node = Node::from_index(self.nodes.len());
        self.nodes.push(shape);
        node
    }

    pub fn child(&self, node: Node, key: &str) -> Option<Node> {
        match self.shape(node) {
            Shape::Object(members) => members
                .iter()
                .find_map(|(k, child)| (k == key).then_some(*child)),
            _ => None,
        }
    }

    /// Creates a `null` member `key`, turning `node` into an object first if needed.
    pub fn add_child(&mut self, node: Node, key: &str) -> Node {
        let child = self.push(Shape::Null);
        self.set_object(node);
        if let Some(Shape::Object(members)) = self.nodes.get_mut(node.index()) {
            match members.iter_mut().find(|(k, _)| k == key) {
                Some((_, slot)) => *slot = child,
                None => members.push((key.to_owned(), child)),
            }
        }
        child
    }

    pub fn set_object(&mut self, node: Node) {
        if let Some(slot) = self.nodes.get_mut(node.index())
            && !matches!(slot, Shape::Object(_))
        {
            *slot = Shape::Object(Vec::new());
        }
    }

    pub fn set_array(&mut self, node: Node, len: usize) {
        match self.nodes.get_mut(node.index()) {
            Some(Shape::Array(elements)) => elements.reserve(len),
            Some(slot) => *slot = Shape::Array(Vec::with_capacity(len)),
            None => {}
        }
    }

    pub fn array_len(&self, node: Node) -> usize {
        match self.shape(node) {
            Shape::Array(elements) => elements.len(),
            _ => 0,
        }
    }

    pub fn array_element(&self, node: Node, index: usize) -> Option<Node> {
        match self.shape(node) {
            Shape::Array(elements) => elements.get(index).copied(),
            _ => None,
        }
    }

    /// Appends a `null` element, turning `node` into an array first if needed.
    pub fn add_array_element(&mut self, node: Node) -> Node {
        let element = self.push(Shape::Null);
        if !matches!(self.shape(node), Shape::Array(_)) {
            self.set_array(node, 0);
        }
        if let Some(Shape::Array(elements)) = self.nodes.get_mut(node.index()) {
            elements.push(element);
        }
        element
    }

    pub fn scalar(&self, node: Node) -> Option<&Scalar<'static>> {
        match self.shape(node) {
            Shape::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn set_scalar(&mut self, node: Node, value: Scalar<'_>) {
        self.set_shape(node, Shape::Scalar(value.into_owned()));
    }
}

// -----------------------------------------------------------------------------
// TreeSyntax

/// Conversion between a [`Tree`] and one text syntax.
pub trait TreeSyntax: 'static {
    /// Name of the syntax, used in logs.
    const NAME: &'static str;

    fn parse(input: &[u8]) -> Result<Tree, SerialError>;

    fn emit(tree: &Tree, output: &mut dyn Write) -> Result<(), SerialError>;

    /// Stores a `serde` value as the subtree at `node`.
    fn import(tree: &mut Tree, node: Node, value: &dyn erased_serde::Serialize) -> bool;

    /// Hands a deserializer over the subtree at `node` to `visit`.
    fn export(
        tree: &Tree,
        node: Node,
        visit: &mut dyn FnMut(&mut dyn erased_serde::Deserializer<'static>),
    );
}

// -----------------------------------------------------------------------------
// TreeAdapter

/// [`Adapter`] over a [`Tree`], parsed up front or rendered at the end.
pub struct TreeAdapter<'a, S: TreeSyntax> {
    tree: Tree,
    output: Option<&'a mut dyn Write>,
    _syntax: PhantomData<S>,
}

impl<'a, S: TreeSyntax> TreeAdapter<'a, S> {
    pub fn from_reader(input: &mut dyn Read) -> Self {
        let mut bytes = Vec::new();
        let tree = match input.read_to_end(&mut bytes) {
            Ok(_) if bytes.iter().all(u8::is_ascii_whitespace) => Tree::new(),
            Ok(_) => S::parse(&bytes).unwrap_or_else(|err| {
                tracing::debug!(target: "lz_serial::tree", syntax = S::NAME, error = %err, "malformed input, using empty document");
                Tree::new()
            }),
            Err(err) => {
                tracing::debug!(target: "lz_serial::tree", syntax = S::NAME, error = %err, "input unreadable, using empty document");
                Tree::new()
            }
        };
        Self::with_tree(tree, None)
    }

    pub fn to_writer(output: &'a mut dyn Write) -> Self {
        Self::with_tree(Tree::new(), Some(output))
    }

    fn with_tree(tree: Tree, output: Option<&'a mut dyn Write>) -> Self {
        Self {
            tree,
            output,
            _syntax: PhantomData,
        }
    }

    /// The document built or parsed so far.
    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }
}

impl<S: TreeSyntax> Adapter for TreeAdapter<'_, S> {
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
        self.tree.add_child(node, key)
    }

    fn is_object(&self, node: Node) -> bool {
        matches!(self.tree.shape(node), Shape::Object(_))
    }

    fn set_object(&mut self, node: Node) {
        self.tree.set_object(node);
    }

    fn is_array(&self, node: Node) -> bool {
        matches!(self.tree.shape(node), Shape::Array(_))
    }

    fn set_array(&mut self, node: Node, len: usize) {
        self.tree.set_array(node, len);
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
        self.tree.set_scalar(node, value);
    }

    fn set_serialized(&mut self, node: Node, value: &dyn erased_serde::Serialize) -> bool {
        S::import(&mut self.tree, node, value)
    }

    fn with_deserializer(
        &mut self,
        node: Node,
        visit: &mut dyn FnMut(&mut dyn erased_serde::Deserializer<'static>),
    ) -> bool {
        S::export(&self.tree, node, visit);
        true
    }

    fn finish_serialization(&mut self) -> Result<(), SerialError> {
        match self.output.as_mut() {
            Some(output) => {
                S::emit(&self.tree, &mut **output)?;
                output.flush()?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}
