//! JSON through `serde_json`.
//!
//! Documents are parsed into a [`Tree`] up front and rendered pretty-printed
//! at the end. Unlike [`LazyJson`](crate::format::LazyJson), object members
//! keep their insertion order and [`Serde`](crate::Serde) fields are supported.

use std::io::{Read, Write};

use serde_json::{Map, Number, Value};

use crate::SerialError;
use crate::adapters::tree::{Shape, Tree, TreeAdapter, TreeSyntax};
use crate::document::{Node, Scalar};
use crate::format::Format;
use crate::multi::TypeDispatchTable;

/// JSON format backed by `serde_json`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Json;

/// [`Adapter`](crate::Adapter) of the [`Json`] format.
pub type JsonAdapter<'a> = TreeAdapter<'a, JsonSyntax>;

impl Format for Json {
    const NAME: &'static str = "json";

    type Adapter<'a> = JsonAdapter<'a>;

    #[inline]
    fn reader<'a>(input: &'a mut dyn Read) -> JsonAdapter<'a> {
        JsonAdapter::from_reader(input)
    }

    #[inline]
    fn writer<'a>(output: &'a mut dyn Write) -> JsonAdapter<'a> {
        JsonAdapter::to_writer(output)
    }

    fn dispatch_table() -> &'static TypeDispatchTable {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new(Json::NAME);
        &TABLE
    }
}

/// [`TreeSyntax`] of [`Json`].
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonSyntax;

impl TreeSyntax for JsonSyntax {
    const NAME: &'static str = "json";

    fn parse(input: &[u8]) -> Result<Tree, SerialError> {
        let value: Value = serde_json::from_slice(input)?;
        let mut tree = Tree::new();
        import_value(&mut tree, Node::ROOT, value);
        Ok(tree)
    }

    fn emit(tree: &Tree, output: &mut dyn Write) -> Result<(), SerialError> {
        serde_json::to_writer_pretty(output, &export_value(tree, Node::ROOT))?;
        Ok(())
    }

    fn import(tree: &mut Tree, node: Node, value: &dyn erased_serde::Serialize) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => {
                import_value(tree, node, value);
                true
            }
            Err(err) => {
                tracing::debug!(target: "lz_serial::json", error = %err, "serde value rejected, leaving node empty");
                false
            }
        }
    }

    fn export(
        tree: &Tree,
        node: Node,
        visit: &mut dyn FnMut(&mut dyn erased_serde::Deserializer<'static>),
    ) {
        let mut erased = <dyn erased_serde::Deserializer>::erase(export_value(tree, node));
        visit(&mut erased);
    }
}

fn import_value(tree: &mut Tree, node: Node, value: Value) {
    match value {
        Value::Null => tree.set_shape(node, Shape::Null),
        Value::Bool(v) => tree.set_scalar(node, Scalar::Bool(v)),
        Value::Number(n) => tree.set_scalar(node, number_scalar(&n)),
        Value::String(s) => tree.set_scalar(node, Scalar::Str(s.into())),
        Value::Array(elements) => {
            tree.set_shape(node, Shape::Array(Vec::with_capacity(elements.len())));
            for element in elements {
                let slot = tree.add_array_element(node);
                import_value(tree, slot, element);
            }
        }
        Value::Object(members) => {
            tree.set_shape(node, Shape::Object(Vec::with_capacity(members.len())));
            for (key, member) in members {
                let slot = tree.add_child(node, &key);
                import_value(tree, slot, member);
            }
        }
    }
}

fn number_scalar(n: &Number) -> Scalar<'static> {
    if let Some(v) = n.as_i64() {
        Scalar::I64(v)
    } else if let Some(v) = n.as_u64() {
        Scalar::U64(v)
    } else {
        Scalar::F64(n.as_f64().unwrap_or_default())
    }
}

fn export_value(tree: &Tree, node: Node) -> Value {
    match tree.shape(node) {
        Shape::Null => Value::Null,
        Shape::Scalar(scalar) => scalar_value(scalar),
        Shape::Array(elements) => elements.iter().map(|e| export_value(tree, *e)).collect(),
        Shape::Object(members) => {
            let mut map = Map::with_capacity(members.len());
            for (key, member) in members {
                map.insert(key.clone(), export_value(tree, *member));
            }
            Value::Object(map)
        }
    }
}

fn scalar_value(scalar: &Scalar<'_>) -> Value {
    match scalar {
        Scalar::Bool(v) => Value::Bool(*v),
        Scalar::I8(v) => Value::from(*v),
        Scalar::I16(v) => Value::from(*v),
        Scalar::I32(v) => Value::from(*v),
        Scalar::I64(v) => Value::from(*v),
        Scalar::U8(v) => Value::from(*v),
        Scalar::U16(v) => Value::from(*v),
        Scalar::U32(v) => Value::from(*v),
        Scalar::U64(v) => Value::from(*v),
        Scalar::F32(v) => float_value(f64::from(*v)),
        Scalar::F64(v) => float_value(*v),
        Scalar::Str(v) => Value::String(v.to_string()),
    }
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}
