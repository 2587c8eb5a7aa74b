//! YAML through `serde_yaml`.
//!
//! Works like the [`Json`](crate::format::Json) format on top of a
//! [`Tree`]. Mapping keys that are booleans or numbers are read as their
//! text form; other non-string keys are skipped. Tags are dropped.

use std::io::{Read, Write};

use serde_yaml::{Mapping, Number, Value};

use crate::SerialError;
use crate::adapters::tree::{Shape, Tree, TreeAdapter, TreeSyntax};
use crate::document::{Node, Scalar};
use crate::format::Format;
use crate::multi::TypeDispatchTable;

/// YAML format backed by `serde_yaml`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Yaml;

/// [`Adapter`](crate::Adapter) of the [`Yaml`] format.
pub type YamlAdapter<'a> = TreeAdapter<'a, YamlSyntax>;

impl Format for Yaml {
    const NAME: &'static str = "yaml";

    type Adapter<'a> = YamlAdapter<'a>;

    #[inline]
    fn reader<'a>(input: &'a mut dyn Read) -> YamlAdapter<'a> {
        YamlAdapter::from_reader(input)
    }

    #[inline]
    fn writer<'a>(output: &'a mut dyn Write) -> YamlAdapter<'a> {
        YamlAdapter::to_writer(output)
    }

    fn dispatch_table() -> &'static TypeDispatchTable {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new(Yaml::NAME);
        &TABLE
    }
}

/// [`TreeSyntax`] of [`Yaml`].
#[derive(Copy, Clone, Debug, Default)]
pub struct YamlSyntax;

impl TreeSyntax for YamlSyntax {
    const NAME: &'static str = "yaml";

    fn parse(input: &[u8]) -> Result<Tree, SerialError> {
        let value: Value = serde_yaml::from_slice(input)?;
        let mut tree = Tree::new();
        import_value(&mut tree, Node::ROOT, value);
        Ok(tree)
    }

    fn emit(tree: &Tree, output: &mut dyn Write) -> Result<(), SerialError> {
        serde_yaml::to_writer(output, &export_value(tree, Node::ROOT))?;
        Ok(())
    }

    fn import(tree: &mut Tree, node: Node, value: &dyn erased_serde::Serialize) -> bool {
        match serde_yaml::to_value(value) {
            Ok(value) => {
                import_value(tree, node, value);
                true
            }
            Err(err) => {
                tracing::debug!(target: "lz_serial::yaml", error = %err, "serde value rejected, leaving node empty");
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
        Value::Sequence(elements) => {
            tree.set_shape(node, Shape::Array(Vec::with_capacity(elements.len())));
            for element in elements {
                let slot = tree.add_array_element(node);
                import_value(tree, slot, element);
            }
        }
        Value::Mapping(members) => {
            tree.set_shape(node, Shape::Object(Vec::with_capacity(members.len())));
            for (key, member) in members {
                let key = match key {
                    Value::String(s) => s,
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => continue,
                };
                let slot = tree.add_child(node, &key);
                import_value(tree, slot, member);
            }
        }
        Value::Tagged(tagged) => import_value(tree, node, tagged.value),
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
        Shape::Array(elements) => {
            Value::Sequence(elements.iter().map(|e| export_value(tree, *e)).collect())
        }
        Shape::Object(members) => {
            let mut map = Mapping::with_capacity(members.len());
            for (key, member) in members {
                map.insert(Value::String(key.clone()), export_value(tree, *member));
            }
            Value::Mapping(map)
        }
    }
}

fn scalar_value(scalar: &Scalar<'_>) -> Value {
    match scalar {
        Scalar::Bool(v) => Value::Bool(*v),
        Scalar::I8(v) => Value::Number(i64::from(*v).into()),
        Scalar::I16(v) => Value::Number(i64::from(*v).into()),
        Scalar::I32(v) => Value::Number(i64::from(*v).into()),
        Scalar::I64(v) => Value::Number((*v).into()),
        Scalar::U8(v) => Value::Number(u64::from(*v).into()),
        Scalar::U16(v) => Value::Number(u64::from(*v).into()),
        Scalar::U32(v) => Value::Number(u64::from(*v).into()),
        Scalar::U64(v) => Value::Number((*v).into()),
        Scalar::F32(v) => Value::Number(f64::from(*v).into()),
        Scalar::F64(v) => Value::Number((*v).into()),
        Scalar::Str(v) => Value::String(v.to_string()),
    }
}
