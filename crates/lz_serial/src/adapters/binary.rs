//! Positional little-endian binary format.
//!
//! There is no framing: scalars are written in visit order and read back in
//! the same order, so a document can only be decoded by the type that wrote
//! it. Keys and nesting are ignored.
//!
//! | Value | Encoding |
//! |-------|----------|
//! | `bool` | one byte, `0` or `1` |
//! | integers, floats | native width, little-endian |
//! | `String` | `u32` byte length, then UTF-8 bytes |
//! | array | `u32` element count, then the elements |
//!
//! Reading past the end yields zero values for the rest of the document.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::SerialError;
use crate::document::{Adapter, Node, Scalar, ScalarKind};
use crate::format::Format;
use crate::multi::TypeDispatchTable;

/// The positional binary format.
#[derive(Copy, Clone, Debug, Default)]
pub struct Binary;

impl Format for Binary {
    const NAME: &'static str = "binary";

    type Adapter<'a> = BinaryAdapter<'a>;

    #[inline]
    fn reader<'a>(input: &'a mut dyn Read) -> BinaryAdapter<'a> {
        BinaryAdapter::from_reader(input)
    }

    #[inline]
    fn writer<'a>(output: &'a mut dyn Write) -> BinaryAdapter<'a> {
        BinaryAdapter::to_writer(output)
    }

    fn dispatch_table() -> &'static TypeDispatchTable {
        static TABLE: TypeDispatchTable = TypeDispatchTable::new(Binary::NAME);
        &TABLE
    }
}

enum Mode<'a> {
    Read {
        input: &'a mut dyn Read,
        exhausted: bool,
    },
    Write {
        output: &'a mut dyn Write,
        error: Option<io::Error>,
    },
}

/// [`Adapter`] of the [`Binary`] format.
///
/// Every node handle is the root; the adapter only tracks the stream position.
pub struct BinaryAdapter<'a> {
    mode: Mode<'a>,
}

impl<'a> BinaryAdapter<'a> {
    pub fn from_reader(input: &'a mut dyn Read) -> Self {
        Self {
            mode: Mode::Read {
                input,
                exhausted: false,
            },
        }
    }

    pub fn to_writer(output: &'a mut dyn Write) -> Self {
        Self {
            mode: Mode::Write {
                output,
                error: None,
            },
        }
    }

    /// Runs `f` against the input unless an earlier read already ran short.
    fn read<T>(&mut self, f: impl FnOnce(&mut dyn Read) -> io::Result<T>) -> Option<T> {
        let Mode::Read { input, exhausted } = &mut self.mode else {
            return None;
        };
        if *exhausted {
            return None;
        }
        match f(&mut **input) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(target: "lz_serial::binary", error = %err, "input exhausted, remaining fields read as defaults");
                *exhausted = true;
                None
            }
        }
    }

    fn write(&mut self, f: impl FnOnce(&mut dyn Write) -> io::Result<()>) {
        if let Mode::Write { output, error } = &mut self.mode
            && error.is_none()
            && let Err(err) = f(&mut **output)
        {
            *error = Some(err);
        }
    }

    fn read_string(&mut self) -> Option<String> {
        let bytes = self.read(|input| {
            let len = input.read_u32::<LittleEndian>()? as u64;
            let mut bytes = Vec::new();
            input.take(len).read_to_end(&mut bytes)?;
            if (bytes.len() as u64) < len {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            Ok(bytes)
        })?;
        String::from_utf8(bytes).ok()
    }
}

impl Adapter for BinaryAdapter<'_> {
    #[inline]
    fn root(&self) -> Node {
        Node::ROOT
    }

    #[inline]
    fn child(&mut self, _node: Node, _key: &str) -> Option<Node> {
        Some(Node::ROOT)
    }

    #[inline]
    fn add_child(&mut self, _node: Node, _key: &str) -> Node {
        Node::ROOT
    }

    #[inline]
    fn is_object(&self, _node: Node) -> bool {
        true
    }

    #[inline]
    fn set_object(&mut self, _node: Node) {}

    #[inline]
    fn is_array(&self, _node: Node) -> bool {
        true
    }

    fn set_array(&mut self, _node: Node, len: usize) {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        self.write(|out| out.write_u32::<LittleEndian>(len));
    }

    fn array_len(&mut self, _node: Node) -> usize {
        self.read(|input| input.read_u32::<LittleEndian>())
            .map_or(0, |len| len as usize)
    }

    #[inline]
    fn array_element(&mut self, _node: Node, _index: usize) -> Option<Node> {
        Some(Node::ROOT)
    }

    #[inline]
    fn add_array_element(&mut self, _node: Node) -> Node {
        Node::ROOT
    }

    fn get_scalar(&mut self, _node: Node, kind: ScalarKind) -> Option<Scalar<'static>> {
        type LE = LittleEndian;
        match kind {
            ScalarKind::Bool => self.read(|i| i.read_u8()).map(|v| Scalar::Bool(v != 0)),
            ScalarKind::I8 => self.read(|i| i.read_i8()).map(Scalar::I8),
            ScalarKind::I16 => self.read(|i| i.read_i16::<LE>()).map(Scalar::I16),
            ScalarKind::I32 => self.read(|i| i.read_i32::<LE>()).map(Scalar::I32),
            ScalarKind::I64 => self.read(|i| i.read_i64::<LE>()).map(Scalar::I64),
            ScalarKind::U8 => self.read(|i| i.read_u8()).map(Scalar::U8),
            ScalarKind::U16 => self.read(|i| i.read_u16::<LE>()).map(Scalar::U16),
            ScalarKind::U32 => self.read(|i| i.read_u32::<LE>()).map(Scalar::U32),
            ScalarKind::U64 => self.read(|i| i.read_u64::<LE>()).map(Scalar::U64),
            ScalarKind::F32 => self.read(|i| i.read_f32::<LE>()).map(Scalar::F32),
            ScalarKind::F64 => self.read(|i| i.read_f64::<LE>()).map(Scalar::F64),
            ScalarKind::Str => self.read_string().map(|s| Scalar::Str(s.into())),
        }
    }

    fn set_scalar(&mut self, _node: Node, value: Scalar<'_>) {
        type LE = LittleEndian;
        self.write(|o| match value {
            Scalar::Bool(v) => o.write_u8(v.into()),
            Scalar::I8(v) => o.write_i8(v),
            Scalar::I16(v) => o.write_i16::<LE>(v),
            Scalar::I32(v) => o.write_i32::<LE>(v),
            Scalar::I64(v) => o.write_i64::<LE>(v),
            Scalar::U8(v) => o.write_u8(v),
            Scalar::U16(v) => o.write_u16::<LE>(v),
            Scalar::U32(v) => o.write_u32::<LE>(v),
            Scalar::U64(v) => o.write_u64::<LE>(v),
            Scalar::F32(v) => o.write_f32::<LE>(v),
            Scalar::F64(v) => o.write_f64::<LE>(v),
            Scalar::Str(v) => {
                let len = u32::try_from(v.len())
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
                o.write_u32::<LE>(len)?;
                o.write_all(v.as_bytes())
            }
        });
    }

    fn finish_serialization(&mut self) -> Result<(), SerialError> {
        match &mut self.mode {
            Mode::Read { .. } => Ok(()),
            Mode::Write { output, error } => match error.take() {
                Some(err) => Err(err.into()),
                None => output.flush().map_err(SerialError::from),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_layout() {
        let mut out = Vec::new();
        {
            let mut writer = Binary::writer(&mut out);
            let adapter: &mut dyn Adapter = &mut writer;
            let root = adapter.root();
            adapter.set_value(root, &0x0102_0304_i32);
            adapter.set_value(root, &true);
            adapter.set_value(root, &"hi".to_string());
            adapter.set_array(root, 3);
            adapter.finish_serialization().unwrap();
        }
        assert_eq!(
            out,
            [4, 3, 2, 1, 1, 2, 0, 0, 0, b'h', b'i', 3, 0, 0, 0]
        );
    }

    #[test]
    fn f64_is_bit_exact() {
        let mut out = Vec::new();
        {
            let mut writer = Binary::writer(&mut out);
            let adapter: &mut dyn Adapter = &mut writer;
            adapter.set_value(Node::ROOT, &3.14159265358979_f64);
            adapter.finish_serialization().unwrap();
        }
        assert_eq!(out, 3.14159265358979_f64.to_le_bytes());

        let mut input = out.as_slice();
        let mut reader = Binary::reader(&mut input);
        let adapter: &mut dyn Adapter = &mut reader;
        assert_eq!(adapter.get_value::<f64>(Node::ROOT), 3.14159265358979);
    }

    #[test]
    fn short_input_yields_defaults() {
        let bytes = [7_u8, 0, 0, 0, 9];
        let mut input = &bytes[..];
        let mut reader = Binary::reader(&mut input);
        let adapter: &mut dyn Adapter = &mut reader;
        assert_eq!(adapter.get_value::<u32>(Node::ROOT), 7);
        assert_eq!(adapter.get_value::<u32>(Node::ROOT), 0);
        // Once short, stays short even though one byte is left.
        assert_eq!(adapter.get_value::<u8>(Node::ROOT), 0);
        assert_eq!(adapter.array_len(Node::ROOT), 0);
    }

    #[test]
    fn truncated_string_reads_empty() {
        let bytes = [5_u8, 0, 0, 0, b'a', b'b'];
        let mut input = &bytes[..];
        let mut reader = Binary::reader(&mut input);
        let adapter: &mut dyn Adapter = &mut reader;
        assert_eq!(adapter.get_value::<String>(Node::ROOT), "");
    }

    #[test]
    fn invalid_utf8_reads_empty() {
        let bytes = [2_u8, 0, 0, 0, 0xFF, 0xFE, 1];
        let mut input = &bytes[..];
        let mut reader = Binary::reader(&mut input);
        let adapter: &mut dyn Adapter = &mut reader;
        assert_eq!(adapter.get_value::<String>(Node::ROOT), "");
        // The bytes were consumed, the stream stays aligned.
        assert!(adapter.get_value::<bool>(Node::ROOT));
    }

    #[test]
    fn every_node_is_present() {
        let mut input: &[u8] = &[];
        let mut reader = Binary::reader(&mut input);
        let root = reader.root();
        assert_eq!(reader.child(root, "anything"), Some(root));
        assert_eq!(reader.array_element(root, 12), Some(root));
        assert!(reader.is_object(root));
        assert!(reader.is_array(root));
    }
}
