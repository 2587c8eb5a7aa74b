use lz_serial::{Reflect, Serializable, format::Text};

#[derive(Reflect, Default, Debug, PartialEq)]
#[reflect(format = Text)]
struct Basic {
    #[reflect(rename = "stringField")]
    string_field: String,
    #[reflect(rename = "intField")]
    int_field: i32,
}

#[derive(Reflect, Default, Debug, PartialEq)]
#[reflect(format = Text)]
struct Numbers {
    values: Vec<i32>,
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Inner {
    id: u64,
    label: String,
}

#[derive(Reflect, Default, Debug, PartialEq)]
#[reflect(format = Text)]
struct Outer {
    title: String,
    inner: Inner,
    grid: Vec<Vec<i16>>,
    flags: Vec<bool>,
    ratio: f32,
}

#[derive(Reflect, Default, Debug, PartialEq)]
#[reflect(format = Text)]
struct Spaced {
    #[reflect(rename = "max size")]
    max_size: u32,
    #[reflect(rename = "user-name")]
    user_name: String,
    r#type: u8,
}

fn to_text<T: Serializable>(value: &T) -> String {
    let mut out = Vec::new();
    value.serialize(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn from_text<T: Serializable + Default>(text: &str) -> T {
    let mut value = T::default();
    value.deserialize(&mut text.as_bytes());
    value
}

#[test]
fn fields_in_declaration_order() {
    let basic = Basic {
        string_field: "hello".into(),
        int_field: 42,
    };
    let text = to_text(&basic);
    assert_eq!(text, "stringField = \"hello\"\nintField = 42\n");
    assert_eq!(from_text::<Basic>(&text), basic);
}

#[test]
fn empty_sequence_writes_only_count() {
    let text = to_text(&Numbers::default());
    assert_eq!(text, "values.count = 0\n");

    let mut read = Numbers { values: vec![5, 6] };
    read.deserialize(&mut text.as_bytes());
    assert!(read.values.is_empty());
}

#[test]
fn nested_round_trip() {
    let outer = Outer {
        title: "root".into(),
        inner: Inner {
            id: u64::MAX,
            label: "line\nbreak \"quoted\"".into(),
        },
        grid: vec![vec![1, -2], vec![], vec![3]],
        flags: vec![true, false],
        ratio: 0.1,
    };
    let text = to_text(&outer);
    assert!(text.contains("inner.id = 18446744073709551615\n"));
    assert!(text.contains("grid.count = 3\n"));
    assert!(text.contains("grid.0.1 = -2\n"));
    assert!(text.contains("grid.1.count = 0\n"));
    assert_eq!(from_text::<Outer>(&text), outer);
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let text = "# saved by hand\n\n   intField=7  \n# stringField = \"no\"\nstringField = \"yes\"\n";
    let read: Basic = from_text(text);
    assert_eq!(read.int_field, 7);
    assert_eq!(read.string_field, "yes");
}

#[test]
fn missing_fields_keep_values() {
    let mut read = Basic {
        string_field: "kept".into(),
        int_field: 1,
    };
    read.deserialize(&mut "intField = 2\n".as_bytes());
    assert_eq!(read.string_field, "kept");
    assert_eq!(read.int_field, 2);
}

#[test]
fn mismatched_fields_become_defaults() {
    let mut read = Basic {
        string_field: "old".into(),
        int_field: 9,
    };
    read.deserialize(&mut "stringField = 12\nintField = \"many\"\n".as_bytes());
    assert_eq!(read.int_field, 0);
    // An unquoted value is still text.
    assert_eq!(read.string_field, "12");
}

#[test]
fn garbage_input_changes_nothing() {
    let mut read = Outer {
        title: "t".into(),
        ..Outer::default()
    };
    read.deserialize(&mut &[0xFF, 0xFE, b'\n', b'=', b'\n'][..]);
    assert_eq!(read.title, "t");
}

#[test]
fn renamed_keys_round_trip() {
    let value = Spaced {
        max_size: 5,
        user_name: "a = b # c".into(),
        r#type: 2,
    };
    let text = to_text(&value);
    assert_eq!(text, "max size = 5\nuser-name = \"a = b # c\"\ntype = 2\n");
    assert_eq!(from_text::<Spaced>(&text), value);
}
