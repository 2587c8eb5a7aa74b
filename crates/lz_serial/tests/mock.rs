use lz_serial::adapters::mock::MockAdapter;
use lz_serial::{Adapter, Codec, Reflect, impl_custom_type};

#[derive(Default, Debug, PartialEq)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

impl_custom_type!(Rgb { r, g, b });

#[derive(Reflect, Default, Debug, PartialEq)]
struct Layer {
    name: String,
    tint: Rgb,
    opacity: f32,
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Scene {
    title: String,
    layers: Vec<Layer>,
    #[reflect(skip)]
    cache: Vec<u8>,
}

fn scene() -> Scene {
    Scene {
        title: "intro".into(),
        layers: vec![
            Layer {
                name: "bg".into(),
                tint: Rgb { r: 10, g: 20, b: 30 },
                opacity: 1.0,
            },
            Layer {
                name: "fx".into(),
                tint: Rgb::default(),
                opacity: 0.5,
            },
        ],
        cache: vec![1, 2, 3],
    }
}

#[test]
fn records_every_mutation() {
    let mut mock = MockAdapter::new();
    let root = mock.root();
    scene().serialize_fields(&mut mock, root);

    assert!(mock.has_operation("setValue", "title=intro"));
    assert!(mock.has_operation("setArray", "layers[2]"));
    assert!(mock.has_operation("setValue", "name=bg"));
    assert!(mock.has_operation("setObject", "tint"));
    assert!(mock.has_operation("setValue", "g=20"));
    assert!(mock.has_operation("setValue", "opacity=0.5"));
    assert!(!mock.has_operation("setArray", "cache"));

    let objects = mock
        .operations()
        .iter()
        .filter(|(op, _)| op == "setObject")
        .count();
    // Two layer elements and two tints.
    assert_eq!(objects, 4);
}

#[test]
fn reads_back_what_it_recorded() {
    let mut mock = MockAdapter::new();
    let root = mock.root();
    let source = scene();
    source.encode(&mut mock, root, "scene");
    assert!(mock.has_operation("setObject", "scene"));

    let mut read = Scene::default();
    read.decode(&mut mock, root, "scene");
    assert_eq!(read.layers, source.layers);
    assert_eq!(read.title, "intro");
    assert!(read.cache.is_empty());
}

#[test]
fn clearing_keeps_the_document() {
    let mut mock = MockAdapter::new();
    let root = mock.root();
    scene().serialize_fields(&mut mock, root);
    mock.clear_operations();
    assert!(mock.operations().is_empty());

    let mut read = Scene::default();
    read.deserialize_fields(&mut mock, root);
    assert_eq!(read.layers.len(), 2);
    assert!(mock.operations().is_empty());
}
