#![cfg(feature = "yaml")]

use lz_serial::{Reflect, Serde, Serializable, format::Yaml};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
enum Mode {
    #[default]
    Idle,
    Busy,
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Limits {
    cpu: f64,
    memory: u64,
}

#[derive(Reflect, Default, Debug, PartialEq)]
#[reflect(format = Yaml)]
struct Service {
    name: String,
    replicas: u16,
    enabled: bool,
    limits: Limits,
    ports: Vec<u16>,
    mode: Serde<Mode>,
}

fn sample() -> Service {
    Service {
        name: "api: v2".into(),
        replicas: 3,
        enabled: true,
        limits: Limits {
            cpu: 0.5,
            memory: 1 << 30,
        },
        ports: vec![80, 443],
        mode: Serde(Mode::Busy),
    }
}

#[test]
fn round_trip() {
    let service = sample();
    let mut out = Vec::new();
    service.serialize(&mut out).unwrap();

    let text = String::from_utf8(out.clone()).unwrap();
    assert!(text.contains("replicas: 3"), "{text}");
    assert!(text.contains("mode: Busy"), "{text}");

    let mut read = Service::default();
    read.deserialize(&mut out.as_slice());
    assert_eq!(read, service);
}

#[test]
fn reads_hand_written_yaml() {
    let input = "\
name: worker
replicas: 2
ports:
  - 8080
limits:
  cpu: 2
mode: Idle
";
    let mut read = sample();
    read.deserialize(&mut input.as_bytes());
    assert_eq!(read.name, "worker");
    assert_eq!(read.replicas, 2);
    assert_eq!(read.ports, [8080]);
    assert_eq!(read.limits.cpu, 2.0);
    assert_eq!(read.limits.memory, 1 << 30);
    assert!(read.enabled);
    assert_eq!(*read.mode, Mode::Idle);
}

#[test]
fn malformed_yaml_changes_nothing() {
    let mut read = sample();
    read.deserialize(&mut "name: [unclosed\n  - : :".as_bytes());
    assert_eq!(read, sample());
}
