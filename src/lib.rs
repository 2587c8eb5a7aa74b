#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use lz_cfg as cfg;
pub use lz_serial as serial;
pub use lz_utils as utils;
