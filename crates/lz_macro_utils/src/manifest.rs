use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// The invoking crate's `Cargo.toml`, used to find the path under which
/// another workspace crate is reachable from generated code.
///
/// ```rust
/// # use lz_macro_utils::Manifest;
/// let path: syn::Path = Manifest::shared(|m| m.get_crate_path("lz_serial"));
/// ```
///
/// # Resolution rules
///
/// 1. A direct dependency named `name` resolves to `::name`.
/// 2. For names starting with `lz_`, a dependency on the facade `lz_core`
///    resolves to `::lz_core::<rest>` (`lz_serial` -> `::lz_core::serial`).
/// 3. Same with the short facade alias `lz`.
/// 4. Steps 1-3 are repeated on `dev-dependencies`.
/// 5. Otherwise `::name`.
///
/// A crate that refers to itself through generated code should declare
/// `extern crate self as name;` so that rule 5 also holds inside it.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Document<Box<str>>,
    pub modified_time: SystemTime,
}

const FACADE_NAMES: [&str; 2] = ["lz_core", "lz"];
const CRATE_PREFIX: &str = "lz_";

impl Manifest {
    #[inline(never)]
    fn manifest_path() -> PathBuf {
        let dir = env::var_os("CARGO_MANIFEST_DIR")
            .expect("CARGO_MANIFEST_DIR is set by cargo for proc-macro expansion");
        let path = PathBuf::from(dir).join("Cargo.toml");
        assert!(
            path.exists(),
            "Cargo manifest does not exist at path {}",
            path.display(),
        );
        path
    }

    #[inline(never)]
    fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    #[inline(never)]
    fn read(path: &Path) -> Document<Box<str>> {
        let text = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Unable to read cargo manifest: {}", path.display()));
        Document::parse(text.into_boxed_str())
            .unwrap_or_else(|_| panic!("Failed to parse cargo manifest: {}", path.display()))
    }

    fn parse_path(text: &str) -> syn::Path {
        syn::parse_str(text).unwrap_or_else(|_| panic!("`{text}` is not a valid path"))
    }

    fn find_in(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return Some(Self::parse_path(&format!("::{name}")));
        }

        let module = name.strip_prefix(CRATE_PREFIX)?;
        FACADE_NAMES
            .iter()
            .find(|facade| deps.contains_key(facade))
            .map(|facade| Self::parse_path(&format!("::{facade}::{module}")))
    }

    /// Resolve the path of crate `name` following the rules above.
    #[inline(never)]
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        ["dependencies", "dev-dependencies"]
            .into_iter()
            .filter_map(|section| match self.manifest.get(section) {
                Some(Item::Table(deps)) => Self::find_in(deps, name),
                _ => None,
            })
            .next()
            .unwrap_or_else(|| Self::parse_path(&format!("::{name}")))
    }

    /// Run `func` against the cached manifest of the invoking crate.
    ///
    /// The manifest is re-read when its modification time changes. Reading
    /// takes a global lock, so macros should call this once per expansion.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let path = Self::manifest_path();
        let modified_time =
            Self::modified_time(&path).expect("Cargo.toml should have a modified time");

        {
            let cache = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(manifest) = cache.get(&path)
                && manifest.modified_time == modified_time
            {
                return func(manifest);
            }
        }

        let manifest = Manifest {
            manifest: Self::read(&path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);

        result
    }
}
