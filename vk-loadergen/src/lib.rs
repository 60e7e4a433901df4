//! This crate reads the Khronos API registry (`vk.xml`) and generates the
//! dispatch-table sources of the Vulkan loader from it.
//!
//! The entry point into this library is `parse_file`, which returns a
//! `Registry` for one API together with the recoverable problems found in
//! the document. `Registry::api_gen` then selects the versions and
//! extensions the options ask for and walks them, feeding a `Generator`.
//! `LoaderGenerator` is the generator for the loader artifacts, and
//! `loader::generate` runs the whole pipeline for one of them.

#[cfg(feature = "serialize")]
#[macro_use]
extern crate serde_derive;

#[macro_use]
mod util;

mod c;
pub mod depends;
mod emit;
pub mod loader;
mod normalize;
pub mod options;
mod parse;
mod registry;
mod select;
pub mod tree;
mod types;

pub use emit::{Diagnostics, Generator};
pub use loader::{Artifact, LoaderGenerator};
pub use normalize::{merge_apis, strip_nonmatching_apis};
pub use options::{GeneratorOptions, Pattern};
pub use parse::{parse_file, parse_stream, parse_tree};
pub use registry::{NameKind, Registry};
pub use types::*;
