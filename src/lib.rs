//! # class-scanner
//!
//! Finds PHP classes, interfaces, enums and traits under a source tree by
//! parsing each file with tree-sitter. Nothing is loaded or executed.
//!
//! ## Architecture
//!
//! - **kind**: declaration kinds and the kind bitmask
//! - **declaration**: the descriptor yielded for each declaration
//! - **scan**: lazy source file discovery with exclude patterns
//! - **parse**: tree-sitter PHP parser and syntax error reporting
//! - **extract**: namespace-aware declaration extraction from a syntax tree
//! - **filter**: composable filter stages over the declaration stream
//! - **finder**: the `ClassFinder` orchestrator tying the pipeline together
//! - **config**: JSON configuration producing a ready-made finder
//! - **cli**: command-line definitions for the `class-scanner` binary
//!
//! ```no_run
//! use class_scanner::{ClassFinder, KindMask};
//! use class_scanner::filter::UniqueFilter;
//!
//! let finder = ClassFinder::new(KindMask::CLASSES, []).with_filter(UniqueFilter);
//! for decl in finder.find(["src"], ["vendor"])? {
//!     let decl = decl?;
//!     println!("{} ({})", decl.name(), decl.file().display());
//! }
//! # Ok::<(), class_scanner::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod declaration;
pub mod error;
pub mod extract;
pub mod filter;
pub mod finder;
pub mod kind;
pub mod parse;
pub mod scan;

pub use declaration::Declaration;
pub use error::{Error, Result};
pub use filter::{Declarations, Filter, FilterChain};
pub use finder::{ClassFinder, ParsePolicy};
pub use kind::{DeclarationKind, KindMask};
