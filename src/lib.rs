//! Index Gentoo's cdb metadata cache into an in-memory package tree.
//!
//! This crate reads the per-category cdb files portage writes below
//! `/var/cache/edb/dep`, decodes their pickled metadata records and turns
//! them into [`Package`]s with versions sorted by Gentoo version order. On
//! top of that tree, a [`StabilityEngine`] computes mask and keyword flags
//! per version and remembers them so repeated queries are cheap.
//!
//! # Overview
//!
//! - [`BasicVersion`] parses and orders version strings the way portage
//!   does (`1.0_alpha1 < 1.0_rc1 < 1.0 < 1.0_p1 < 1.0-r1`).
//! - [`Cdb`] walks the records of a memory-mapped cdb file, checking every
//!   length against the file.
//! - [`CdbCache`] fills [`Category`]s from those records.
//! - [`StabilityEngine`] evaluates a [`StabilityPolicy`] per package.
//!
//! # Examples
//!
//! Compare versions:
//!
//! ```
//! use std::cmp::Ordering;
//!
//! use eix_cache::BasicVersion;
//!
//! let rc = BasicVersion::parse("1.0_rc1");
//! let release = BasicVersion::parse("1.0");
//! let patched = BasicVersion::parse("1.0_p1");
//! assert!(rc < release && release < patched);
//! assert_eq!(
//!     BasicVersion::compare(&release, &BasicVersion::parse("1.0.0")),
//!     Ordering::Less
//! );
//! ```
//!
//! Add a decoded record to a category:
//!
//! ```
//! use eix_cache::{CacheConfig, CdbCache, Category, Metadata};
//!
//! let cache = CdbCache::new(CacheConfig::default().with_arch("amd64"));
//! let mut category = Category::new("app-editors");
//! let mut metadata = Metadata::new();
//! metadata.insert("DESCRIPTION".into(), "Vi IMproved".into());
//! metadata.insert("KEYWORDS".into(), "amd64 ~x86".into());
//! cache.add_record(&mut category, "vim-9.0.1", &metadata).unwrap();
//!
//! let vim = category.find_package("vim").unwrap();
//! assert_eq!(vim.desc, "Vi IMproved");
//! assert_eq!(vim.latest().unwrap().as_str(), "9.0.1");
//! ```

mod atom;
mod cdb;
mod error;
mod flags;
mod ingest;
mod iuse;
mod keyword;
mod package;
mod restrict;
mod stability;
mod unpickle;
mod version;

// Re-export public types
pub use atom::split_atom;
pub use cdb::{Cdb, CdbRecord};
pub use error::{Error, Result};
pub use flags::{KeywordsFlags, MaskFlags, SavedKeyIndex, SavedMaskIndex};
pub use ingest::{CacheConfig, CdbCache, IngestStats, PORTAGE_CACHE_PATH};
pub use iuse::{IUse, IUseDefault, IUseSet};
pub use keyword::{Keyword, Stability};
pub use package::{
    Category, OverlayKey, Package, PackageTree, PendingVersion, Registration, Version,
};
pub use restrict::RestrictFlags;
pub use stability::{KeywordPolicy, PackageSave, StabilityConfig, StabilityEngine, StabilityPolicy};
pub use unpickle::{KeyValueDecoder, Metadata, MetadataDecoder, PickleDecoder};
pub use version::{BasicVersion, LeadNum, Suffix, SuffixLevel};

/// Re-exported for [`Version::slot`].
pub use portage_atom::Slot;
