use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::atom::split_atom;
use crate::cdb::Cdb;
use crate::error::Result;
use crate::package::{Category, OverlayKey, PackageTree, Version};
use crate::restrict::RestrictFlags;
use crate::unpickle::{Metadata, MetadataDecoder, PickleDecoder};

/// Where portage keeps its cdb dependency cache.
pub const PORTAGE_CACHE_PATH: &str = "/var/cache/edb/dep";

/// Settings for reading a portage cdb cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Cache root, [`PORTAGE_CACHE_PATH`] by default.
    pub cache_root: PathBuf,
    /// Repository path the cache was generated for (e.g. `/usr/portage/`).
    /// It is appended verbatim to the cache root, followed by the category
    /// name and `.cdb`.
    pub scheme: String,
    /// Architecture keywords are evaluated for.
    pub arch: String,
    /// Identifier stored on every version read.
    pub overlay_key: OverlayKey,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            cache_root: PathBuf::from(PORTAGE_CACHE_PATH),
            scheme: "/usr/portage/".to_string(),
            arch: "amd64".to_string(),
            overlay_key: 0,
        }
    }
}

impl CacheConfig {
    /// Use another cache root.
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    /// Use another repository path.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Evaluate keywords for another architecture.
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    /// Tag versions with another repository identifier.
    pub fn with_overlay_key(mut self, key: OverlayKey) -> Self {
        self.overlay_key = key;
        self
    }

    /// Cache file holding `category`.
    ///
    /// # Examples
    ///
    /// ```
    /// use eix_cache::CacheConfig;
    ///
    /// let config = CacheConfig::default().with_scheme("/usr/portage/");
    /// assert_eq!(
    ///     config.cache_file("app-editors").to_str(),
    ///     Some("/var/cache/edb/dep/usr/portage/app-editors.cdb"),
    /// );
    /// ```
    pub fn cache_file(&self, category: &str) -> PathBuf {
        let mut path = self.cache_root.as_os_str().to_os_string();
        path.push(&self.scheme);
        path.push(category);
        path.push(".cdb");
        PathBuf::from(path)
    }
}

/// Outcome of reading one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Versions added to the category.
    pub versions: usize,
    /// Records skipped because they could not be decoded or split.
    pub skipped: usize,
    /// The cache file could not be read at all; the category was left as
    /// it was.
    pub unreadable: bool,
    /// Reading stopped early at a corrupt record.
    pub truncated: bool,
}

impl IngestStats {
    /// `true` if something went wrong that was logged as a warning.
    pub fn has_warnings(&self) -> bool {
        self.skipped > 0 || self.unreadable || self.truncated
    }
}

/// Fills categories from portage's cdb metadata cache.
#[derive(Debug, Clone)]
pub struct CdbCache<D = PickleDecoder> {
    config: CacheConfig,
    decoder: D,
}

impl CdbCache<PickleDecoder> {
    /// Reader for pickled cache records.
    pub fn new(config: CacheConfig) -> Self {
        CdbCache {
            config,
            decoder: PickleDecoder,
        }
    }
}

impl<D: MetadataDecoder> CdbCache<D> {
    /// Reader with a custom record decoder.
    pub fn with_decoder(config: CacheConfig, decoder: D) -> Self {
        CdbCache { config, decoder }
    }

    /// The configuration in use.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Read the cache file of `category` into it.
    ///
    /// Never fails: an unreadable file, undecodable records and keys that
    /// are not `name-version` are logged and reflected in the returned
    /// [`IngestStats`].
    pub fn read_category(&self, category: &mut Category) -> IngestStats {
        let path = self.config.cache_file(category.name());
        self.read_category_from(&path, category)
    }

    /// Read the records of the cdb file at `path` into `category`.
    pub fn read_category_from(&self, path: &Path, category: &mut Category) -> IngestStats {
        let mut stats = IngestStats::default();
        let mut cdb = Cdb::open(path);
        if let Some(e) = cdb.take_failure() {
            warn!(category = category.name(), path = %path.display(), "can't read cache file: {e}");
            stats.unreadable = true;
            return stats;
        }

        while !cdb.end() {
            let record = match cdb.get() {
                Ok(record) => record,
                Err(e) => {
                    warn!(category = category.name(), path = %path.display(), "{e}, skipping rest of file");
                    stats.truncated = true;
                    break;
                }
            };
            let key = record.key_str();
            let metadata = match self.decoder.decode(record.data) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(category = category.name(), key = %key, "problems with {key}, skipping: {e}");
                    stats.skipped += 1;
                    continue;
                }
            };
            match self.add_record(category, &key, &metadata) {
                Ok(()) => stats.versions += 1,
                Err(e) => {
                    warn!(category = category.name(), key = %key, "{e}");
                    stats.skipped += 1;
                }
            }
        }

        debug!(category = category.name(), ?stats, "read category");
        stats
    }

    /// Read every category of `tree`. A category whose cache cannot be read
    /// does not affect the others.
    pub fn read_tree(&self, tree: &mut PackageTree) -> BTreeMap<String, IngestStats> {
        tree.iter_mut()
            .map(|category| {
                let stats = self.read_category(category);
                (category.name().to_string(), stats)
            })
            .collect()
    }

    /// Register one decoded record as a version of its package.
    pub fn add_record(&self, category: &mut Category, key: &str, metadata: &Metadata) -> Result<()> {
        let (name, version) = split_atom(key)?;

        let package = category.find_or_add_package(name);
        let pending = package.add_version_start(Version::new(version));

        if package.is_latest(&pending) {
            package.desc = field(metadata, "DESCRIPTION").to_string();
            package.homepage = field(metadata, "HOMEPAGE").to_string();
            package.licenses = field(metadata, "LICENSE").to_string();
            package.provide = field(metadata, "PROVIDE").to_string();
        }

        if let Some(version) = package.pending_mut(&pending) {
            version.set_keywords(&self.config.arch, field(metadata, "KEYWORDS"));
            version.set_slot(field(metadata, "SLOT"));
            version.set_iuse(field(metadata, "IUSE"));
            version.restrict = RestrictFlags::from_words(field(metadata, "RESTRICT"));
            version.overlay_key = self.config.overlay_key;
        }
        package.add_version_finalize(pending);
        Ok(())
    }
}

fn field<'m>(metadata: &'m Metadata, var: &str) -> &'m str {
    metadata.get(var).map(String::as_str).unwrap_or_default()
}
