use std::collections::BTreeMap;

use portage_atom::Slot;

use crate::flags::{KeywordsFlags, MaskFlags, SavedKeyIndex, SavedMaskIndex};
use crate::iuse::IUseSet;
use crate::restrict::RestrictFlags;
use crate::version::BasicVersion;

/// Identifier of the repository (main tree or overlay) a version comes from.
pub type OverlayKey = u16;

/// Registration state of a [`Version`] inside its [`Package`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Visible for version comparison, metadata still being filled in.
    Pending,
    /// Permanent member of the package.
    Registered,
}

/// One ebuild version of a package together with its metadata and the
/// stability flags computed for it.
#[derive(Debug, Clone)]
pub struct Version {
    version: BasicVersion,
    state: Registration,
    id: u64,

    /// Raw `KEYWORDS` value.
    pub full_keywords: String,
    /// `KEYWORDS` reduced to the target architecture.
    pub keywords_arch: KeywordsFlags,
    /// Parsed `SLOT`, `None` if the ebuild has none.
    pub slot: Option<Slot>,
    /// Declared USE flags.
    pub iuse: IUseSet,
    /// Restrictions from `RESTRICT`.
    pub restrict: RestrictFlags,
    /// Repository this version was read from.
    pub overlay_key: OverlayKey,

    /// Working mask flags, written by stability policies.
    pub maskflags: MaskFlags,
    /// Working keyword flags, written by stability policies.
    pub keyflags: KeywordsFlags,

    saved_masks: [Option<MaskFlags>; SavedMaskIndex::COUNT],
    saved_keywords: [Option<KeywordsFlags>; SavedKeyIndex::COUNT],
}

impl Version {
    /// Create a version from its version string.
    pub fn new(version: &str) -> Version {
        Version {
            version: BasicVersion::parse(version),
            state: Registration::Pending,
            id: 0,
            full_keywords: String::new(),
            keywords_arch: KeywordsFlags::empty(),
            slot: None,
            iuse: IUseSet::default(),
            restrict: RestrictFlags::NONE,
            overlay_key: 0,
            maskflags: MaskFlags::empty(),
            keyflags: KeywordsFlags::empty(),
            saved_masks: [None; SavedMaskIndex::COUNT],
            saved_keywords: [None; SavedKeyIndex::COUNT],
        }
    }

    /// The parsed version.
    pub fn version(&self) -> &BasicVersion {
        &self.version
    }

    /// The version string as read.
    pub fn as_str(&self) -> &str {
        self.version.full()
    }

    /// Registration state.
    pub fn state(&self) -> Registration {
        self.state
    }

    /// Store `KEYWORDS` and derive the flags for `arch`.
    pub fn set_keywords(&mut self, arch: &str, keywords: &str) {
        self.full_keywords = keywords.to_string();
        self.keywords_arch = KeywordsFlags::for_arch(keywords, arch);
    }

    /// Parse and store `SLOT` (`slot` or `slot/subslot`).
    pub fn set_slot(&mut self, slot: &str) {
        if slot.is_empty() {
            self.slot = None;
            return;
        }
        self.slot = Some(match slot.split_once('/') {
            Some((slot, subslot)) => Slot::with_subslot(slot, subslot),
            None => Slot::new(slot),
        });
    }

    /// Parse and store `IUSE`.
    pub fn set_iuse(&mut self, iuse: &str) {
        self.iuse = IUseSet::parse(iuse);
    }

    /// Record the current [`Version::maskflags`] in a saved slot.
    pub fn save_masks(&mut self, index: SavedMaskIndex) {
        self.saved_masks[index.slot()] = Some(self.maskflags);
    }

    /// Record the current [`Version::keyflags`] in a saved slot.
    pub fn save_keywords(&mut self, index: SavedKeyIndex) {
        self.saved_keywords[index.slot()] = Some(self.keyflags);
    }

    /// Saved mask flags, if that slot has been populated.
    pub fn saved_masks(&self, index: SavedMaskIndex) -> Option<MaskFlags> {
        self.saved_masks[index.slot()]
    }

    /// Saved keyword flags, if that slot has been populated.
    pub fn saved_keywords(&self, index: SavedKeyIndex) -> Option<KeywordsFlags> {
        self.saved_keywords[index.slot()]
    }

    /// Forget every saved slot, e.g. after the policy configuration changed.
    pub fn clear_saved(&mut self) {
        self.saved_masks = [None; SavedMaskIndex::COUNT];
        self.saved_keywords = [None; SavedKeyIndex::COUNT];
    }
}

/// Handle to a version added with [`Package::add_version_start`] that has
/// not been finalized yet.
#[derive(Debug)]
#[must_use = "a pending version must be finalized"]
pub struct PendingVersion {
    id: u64,
}

/// A package: its versions, sorted ascending, and the metadata of the
/// latest one.
#[derive(Debug, Clone, Default)]
pub struct Package {
    name: String,
    /// `DESCRIPTION` of the latest version.
    pub desc: String,
    /// `HOMEPAGE` of the latest version.
    pub homepage: String,
    /// `LICENSE` of the latest version.
    pub licenses: String,
    /// `PROVIDE` of the latest version.
    pub provide: String,
    versions: Vec<Version>,
    next_id: u64,
}

impl Package {
    /// Create an empty package.
    pub fn new(name: impl Into<String>) -> Package {
        Package {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Package name without category.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All versions, pending ones included, in ascending order.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub(crate) fn versions_mut(&mut self) -> &mut [Version] {
        &mut self.versions
    }

    /// The greatest version, pending ones included.
    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    /// Look up a version by its exact version string.
    pub fn find_version(&self, version: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.as_str() == version)
    }

    /// Position of a version by its exact version string.
    pub fn position(&self, version: &str) -> Option<usize> {
        self.versions.iter().position(|v| v.as_str() == version)
    }

    /// First registration phase: insert `version` in order and make it
    /// visible to [`Package::latest`]. Equal versions keep insertion order.
    pub fn add_version_start(&mut self, mut version: Version) -> PendingVersion {
        self.next_id += 1;
        version.id = self.next_id;
        version.state = Registration::Pending;
        let at = self
            .versions
            .partition_point(|v| BasicVersion::compare(v.version(), version.version()).is_le());
        self.versions.insert(at, version);
        PendingVersion { id: self.next_id }
    }

    /// `true` if the pending version compares equal to the latest one.
    pub fn is_latest(&self, pending: &PendingVersion) -> bool {
        match (self.latest(), self.pending_ref(pending)) {
            (Some(latest), Some(version)) => latest.version() == version.version(),
            _ => false,
        }
    }

    fn pending_ref(&self, pending: &PendingVersion) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == pending.id)
    }

    /// Mutable access to a pending version, to fill in its metadata.
    pub fn pending_mut(&mut self, pending: &PendingVersion) -> Option<&mut Version> {
        self.versions.iter_mut().find(|v| v.id == pending.id)
    }

    /// Second registration phase: make the version a permanent member.
    pub fn add_version_finalize(&mut self, pending: PendingVersion) {
        if let Some(version) = self.pending_mut(&pending) {
            version.state = Registration::Registered;
        }
    }

    /// Versions that completed both registration phases.
    pub fn registered(&self) -> impl Iterator<Item = &Version> {
        self.versions
            .iter()
            .filter(|v| v.state == Registration::Registered)
    }
}

/// A category: packages keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Category {
    name: String,
    packages: BTreeMap<String, Package>,
}

impl Category {
    /// Create an empty category.
    pub fn new(name: impl Into<String>) -> Category {
        Category {
            name: name.into(),
            packages: BTreeMap::new(),
        }
    }

    /// Category name (e.g. `app-editors`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Find a package by exact name.
    pub fn find_package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Find a package by exact name, mutably.
    pub fn find_package_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages.get_mut(name)
    }

    /// Find a package, creating it if absent.
    pub fn find_or_add_package(&mut self, name: &str) -> &mut Package {
        self.packages
            .entry(name.to_string())
            .or_insert_with(|| Package::new(name))
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// `true` if there are no packages.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Packages sorted by name, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Package> {
        self.packages.values_mut()
    }
}

/// All categories of a repository scan.
#[derive(Debug, Clone, Default)]
pub struct PackageTree {
    categories: BTreeMap<String, Category>,
}

impl PackageTree {
    /// Create an empty tree.
    pub fn new() -> PackageTree {
        PackageTree::default()
    }

    /// Create a tree with empty categories of the given names.
    pub fn with_categories<I, S>(names: I) -> PackageTree
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = PackageTree::new();
        for name in names {
            tree.find_or_add_category(name.as_ref());
        }
        tree
    }

    /// Find a category by name.
    pub fn find_category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Find a category, creating it if absent.
    pub fn find_or_add_category(&mut self, name: &str) -> &mut Category {
        self.categories
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name))
    }

    /// Categories sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Categories sorted by name, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Category> {
        self.categories.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(pkg: &mut Package, version: &str) {
        let pending = pkg.add_version_start(Version::new(version));
        pkg.add_version_finalize(pending);
    }

    #[test]
    fn versions_stay_sorted() {
        let mut pkg = Package::new("vim");
        for v in ["9.0", "8.2_p1", "9.0_rc1", "8.2", "9.0-r1"] {
            add(&mut pkg, v);
        }
        let order: Vec<&str> = pkg.versions().iter().map(Version::as_str).collect();
        assert_eq!(order, vec!["8.2", "8.2_p1", "9.0_rc1", "9.0", "9.0-r1"]);
        assert_eq!(pkg.latest().map(Version::as_str), Some("9.0-r1"));
    }

    #[test]
    fn pending_is_visible_but_not_registered() {
        let mut pkg = Package::new("vim");
        add(&mut pkg, "1.0");
        let pending = pkg.add_version_start(Version::new("2.0"));
        assert!(pkg.is_latest(&pending));
        assert_eq!(pkg.latest().map(Version::state), Some(Registration::Pending));
        assert_eq!(pkg.registered().count(), 1);

        pkg.add_version_finalize(pending);
        assert_eq!(pkg.registered().count(), 2);
        assert!(pkg.versions().iter().all(|v| v.state() == Registration::Registered));
    }

    #[test]
    fn older_pending_is_not_latest() {
        let mut pkg = Package::new("vim");
        add(&mut pkg, "2.0");
        let pending = pkg.add_version_start(Version::new("1.0"));
        assert!(!pkg.is_latest(&pending));
        pkg.add_version_finalize(pending);
    }

    #[test]
    fn equal_version_counts_as_latest() {
        let mut pkg = Package::new("vim");
        add(&mut pkg, "2.0");
        let pending = pkg.add_version_start(Version::new("2.0"));
        assert!(pkg.is_latest(&pending));
        pkg.add_version_finalize(pending);
        assert_eq!(pkg.versions().len(), 2);
    }

    #[test]
    fn pending_mut_targets_the_right_version() {
        let mut pkg = Package::new("vim");
        add(&mut pkg, "3.0");
        let pending = pkg.add_version_start(Version::new("1.0"));
        pkg.pending_mut(&pending).unwrap().set_slot("0/1.0");
        pkg.add_version_finalize(pending);

        let v = pkg.find_version("1.0").unwrap();
        let slot = v.slot.as_ref().unwrap();
        assert_eq!(slot.slot, "0");
        assert_eq!(slot.subslot, Some("1.0".to_string()));
        assert!(pkg.find_version("3.0").unwrap().slot.is_none());
    }

    #[test]
    fn saved_slots() {
        let mut v = Version::new("1.0");
        assert_eq!(v.saved_masks(SavedMaskIndex::Profile), None);
        v.maskflags = MaskFlags::PACKAGE;
        v.save_masks(SavedMaskIndex::Profile);
        v.keyflags = KeywordsFlags::STABLE;
        v.save_keywords(SavedKeyIndex::Accept);
        assert_eq!(v.saved_masks(SavedMaskIndex::Profile), Some(MaskFlags::PACKAGE));
        assert_eq!(v.saved_masks(SavedMaskIndex::File), None);
        assert_eq!(v.saved_keywords(SavedKeyIndex::Accept), Some(KeywordsFlags::STABLE));
        assert_eq!(v.saved_keywords(SavedKeyIndex::Arch), None);

        v.clear_saved();
        assert_eq!(v.saved_masks(SavedMaskIndex::Profile), None);
    }

    #[test]
    fn empty_slot_is_none() {
        let mut v = Version::new("1.0");
        v.set_slot("");
        assert!(v.slot.is_none());
        v.set_slot("2");
        assert_eq!(v.slot.as_ref().map(|s| s.slot.as_str()), Some("2"));
    }

    #[test]
    fn category_find_or_add() {
        let mut cat = Category::new("app-editors");
        cat.find_or_add_package("vim").desc = "Vi IMproved".to_string();
        cat.find_or_add_package("vim");
        cat.find_or_add_package("emacs");
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.find_package("vim").unwrap().desc, "Vi IMproved");
        let names: Vec<&str> = cat.iter().map(Package::name).collect();
        assert_eq!(names, vec!["emacs", "vim"]);
    }

    #[test]
    fn tree_with_categories() {
        let tree = PackageTree::with_categories(["sys-apps", "app-editors"]);
        let names: Vec<&str> = tree.iter().map(Category::name).collect();
        assert_eq!(names, vec!["app-editors", "sys-apps"]);
        assert!(tree.find_category("sys-apps").unwrap().is_empty());
    }
}
