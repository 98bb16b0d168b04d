use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::error::{Error, Result};
use crate::flags::{KeywordsFlags, MaskFlags, SavedKeyIndex, SavedMaskIndex};
use crate::package::{Category, Package, PackageTree};

/// Switches that decide how masks and keywords are evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StabilityConfig {
    /// Evaluate with the user's configuration on top of the profile; used
    /// by the bulk entry points.
    pub local: bool,
    /// Treat `package.mask` files as part of the profile.
    pub filemask_is_profile: bool,
    /// Apply `ACCEPT_KEYWORDS` even in the global (profile-only) view.
    pub always_accept_keywords: bool,
}

/// Mask and keyword policy of a profile plus user configuration.
///
/// Applying a policy sets [`Version::maskflags`](crate::Version::maskflags)
/// and [`Version::keyflags`](crate::Version::keyflags) on every version of
/// the package and records them with
/// [`Version::save_masks`](crate::Version::save_masks) and
/// [`Version::save_keywords`](crate::Version::save_keywords) in the slots
/// matching the evaluation.
pub trait StabilityPolicy {
    /// Evaluate with the user's configuration.
    fn apply_local(&self, package: &mut Package, config: &StabilityConfig);
    /// Evaluate with the profile only.
    fn apply_global(&self, package: &mut Package, config: &StabilityConfig);
}

/// Policy without masks that accepts versions by their keywords alone.
///
/// Stable keywords are always accepted; testing keywords only when
/// `accept_testing` is set and the user's keywords apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordPolicy {
    /// Accept `~arch` in the local view (`ACCEPT_KEYWORDS="~arch"`).
    pub accept_testing: bool,
}

impl KeywordPolicy {
    fn apply(&self, package: &mut Package, accept_testing: bool, masks: SavedMaskIndex, keys: SavedKeyIndex) {
        for version in package.versions_mut() {
            let kw = version.keywords_arch;
            let accepted = kw.contains(KeywordsFlags::STABLE)
                || (accept_testing && kw.contains(KeywordsFlags::UNSTABLE));
            version.maskflags = MaskFlags::empty();
            version.keyflags = if accepted {
                kw | KeywordsFlags::ACCEPTED
            } else {
                kw
            };
            version.save_masks(masks);
            version.save_keywords(keys);
        }
    }
}

impl StabilityPolicy for KeywordPolicy {
    fn apply_local(&self, package: &mut Package, config: &StabilityConfig) {
        let masks = if config.filemask_is_profile {
            SavedMaskIndex::File
        } else {
            SavedMaskIndex::UserProfile
        };
        self.apply(package, self.accept_testing, masks, SavedKeyIndex::Accept);
    }

    fn apply_global(&self, package: &mut Package, config: &StabilityConfig) {
        let masks = if config.filemask_is_profile {
            SavedMaskIndex::File
        } else {
            SavedMaskIndex::Profile
        };
        if config.always_accept_keywords {
            self.apply(package, self.accept_testing, masks, SavedKeyIndex::Accept);
        } else {
            self.apply(package, false, masks, SavedKeyIndex::Arch);
        }
    }
}

/// Snapshot of a package's working mask and keyword flags, restored when
/// the guard is dropped.
///
/// The guard dereferences to the package, so it can be mutated freely
/// while the snapshot is held. Saved slots are not part of the snapshot.
pub struct PackageSave<'a> {
    package: &'a mut Package,
    flags: Vec<(MaskFlags, KeywordsFlags)>,
}

impl<'a> PackageSave<'a> {
    /// Take a snapshot of `package`.
    pub fn new(package: &'a mut Package) -> Self {
        let flags = package
            .versions()
            .iter()
            .map(|v| (v.maskflags, v.keyflags))
            .collect();
        PackageSave { package, flags }
    }
}

impl Deref for PackageSave<'_> {
    type Target = Package;

    fn deref(&self) -> &Package {
        self.package
    }
}

impl DerefMut for PackageSave<'_> {
    fn deref_mut(&mut self) -> &mut Package {
        self.package
    }
}

impl Drop for PackageSave<'_> {
    fn drop(&mut self) {
        for (version, &(masks, keys)) in self.package.versions_mut().iter_mut().zip(&self.flags) {
            version.maskflags = masks;
            version.keyflags = keys;
        }
    }
}

/// Computes mask and keyword flags of versions, reusing the flags saved on
/// a version whenever the same evaluation was done before.
#[derive(Debug, Clone)]
pub struct StabilityEngine<P> {
    policy: P,
    config: StabilityConfig,
}

impl<P: StabilityPolicy> StabilityEngine<P> {
    /// Create an engine.
    pub fn new(policy: P, config: StabilityConfig) -> Self {
        StabilityEngine { policy, config }
    }

    /// The policy in use.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The configuration in use.
    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }

    /// Keyword slot an evaluation with `local` ends up in.
    pub fn keyword_index(&self, local: bool) -> SavedKeyIndex {
        if local || self.config.always_accept_keywords {
            SavedKeyIndex::Accept
        } else {
            SavedKeyIndex::Arch
        }
    }

    /// Mask slot an evaluation with `local` ends up in.
    pub fn mask_index(&self, local: bool) -> SavedMaskIndex {
        if self.config.filemask_is_profile {
            SavedMaskIndex::File
        } else if local {
            SavedMaskIndex::UserProfile
        } else {
            SavedMaskIndex::Profile
        }
    }

    /// Evaluate the policy on `package` and keep the result.
    pub fn set_stability(&self, local: bool, package: &mut Package) {
        if local {
            self.policy.apply_local(package, &self.config);
        } else {
            self.policy.apply_global(package, &self.config);
        }
    }

    /// Flags of version `index` of `package` under the local or global
    /// view, without changing the package's working flags.
    ///
    /// Saved flags are returned directly. Otherwise the policy is applied
    /// to the package under a [`PackageSave`] and the working flags are
    /// restored afterwards, also if the policy panics.
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchVersion`] for an index out of range, and
    /// [`Error::StabilityIndexMismatch`] if the policy did not save the
    /// result in the slot this engine reads from. The latter is an internal
    /// error: the caller must stop instead of falling back to other data.
    pub fn calc_version_flags(
        &self,
        local: bool,
        package: &mut Package,
        index: usize,
    ) -> Result<(MaskFlags, KeywordsFlags)> {
        let no_such_version = |package: &Package| Error::NoSuchVersion {
            package: package.name().to_string(),
            index,
        };
        let mi = self.mask_index(local);
        let ki = self.keyword_index(local);

        let version = package
            .versions()
            .get(index)
            .ok_or_else(|| no_such_version(package))?;
        if let (Some(masks), Some(keys)) = (version.saved_masks(mi), version.saved_keywords(ki)) {
            return Ok((masks, keys));
        }

        trace!(package = package.name(), version = version.as_str(), local, "calculating stability");
        let (masks, keys) = {
            let mut saved = PackageSave::new(package);
            self.set_stability(local, &mut saved);
            let version = saved
                .versions()
                .get(index)
                .ok_or_else(|| no_such_version(&*saved))?;
            (version.maskflags, version.keyflags)
        };

        let version = package
            .versions()
            .get(index)
            .ok_or_else(|| no_such_version(package))?;
        if version.saved_masks(mi) != Some(masks) || version.saved_keywords(ki) != Some(keys) {
            return Err(Error::StabilityIndexMismatch {
                package: package.name().to_string(),
                version: version.as_str().to_string(),
            });
        }
        Ok((masks, keys))
    }

    /// Recompute the flags of every version of `package` under the
    /// configured view.
    pub fn set_stability_package(&self, package: &mut Package) {
        self.set_stability(self.config.local, package);
    }

    /// Recompute every package of `category`.
    pub fn set_stability_category(&self, category: &mut Category) {
        for package in category.iter_mut() {
            self.set_stability_package(package);
        }
    }

    /// Recompute every package of `tree`.
    pub fn set_stability_tree(&self, tree: &mut PackageTree) {
        for category in tree.iter_mut() {
            self.set_stability_category(category);
        }
    }
}
