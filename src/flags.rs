use bitflags::bitflags;

bitflags! {
    /// Mask state of a version.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MaskFlags: u8 {
        /// Masked by a `package.mask` entry.
        const PACKAGE = 0x01;
        /// Not part of the profile's package set.
        const PROFILE = 0x02;
        /// Both kinds of hard mask.
        const HARD = Self::PACKAGE.bits() | Self::PROFILE.bits();
        /// Part of the system set.
        const SYSTEM = 0x04;
        /// Part of the world file.
        const WORLD = 0x08;
        /// Part of a world set.
        const WORLD_SETS = 0x10;
    }
}

bitflags! {
    /// Keyword state of a version for one architecture.
    ///
    /// The low bits describe what `KEYWORDS` says about the target
    /// architecture; [`KeywordsFlags::ACCEPTED`] is set by a stability
    /// policy once it decides the version is visible.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct KeywordsFlags: u16 {
        /// `arch`
        const STABLE = 0x0001;
        /// `~arch`
        const UNSTABLE = 0x0002;
        /// `-arch`
        const MINUS_KEYWORD = 0x0004;
        /// `-~arch`
        const MINUS_UNSTABLE = 0x0008;
        /// `-*`
        const MINUS_ASTERISK = 0x0010;
        /// Stable on some other architecture only.
        const ALIEN_STABLE = 0x0020;
        /// Testing on some other architecture only.
        const ALIEN_UNSTABLE = 0x0040;
        /// Accepted by the keyword policy.
        const ACCEPTED = 0x0100;
    }
}

/// Which saved mask slot of a [`Version`](crate::Version) a computation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SavedMaskIndex {
    /// Global profile masks.
    Profile,
    /// Profile masks plus the user's configuration.
    UserProfile,
    /// `package.mask` files treated as part of the profile.
    File,
}

impl SavedMaskIndex {
    pub(crate) const COUNT: usize = 3;

    pub(crate) fn slot(self) -> usize {
        match self {
            SavedMaskIndex::Profile => 0,
            SavedMaskIndex::UserProfile => 1,
            SavedMaskIndex::File => 2,
        }
    }
}

/// Which saved keyword slot of a [`Version`](crate::Version) a computation
/// uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SavedKeyIndex {
    /// Keywords of the target architecture only.
    Arch,
    /// Keywords after applying `ACCEPT_KEYWORDS`.
    Accept,
}

impl SavedKeyIndex {
    pub(crate) const COUNT: usize = 2;

    pub(crate) fn slot(self) -> usize {
        match self {
            SavedKeyIndex::Arch => 0,
            SavedKeyIndex::Accept => 1,
        }
    }
}
