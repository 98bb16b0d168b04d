use bitflags::bitflags;

bitflags! {
    /// Restrictions taken from an ebuild's `RESTRICT` variable that matter
    /// for searching.
    ///
    /// Only `fetch` and `mirror` are tracked; other words are ignored.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct RestrictFlags: u8 {
        /// Sources must be fetched manually (`RESTRICT=fetch`).
        const FETCH = 0x01;
        /// Sources may not be mirrored (`RESTRICT=mirror`).
        const MIRROR = 0x02;
    }
}

impl RestrictFlags {
    /// No restriction.
    pub const NONE: RestrictFlags = RestrictFlags::empty();

    /// Compute the flags from a whitespace-separated `RESTRICT` value.
    ///
    /// Words are matched case-insensitively. USE-conditional groups are not
    /// evaluated: `!test? ( fetch )` still sets [`RestrictFlags::FETCH`].
    ///
    /// # Examples
    ///
    /// ```
    /// use eix_cache::RestrictFlags;
    ///
    /// let flags = RestrictFlags::from_words("Fetch test mirror");
    /// assert_eq!(flags, RestrictFlags::FETCH | RestrictFlags::MIRROR);
    /// assert_eq!(RestrictFlags::from_words("test"), RestrictFlags::NONE);
    /// ```
    pub fn from_words(words: &str) -> RestrictFlags {
        words
            .split_whitespace()
            .fold(RestrictFlags::NONE, |flags, word| {
                if word.eq_ignore_ascii_case("fetch") {
                    flags | RestrictFlags::FETCH
                } else if word.eq_ignore_ascii_case("mirror") {
                    flags | RestrictFlags::MIRROR
                } else {
                    flags
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_none() {
        assert_eq!(RestrictFlags::from_words(""), RestrictFlags::NONE);
        assert_eq!(RestrictFlags::from_words("   "), RestrictFlags::NONE);
    }

    #[test]
    fn single_words() {
        assert_eq!(RestrictFlags::from_words("fetch"), RestrictFlags::FETCH);
        assert_eq!(RestrictFlags::from_words("mirror"), RestrictFlags::MIRROR);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(RestrictFlags::from_words("FETCH"), RestrictFlags::FETCH);
        assert_eq!(RestrictFlags::from_words("MiRrOr"), RestrictFlags::MIRROR);
    }

    #[test]
    fn unknown_words_ignored() {
        let flags = RestrictFlags::from_words("test strip mirror bindist");
        assert_eq!(flags, RestrictFlags::MIRROR);
    }

    #[test]
    fn prefixes_do_not_match() {
        assert_eq!(RestrictFlags::from_words("fetching mirrors"), RestrictFlags::NONE);
    }

    #[test]
    fn conditional_groups_are_flattened() {
        let flags = RestrictFlags::from_words("!test? ( fetch ) mirror");
        assert_eq!(flags, RestrictFlags::FETCH | RestrictFlags::MIRROR);
    }
}
