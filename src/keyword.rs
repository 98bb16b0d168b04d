use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::flags::KeywordsFlags;

/// Stability level for an architecture keyword.
///
/// See [PMS 7.3.3](https://projects.gentoo.org/pms/9/pms.html#keywords).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    /// `amd64`
    Stable,
    /// `~amd64`
    Testing,
    /// `-amd64`
    Disabled,
    /// `-~amd64`
    DisabledTesting,
    /// `-*`
    DisabledAll,
}

/// A single architecture keyword entry from the `KEYWORDS` variable.
///
/// Each keyword consists of an architecture name and a stability level.
///
/// See [PMS 7.3.3](https://projects.gentoo.org/pms/9/pms.html#keywords).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyword {
    /// Architecture name (e.g. `amd64`), `*` for `-*`.
    pub arch: String,
    /// Stability classification.
    pub stability: Stability,
}

impl Keyword {
    /// Parse a space-separated `KEYWORDS` line into a list of keywords.
    ///
    /// # Examples
    ///
    /// ```
    /// use eix_cache::{Keyword, Stability};
    ///
    /// let kws = Keyword::parse_line("amd64 ~arm64 -~x86 -*").unwrap();
    /// assert_eq!(kws.len(), 4);
    /// assert_eq!(kws[0].stability, Stability::Stable);
    /// assert_eq!(kws[1].stability, Stability::Testing);
    /// assert_eq!(kws[2].stability, Stability::DisabledTesting);
    /// assert_eq!(kws[2].arch, "x86");
    /// assert_eq!(kws[3].stability, Stability::DisabledAll);
    /// ```
    pub fn parse_line(input: &str) -> Result<Vec<Keyword>> {
        input.split_whitespace().map(str::parse).collect()
    }
}

impl FromStr for Keyword {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "-*" {
            return Ok(Keyword {
                arch: "*".to_string(),
                stability: Stability::DisabledAll,
            });
        }

        let (arch, stability) = if let Some(arch) = s.strip_prefix("-~") {
            (arch, Stability::DisabledTesting)
        } else if let Some(arch) = s.strip_prefix('~') {
            (arch, Stability::Testing)
        } else if let Some(arch) = s.strip_prefix('-') {
            (arch, Stability::Disabled)
        } else {
            (s, Stability::Stable)
        };

        if arch.is_empty() || arch.starts_with(['~', '-']) {
            return Err(Error::InvalidKeyword(s.to_string()));
        }
        Ok(Keyword {
            arch: arch.to_string(),
            stability,
        })
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.stability {
            Stability::Stable => write!(f, "{}", self.arch),
            Stability::Testing => write!(f, "~{}", self.arch),
            Stability::Disabled => write!(f, "-{}", self.arch),
            Stability::DisabledTesting => write!(f, "-~{}", self.arch),
            Stability::DisabledAll => write!(f, "-*"),
        }
    }
}

impl KeywordsFlags {
    /// Reduce a `KEYWORDS` value to the flags relevant for `arch`.
    ///
    /// Malformed tokens are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use eix_cache::KeywordsFlags;
    ///
    /// let flags = KeywordsFlags::for_arch("~amd64 x86 -*", "amd64");
    /// assert_eq!(flags, KeywordsFlags::UNSTABLE | KeywordsFlags::MINUS_ASTERISK);
    /// ```
    pub fn for_arch(keywords: &str, arch: &str) -> KeywordsFlags {
        let mut flags = KeywordsFlags::empty();
        let mut alien = KeywordsFlags::empty();
        for token in keywords.split_whitespace() {
            let keyword: Keyword = match token.parse() {
                Ok(keyword) => keyword,
                Err(e) => {
                    debug!(token, "skipping keyword: {e}");
                    continue;
                }
            };
            if keyword.stability == Stability::DisabledAll {
                flags |= KeywordsFlags::MINUS_ASTERISK;
                continue;
            }
            if keyword.arch != arch {
                match keyword.stability {
                    Stability::Stable => alien |= KeywordsFlags::ALIEN_STABLE,
                    Stability::Testing => alien |= KeywordsFlags::ALIEN_UNSTABLE,
                    _ => {}
                }
                continue;
            }
            flags |= match keyword.stability {
                Stability::Stable => KeywordsFlags::STABLE,
                Stability::Testing => KeywordsFlags::UNSTABLE,
                Stability::Disabled => KeywordsFlags::MINUS_KEYWORD,
                Stability::DisabledTesting => KeywordsFlags::MINUS_UNSTABLE,
                Stability::DisabledAll => KeywordsFlags::MINUS_ASTERISK,
            };
        }
        // foreign keywords only count when the target arch has none
        if !flags.intersects(KeywordsFlags::STABLE | KeywordsFlags::UNSTABLE) {
            flags |= alien;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_kinds() {
        let kws = Keyword::parse_line("amd64 ~arm64 -x86 -~ppc -*").unwrap();
        let kinds: Vec<Stability> = kws.iter().map(|k| k.stability).collect();
        assert_eq!(
            kinds,
            vec![
                Stability::Stable,
                Stability::Testing,
                Stability::Disabled,
                Stability::DisabledTesting,
                Stability::DisabledAll,
            ]
        );
        assert_eq!(kws[3].arch, "ppc");
        assert_eq!(kws[4].arch, "*");
    }

    #[test]
    fn display_round_trip() {
        for s in ["amd64", "~arm64", "-x86", "-~ppc", "-*"] {
            let kw: Keyword = s.parse().unwrap();
            assert_eq!(kw.to_string(), s);
        }
    }

    #[test]
    fn invalid_tokens() {
        for s in ["", "~", "-", "-~", "~~x86", "--x86"] {
            assert!(s.parse::<Keyword>().is_err(), "{s:?} should not parse");
        }
    }

    #[test]
    fn arch_flags_stable() {
        assert_eq!(KeywordsFlags::for_arch("amd64 ~x86", "amd64"), KeywordsFlags::STABLE);
    }

    #[test]
    fn arch_flags_unstable() {
        assert_eq!(KeywordsFlags::for_arch("~amd64 x86", "amd64"), KeywordsFlags::UNSTABLE);
    }

    #[test]
    fn arch_flags_minus() {
        assert_eq!(
            KeywordsFlags::for_arch("-amd64 -~x86", "amd64"),
            KeywordsFlags::MINUS_KEYWORD
        );
        assert_eq!(
            KeywordsFlags::for_arch("-~amd64", "amd64"),
            KeywordsFlags::MINUS_UNSTABLE
        );
    }

    #[test]
    fn arch_flags_alien() {
        assert_eq!(
            KeywordsFlags::for_arch("x86 ~arm", "amd64"),
            KeywordsFlags::ALIEN_STABLE | KeywordsFlags::ALIEN_UNSTABLE
        );
    }

    #[test]
    fn arch_flags_empty_and_garbage() {
        assert_eq!(KeywordsFlags::for_arch("", "amd64"), KeywordsFlags::empty());
        assert_eq!(KeywordsFlags::for_arch("~ - amd64", "amd64"), KeywordsFlags::STABLE);
    }
}
