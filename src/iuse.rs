use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};

/// Default state for an IUSE flag.
///
/// Flags may be prefixed with `+` (enabled by default) or `-` (disabled by
/// default) in the `IUSE` variable.
///
/// See [PMS 7.2](https://projects.gentoo.org/pms/9/pms.html#mandatory-ebuilddefined-variables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IUseDefault {
    /// `+flag`
    Enabled,
    /// `-flag`
    Disabled,
}

/// A single USE flag entry from the `IUSE` variable.
///
/// See [PMS 7.2](https://projects.gentoo.org/pms/9/pms.html#mandatory-ebuilddefined-variables).
///
/// # Examples
///
/// ```
/// use eix_cache::{IUse, IUseDefault};
///
/// let flag: IUse = "+ssl".parse().unwrap();
/// assert_eq!(flag.name, "ssl");
/// assert_eq!(flag.default, Some(IUseDefault::Enabled));
/// assert!("+".parse::<IUse>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IUse {
    /// The USE flag name (without prefix).
    pub name: String,
    /// Optional default state prefix.
    pub default: Option<IUseDefault>,
}

impl FromStr for IUse {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, default) = match s.as_bytes().first() {
            Some(b'+') => (&s[1..], Some(IUseDefault::Enabled)),
            Some(b'-') => (&s[1..], Some(IUseDefault::Disabled)),
            _ => (s, None),
        };
        if name.is_empty() {
            return Err(Error::InvalidIUse(s.to_string()));
        }
        Ok(IUse {
            name: name.to_string(),
            default,
        })
    }
}

/// The set of USE flags a version declares, without default markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IUseSet {
    flags: BTreeSet<String>,
    enabled: BTreeSet<String>,
}

impl IUseSet {
    /// Build the set from an `IUSE` value. Malformed entries are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use eix_cache::IUseSet;
    ///
    /// let iuse = IUseSet::parse("+ssl -debug test ssl");
    /// assert_eq!(iuse.len(), 3);
    /// assert!(iuse.contains("debug"));
    /// assert!(iuse.is_default_enabled("ssl"));
    /// ```
    pub fn parse(input: &str) -> IUseSet {
        let mut set = IUseSet::default();
        for token in input.split_whitespace() {
            match token.parse::<IUse>() {
                Ok(flag) => {
                    if flag.default == Some(IUseDefault::Enabled) {
                        set.enabled.insert(flag.name.clone());
                    }
                    set.flags.insert(flag.name);
                }
                Err(e) => debug!(token, "skipping IUSE entry: {e}"),
            }
        }
        set
    }

    /// `true` if the flag is declared.
    pub fn contains(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// `true` if the flag is declared as `+flag`.
    pub fn is_default_enabled(&self, flag: &str) -> bool {
        self.enabled.contains(flag)
    }

    /// Number of distinct flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// `true` if no flag is declared.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flag names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }
}

impl fmt::Display for IUseSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, flag) in self.flags.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if self.enabled.contains(flag) {
                f.write_str("+")?;
            }
            f.write_str(flag)?;
        }
        Ok(())
    }
}
