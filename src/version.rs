use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::{Error, Result};

/// A run of decimal digits compared the way portage compares version
/// components.
///
/// The digits are kept verbatim, so leading zeros survive. Components
/// without leading zeros compare numerically (shorter is smaller, then
/// byte-wise); as soon as either side has a leading zero the comparison
/// falls back to plain string ordering.
///
/// A *magic* value stands for "absent" (for instance a missing `-r`
/// revision) and sorts below every other value, zero included.
#[derive(Debug, Clone)]
pub struct LeadNum {
    text: String,
    is_zero: bool,
    is_magic: bool,
}

impl LeadNum {
    /// Build a value from a string of digits.
    ///
    /// Only the leading digit run of `text` is used; anything after it is
    /// ignored.
    pub fn new(text: &str) -> Self {
        let mut input = text;
        Self::parse(&mut input)
    }

    /// The magic "absent" value.
    pub fn magic() -> Self {
        LeadNum {
            text: String::new(),
            is_zero: true,
            is_magic: true,
        }
    }

    /// Consume the leading digit run of `input` (possibly empty).
    ///
    /// # Examples
    ///
    /// ```
    /// use eix_cache::LeadNum;
    ///
    /// let mut input = "0042_rc1";
    /// let num = LeadNum::parse(&mut input);
    /// assert_eq!(num.as_str(), "0042");
    /// assert_eq!(input, "_rc1");
    /// ```
    pub fn parse(input: &mut &str) -> Self {
        let text: &str = *input;
        let end = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (digits, rest) = text.split_at(end);
        *input = rest;
        LeadNum {
            text: digits.to_string(),
            is_zero: digits.bytes().all(|b| b == b'0'),
            is_magic: false,
        }
    }

    /// Mark this value as absent.
    pub fn set_magic(&mut self) {
        self.text.clear();
        self.is_zero = true;
        self.is_magic = true;
    }

    /// The digits exactly as they were read.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// `true` if every digit is `0` (vacuously for an empty run).
    pub fn is_zero(&self) -> bool {
        self.is_zero
    }

    /// `true` for the "absent" value.
    pub fn is_magic(&self) -> bool {
        self.is_magic
    }

    /// `true` if there is more than one digit and the first one is `0`.
    pub fn leadzero(&self) -> bool {
        self.text.len() > 1 && self.text.starts_with('0')
    }

    /// Total order on digit runs, see the type-level documentation.
    pub fn compare(left: &LeadNum, right: &LeadNum) -> Ordering {
        // magic must stay the smallest value
        if left.is_zero {
            if !right.is_zero {
                return Ordering::Less;
            }
            return match (left.is_magic, right.is_magic) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                // "" < "0" < "00" < ...
                (false, false) => left.text.len().cmp(&right.text.len()),
            };
        }
        if right.is_zero {
            return Ordering::Greater;
        }

        match (left.leadzero(), right.leadzero()) {
            (true, true) => left.text.as_bytes().cmp(right.text.as_bytes()),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => left
                .text
                .len()
                .cmp(&right.text.len())
                .then_with(|| left.text.as_bytes().cmp(right.text.as_bytes())),
        }
    }
}

impl PartialEq for LeadNum {
    fn eq(&self, other: &Self) -> bool {
        Self::compare(self, other) == Ordering::Equal
    }
}

impl Eq for LeadNum {}

impl PartialOrd for LeadNum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LeadNum {
    fn cmp(&self, other: &Self) -> Ordering {
        Self::compare(self, other)
    }
}

impl Default for LeadNum {
    /// The empty digit run, same as `LeadNum::new("")`.
    fn default() -> Self {
        LeadNum::new("")
    }
}

impl fmt::Display for LeadNum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Release stage of a version suffix.
///
/// Variants are declared in ascending order; [`SuffixLevel::Release`] is
/// the implicit level of a version without any suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SuffixLevel {
    /// `_alpha`
    Alpha,
    /// `_beta`
    Beta,
    /// `_pre`
    Pre,
    /// `_rc`
    Rc,
    /// No suffix.
    #[default]
    Release,
    /// `_p` (patch level).
    Patch,
}

/// Suffix level names in matching order. `pre` must be tried before `p`.
const SUFFIX_LEVELS: [(SuffixLevel, &str); 6] = [
    (SuffixLevel::Alpha, "alpha"),
    (SuffixLevel::Beta, "beta"),
    (SuffixLevel::Pre, "pre"),
    (SuffixLevel::Rc, "rc"),
    (SuffixLevel::Release, ""),
    (SuffixLevel::Patch, "p"),
];

impl SuffixLevel {
    /// The name used in version strings (empty for [`SuffixLevel::Release`]).
    pub fn as_str(&self) -> &'static str {
        SUFFIX_LEVELS
            .iter()
            .find(|(level, _)| level == self)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }
}

/// A version suffix such as `_pre2` or `_p20240101`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Suffix {
    /// Release stage.
    pub level: SuffixLevel,
    /// Numeric qualifier, empty if none was given.
    pub num: LeadNum,
}

impl Suffix {
    /// Parse one `_<level><digits>` suffix from the front of `input`.
    ///
    /// On success the cursor is advanced past the suffix. If `input` does
    /// not start with a recognised suffix, `None` is returned and the cursor
    /// is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use eix_cache::{Suffix, SuffixLevel};
    ///
    /// let mut input = "_pre2-r1";
    /// let suffix = Suffix::parse(&mut input).unwrap();
    /// assert_eq!(suffix.level, SuffixLevel::Pre);
    /// assert_eq!(suffix.num.as_str(), "2");
    /// assert_eq!(input, "-r1");
    ///
    /// let mut input = "_bogus";
    /// assert!(Suffix::parse(&mut input).is_none());
    /// assert_eq!(input, "_bogus");
    /// ```
    pub fn parse(input: &mut &str) -> Option<Suffix> {
        let text: &str = *input;
        let body = text.strip_prefix('_')?;
        SUFFIX_LEVELS
            .iter()
            .filter(|(level, _)| *level != SuffixLevel::Release)
            .find_map(|(level, name)| {
                let mut rest = body.strip_prefix(name)?;
                let num = LeadNum::parse(&mut rest);
                *input = rest;
                Some(Suffix { level: *level, num })
            })
    }

    /// Compare by level first, then by numeric qualifier.
    pub fn compare(left: &Suffix, right: &Suffix) -> Ordering {
        left.level
            .cmp(&right.level)
            .then_with(|| LeadNum::compare(&left.num, &right.num))
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "_{}{}", self.level.as_str(), self.num)
    }
}

/// A parsed ebuild version with portage's total order.
///
/// A version is made of dot-separated numeric components, an optional
/// letter, any number of suffixes, and an optional `-r` revision, which in
/// turn may carry a subrevision (`-r01.2`). Text that does not fit the
/// grammar is kept as *garbage*: parsing never fails, and the garbage only
/// takes part in the final tie-break of [`BasicVersion::compare`].
///
/// Equality follows the comparator, not the text.
///
/// # Examples
///
/// ```
/// use eix_cache::BasicVersion;
///
/// let rc = BasicVersion::parse("1.0_rc3");
/// let release = BasicVersion::parse("1.0");
/// let patched = BasicVersion::parse("1.0_p1");
/// assert!(rc < release);
/// assert!(release < patched);
/// ```
#[derive(Debug, Clone)]
pub struct BasicVersion {
    full: String,
    garbage: String,
    primary: Vec<LeadNum>,
    primary_char: Option<char>,
    suffixes: Vec<Suffix>,
    revision: LeadNum,
    subrevision: LeadNum,
}

impl BasicVersion {
    /// Parse a version string. Never fails; unparsable trailing text ends
    /// up in [`BasicVersion::garbage`] and is reported as a warning.
    pub fn parse(text: &str) -> BasicVersion {
        let version = Self::parse_quiet(text);
        if !version.garbage.is_empty() {
            warn!(version = text, garbage = %version.garbage, "garbage at end of version string");
        }
        version
    }

    /// [`BasicVersion::parse`] without the garbage warning, for checking
    /// candidate strings.
    pub(crate) fn parse_quiet(text: &str) -> BasicVersion {
        let mut version = BasicVersion {
            full: text.to_string(),
            garbage: String::new(),
            primary: Vec::new(),
            primary_char: None,
            suffixes: Vec::new(),
            revision: LeadNum::magic(),
            subrevision: LeadNum::magic(),
        };

        let mut input = text;
        version.parse_primary(&mut input);

        while let Some(suffix) = Suffix::parse(&mut input) {
            version.suffixes.push(suffix);
        }

        if let Some(mut rest) = input.strip_prefix("-r") {
            version.revision = LeadNum::parse(&mut rest);
            if version.revision.leadzero() {
                if let Some(mut sub) = rest.strip_prefix('.') {
                    version.subrevision = LeadNum::parse(&mut sub);
                    rest = sub;
                }
            }
            input = rest;
        }

        version.garbage = input.to_string();
        version
    }

    fn parse_primary(&mut self, input: &mut &str) {
        let text: &str = *input;
        let mut component = String::new();
        let mut consumed = 0;
        for c in text.chars() {
            match c {
                '.' => self.primary.push(LeadNum::new(&std::mem::take(&mut component))),
                '0'..='9' => component.push(c),
                _ => break,
            }
            consumed += 1;
        }
        if !component.is_empty() {
            self.primary.push(LeadNum::new(&component));
        }
        let rest = &text[consumed..];

        match rest.chars().next().filter(char::is_ascii_alphabetic) {
            Some(c) => {
                self.primary_char = Some(c);
                *input = &rest[1..];
            }
            None => *input = rest,
        }
    }

    /// The string this version was parsed from.
    pub fn full(&self) -> &str {
        &self.full
    }

    /// Trailing text the grammar could not consume.
    pub fn garbage(&self) -> &str {
        &self.garbage
    }

    /// Dot-separated numeric components.
    pub fn primary(&self) -> &[LeadNum] {
        &self.primary
    }

    /// Letter following the numeric components (`1.2b`).
    pub fn primary_char(&self) -> Option<char> {
        self.primary_char
    }

    /// Suffixes in the order they appear.
    pub fn suffixes(&self) -> &[Suffix] {
        &self.suffixes
    }

    /// The `-r` revision; magic if absent.
    pub fn revision(&self) -> &LeadNum {
        &self.revision
    }

    /// The subrevision after `-r0N.`; magic if absent.
    pub fn subrevision(&self) -> &LeadNum {
        &self.subrevision
    }

    /// Rebuild the version string from its parsed parts.
    pub fn to_canonical_string(&self) -> String {
        let mut out = self
            .primary
            .iter()
            .map(LeadNum::as_str)
            .collect::<Vec<_>>()
            .join(".");
        if let Some(c) = self.primary_char {
            out.push(c);
        }
        for suffix in &self.suffixes {
            out.push_str(&suffix.to_string());
        }
        if !self.revision.is_magic() {
            out.push_str("-r");
            out.push_str(self.revision.as_str());
            if !self.subrevision.is_magic() {
                out.push('.');
                out.push_str(self.subrevision.as_str());
            }
        }
        out.push_str(&self.garbage);
        out
    }

    /// Compare numeric components; with a common prefix, more components
    /// win (`1.0 > 1`).
    pub fn compare_primary(left: &BasicVersion, right: &BasicVersion) -> Ordering {
        left.primary
            .iter()
            .zip(&right.primary)
            .map(|(a, b)| LeadNum::compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| left.primary.len().cmp(&right.primary.len()))
    }

    /// Compare suffix lists; a missing suffix compares as a plain release.
    pub fn compare_suffix(left: &BasicVersion, right: &BasicVersion) -> Ordering {
        let release = Suffix::default();
        let len = left.suffixes.len().max(right.suffixes.len());
        (0..len)
            .map(|i| {
                Suffix::compare(
                    left.suffixes.get(i).unwrap_or(&release),
                    right.suffixes.get(i).unwrap_or(&release),
                )
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Order ignoring revisions, as used by `~` dependency matching.
    pub fn compare_tilde(left: &BasicVersion, right: &BasicVersion) -> Ordering {
        Self::compare_primary(left, right)
            .then_with(|| left.primary_char.cmp(&right.primary_char))
            .then_with(|| Self::compare_suffix(left, right))
    }

    /// The full total order.
    ///
    /// After [`BasicVersion::compare_tilde`], revisions are compared. A
    /// revision with a leading zero that carries a subrevision (`-r01.2`)
    /// is folded by dropping its first digit, so `-r01.2` counts as
    /// revision `1`. Then subrevisions are compared, and finally the raw
    /// garbage strings, which keeps the order total for odd inputs.
    pub fn compare(left: &BasicVersion, right: &BasicVersion) -> Ordering {
        Self::compare_tilde(left, right)
            .then_with(|| LeadNum::compare(&left.effective_revision(), &right.effective_revision()))
            .then_with(|| LeadNum::compare(&left.subrevision, &right.subrevision))
            .then_with(|| left.garbage.as_bytes().cmp(right.garbage.as_bytes()))
    }

    fn effective_revision(&self) -> LeadNum {
        if self.subrevision.is_magic() || !self.revision.leadzero() {
            return self.revision.clone();
        }
        LeadNum::new(&self.revision.as_str()[1..])
    }
}

impl PartialEq for BasicVersion {
    fn eq(&self, other: &Self) -> bool {
        Self::compare(self, other) == Ordering::Equal
    }
}

impl Eq for BasicVersion {}

impl PartialOrd for BasicVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BasicVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        Self::compare(self, other)
    }
}

impl FromStr for BasicVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidVersion("empty version".to_string()));
        }
        Ok(BasicVersion::parse(s))
    }
}

impl Default for BasicVersion {
    /// The empty version, with absent revision and subrevision.
    fn default() -> Self {
        BasicVersion::parse_quiet("")
    }
}

impl fmt::Display for BasicVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> BasicVersion {
        BasicVersion::parse(s)
    }

    fn num(s: &str) -> LeadNum {
        LeadNum::new(s)
    }

    #[test]
    fn leadnum_parse_keeps_leading_zeros() {
        let mut input = "007abc";
        let n = LeadNum::parse(&mut input);
        assert_eq!(n.as_str(), "007");
        assert!(!n.is_zero());
        assert!(n.leadzero());
        assert_eq!(input, "abc");
    }

    #[test]
    fn leadnum_parse_empty_run_is_zero() {
        let mut input = "abc";
        let n = LeadNum::parse(&mut input);
        assert_eq!(n.as_str(), "");
        assert!(n.is_zero());
        assert!(!n.is_magic());
        assert_eq!(input, "abc");
    }

    #[test]
    fn defaults_match_empty_parse() {
        let n = LeadNum::default();
        assert!(n.is_zero());
        assert!(!n.is_magic());
        assert_eq!(LeadNum::compare(&n, &num("")), Ordering::Equal);
        assert_eq!(LeadNum::compare(&n, &num("0")), Ordering::Less);

        let empty = BasicVersion::default();
        assert!(empty.revision().is_magic());
        assert!(empty.subrevision().is_magic());
        assert_eq!(BasicVersion::compare(&empty, &v("")), Ordering::Equal);
        assert_eq!(Suffix::default().num, num(""));
    }

    #[test]
    fn leadnum_magic_is_minimum() {
        let magic = LeadNum::magic();
        assert_eq!(LeadNum::compare(&magic, &LeadNum::magic()), Ordering::Equal);
        assert_eq!(LeadNum::compare(&magic, &num("")), Ordering::Less);
        assert_eq!(LeadNum::compare(&magic, &num("0")), Ordering::Less);
        assert_eq!(LeadNum::compare(&magic, &num("1")), Ordering::Less);
        assert_eq!(LeadNum::compare(&num(""), &magic), Ordering::Greater);
    }

    #[test]
    fn leadnum_set_magic() {
        let mut n = num("12");
        n.set_magic();
        assert!(n.is_magic());
        assert!(n < num(""));
    }

    #[test]
    fn leadnum_zero_lengths() {
        assert!(num("") < num("0"));
        assert!(num("0") < num("00"));
        assert!(num("00") < num("000"));
        assert_eq!(num("00"), num("00"));
        assert!(num("000") < num("1"));
    }

    #[test]
    fn leadnum_numeric_and_lexicographic() {
        assert!(num("9") < num("10"));
        assert!(num("12") < num("13"));
        assert!(num("007") < num("07"));
        assert!(num("01") < num("1"));
        assert!(num("09") < num("1"));
        assert!(num("010") < num("02"));
    }

    #[test]
    fn suffix_parse_pre() {
        let mut input = "_pre2";
        let s = Suffix::parse(&mut input).unwrap();
        assert_eq!(s.level, SuffixLevel::Pre);
        assert_eq!(s.num.as_str(), "2");
        assert_eq!(input, "");
    }

    #[test]
    fn suffix_parse_p_and_pre_disambiguation() {
        let mut input = "_p3";
        assert_eq!(Suffix::parse(&mut input).unwrap().level, SuffixLevel::Patch);
        let mut input = "_pre";
        let s = Suffix::parse(&mut input).unwrap();
        assert_eq!(s.level, SuffixLevel::Pre);
        assert_eq!(s.num.as_str(), "");
    }

    #[test]
    fn suffix_parse_failure_leaves_cursor() {
        let mut input = "_bogus";
        assert!(Suffix::parse(&mut input).is_none());
        assert_eq!(input, "_bogus");

        let mut input = "pre1";
        assert!(Suffix::parse(&mut input).is_none());
        assert_eq!(input, "pre1");
    }

    #[test]
    fn suffix_default_is_release() {
        let s = Suffix::default();
        assert_eq!(s.level, SuffixLevel::Release);
        assert_eq!(s.num.as_str(), "");
        assert_eq!(s.to_string(), "_");
    }

    #[test]
    fn parse_components() {
        let ver = v("1.2.03b_alpha1_p2-r3");
        let primary: Vec<&str> = ver.primary().iter().map(LeadNum::as_str).collect();
        assert_eq!(primary, vec!["1", "2", "03"]);
        assert_eq!(ver.primary_char(), Some('b'));
        assert_eq!(ver.suffixes().len(), 2);
        assert_eq!(ver.suffixes()[0].level, SuffixLevel::Alpha);
        assert_eq!(ver.suffixes()[1].level, SuffixLevel::Patch);
        assert_eq!(ver.revision().as_str(), "3");
        assert!(ver.subrevision().is_magic());
        assert_eq!(ver.garbage(), "");
    }

    #[test]
    fn parse_no_revision_is_magic() {
        let ver = v("1.0");
        assert!(ver.revision().is_magic());
        assert!(ver.subrevision().is_magic());
    }

    #[test]
    fn parse_subrevision() {
        let ver = v("1.0-r01.2");
        assert_eq!(ver.revision().as_str(), "01");
        assert_eq!(ver.subrevision().as_str(), "2");
        assert_eq!(ver.garbage(), "");
    }

    #[test]
    fn parse_subrevision_requires_leading_zero() {
        let ver = v("1.0-r1.2");
        assert_eq!(ver.revision().as_str(), "1");
        assert!(ver.subrevision().is_magic());
        assert_eq!(ver.garbage(), ".2");
    }

    #[test]
    fn parse_garbage_is_kept() {
        let ver = v("1.0-foo");
        assert_eq!(ver.garbage(), "-foo");
        assert_eq!(ver.full(), "1.0-foo");
    }

    #[test]
    fn canonical_string() {
        assert_eq!(v("1.02_rc3-r01.4").to_canonical_string(), "1.02_rc3-r01.4");
        assert_eq!(v("2.0b_p").to_canonical_string(), "2.0b_p");
        assert_eq!(v("1.").to_canonical_string(), "1");
    }

    #[test]
    fn display_is_original_text() {
        assert_eq!(v("1.").to_string(), "1.");
    }

    #[test]
    fn from_str_rejects_empty() {
        assert!("".parse::<BasicVersion>().is_err());
        assert!("1.0".parse::<BasicVersion>().is_ok());
    }

    #[test]
    fn literal_orderings() {
        assert!(v("1") < v("1.0"));
        let chain = ["1.0_alpha", "1.0_beta", "1.0_pre", "1.0_rc", "1.0", "1.0_p"];
        for pair in chain.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
        assert!(v("1.0_alpha1") < v("1.0_alpha2"));
        assert!(v("007") < v("07"));
        assert!(v("0") < v("00"));
        assert!(v("00") < v("000"));
    }

    #[test]
    fn letter_and_suffix_orderings() {
        assert!(v("1.0") < v("1.0a"));
        assert!(v("1.0a") < v("1.0b"));
        assert!(v("1.0_rc1_p1") < v("1.0_rc2"));
        assert!(v("1.0_p1_alpha") < v("1.0_p1"));
        assert!(v("1.0_p1") < v("1.0_p1_p1"));
        assert!(v("1.2") < v("1.10"));
    }

    #[test]
    fn revision_orderings() {
        assert!(v("1.0") < v("1.0-r0"));
        assert!(v("1.0-r0") < v("1.0-r1"));
        assert!(v("1.0-r1") < v("1.0-r10"));
        assert!(v("1.0-r9") < v("1.1"));
        assert!(v("1.0_rc1-r5") < v("1.0"));
    }

    #[test]
    fn revision_fold_truth_table() {
        // leading zero without a subrevision is compared as is
        assert!(v("1.0-r01") < v("1.0-r1"));
        // with a subrevision the leading zero folds away
        assert_eq!(v("1.0-r01.0").cmp(&v("1.0-r1")), Ordering::Greater);
        assert_eq!(v("1.0-r01.2"), v("1.0-r01.2"));
        assert!(v("1.0-r01.1") < v("1.0-r01.2"));
        assert!(v("1.0-r01.9") < v("1.0-r2"));
        assert!(v("1.0-r02.1") > v("1.0-r1"));
        assert!(v("1.0-r00.1") > v("1.0-r0"));
        assert!(v("1.0") < v("1.0-r00.1"));
        // no leading zero: the subrevision is garbage, not folded
        assert_eq!(v("1.0-r1.2").garbage(), ".2");
        assert!(v("1.0-r1.2").subrevision().is_magic());
        assert_eq!(v("1.0-r01.2").cmp(&v("1.0-r1.2")), Ordering::Greater);
    }

    #[test]
    fn garbage_breaks_ties() {
        assert_eq!(BasicVersion::compare_tilde(&v("1.0"), &v("1.0foo")), Ordering::Less);
        assert!(v("1.0-x") < v("1.0-y"));
        assert!(v("1.0") < v("1.0-x"));
        assert_eq!(v("1.0-x"), v("1.0-x"));
    }

    #[test]
    fn tilde_ignores_revision() {
        assert_eq!(
            BasicVersion::compare_tilde(&v("1.0-r3"), &v("1.0")),
            Ordering::Equal
        );
        assert_eq!(BasicVersion::compare(&v("1.0-r3"), &v("1.0")), Ordering::Greater);
    }

    #[test]
    fn sorting_versions() {
        let mut versions: Vec<BasicVersion> = ["2.0", "1.0_rc1", "1.0-r1", "1.0", "1.0_p2"]
            .iter()
            .map(|s| v(s))
            .collect();
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(BasicVersion::full).collect();
        assert_eq!(sorted, vec!["1.0_rc1", "1.0", "1.0-r1", "1.0_p2", "2.0"]);
    }

    fn version_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex(
            "[0-9]{1,3}(\\.[0-9]{1,3}){0,2}[a-c]?(_(alpha|beta|pre|rc|p)[0-9]{0,2}){0,2}(-r0?[0-9]{1,2}(\\.[0-9])?)?(-[xy])?",
        )
        .unwrap()
    }

    proptest! {
        #[test]
        fn compare_is_reflexive(a in version_strategy()) {
            let a = v(&a);
            prop_assert_eq!(BasicVersion::compare(&a, &a), Ordering::Equal);
        }

        #[test]
        fn compare_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
            let (a, b) = (v(&a), v(&b));
            prop_assert_eq!(BasicVersion::compare(&a, &b), BasicVersion::compare(&b, &a).reverse());
        }

        #[test]
        fn compare_is_transitive(
            a in version_strategy(),
            b in version_strategy(),
            c in version_strategy(),
        ) {
            let mut sorted = vec![v(&a), v(&b), v(&c)];
            sorted.sort();
            prop_assert!(BasicVersion::compare(&sorted[0], &sorted[1]).is_le());
            prop_assert!(BasicVersion::compare(&sorted[1], &sorted[2]).is_le());
            prop_assert!(BasicVersion::compare(&sorted[0], &sorted[2]).is_le());
        }
    }
}
