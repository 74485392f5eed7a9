use semver::VersionReq;
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, Clone)]
pub struct RangeSet {
    ranges: Vec<VersionReq>,
}

#[derive(Debug, Clone)]
pub struct Error {
    input: String,
    message: String,
}

impl Error {
    pub fn new(input: String, message: String) -> Self {
        Self { input, message }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.input)
    }
}

impl StdError for Error {}

impl RangeSet {
    pub fn parse(original: &str) -> Result<Self, Error> {
        let mut ranges = Vec::new();

        // An empty alternative, like an empty range, matches anything.
        for part in original.trim().split("||") {
            let part = part.trim();
            if part.is_empty() {
                ranges.push(VersionReq::STAR);
                continue;
            }

            let normalized = normalize_and_part(part)
                .ok_or_else(|| Error::new(original.to_string(), "invalid comparator".into()))?;

            let req = VersionReq::parse(&normalized)
                .map_err(|err| Error::new(original.to_string(), err.to_string()))?;

            ranges.push(req);
        }

        Ok(RangeSet { ranges })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.ranges.iter().any(|r| r.matches(version))
    }
}

/// Reports whether `range` is something the registry can be queried with.
///
/// Dist-tags, URLs, `file:`/`git+` specifiers and aliases are not ranges.
pub fn is_valid_range(range: &str) -> bool {
    RangeSet::parse(range).is_ok()
}

/// Greatest version in `versions` satisfying `range`.
///
/// Entries that do not parse as semver are skipped. An invalid range
/// satisfies nothing.
pub fn max_satisfying<S: AsRef<str>>(versions: &[S], range: &str) -> Option<String> {
    let set = RangeSet::parse(range).ok()?;
    let mut best: Option<(Version, &str)> = None;

    for raw in versions {
        let raw = raw.as_ref();
        let Ok(ver) = Version::parse(raw) else {
            continue;
        };

        if !set.matches(&ver) {
            continue;
        }

        match &best {
            Some((current, _)) if ver <= *current => {}
            _ => best = Some((ver, raw)),
        }
    }

    best.map(|(_, raw)| raw.to_string())
}

fn normalize_and_part(part: &str) -> Option<String> {
    let tokens: Vec<&str> = part.split_whitespace().collect();

    if tokens.len() == 3 && tokens[1] == "-" {
        let lower = normalize_comparator(&format!(">={}", tokens[0]))?;
        let upper = normalize_comparator(&format!("<={}", tokens[2]))?;
        return Some(format!("{lower}, {upper}"));
    }

    // ">= 4.21.0" splits into an operator token and a version token.
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in tokens {
        if is_operator(token) {
            if pending_op.is_some() {
                return None;
            }
            pending_op = Some(token);
            continue;
        }

        let joined = match pending_op.take() {
            Some(op) => format!("{op}{token}"),
            None => token.to_string(),
        };
        comparators.push(normalize_comparator(&joined)?);
    }

    if pending_op.is_some() || comparators.is_empty() {
        return None;
    }

    Some(comparators.join(", "))
}

fn is_operator(token: &str) -> bool {
    matches!(token, "=" | ">" | ">=" | "<" | "<=" | "~" | "^")
}

fn normalize_comparator(comparator: &str) -> Option<String> {
    let split = comparator
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '~' | '^'))
        .unwrap_or(comparator.len());
    let (op, rest) = comparator.split_at(split);
    let rest = rest.strip_prefix(['v', 'V']).unwrap_or(rest);

    if rest.is_empty() {
        return None;
    }

    if !rest.starts_with(|c: char| c.is_ascii_digit() || matches!(c, 'x' | 'X' | '*')) {
        return None;
    }

    let is_wildcard = |p: &str| matches!(p, "x" | "X" | "*");

    // "x.x.x", "*.*": nothing is pinned. Only strict bounds exclude everything.
    if rest.split('.').all(is_wildcard) {
        return Some(match op {
            "<" | ">" => "<0.0.0".to_string(),
            _ => "*".to_string(),
        });
    }

    // npm treats a bare version as exact; the `semver` crate defaults to caret.
    if op.is_empty() && !rest.split('.').any(is_wildcard) {
        return Some(format!("={rest}"));
    }

    Some(format!("{op}{rest}"))
}

pub use semver::Version;

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    #[test]
    fn normalizes_ge_space() {
        let set = RangeSet::parse(">= 4.21.0").unwrap();
        assert!(set.matches(&v("4.21.0")));
        assert!(set.matches(&v("5.0.0")));
        assert!(!set.matches(&v("4.20.9")));
    }

    #[test]
    fn treats_empty_as_wildcard() {
        let set = RangeSet::parse("").unwrap();
        assert!(set.matches(&v("999.0.0")));
    }

    #[test]
    fn dotted_wildcards_match_anything() {
        for spec in ["x.x.x", "*.*", "X.x", ">=*.*.*", "^x.x"] {
            let set = RangeSet::parse(spec).unwrap();
            assert!(set.matches(&v("0.1.0")), "{spec}");
            assert!(set.matches(&v("42.0.0")), "{spec}");
        }
        assert!(!RangeSet::parse("<x.x").unwrap().matches(&v("0.0.1")));
    }

    #[test]
    fn empty_alternative_matches_anything() {
        let versions = ["1.2.3", "2.5.0", "3.1.0"];
        assert_eq!(
            max_satisfying(&versions, "1.2.3 || 2.x || ").as_deref(),
            Some("3.1.0")
        );
        assert_eq!(max_satisfying(&versions, "1.2.3 || 2.x").as_deref(), Some("2.5.0"));
    }

    #[test]
    fn handles_or_ranges() {
        let set = RangeSet::parse("^1.0.0 || ^2.0.0").unwrap();
        assert!(set.matches(&v("1.5.0")));
        assert!(set.matches(&v("2.3.0")));
        assert!(!set.matches(&v("3.0.0")));
    }

    #[test]
    fn bare_version_is_exact() {
        let set = RangeSet::parse("1.0.0").unwrap();
        assert!(set.matches(&v("1.0.0")));
        assert!(!set.matches(&v("1.2.0")));

        let prefixed = RangeSet::parse("v2.0.0").unwrap();
        assert!(prefixed.matches(&v("2.0.0")));
    }

    #[test]
    fn partial_versions_cover_their_minor() {
        let set = RangeSet::parse("1.2").unwrap();
        assert!(set.matches(&v("1.2.9")));
        assert!(!set.matches(&v("1.3.0")));

        let x_range = RangeSet::parse("1.x").unwrap();
        assert!(x_range.matches(&v("1.9.0")));
        assert!(!x_range.matches(&v("2.0.0")));
    }

    #[test]
    fn space_separated_comparators_intersect() {
        let set = RangeSet::parse(">=1.0.0 <2.0.0").unwrap();
        assert!(set.matches(&v("1.9.9")));
        assert!(!set.matches(&v("2.0.0")));
    }

    #[test]
    fn hyphen_range_is_inclusive() {
        let set = RangeSet::parse("1.0.0 - 2.3.4").unwrap();
        assert!(set.matches(&v("1.0.0")));
        assert!(set.matches(&v("2.3.4")));
        assert!(!set.matches(&v("2.3.5")));
    }

    #[test]
    fn rejects_non_registry_specifiers() {
        for spec in [
            "latest",
            "next",
            "https://example.com/pkg.tgz",
            "file:../local",
            "git+ssh://git@github.com/a/b.git",
            "user/repo",
            "npm:other@^1.0.0",
        ] {
            assert!(!is_valid_range(spec), "{spec} should be rejected");
        }
    }

    #[test]
    fn accepts_common_ranges() {
        for spec in ["*", "x", "x.x.x", "^1.2.3", "~1.2", ">=1.0.0", "1.2.3", "1 || 2"] {
            assert!(is_valid_range(spec), "{spec} should be accepted");
        }
    }

    #[test]
    fn max_satisfying_picks_greatest_match() {
        let versions = ["1.0.0", "1.2.0", "2.0.0"];
        assert_eq!(max_satisfying(&versions, "^1.0.0").as_deref(), Some("1.2.0"));
        assert_eq!(max_satisfying(&versions, "*").as_deref(), Some("2.0.0"));
        assert_eq!(max_satisfying(&versions, "2.5.0"), None);
        assert_eq!(max_satisfying(&versions, "latest"), None);
    }

    #[test]
    fn max_satisfying_skips_unparseable_versions() {
        let versions = ["not-a-version", "1.0.0"];
        assert_eq!(max_satisfying(&versions, "*").as_deref(), Some("1.0.0"));
    }
}
