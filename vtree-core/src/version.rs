use crate::registry::{PackageMetadata, RegistryVersion};
use crate::{Result, VtreeError};

/// Dist-tag used when no range is requested.
pub const LATEST_TAG: &str = "latest";

/// Picks the published version `range` refers to.
///
/// A dist-tag name is swapped for the version it points at before
/// matching; the greatest version satisfying the result wins.
pub fn select_version<'a>(
    name: &str,
    range: &str,
    package: &'a PackageMetadata,
) -> Result<&'a RegistryVersion> {
    let trimmed = range.trim();
    let look_for = package
        .dist_tags
        .get(trimmed)
        .map(String::as_str)
        .unwrap_or(trimmed);

    let selected = vtree_semver::max_satisfying(&package.available, look_for)
        .and_then(|version| package.versions.get(&version));

    match selected {
        Some(meta) => {
            tracing::debug!("Result for {}#{}: {}.", name, range, meta.version);
            Ok(meta)
        }
        None => Err(VtreeError::Resolution {
            name: name.to_string(),
            range: range.to_string(),
            available: package.available.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::registry::RegistryPackage;
    use crate::testing::version;

    fn metadata(tags: &[(&str, &str)], versions: &[&str]) -> PackageMetadata {
        let package = RegistryPackage {
            name: "pkg".into(),
            dist_tags: tags
                .iter()
                .map(|(t, v)| (t.to_string(), v.to_string()))
                .collect(),
            versions: versions
                .iter()
                .map(|v| (v.to_string(), version(v)))
                .collect(),
        };
        PackageMetadata::from_registry("pkg", package)
    }

    #[test]
    fn selects_greatest_match_for_caret_range() {
        let package = metadata(&[], &["1.0.0", "1.2.0", "2.0.0"]);
        let meta = select_version("pkg", "^1.0.0", &package).unwrap();
        assert_eq!(meta.version, "1.2.0");
    }

    #[test]
    fn substitutes_dist_tags() {
        let package = metadata(&[("latest", "2.0.0"), ("ts5.9", "1.0.0")], &["1.0.0", "2.0.0"]);
        assert_eq!(select_version("pkg", LATEST_TAG, &package).unwrap().version, "2.0.0");
        assert_eq!(select_version("pkg", "ts5.9", &package).unwrap().version, "1.0.0");
    }

    #[test]
    fn reports_available_versions_when_nothing_matches() {
        let package = metadata(&[], &["2.0.0", "1.0.0"]);
        let err = select_version("pkg", "2.5.0", &package).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Resolution);
        match &err {
            VtreeError::Resolution {
                name,
                range,
                available,
            } => {
                assert_eq!(name, "pkg");
                assert_eq!(range, "2.5.0");
                assert_eq!(available, &vec!["1.0.0".to_string(), "2.0.0".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("Use one of: 1.0.0, 2.0.0."));
    }

    #[test]
    fn missing_latest_tag_is_a_resolution_error() {
        let package = metadata(&[], &["1.0.0"]);
        assert!(select_version("pkg", LATEST_TAG, &package).is_err());
    }
}
