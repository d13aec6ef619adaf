//! API version comparison.

use std::cmp::Ordering;

/// Version used when neither configuration nor project files name one.
pub const DEFAULT_API_VERSION: &str = "58.0";

/// Whether `version` is a dotted numeric string such as `58.0`.
pub fn is_valid_api_version(version: &str) -> bool {
    numeric_parts(version).is_some()
}

/// Compare dotted numeric versions component by component.
///
/// Missing components count as zero, so `58` equals `58.0`. Versions that are
/// not numeric fall back to plain string ordering.
pub fn compare_api_versions(left: &str, right: &str) -> Ordering {
    match (numeric_parts(left), numeric_parts(right)) {
        (Some(left), Some(right)) => {
            let len = left.len().max(right.len());
            (0..len)
                .map(|i| {
                    let l = left.get(i).copied().unwrap_or(0);
                    let r = right.get(i).copied().unwrap_or(0);
                    l.cmp(&r)
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        }
        _ => left.cmp(right),
    }
}

/// Highest version in `versions`; the first one wins among equals.
pub fn max_api_version<'a>(versions: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    versions.into_iter().fold(None, |best, candidate| match best {
        Some(current) if compare_api_versions(candidate, current) != Ordering::Greater => {
            Some(current)
        }
        _ => Some(candidate),
    })
}

fn numeric_parts(version: &str) -> Option<Vec<u64>> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.split('.').map(|part| part.parse().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_comparison() {
        assert_eq!(compare_api_versions("55.0", "58.0"), Ordering::Less);
        assert_eq!(compare_api_versions("9.0", "10.0"), Ordering::Less);
        assert_eq!(compare_api_versions("58", "58.0"), Ordering::Equal);
        assert_eq!(compare_api_versions("58.1", "58.0"), Ordering::Greater);
    }

    #[test]
    fn test_max_version() {
        assert_eq!(max_api_version(["55.0", "58.0", "57.0"]), Some("58.0"));
        assert_eq!(max_api_version(["58", "58.0"]), Some("58"));
        assert_eq!(max_api_version(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_valid_versions() {
        assert!(is_valid_api_version("58.0"));
        assert!(is_valid_api_version("60"));
        assert!(!is_valid_api_version(""));
        assert!(!is_valid_api_version("v58"));
        assert!(!is_valid_api_version("58..0"));
    }
}
