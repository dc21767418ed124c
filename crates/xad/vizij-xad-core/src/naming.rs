//! Object path and namespace helpers.
//!
//! Paths are `|`-joined hierarchies (`|rig:root|rig:arm`); a namespace is the
//! `:`-terminated prefix of a segment (`rig:`, or `a:b:` when nested).

use hashbrown::HashSet;

use crate::error::{Result, XadError};

pub const PATH_SEPARATOR: char = '|';
pub const NAMESPACE_SEPARATOR: char = ':';

/// Label used for objects that have no namespace.
pub const NO_NAMESPACE: &str = "none";

/// Last hierarchy segment of a path, namespace included.
pub fn leaf(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}

/// Segment with its namespace prefix removed.
pub fn strip_namespace(segment: &str) -> &str {
    segment
        .rsplit(NAMESPACE_SEPARATOR)
        .next()
        .unwrap_or(segment)
}

/// Leaf name without namespace: the identity used for name matching.
pub fn bare_name(path: &str) -> &str {
    strip_namespace(leaf(path))
}

/// Namespace prefix of the leaf segment (`"rig:"`), or `None`.
pub fn namespace_of(path: &str) -> Option<&str> {
    let segment = leaf(path);
    let name = strip_namespace(segment);
    if name.len() == segment.len() {
        None
    } else {
        Some(&segment[..segment.len() - name.len()])
    }
}

/// Namespace label for partitioning; `"none"` when there is no namespace.
pub fn namespace_label(path: &str) -> &str {
    namespace_of(path).unwrap_or(NO_NAMESPACE)
}

/// Full path with every segment namespace-stripped, always `|`-rooted.
pub fn strip_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for segment in path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()) {
        out.push(PATH_SEPARATOR);
        out.push_str(strip_namespace(segment));
    }
    out
}

/// Reject selections where two objects share a leaf name.
pub fn check_clashing_names<S: AsRef<str>>(selection: &[S]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(selection.len());
    let mut clashes: Vec<String> = Vec::new();
    for path in selection {
        let name = leaf(path.as_ref());
        if !seen.insert(name) && !clashes.iter().any(|c| c == name) {
            clashes.push(name.to_string());
        }
    }
    if clashes.is_empty() {
        Ok(())
    } else {
        log::error!("selection contains non-unique names: {clashes:?}");
        Err(XadError::NameClash { names: clashes })
    }
}

/// Distinct namespace labels of a selection in first-seen order.
pub fn namespaces_in<S: AsRef<str>>(selection: &[S]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for path in selection {
        let label = namespace_label(path.as_ref());
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}

/// Reject import targets spread over more than one namespace.
pub fn check_single_namespace<S: AsRef<str>>(selection: &[S]) -> Result<()> {
    let namespaces = namespaces_in(selection);
    if namespaces.len() > 1 {
        log::error!("import targets span namespaces {namespaces:?}");
        return Err(XadError::NamespaceAmbiguity { namespaces });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_leaf_and_namespace() {
        assert_eq!(leaf("|root|rig:arm"), "rig:arm");
        assert_eq!(bare_name("|root|rig:arm"), "arm");
        assert_eq!(namespace_of("|root|rig:arm"), Some("rig:"));
        assert_eq!(namespace_of("|root|a:b:arm"), Some("a:b:"));
        assert_eq!(namespace_of("|root|arm"), None);
        assert_eq!(namespace_label("arm"), "none");
    }

    #[test]
    fn strip_path_removes_every_namespace() {
        assert_eq!(strip_path("|rig:root|rig:spine|fx:arm"), "|root|spine|arm");
        assert_eq!(strip_path("arm"), "|arm");
    }

    #[test]
    fn clash_detection_reports_each_name_once() {
        let sel = ["|a|hand", "|b|hand", "|c|hand", "|a|foot"];
        match check_clashing_names(&sel) {
            Err(XadError::NameClash { names }) => assert_eq!(names, vec!["hand".to_string()]),
            other => panic!("expected clash, got {other:?}"),
        }
        assert!(check_clashing_names(&["|a|hand", "|a|foot"]).is_ok());
    }

    #[test]
    fn namespaced_duplicates_are_not_clashes() {
        assert!(check_clashing_names(&["|rig1:hand", "|rig2:hand"]).is_ok());
    }

    #[test]
    fn namespace_count_counts_none_as_a_namespace() {
        assert!(check_single_namespace(&["|rig:a", "|rig:b"]).is_ok());
        let err = check_single_namespace(&["|rig:a", "|b"]).unwrap_err();
        assert_eq!(
            err,
            XadError::NamespaceAmbiguity {
                namespaces: vec!["rig:".into(), "none".into()]
            }
        );
    }
}
