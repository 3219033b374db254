use crate::error::{Result, StoreError};

/// Normalizes a store-relative path: strips surrounding slashes and rejects
/// empty, `.` and `..` segments before any I/O happens.
pub fn normalize_store_path(input: &str) -> Result<String> {
    let trimmed = input.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath(
            "store path cannot be empty".to_string(),
        ));
    }

    let mut components = Vec::new();
    for component in trimmed.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(StoreError::InvalidPath(format!(
                "invalid store path component: {:?}",
                component
            )));
        }
        components.push(component);
    }

    Ok(components.join("/"))
}

/// Like [`normalize_store_path`] but accepts the empty string as the store
/// root, for operations that address directories.
pub fn normalize_parent_path(input: &str) -> Result<String> {
    if input.trim_matches('/').is_empty() {
        return Ok(String::new());
    }
    normalize_store_path(input)
}

/// Splits a normalized path into parent directory and simple name. The
/// parent of a top-level entry is the empty root.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_surrounding_slashes() {
        assert_eq!(
            normalize_store_path("/configs/a.jar/").unwrap(),
            "configs/a.jar"
        );
        assert_eq!(normalize_store_path("a").unwrap(), "a");
    }

    #[test]
    fn rejects_empty_paths() {
        assert!(normalize_store_path("").is_err());
        assert!(normalize_store_path("///").is_err());
    }

    #[test]
    fn rejects_traversal_segments() {
        assert!(normalize_store_path("a/../b").is_err());
        assert!(normalize_store_path("../etc/passwd").is_err());
        assert!(normalize_store_path("a/./b").is_err());
        assert!(normalize_store_path("a//b").is_err());
    }

    #[test]
    fn parent_path_accepts_root() {
        assert_eq!(normalize_parent_path("").unwrap(), "");
        assert_eq!(normalize_parent_path("/").unwrap(), "");
        assert_eq!(normalize_parent_path("configs").unwrap(), "configs");
        assert!(normalize_parent_path("a/../b").is_err());
    }

    #[test]
    fn splits_parent_and_name() {
        assert_eq!(split_parent("configs/a.jar"), ("configs", "a.jar"));
        assert_eq!(split_parent("a.jar"), ("", "a.jar"));
        assert_eq!(split_parent("a/b/c"), ("a/b", "c"));
    }
}
