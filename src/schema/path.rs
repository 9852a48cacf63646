//! Dotted/bracketed field paths used in schema and validation messages

/// Extend `path` with an object key (`a` -> `a.key`, root -> `key`)
pub fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Extend `path` with an array index (`a` -> `a[3]`)
pub fn index_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

/// Render a path for humans; the empty root path reads as `root`
pub fn display_path(path: &str) -> &str {
    if path.is_empty() { "root" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_building() {
        let p = child_path("", "elements");
        let p = index_path(&p, 0);
        let p = child_path(&p, "id");
        assert_eq!(p, "elements[0].id");
        assert_eq!(display_path(""), "root");
        assert_eq!(display_path("a.b"), "a.b");
    }
}
