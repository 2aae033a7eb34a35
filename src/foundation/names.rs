use crate::foundation::error::{NodeBoxError, NodeBoxResult};

pub const MAX_NAME_LEN: usize = 30;

/// Node names are `[a-z_][a-z0-9_]*`, at most 30 characters, never starting with `__`.
pub fn validate_node_name(name: &str) -> NodeBoxResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(NodeBoxError::invalid_name("name must not be empty"));
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return Err(NodeBoxError::invalid_name(format!(
            "'{name}': must start with a lowercase letter or underscore"
        )));
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(NodeBoxError::invalid_name(format!(
            "'{name}': only lowercase letters, digits and underscores are allowed"
        )));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NodeBoxError::invalid_name(format!(
            "'{name}': longer than {MAX_NAME_LEN} characters"
        )));
    }
    if name.starts_with("__") {
        return Err(NodeBoxError::invalid_name(format!(
            "'{name}': names starting with a double underscore are reserved"
        )));
    }
    Ok(())
}

/// Derive a node name prefix from a type id (`"rect"` -> `"rect"`, `"Copy-2"` -> `"copy_2"`).
pub fn name_prefix(type_id: &str) -> String {
    let mut s: String = type_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() || s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, 'n');
    }
    while s.starts_with("__") {
        s.remove(0);
    }
    s.truncate(MAX_NAME_LEN - 4);
    s
}

/// Split an absolute node path (`/`, `/net1/rect1`) into its segments.
pub fn split_path(path: &str) -> NodeBoxResult<Vec<&str>> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(NodeBoxError::not_found(format!(
            "node path '{path}' must be absolute"
        )));
    };
    Ok(rest.split('/').filter(|s| !s.is_empty()).collect())
}

/// Join a parent path and a child name.
pub fn child_path(parent: &str, child: &str) -> String {
    if parent == "/" || parent.is_empty() {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_rejects_names() {
        assert!(validate_node_name("rect1").is_ok());
        assert!(validate_node_name("_tmp").is_ok());
        assert!(validate_node_name("Rect").is_err());
        assert!(validate_node_name("1rect").is_err());
        assert!(validate_node_name("__root").is_err());
        assert!(validate_node_name("").is_err());
        assert!(validate_node_name(&"a".repeat(31)).is_err());
    }

    #[test]
    fn prefixes_are_valid_names() {
        assert_eq!(name_prefix("rect"), "rect");
        assert_eq!(name_prefix("Copy-2"), "copy_2");
        assert!(validate_node_name(&format!("{}1", name_prefix("9lives"))).is_ok());
    }

    #[test]
    fn paths_split_and_join() {
        assert_eq!(split_path("/").unwrap(), Vec::<&str>::new());
        assert_eq!(split_path("/net/rect1").unwrap(), vec!["net", "rect1"]);
        assert!(split_path("rect1").is_err());
        assert_eq!(child_path("/", "a"), "/a");
        assert_eq!(child_path("/a", "b"), "/a/b");
    }
}
