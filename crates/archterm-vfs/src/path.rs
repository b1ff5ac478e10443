//! Path resolution for the virtual filesystem.
//!
//! All VFS keys are canonical: absolute, `/`-separated, no `.` or `..`
//! segments and no trailing slash (except the root itself).

/// Home directory of the simulated user; the target of `~`.
pub const HOME_DIR: &str = "/home/user";

/// Resolve a user-supplied path expression against the working directory.
///
/// - empty input resolves to `cwd`
/// - `~` and `~/x` expand against [`HOME_DIR`]
/// - anything else is joined to `cwd` (if relative) and normalized
pub fn resolve(cwd: &str, input: &str) -> String {
    if input.is_empty() {
        return cwd.to_string();
    }
    if input == "~" {
        return HOME_DIR.to_string();
    }
    if let Some(rest) = input.strip_prefix("~/") {
        return normalize(&format!("{HOME_DIR}/{rest}"));
    }
    if input.starts_with('/') {
        return normalize(input);
    }
    normalize(&format!("{cwd}/{input}"))
}

/// Canonicalize a path.
///
/// Excess `..` segments clamp at the root: popping an empty stack is a no-op.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Parent of a canonical path. The root is its own parent.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

/// Last segment of a canonical path, `/` for the root.
pub fn basename(path: &str) -> &str {
    match path.rsplit('/').find(|s| !s.is_empty()) {
        Some(name) => name,
        None => "/",
    }
}

/// Append a single name to a canonical directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// True when `path` is `ancestor` or lies somewhere below it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor || path.starts_with(&descendant_prefix(ancestor))
}

/// Prefix every descendant of `path` starts with.
pub(crate) fn descendant_prefix(path: &str) -> String {
    if path == "/" {
        "/".to_string()
    } else {
        format!("{path}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_cwd() {
        assert_eq!(resolve("/home/user", ""), "/home/user");
    }

    #[test]
    fn tilde_expansion() {
        assert_eq!(resolve("/tmp", "~"), "/home/user");
        assert_eq!(resolve("/tmp", "~/Documents"), "/home/user/Documents");
        assert_eq!(resolve("/tmp", "~/Documents/../x"), "/home/user/x");
    }

    #[test]
    fn absolute_input() {
        assert_eq!(resolve("/home/user", "/etc//hosts"), "/etc/hosts");
        assert_eq!(resolve("/home/user", "/"), "/");
    }

    #[test]
    fn relative_input() {
        assert_eq!(resolve("/home/user", "Documents"), "/home/user/Documents");
        assert_eq!(resolve("/home/user", "./a/./b"), "/home/user/a/b");
        assert_eq!(resolve("/home/user", "../.."), "/");
        assert_eq!(resolve("/", "etc"), "/etc");
    }

    #[test]
    fn excess_dotdot_clamps_at_root() {
        assert_eq!(normalize("/../../.."), "/");
        assert_eq!(normalize("/a/../../b"), "/b");
        assert_eq!(resolve("/", ".."), "/");
    }

    #[test]
    fn trailing_slash_dropped() {
        assert_eq!(normalize("/home/user/"), "/home/user");
    }

    #[test]
    fn parent_of_paths() {
        assert_eq!(parent("/"), "/");
        assert_eq!(parent("/etc"), "/");
        assert_eq!(parent("/home/user"), "/home");
    }

    #[test]
    fn basename_of_paths() {
        assert_eq!(basename("/"), "/");
        assert_eq!(basename("/etc"), "etc");
        assert_eq!(basename("/home/user/.bashrc"), ".bashrc");
    }

    #[test]
    fn within_checks_whole_segments() {
        assert!(is_within("/home/user", "/home/user"));
        assert!(is_within("/home/user/a", "/home"));
        assert!(is_within("/etc", "/"));
        assert!(!is_within("/home/username", "/home/user"));
        assert!(!is_within("/home", "/home/user"));
    }

    #[test]
    fn join_paths() {
        assert_eq!(join("/", "etc"), "/etc");
        assert_eq!(join("/etc", "hosts"), "/etc/hosts");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_idempotent(path in "[/a-z.]{0,40}") {
                let once = normalize(&path);
                let twice = normalize(&once);
                prop_assert_eq!(&once, &twice);
            }

            #[test]
            fn normalize_output_is_canonical(path in "[/a-z.]{0,40}") {
                let normed = normalize(&path);
                prop_assert!(normed.starts_with('/'));
                prop_assert!(!normed.contains("//"));
                for seg in normed.split('/') {
                    prop_assert!(seg != "." && seg != "..", "bad segment in {}", normed);
                }
                if normed != "/" {
                    prop_assert!(!normed.ends_with('/'));
                }
            }

            #[test]
            fn dotdot_climbs_to_root(segments in proptest::collection::vec("[a-z]{1,6}", 0..8)) {
                let mut cwd = format!("/{}", segments.join("/"));
                cwd = normalize(&cwd);
                for _ in 0..=segments.len() {
                    cwd = resolve(&cwd, "..");
                }
                prop_assert_eq!(cwd.as_str(), "/");
                prop_assert_eq!(resolve(&cwd, ".."), "/");
            }
        }
    }
}
