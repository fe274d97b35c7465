use std::path::Path;

use quest_tally::Post;

/// Resolves a path of the configuration file against its directory.
/// `stdout` names the standard output, not a file.
pub fn resolve_path(root: Option<&Path>, path: &str) -> String {
    match root {
        Some(r) if path != "stdout" && Path::new(path).is_relative() => {
            r.join(path).display().to_string()
        }
        _ => path.to_string(),
    }
}

/// Keeps the posts numbered within the range, both ends included.
pub fn keep_range(posts: Vec<Post>, start: Option<u32>, end: Option<u32>) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|p| start.map(|s| p.number >= s).unwrap_or(true))
        .filter(|p| end.map(|e| p.number <= e).unwrap_or(true))
        .collect()
}
