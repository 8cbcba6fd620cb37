//! Textual preprocessing applied by the driver before lexing: full-line
//! `#` comments are blanked and `use "path";` lines are replaced with the
//! referenced file's contents. Inlining is single level; a `use` line the
//! preprocessor leaves behind still parses and evaluates as a no-op.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Blanks full-line comments while keeping the line count, so parser
/// positions still point into the original source.
pub fn strip_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                ""
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips comments and expands `use` directives against `base_dir`.
pub fn preprocess(source: &str, base_dir: &Path) -> Result<String> {
    let mut lines = Vec::new();
    for line in strip_comments(source).lines() {
        match use_path(line) {
            Some(path) => {
                let resolved = resolve(base_dir, path);
                let contents = fs::read_to_string(&resolved)
                    .with_context(|| format!("Inlining {} from use directive", resolved.display()))?;
                lines.push(strip_comments(&contents));
            }
            None => lines.push(line.to_string()),
        }
    }
    Ok(lines.join("\n"))
}

/// Matches a line holding exactly one `use "path";` directive and returns
/// the quoted path.
fn use_path(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("use")?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let (path, rest) = rest.split_once('"')?;
    let tail = rest.trim().strip_prefix(';')?;
    if !tail.trim().is_empty() {
        return None;
    }
    Some(path)
}

/// The `.sable` extension is implied when the path has none.
fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let mut resolved = base_dir.join(path);
    if resolved.extension().is_none() {
        resolved.set_extension("sable");
    }
    resolved
}
