//! Production Code Enforcement
//!
//! Production sources must not silence dead code warnings and must not call
//! `.unwrap()`. Everything from the first `#[cfg(test)]` line onwards is
//! test code and exempt.

use std::fs;
use std::path::{Path, PathBuf};

/// A rule violation found in production code
#[derive(Debug, PartialEq, Eq)]
struct Violation {
    file_path: String,
    line_number: usize,
    rule: &'static str,
    context: String,
}

/// Checks one source file's text, stopping at the first test module.
fn check_source(file_path: &str, content: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }
        if trimmed.starts_with("//") {
            continue;
        }

        let rule = if trimmed.contains("#[allow(") && trimmed.contains("dead_code") {
            Some("dead_code allowance")
        } else if trimmed.contains(".unwrap()") {
            Some("unwrap call")
        } else {
            None
        };

        if let Some(rule) = rule {
            violations.push(Violation {
                file_path: file_path.to_string(),
                line_number: index + 1,
                rule,
                context: trimmed.to_string(),
            });
        }
    }

    violations
}

/// Source directories of every workspace crate.
fn crate_source_dirs() -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .ok_or("tests crate has no parent directory")?;

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        let is_member = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with("ladderview-"));
        if is_member && path.join("src").is_dir() {
            dirs.push(path.join("src"));
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn find_rust_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            find_rust_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    Ok(())
}

#[test]
fn test_detects_dead_code_allowances() {
    let content = r#"
#[allow(dead_code)]
struct Unused;

#[allow(clippy::missing_docs, dead_code)]
fn unused() {}
"#;

    let violations = check_source("sample.rs", content);
    let lines: Vec<usize> = violations.iter().map(|v| v.line_number).collect();
    assert_eq!(lines, [2, 5]);
    assert!(violations.iter().all(|v| v.rule == "dead_code allowance"));
}

#[test]
fn test_unwrap_allowed_after_test_module_starts() {
    let content = r#"
fn parse(text: &str) -> u32 {
    text.parse().unwrap_or_default()
}

// Callers must not .unwrap() this
fn bad(text: &str) -> u32 {
    text.parse().unwrap()
}

#[cfg(test)]
mod tests {
    #[test]
    fn parses() {
        assert_eq!("3".parse::<u32>().unwrap(), 3);
    }
}
"#;

    let violations = check_source("sample.rs", content);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].line_number, 8);
    assert_eq!(violations[0].rule, "unwrap call");
}

#[test]
fn production_code_enforcement() {
    let mut files = Vec::new();
    for dir in crate_source_dirs().expect("Failed to list workspace crates") {
        find_rust_files(&dir, &mut files).expect("Failed to scan crate sources");
    }
    assert!(!files.is_empty(), "No workspace sources found");

    let mut violations = Vec::new();
    for file in &files {
        let content = fs::read_to_string(file).expect("Failed to read source file");
        violations.extend(check_source(&file.to_string_lossy(), &content));
    }

    for violation in &violations {
        println!(
            "{}:{} [{}]\n  {}",
            violation.file_path, violation.line_number, violation.rule, violation.context
        );
    }

    assert!(
        violations.is_empty(),
        "Found {} violation(s) in {} production file(s)",
        violations.len(),
        files.len()
    );
}
