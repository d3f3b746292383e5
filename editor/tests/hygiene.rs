//! Hygiene: enforces coding standards at test time
//!
//! Scans the editor's production sources (everything under `src/` except
//! `*_test.rs`). The editor runs inside the host page, so a panic kills the
//! page and a swallowed error shows up as a canvas that silently stops
//! repainting. Each budget below names what it protects; budgets only shrink.

use std::fs;
use std::path::Path;

/// A pattern, how many production lines may contain it, and where.
struct Budget {
    pattern: &'static str,
    max: usize,
    /// Files allowed to hold the pattern. Empty means any file.
    only_in: &'static [&'static str],
    guards: &'static str,
}

const BUDGETS: &[Budget] = &[
    Budget {
        pattern: ".unwrap()",
        max: 0,
        only_in: &[],
        guards: "input handlers and repaint return SurfaceError instead of aborting the page",
    },
    Budget {
        pattern: ".expect(",
        max: 0,
        only_in: &[],
        guards: "input handlers and repaint return SurfaceError instead of aborting the page",
    },
    Budget {
        pattern: "panic!(",
        max: 0,
        only_in: &[],
        guards: "a bad layer is logged and skipped, never fatal",
    },
    Budget {
        pattern: "unreachable!(",
        max: 0,
        only_in: &[],
        guards: "tool and gesture matches stay exhaustive",
    },
    Budget { pattern: "todo!(", max: 0, only_in: &[], guards: "every tool and command is implemented" },
    Budget { pattern: "unimplemented!(", max: 0, only_in: &[], guards: "every Surface backend method is implemented" },
    Budget {
        pattern: "let _ =",
        max: 0,
        only_in: &[],
        guards: "backend errors are logged with tracing, not dropped",
    },
    Budget {
        pattern: ".ok()",
        max: 3,
        only_in: &["color.rs"],
        guards: "only colour channel parsing, where a bad channel means an unparseable colour with a documented fallback",
    },
    Budget {
        pattern: "println!(",
        max: 0,
        only_in: &[],
        guards: "diagnostics go through tracing so the host decides where they land",
    },
    Budget {
        pattern: "eprintln!(",
        max: 0,
        only_in: &[],
        guards: "diagnostics go through tracing so the host decides where they land",
    },
    Budget {
        pattern: "web_sys::",
        max: 1,
        only_in: &["web.rs"],
        guards: "the browser boundary stays in the web backend; the core builds natively",
    },
    Budget { pattern: "#[allow(dead_code)]", max: 0, only_in: &[], guards: "unused editor code is deleted" },
];

struct SourceFile {
    path: String,
    content: String,
}

/// Collect production `.rs` files from `editor/src/`, excluding test files.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            let path_str = path.to_string_lossy().to_string();
            if path_str.ends_with("_test.rs") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path: path_str, content });
            }
        }
    }
}

fn count_in_source(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn format_hits(hits: &[(String, usize)]) -> String {
    hits.iter()
        .map(|(path, count)| format!("  {path}: {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn scan_finds_sources() {
    let files = source_files();
    assert!(files.iter().any(|f| f.path.ends_with("engine.rs")), "no sources found under src/");
    assert!(files.iter().all(|f| !f.path.ends_with("_test.rs")));
}

#[test]
fn budgets_hold() {
    let files = source_files();
    let mut failures = Vec::new();
    for budget in BUDGETS {
        let hits = count_in_source(&files, budget.pattern);
        let count: usize = hits.iter().map(|(_, c)| c).sum();
        if count > budget.max {
            failures.push(format!(
                "{} budget exceeded: found {count}, max {} ({}).\n{}",
                budget.pattern,
                budget.max,
                budget.guards,
                format_hits(&hits)
            ));
        }
        let strays: Vec<_> = hits
            .iter()
            .filter(|(path, _)| !budget.only_in.is_empty() && !budget.only_in.iter().any(|f| path.ends_with(f)))
            .cloned()
            .collect();
        if !strays.is_empty() {
            failures.push(format!(
                "{} is only allowed in {:?} ({}).\n{}",
                budget.pattern,
                budget.only_in,
                budget.guards,
                format_hits(&strays)
            ));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn surface_trait_has_two_backends() {
    let files = source_files();
    let backends: Vec<_> = files
        .iter()
        .filter(|f| f.content.contains("impl Surface for "))
        .map(|f| f.path.clone())
        .collect();
    assert_eq!(backends.len(), 2, "expected the raster and web backends, found {backends:?}");
}
