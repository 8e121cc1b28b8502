//! Code inspection
//!
//! Pulls the first code block out of a generated answer and produces a short
//! "beacon" report: the lines inside each function that shape its control
//! flow (returns, raises, loops, branches, assertions, awaits).

use regex::Regex;
use sdk::types::{ToolError, ToolOutcome};

/// Default cap on beacons reported per function
pub const DEFAULT_MAX_PER_FUNCTION: usize = 20;

const MODULE_SCOPE: &str = "<module>";
const EMPTY_REPORT: &str = "(No significant beacons found for this code.)";

/// Static-analysis collaborator used by the coding specialist
pub trait CodeAnalyzer: Send + Sync {
    /// Produce a human-readable report for `source`
    fn analyze(&self, source: &str) -> ToolOutcome;
}

/// Language-agnostic heuristic beacon scanner
pub struct BeaconAnalyzer {
    function: Regex,
    beacon: Regex,
    max_per_function: usize,
}

impl BeaconAnalyzer {
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new(max_per_function: usize) -> anyhow::Result<Self> {
        Ok(Self {
            function: Regex::new(
                r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:def|fn|function)\s+([A-Za-z_][A-Za-z0-9_]*)",
            )?,
            beacon: Regex::new(
                r"^\s*(?:return|raise|throw|yield|assert|for|while|loop|if|elif|else\s+if|match|try|except|catch|break|continue)\b|panic!|unreachable!|\bawait\b|\.await\b",
            )?,
            max_per_function,
        })
    }
}

struct Scope {
    name: String,
    line: usize,
    indent: usize,
    beacons: Vec<(usize, String)>,
}

impl CodeAnalyzer for BeaconAnalyzer {
    fn analyze(&self, source: &str) -> ToolOutcome {
        if source.trim().is_empty() {
            return Err(ToolError::InvalidInput("no source code to analyze".to_string()));
        }

        let mut finished: Vec<Scope> = Vec::new();
        let mut module = Scope {
            name: MODULE_SCOPE.to_string(),
            line: 0,
            indent: 0,
            beacons: Vec::new(),
        };
        let mut open: Vec<Scope> = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let lineno = index + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') || text.starts_with("//") {
                continue;
            }
            let indent = raw.len() - raw.trim_start().len();

            while open.last().is_some_and(|scope| indent <= scope.indent) {
                if let Some(scope) = open.pop() {
                    finished.push(scope);
                }
            }

            if let Some(caps) = self.function.captures(raw) {
                open.push(Scope {
                    name: caps[1].to_string(),
                    line: lineno,
                    indent,
                    beacons: Vec::new(),
                });
                continue;
            }

            if self.beacon.is_match(raw) {
                let scope = open.last_mut().unwrap_or(&mut module);
                if scope.beacons.len() < self.max_per_function {
                    scope.beacons.push((lineno, text.to_string()));
                }
            }
        }
        finished.extend(open.drain(..));
        finished.sort_by_key(|scope| scope.line);

        let mut lines = vec!["### Beacon summary".to_string(), String::new()];
        for scope in std::iter::once(&module).chain(finished.iter()) {
            if scope.beacons.is_empty() {
                continue;
            }
            if scope.line == 0 {
                lines.push(format!("- `{}`", scope.name));
            } else {
                lines.push(format!("- `{}` (line {})", scope.name, scope.line));
            }
            for (lineno, text) in &scope.beacons {
                lines.push(format!("  - line {}: {}", lineno, text));
            }
        }
        if lines.len() == 2 {
            lines.push(EMPTY_REPORT.to_string());
        }

        Ok(lines.join("\n"))
    }
}

/// First fenced code block in `text`.
///
/// A block tagged `python` (any case) wins; otherwise the first block of any
/// kind. The tag line is dropped. Blank blocks count as no block.
pub fn extract_code_block(text: &str) -> Option<String> {
    let blocks = fenced_blocks(text);
    let chosen = blocks
        .iter()
        .find(|(tag, _)| tag.eq_ignore_ascii_case("python"))
        .or_else(|| blocks.first())?;

    let code = chosen.1.trim();
    (!code.is_empty()).then(|| code.to_string())
}

fn fenced_blocks(text: &str) -> Vec<(&str, &str)> {
    let segments: Vec<&str> = text.split("```").collect();
    segments
        .iter()
        .enumerate()
        // odd segments sit between an opening and a closing fence
        .filter(|(i, _)| i % 2 == 1 && i + 1 < segments.len())
        .map(|(_, segment)| match segment.split_once('\n') {
            Some((tag, body)) => (tag.trim(), body),
            None => ("", *segment),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> BeaconAnalyzer {
        BeaconAnalyzer::new(DEFAULT_MAX_PER_FUNCTION).unwrap()
    }

    #[test]
    fn test_python_block_preferred() {
        let answer = "Try this:\n```bash\npip install x\n```\nthen\n```Python\nprint('hi')\n```\n";
        assert_eq!(extract_code_block(answer), Some("print('hi')".to_string()));
    }

    #[test]
    fn test_any_block_fallback_strips_tag() {
        let answer = "```rust\nfn main() {}\n```";
        assert_eq!(extract_code_block(answer), Some("fn main() {}".to_string()));

        let answer = "```\nx = 1\n```";
        assert_eq!(extract_code_block(answer), Some("x = 1".to_string()));
    }

    #[test]
    fn test_no_block() {
        assert_eq!(extract_code_block("plain prose"), None);
        assert_eq!(extract_code_block("```python\n   \n```"), None);
        assert_eq!(extract_code_block("unclosed ```python\nx = 1"), None);
    }

    #[test]
    fn test_beacons_grouped_by_function() {
        let code = "def load(path):\n    if not path:\n        raise ValueError('empty')\n    for line in open(path):\n        pass\n    return 1\n\ndef noop():\n    pass\n";
        let report = analyzer().analyze(code).unwrap();

        assert!(report.starts_with("### Beacon summary"));
        assert!(report.contains("- `load` (line 1)"));
        assert!(report.contains("  - line 2: if not path:"));
        assert!(report.contains("  - line 3: raise ValueError('empty')"));
        assert!(report.contains("  - line 6: return 1"));
        assert!(!report.contains("noop"));
    }

    #[test]
    fn test_rust_functions_detected() {
        let code = "pub fn parse(s: &str) -> Option<u32> {\n    let v = s.parse().ok()?;\n    match v {\n        0 => None,\n        n => Some(n),\n    }\n}\n";
        let report = analyzer().analyze(code).unwrap();
        assert!(report.contains("- `parse` (line 1)"));
        assert!(report.contains("line 3: match v {"));
    }

    #[test]
    fn test_cap_per_function() {
        let mut code = String::from("def busy():\n");
        for _ in 0..30 {
            code.push_str("    if x:\n        pass\n");
        }
        let report = BeaconAnalyzer::new(3).unwrap().analyze(&code).unwrap();
        assert_eq!(report.matches("if x:").count(), 3);
    }

    #[test]
    fn test_no_beacons() {
        let report = analyzer().analyze("x = 1\ny = 2\n").unwrap();
        assert!(report.ends_with("(No significant beacons found for this code.)"));
    }

    #[test]
    fn test_blank_source_rejected() {
        assert!(matches!(
            analyzer().analyze("  \n "),
            Err(ToolError::InvalidInput(_))
        ));
    }
}
