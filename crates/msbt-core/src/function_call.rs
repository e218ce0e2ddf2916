//! Virtual function call parsing
//!
//! Smartsheet queries are written as `functionName(arg1,arg2)`. The parser only
//! splits the string; deciding which names exist is left to the connector.

use once_cell::sync::Lazy;
use regex::Regex;

static CALL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+)\((.*)\)$").expect("function call pattern is valid")
});

/// A parsed `name(args…)` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<String>,
}

impl FunctionCall {
    /// Parse a call string. Returns `None` when the string is not of the form
    /// `name(...)`.
    ///
    /// Arguments are split on `,` and trimmed, so `listSheets()` carries a
    /// single empty argument.
    pub fn parse(input: &str) -> Option<Self> {
        let captures = CALL_PATTERN.captures(input.trim())?;
        let name = captures.get(1)?.as_str().to_string();
        let args = captures
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split(',')
            .map(|arg| arg.trim().to_string())
            .collect();

        Some(Self { name, args })
    }

    /// Raw argument at `index`
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str).filter(|s| !s.is_empty())
    }

    /// Numeric argument at `index`; `None` if missing or not an unsigned integer
    pub fn arg_u64(&self, index: usize) -> Option<u64> {
        self.arg(index).and_then(|s| s.parse().ok())
    }
}

impl std::fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(","))
    }
}
