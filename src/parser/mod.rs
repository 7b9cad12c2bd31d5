// Chart script parser module

pub mod ast;
pub mod lexer;
pub mod script;

// Public API re-exports
pub use ast::{Script, Statement};
pub use script::parse_script;

use anyhow::{anyhow, Result};

/// Parse a complete script, reporting the line where parsing stopped.
pub fn parse(source: &str) -> Result<Script> {
    match parse_script(source) {
        Ok((rest, script)) if rest.trim().is_empty() => Ok(script),
        Ok((rest, _)) => Err(unexpected(source, rest)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(unexpected(source, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(anyhow!("Parse error: unexpected end of script")),
    }
}

fn unexpected(source: &str, rest: &str) -> anyhow::Error {
    let line = script::line_of(source, rest);
    let snippet = rest.lines().next().unwrap_or_default().trim();
    if snippet.is_empty() {
        anyhow!("Parse error at line {}: unexpected end of block", line)
    } else {
        anyhow!("Parse error at line {}: unexpected '{}'", line, snippet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reports_line() {
        let err = parse("chart {\n  chart-size 10px\n}").unwrap_err();
        assert_eq!(err.to_string(), "Parse error at line 2: unexpected 'px'");
    }

    #[test]
    fn test_parse_unclosed_block() {
        let err = parse("chart {\n  chart-size 10\n").unwrap_err();
        assert!(err.to_string().contains("unexpected end of block"), "{}", err);
    }

    #[test]
    fn test_parse_ok() {
        let script = parse("chart { chart-data [1, 2] }\n").unwrap();
        assert_eq!(script.statements.len(), 1);
    }
}
