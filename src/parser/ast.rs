// Syntax tree for chart scripts

use crate::directive::Arg;

/// A parsed script: a list of top-level statements (normally `chart` blocks)
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub statements: Vec<Statement>,
}

/// `name arg* { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub name: String,
    pub args: Vec<Arg>,
    /// Nested statements, when the statement opens a block
    pub block: Option<Vec<Statement>>,
    /// 1-based source line of the statement name
    pub line: usize,
}

impl Statement {
    /// Bare word at `index`, if the argument there is one
    pub fn word(&self, index: usize) -> Option<&str> {
        match self.args.get(index) {
            Some(Arg::Variable(word)) => Some(word),
            _ => None,
        }
    }
}
