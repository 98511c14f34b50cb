//! Line-oriented circuit text format.
//!
//! One instruction per line: a name, optional parenthesized arguments and
//! whitespace separated targets (`5`, `!5` or `rec[-3]`). `TICK` separates
//! time-steps, `REPEAT n { ... }` repeats a block and `#` starts a comment.

mod lexer;
mod parser;

pub use parser::parse;
