//! Parser for the circuit text format.

use crate::circuit::Circuit;
use crate::error::{ParseError, ParseResult};
use crate::instruction::{Instruction, Target, gate_data};

use super::lexer::{SpannedToken, Token, tokenize};

/// Parse a circuit source string into a [`Circuit`].
pub fn parse(source: &str) -> ParseResult<Circuit> {
    let mut parser = Parser::new(source)?;
    parser.parse_block(false)
}

/// Parser state.
struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    line: usize,
}

impl Parser {
    /// Create a new parser from source.
    fn new(source: &str) -> ParseResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, msg)) => {
                    return Err(ParseError::LexerError {
                        position: span.start,
                        message: msg,
                    });
                }
            }
        }

        Ok(Self {
            tokens,
            pos: 0,
            line: 1,
        })
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        if token == Token::Newline {
            self.line += 1;
        }
        Some(token)
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {expected}")))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(expected) {
            return Err(self.unexpected(&expected.to_string(), &found));
        }
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            line: self.line,
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Parse lines until end of input, or until the closing brace of a block.
    fn parse_block(&mut self, in_repeat: bool) -> ParseResult<Circuit> {
        let mut circuit = Circuit::new();
        loop {
            match self.peek() {
                None if in_repeat => {
                    return Err(ParseError::UnexpectedEof("closing '}' of REPEAT block".into()));
                }
                None => return Ok(circuit),
                Some(Token::Newline) => {
                    self.advance();
                }
                Some(Token::RBrace) if in_repeat => {
                    self.advance();
                    return Ok(circuit);
                }
                Some(Token::Repeat) => {
                    let (repetitions, body) = self.parse_repeat()?;
                    circuit.push_repeat(repetitions, body);
                    self.end_of_line()?;
                }
                Some(Token::Identifier(_)) => {
                    let instruction = self.parse_instruction()?;
                    circuit.push(instruction);
                    self.end_of_line()?;
                }
                Some(other) => {
                    let other = other.clone();
                    return Err(self.unexpected("instruction", &other));
                }
            }
        }
    }

    /// An instruction ends at a newline, at the end of input or before a closing brace.
    fn end_of_line(&mut self) -> ParseResult<()> {
        match self.peek() {
            None | Some(Token::RBrace) => Ok(()),
            Some(Token::Newline) => {
                self.advance();
                Ok(())
            }
            Some(other) => {
                let other = other.clone();
                Err(self.unexpected("end of line", &other))
            }
        }
    }

    fn parse_repeat(&mut self) -> ParseResult<(u64, Circuit)> {
        self.expect(&Token::Repeat)?;
        let repetitions = match self.advance() {
            Some(Token::IntLiteral(n)) if n > 0 => n,
            Some(other) => return Err(self.unexpected("positive repetition count", &other)),
            None => return Err(ParseError::UnexpectedEof("repetition count".into())),
        };
        self.expect(&Token::LBrace)?;
        let body = self.parse_block(true)?;
        Ok((repetitions, body))
    }

    fn parse_instruction(&mut self) -> ParseResult<Instruction> {
        let line = self.line;
        let name = match self.advance() {
            Some(Token::Identifier(name)) => name,
            Some(other) => return Err(self.unexpected("instruction name", &other)),
            None => return Err(ParseError::UnexpectedEof("instruction name".into())),
        };
        if gate_data(&name).is_none() {
            return Err(ParseError::UnknownInstruction { name, line });
        }

        let args = if self.consume(&Token::LParen) {
            let args = self.parse_args()?;
            self.expect(&Token::RParen)?;
            args
        } else {
            vec![]
        };

        let mut targets = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                Token::Newline | Token::RBrace => break,
                _ => targets.push(self.parse_target()?),
            }
        }

        Ok(Instruction {
            name,
            targets,
            args,
        })
    }

    fn parse_args(&mut self) -> ParseResult<Vec<f64>> {
        let mut args = Vec::new();
        if self.check(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_number()?);
            if !self.consume(&Token::Comma) {
                return Ok(args);
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn parse_number(&mut self) -> ParseResult<f64> {
        let negative = self.consume(&Token::Minus);
        let value = match self.advance() {
            Some(Token::IntLiteral(v)) => v as f64,
            Some(Token::FloatLiteral(v)) => v,
            Some(other) => return Err(self.unexpected("number", &other)),
            None => return Err(ParseError::UnexpectedEof("number".into())),
        };
        Ok(if negative { -value } else { value })
    }

    fn parse_target(&mut self) -> ParseResult<Target> {
        let line = self.line;
        match self.advance() {
            Some(Token::IntLiteral(v)) => {
                let index = qubit_index(v, line)?;
                Ok(Target::qubit(index))
            }
            Some(Token::Not) => match self.advance() {
                Some(Token::IntLiteral(v)) => Ok(Target::inverted(qubit_index(v, line)?)),
                Some(other) => Err(ParseError::InvalidTarget {
                    target: format!("!{other}"),
                    line,
                }),
                None => Err(ParseError::UnexpectedEof("inverted qubit target".into())),
            },
            Some(Token::Rec) => {
                self.expect(&Token::LBracket)?;
                self.expect(&Token::Minus)?;
                let offset = match self.advance() {
                    Some(Token::IntLiteral(v)) if v > 0 => i32::try_from(v)
                        .map_err(|_| ParseError::InvalidTarget {
                            target: format!("rec[-{v}]"),
                            line,
                        })?,
                    Some(other) => {
                        return Err(ParseError::InvalidTarget {
                            target: format!("rec[-{other}]"),
                            line,
                        });
                    }
                    None => return Err(ParseError::UnexpectedEof("record offset".into())),
                };
                self.expect(&Token::RBracket)?;
                Ok(Target::record(-offset))
            }
            Some(other) => Err(ParseError::InvalidTarget {
                target: other.to_string(),
                line,
            }),
            None => Err(ParseError::UnexpectedEof("target".into())),
        }
    }
}

fn qubit_index(value: u64, line: usize) -> ParseResult<u32> {
    u32::try_from(value).map_err(|_| ParseError::InvalidTarget {
        target: value.to_string(),
        line,
    })
}
