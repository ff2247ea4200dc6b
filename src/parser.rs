//! Default expression parser
//!
//! Recursive-descent parser for the rule-expression grammar:
//! - `status == 'active'`
//! - `priority > 3 && status != 'closed'`
//! - `user.role in ['admin', 'editor']`
//! - `amount > limit ? 'review' : 'auto'`
//!
//! Parsing is a pluggable capability: the engine accepts any
//! [`ExpressionParser`], and evaluation never touches text, so alternative
//! parsers (or pre-built trees) drop in without evaluator changes.

use serde_json::{Number, Value};

use crate::ast::Node;
use crate::error::ParseError;

/// Text→AST capability injected into the engine
pub trait ExpressionParser {
    fn parse(&self, input: &str) -> Result<Node, ParseError>;
}

/// Hand-written recursive-descent parser for the default grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl ExpressionParser for DefaultParser {
    fn parse(&self, input: &str) -> Result<Node, ParseError> {
        Scanner::new(input).parse_program()
    }
}

/// Parse an expression with the default grammar
pub fn parse(input: &str) -> Result<Node, ParseError> {
    DefaultParser.parse(input)
}

/// Binary operator precedence; higher binds tighter
fn binary_precedence(op: &str) -> u8 {
    match op {
        "??" => 1,
        "||" => 2,
        "&&" => 3,
        "==" | "!=" | "===" | "!==" => 4,
        "<" | ">" | "<=" | ">=" | "in" => 5,
        "+" | "-" => 6,
        _ => 7, // "*" | "/" | "%"
    }
}

// Longest first, so "===" wins over "==" and "<=" over "<"
const SYMBOLIC_OPERATORS: [&str; 16] = [
    "===", "!==", "??", "||", "&&", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%",
];

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn parse_program(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        let first = self.parse_expression()?;
        self.skip_whitespace();
        if self.peek().is_none() {
            return Ok(first);
        }

        // Anything after a complete expression must be a comma sequence,
        // which parses to Compound and is rejected at evaluation time
        let mut body = vec![first];
        while let Some(ch) = self.peek() {
            if ch != ',' {
                return Err(ParseError::UnexpectedChar { ch, pos: self.pos });
            }
            self.pos += 1;
            body.push(self.parse_expression()?);
            self.skip_whitespace();
        }
        Ok(Node::Compound { body })
    }

    fn parse_expression(&mut self) -> Result<Node, ParseError> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Node, ParseError> {
        let test = self.parse_binary(1)?;
        self.skip_whitespace();
        if self.peek() != Some('?') {
            return Ok(test);
        }
        self.pos += 1;
        let consequent = self.parse_ternary()?;
        self.skip_whitespace();
        self.expect(':')?;
        let alternate = self.parse_ternary()?;
        Ok(Node::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Node, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_whitespace();
            let Some(op) = self.peek_binary_operator() else {
                break;
            };
            let precedence = binary_precedence(op);
            if precedence < min_precedence {
                break;
            }
            self.pos += op.chars().count();
            let right = self.parse_binary(precedence + 1)?;
            left = Node::Binary {
                operator: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn peek_binary_operator(&self) -> Option<&'static str> {
        for op in SYMBOLIC_OPERATORS {
            if self.matches_str(op) {
                return Some(op);
            }
        }
        if self.matches_word("in") {
            return Some("in");
        }
        None
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        if let Some(ch) = self.peek() {
            let is_negation = ch == '!' && self.peek_ahead(1) != Some('=');
            if is_negation || ch == '-' || ch == '+' {
                self.pos += 1;
                let argument = self.parse_unary()?;
                return Ok(Node::Unary {
                    operator: ch.to_string(),
                    argument: Box::new(argument),
                });
            }
        }
        if self.matches_word("typeof") {
            self.pos += 6;
            let argument = self.parse_unary()?;
            return Ok(Node::Unary {
                operator: "typeof".to_string(),
                argument: Box::new(argument),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_primary()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    let name = self.parse_identifier_name()?;
                    node = Node::Member {
                        object: Box::new(node),
                        property: Box::new(Node::Identifier { name }),
                        computed: false,
                    };
                }
                Some('[') => {
                    self.pos += 1;
                    let property = self.parse_expression()?;
                    self.skip_whitespace();
                    self.expect(']')?;
                    node = Node::Member {
                        object: Box::new(node),
                        property: Box::new(property),
                        computed: true,
                    };
                }
                Some('(') => {
                    self.pos += 1;
                    let arguments = self.parse_arguments()?;
                    node = Node::Call {
                        callee: Box::new(node),
                        arguments,
                    };
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut arguments = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_expression()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => {
                    self.pos += 1;
                    return Ok(arguments);
                }
                Some(ch) => return Err(ParseError::UnexpectedChar { ch, pos: self.pos }),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ParseError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let inner = self.parse_expression()?;
                self.skip_whitespace();
                self.expect(')')?;
                Ok(inner)
            }
            Some('[') => {
                self.pos += 1;
                let elements = self.parse_elements()?;
                Ok(Node::Array { elements })
            }
            Some(quote) if quote == '\'' || quote == '"' => self.parse_string(quote),
            Some(ch) if ch.is_ascii_digit() => self.parse_number(),
            Some(ch) if is_identifier_start(ch) => {
                let name = self.parse_identifier_name()?;
                Ok(Node::Identifier { name })
            }
            Some(ch) => Err(ParseError::UnexpectedChar { ch, pos: self.pos }),
        }
    }

    fn parse_elements(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut elements = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(elements);
        }
        loop {
            elements.push(self.parse_expression()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(elements);
                }
                Some(ch) => return Err(ParseError::UnexpectedChar { ch, pos: self.pos }),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<Node, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::UnterminatedString(start)),
                Some(ch) if ch == quote => {
                    self.pos += 1;
                    return Ok(Node::Literal {
                        value: Value::String(out),
                    });
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        None => return Err(ParseError::UnterminatedString(start)),
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some(ch) => out.push(ch),
                    }
                    self.pos += 1;
                }
                Some(ch) => {
                    out.push(ch);
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;
        while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }
        let mut is_float = false;
        let next_is_digit = |c: Option<char>| c.map(|c| c.is_ascii_digit()).unwrap_or(false);
        if self.peek() == Some('.') && next_is_digit(self.peek_ahead(1)) {
            is_float = true;
            self.pos += 1;
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.pos += 1;
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        let value = if is_float {
            let f: f64 = text.parse().map_err(|_| ParseError::InvalidNumber(start))?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or(ParseError::InvalidNumber(start))?
        } else {
            match text.parse::<i64>() {
                Ok(i) => Value::Number(Number::from(i)),
                // Wider than i64: keep the value as a float
                Err(_) => {
                    let f: f64 = text.parse().map_err(|_| ParseError::InvalidNumber(start))?;
                    Number::from_f64(f)
                        .map(Value::Number)
                        .ok_or(ParseError::InvalidNumber(start))?
                }
            }
        };
        Ok(Node::Literal { value })
    }

    fn parse_identifier_name(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(ch) if is_identifier_start(ch) => {}
            Some(ch) => return Err(ParseError::UnexpectedChar { ch, pos: self.pos }),
            None => return Err(ParseError::UnexpectedEnd),
        }
        let start = self.pos;
        while self.peek().map(is_identifier_part).unwrap_or(false) {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn matches_str(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, ch)| self.chars.get(self.pos + i) == Some(&ch))
    }

    fn matches_word(&self, word: &str) -> bool {
        self.matches_str(word)
            && !self
                .chars
                .get(self.pos + word.chars().count())
                .map(|ch| is_identifier_part(*ch))
                .unwrap_or(false)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map(char::is_whitespace).unwrap_or(false) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ParseError::Expected {
                expected,
                pos: self.pos,
            })
        }
    }
}
