//! Evaluator for admin-authored cost formulas.
//!
//! Formulas reference slider names as free variables, e.g.
//! `"Input Tokens * 0.002 + Output Tokens * 0.004"`. Slider names may
//! contain spaces, so the tokenizer matches them longest-first with word
//! boundaries instead of substring replacement. The grammar is restricted
//! to numeric literals, the four arithmetic operators, parentheses and
//! unary sign; formulas are never executed as code.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FormulaError {
    #[error("unknown identifier '{0}' in formula")]
    UnknownIdentifier(String),

    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("invalid number at position {0}")]
    InvalidNumber(usize),

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Matches `name` at `pos`, requiring a word boundary after the match so a
/// slider named "Tokens" never matches inside "Input Tokens".
fn match_name(chars: &[char], pos: usize, name: &[char]) -> bool {
    if pos + name.len() > chars.len() {
        return false;
    }
    if chars[pos..pos + name.len()] != *name {
        return false;
    }
    match chars.get(pos + name.len()) {
        Some(&next) => !is_ident_char(next),
        None => true,
    }
}

fn tokenize(formula: &str, values: &HashMap<String, f64>) -> Result<Vec<(Token, usize)>, FormulaError> {
    // Longest name first, so "Input Tokens" wins over a plain "Tokens".
    let mut names: Vec<(Vec<char>, f64)> = values
        .iter()
        .map(|(name, value)| (name.chars().collect(), *value))
        .collect();
    names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    'outer: while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let op = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(op) = op {
            tokens.push((op, pos));
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            let literal: String = chars[start..pos].iter().collect();
            let number = literal
                .parse::<f64>()
                .map_err(|_| FormulaError::InvalidNumber(start))?;
            tokens.push((Token::Number(number), start));
            continue;
        }

        if is_ident_char(c) {
            for (name, value) in &names {
                if match_name(&chars, pos, name) {
                    tokens.push((Token::Number(*value), pos));
                    pos += name.len();
                    continue 'outer;
                }
            }
            // No slider name matches: report the offending word.
            let start = pos;
            while pos < chars.len() && is_ident_char(chars[pos]) {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            return Err(FormulaError::UnknownIdentifier(word));
        }

        return Err(FormulaError::UnexpectedChar(c, pos));
    }

    Ok(tokens)
}

/// Recursive-descent evaluator over the token stream.
struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    cursor: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<(Token, usize)> {
        self.tokens.get(self.cursor).copied()
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let token = self.peek();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.term()?;
        while let Some((token, _)) = self.peek() {
            match token {
                Token::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.factor()?;
        while let Some((token, _)) = self.peek() {
            match token {
                Token::Star => {
                    self.advance();
                    value *= self.factor()?;
                }
                Token::Slash => {
                    self.advance();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, FormulaError> {
        match self.advance() {
            Some((Token::Number(value), _)) => Ok(value),
            Some((Token::Plus, _)) => self.factor(),
            Some((Token::Minus, _)) => Ok(-self.factor()?),
            Some((Token::LParen, _)) => {
                let value = self.expression()?;
                match self.advance() {
                    Some((Token::RParen, _)) => Ok(value),
                    Some((_, pos)) => Err(FormulaError::UnexpectedToken(pos)),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some((_, pos)) => Err(FormulaError::UnexpectedToken(pos)),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

/// Evaluates a formula against named slider values.
pub fn evaluate(formula: &str, values: &HashMap<String, f64>) -> Result<f64, FormulaError> {
    let tokens = tokenize(formula, values)?;
    let mut parser = Parser {
        tokens: &tokens,
        cursor: 0,
    };
    let value = parser.expression()?;
    match parser.peek() {
        Some((_, pos)) => Err(FormulaError::UnexpectedToken(pos)),
        None => Ok(value),
    }
}

/// Form-edit-time check: substitutes 1 for every slider name and reports
/// whether the formula parses and evaluates.
pub fn validate_formula(formula: &str, slider_names: &[String]) -> bool {
    let values: HashMap<String, f64> = slider_names
        .iter()
        .map(|name| (name.clone(), 1.0))
        .collect();
    evaluate(formula, &values).is_ok()
}
