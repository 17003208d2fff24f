//! Total predicate language over device records.
//!
//! Grammar: conjunction (`and`), negation (`not`), comparisons
//! (`== != < <= > >=`), `exists(field)`, parentheses, and bare boolean
//! fields. Literals are integers, single-quoted strings, `true`, `false`.
//!
//! Evaluation is total: missing fields evaluate to a distinguished absent
//! value, comparisons with absent are false, and type mismatches are false.
//! No loops, no I/O, no mutation.

use serde_json::Value;

use netrag_core::{CompareOp, DeviceRecord};

use crate::error::AnalysisError;

/// A literal or field reference in a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(String),
    Int(i64),
    Str(String),
    Bool(bool),
}

/// Parsed predicate expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare {
        lhs: Operand,
        op: CompareOp,
        rhs: Operand,
    },
    /// Bare field used as a boolean (`managed_by_inmanta`).
    Truthy(String),
    /// `exists(field)`: the field is present and non-null.
    Exists(String),
    /// Literal `true` / `false`.
    Const(bool),
}

/// Resolved field value during evaluation.
#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Predicate {
    /// Parse an expression string.
    pub fn parse(input: &str) -> Result<Self, AnalysisError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let predicate = parser.expression()?;
        if parser.pos != parser.tokens.len() {
            return Err(AnalysisError::Predicate(format!(
                "unexpected trailing input in {input:?}"
            )));
        }
        Ok(predicate)
    }

    /// Evaluate against a record. Total for every record.
    pub fn eval(&self, record: &DeviceRecord) -> bool {
        match self {
            Self::And(parts) => parts.iter().all(|p| p.eval(record)),
            Self::Not(inner) => !inner.eval(record),
            Self::Compare { lhs, op, rhs } => {
                compare(resolve(lhs, record), *op, resolve(rhs, record))
            }
            Self::Truthy(field) => matches!(lookup(record, field), Resolved::Bool(true)),
            Self::Exists(field) => !matches!(lookup(record, field), Resolved::Absent),
            Self::Const(value) => *value,
        }
    }
}

fn lookup(record: &DeviceRecord, field: &str) -> Resolved {
    match record.get(field) {
        None | Some(Value::Null) => Resolved::Absent,
        Some(Value::Bool(b)) => Resolved::Bool(*b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Resolved::Int(i),
            None => n.as_f64().map(Resolved::Float).unwrap_or(Resolved::Absent),
        },
        Some(Value::String(s)) => Resolved::Str(s.clone()),
        Some(_) => Resolved::Absent,
    }
}

fn resolve(operand: &Operand, record: &DeviceRecord) -> Resolved {
    match operand {
        Operand::Field(name) => lookup(record, name),
        Operand::Int(i) => Resolved::Int(*i),
        Operand::Str(s) => Resolved::Str(s.clone()),
        Operand::Bool(b) => Resolved::Bool(*b),
    }
}

fn compare(lhs: Resolved, op: CompareOp, rhs: Resolved) -> bool {
    use Resolved::*;

    // Comparisons with absent are false, including equality.
    if lhs == Absent || rhs == Absent {
        return false;
    }

    match (lhs, rhs) {
        (Bool(a), Bool(b)) => match op {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            _ => false,
        },
        (Str(a), Str(b)) => match op {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
            _ => false,
        },
        (a, b) => {
            let (Some(x), Some(y)) = (as_float(&a), as_float(&b)) else {
                return false;
            };
            match op {
                CompareOp::Eq => x == y,
                CompareOp::Ne => x != y,
                CompareOp::Lt => x < y,
                CompareOp::Le => x <= y,
                CompareOp::Gt => x > y,
                CompareOp::Ge => x >= y,
                _ => false,
            }
        }
    }
}

fn as_float(value: &Resolved) -> Option<f64> {
    match value {
        Resolved::Int(i) => Some(*i as f64),
        Resolved::Float(f) => Some(*f),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    Op(CompareOp),
    And,
    Not,
    Exists,
    True,
    False,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, AnalysisError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != '\'' {
                    end += 1;
                }
                if end == chars.len() {
                    return Err(AnalysisError::Predicate(format!(
                        "unterminated string in {input:?}"
                    )));
                }
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            '=' | '!' | '<' | '>' => {
                let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
                let (op, len) = match two.as_str() {
                    "==" => (CompareOp::Eq, 2),
                    "!=" => (CompareOp::Ne, 2),
                    "<=" => (CompareOp::Le, 2),
                    ">=" => (CompareOp::Ge, 2),
                    _ if c == '<' => (CompareOp::Lt, 1),
                    _ if c == '>' => (CompareOp::Gt, 1),
                    _ => {
                        return Err(AnalysisError::Predicate(format!(
                            "unexpected character {c:?} in {input:?}"
                        )))
                    }
                };
                tokens.push(Token::Op(op));
                i += len;
            }
            '-' | '0'..='9' => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<i64>().map_err(|_| {
                    AnalysisError::Predicate(format!("bad number {text:?} in {input:?}"))
                })?;
                tokens.push(Token::Int(value));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "not" => Token::Not,
                    "exists" => Token::Exists,
                    "true" | "True" => Token::True,
                    "false" | "False" => Token::False,
                    _ => Token::Ident(word),
                });
            }
            _ => {
                return Err(AnalysisError::Predicate(format!(
                    "unexpected character {c:?} in {input:?}"
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), AnalysisError> {
        match self.advance() {
            Some(ref t) if t == expected => Ok(()),
            other => Err(AnalysisError::Predicate(format!(
                "expected {expected:?}, found {other:?}"
            ))),
        }
    }

    /// expression := term ('and' term)*
    fn expression(&mut self) -> Result<Predicate, AnalysisError> {
        let mut parts = vec![self.term()?];
        while self.peek() == Some(&Token::And) {
            self.advance();
            parts.push(self.term()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Predicate::And(parts)
        })
    }

    /// term := 'not' term | atom
    fn term(&mut self) -> Result<Predicate, AnalysisError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            return Ok(Predicate::Not(Box::new(self.term()?)));
        }
        self.atom()
    }

    /// atom := '(' expression ')' | 'exists' '(' ident ')'
    ///       | operand (op operand)?
    fn atom(&mut self) -> Result<Predicate, AnalysisError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.advance();
                let inner = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Exists) => {
                self.advance();
                self.expect(&Token::LParen)?;
                let field = match self.advance() {
                    Some(Token::Ident(name)) => name,
                    other => {
                        return Err(AnalysisError::Predicate(format!(
                            "exists() needs a field name, found {other:?}"
                        )))
                    }
                };
                self.expect(&Token::RParen)?;
                Ok(Predicate::Exists(field))
            }
            _ => {
                let lhs = self.operand()?;
                if let Some(Token::Op(op)) = self.peek().cloned() {
                    self.advance();
                    let rhs = self.operand()?;
                    return Ok(Predicate::Compare { lhs, op, rhs });
                }
                match lhs {
                    Operand::Field(name) => Ok(Predicate::Truthy(name)),
                    Operand::Bool(value) => Ok(Predicate::Const(value)),
                    other => Err(AnalysisError::Predicate(format!(
                        "literal {other:?} is not a predicate"
                    ))),
                }
            }
        }
    }

    fn operand(&mut self) -> Result<Operand, AnalysisError> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(Operand::Field(name)),
            Some(Token::Int(value)) => Ok(Operand::Int(value)),
            Some(Token::Str(value)) => Ok(Operand::Str(value)),
            Some(Token::True) => Ok(Operand::Bool(true)),
            Some(Token::False) => Ok(Operand::Bool(false)),
            other => Err(AnalysisError::Predicate(format!(
                "expected operand, found {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn olt() -> DeviceRecord {
        match json!({
            "name": "OLT17PROP01",
            "region": "HOBO",
            "environment": "PRODUCTION",
            "bandwidth_gbps": 100,
            "service_count": 0,
            "managed_by_inmanta": false,
            "complete_config": false
        }) {
            Value::Object(map) => DeviceRecord::new("ftth_olt", map),
            _ => unreachable!(),
        }
    }

    fn eval(expr: &str, record: &DeviceRecord) -> bool {
        Predicate::parse(expr).unwrap().eval(record)
    }

    #[test]
    fn comparisons() {
        let d = olt();
        assert!(eval("service_count == 0", &d));
        assert!(eval("bandwidth_gbps >= 100", &d));
        assert!(!eval("bandwidth_gbps < 100", &d));
        assert!(eval("service_count != 5", &d));
        assert!(eval("environment == 'PRODUCTION'", &d));
        assert!(!eval("environment == 'TEST'", &d));
    }

    #[test]
    fn negation_and_conjunction() {
        let d = olt();
        assert!(eval("not managed_by_inmanta", &d));
        assert!(eval("environment == 'PRODUCTION' and not managed_by_inmanta", &d));
        assert!(!eval("managed_by_inmanta and complete_config", &d));
        assert!(eval(
            "service_count == 0 and not complete_config and bandwidth_gbps >= 100",
            &d
        ));
    }

    #[test]
    fn range_expression() {
        let d = olt();
        assert!(!eval("service_count > 0 and service_count < 50", &d));
    }

    #[test]
    fn parentheses_group() {
        let d = olt();
        assert!(eval("not (managed_by_inmanta and complete_config)", &d));
    }

    #[test]
    fn exists_checks_presence() {
        let d = olt();
        assert!(eval("exists(region)", &d));
        assert!(!eval("exists(admin_key)", &d));
        assert!(eval("not exists(admin_key)", &d));
    }

    #[test]
    fn absent_fields_compare_false() {
        let d = olt();
        assert!(!eval("admin_key == 5", &d));
        assert!(!eval("admin_key != 5", &d));
        assert!(!eval("admin_key < 5", &d));
        // Bare absent field is not truthy, so negation holds.
        assert!(eval("not admin_key", &d));
    }

    #[test]
    fn type_mismatch_is_false() {
        let d = olt();
        assert!(!eval("region == 5", &d));
        assert!(!eval("service_count == 'zero'", &d));
    }

    #[test]
    fn boolean_literal_comparisons() {
        let d = olt();
        assert!(eval("complete_config == false", &d));
        assert!(eval("managed_by_inmanta != true", &d));
    }

    #[test]
    fn negative_numbers() {
        let mut d = olt();
        d.fields.insert("signal_strength".to_string(), json!(-95));
        assert!(eval("signal_strength < -90", &d));
        assert!(!eval("signal_strength < -110", &d));
    }

    #[test]
    fn parse_errors_are_reported_not_panicked() {
        assert!(Predicate::parse("service_count ==").is_err());
        assert!(Predicate::parse("(service_count == 0").is_err());
        assert!(Predicate::parse("'literal'").is_err());
        assert!(Predicate::parse("field @ 3").is_err());
        assert!(Predicate::parse("exists(service_count == 0)").is_err());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let d = olt();
        let p = Predicate::parse("service_count == 0 and not complete_config").unwrap();
        let first = p.eval(&d);
        for _ in 0..10 {
            assert_eq!(p.eval(&d), first);
        }
    }
}
