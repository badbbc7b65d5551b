//! Integer-constant expression evaluation
//!
//! Array sizes in variable declarations are bracketed arithmetic
//! expressions over integer literals and previously declared integer
//! constants, e.g. `[2*Nss+1]`. This is a small recursive-descent evaluator
//! over the token values collected from the bracket body.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::error::ParseError;

/// Evaluate an arithmetic expression over integer literals and named
/// constants.
///
/// Grammar: `expr := term (('+'|'-') term)*`,
/// `term := factor (('*'|'/'|'%') factor)*`,
/// `factor := ('+'|'-')* (integer | ident | '(' expr ')')`.
///
/// Referencing a name absent from `constants` is an unknown-constant error.
pub fn evaluate_integer_expression(
    tokens: &[SmolStr],
    constants: &FxHashMap<SmolStr, i64>,
    operation: &str,
    line: u32,
) -> Result<i64, ParseError> {
    let mut ev = Evaluator {
        tokens,
        pos: 0,
        constants,
        operation,
        line,
    };
    let value = ev.expr()?;
    if ev.pos != ev.tokens.len() {
        return Err(ev.error(format!("unexpected token '{}'", ev.tokens[ev.pos])));
    }
    Ok(value)
}

struct Evaluator<'a> {
    tokens: &'a [SmolStr],
    pos: usize,
    constants: &'a FxHashMap<SmolStr, i64>,
    operation: &'a str,
    line: u32,
}

impl Evaluator<'_> {
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.operation, message, Some(self.line))
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(|t| t.as_str())
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn expr(&mut self) -> Result<i64, ParseError> {
        let mut value = self.term()?;
        while let Some(op @ ("+" | "-")) = self.peek() {
            let op = op.to_owned();
            self.bump();
            let rhs = self.term()?;
            value = if op == "+" { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<i64, ParseError> {
        let mut value = self.factor()?;
        while let Some(op @ ("*" | "/" | "%")) = self.peek() {
            let op = op.to_owned();
            self.bump();
            let rhs = self.factor()?;
            value = match op.as_str() {
                "*" => value * rhs,
                _ if rhs == 0 => return Err(self.error("division by zero")),
                "/" => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<i64, ParseError> {
        match self.peek() {
            Some("-") => {
                self.bump();
                Ok(-self.factor()?)
            }
            Some("+") => {
                self.bump();
                self.factor()
            }
            Some("(") => {
                self.bump();
                let value = self.expr()?;
                if self.peek() != Some(")") {
                    return Err(self.error("unbalanced parenthesis"));
                }
                self.bump();
                Ok(value)
            }
            Some(t) => {
                if let Ok(v) = t.parse::<i64>() {
                    self.bump();
                    Ok(v)
                } else if let Some(&v) = self.constants.get(t) {
                    self.bump();
                    Ok(v)
                } else if super::lexer::is_valid_identifier(t) {
                    Err(self.error(format!("unknown constant '{t}'")))
                } else {
                    Err(self.error(format!("unexpected token '{t}'")))
                }
            }
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(values: &[&str]) -> Vec<SmolStr> {
        values.iter().map(|v| SmolStr::new(v)).collect()
    }

    fn eval(values: &[&str], constants: &[(&str, i64)]) -> Result<i64, ParseError> {
        let constants: FxHashMap<SmolStr, i64> = constants
            .iter()
            .map(|(k, v)| (SmolStr::new(k), *v))
            .collect();
        evaluate_integer_expression(&toks(values), &constants, "test", 1)
    }

    #[test]
    fn test_literal_addition() {
        assert_eq!(eval(&["2", "+", "2"], &[]).unwrap(), 4);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval(&["1", "+", "2", "*", "3"], &[]).unwrap(), 7);
        assert_eq!(eval(&["(", "1", "+", "2", ")", "*", "3"], &[]).unwrap(), 9);
    }

    #[test]
    fn test_constant_substitution() {
        assert_eq!(eval(&["2", "*", "Nss", "+", "1"], &[("Nss", 12)]).unwrap(), 25);
    }

    #[test]
    fn test_unknown_constant() {
        let err = eval(&["N"], &[]).unwrap_err();
        assert!(err.message.contains("unknown constant 'N'"));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(eval(&["1", "/", "0"], &[]).is_err());
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval(&["-", "3", "+", "5"], &[]).unwrap(), 2);
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(eval(&["1", "2"], &[]).is_err());
    }
}
