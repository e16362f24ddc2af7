//! Strategy script compiler.
//!
//! Line-oriented grammar:
//!
//! ```text
//! STRATEGY <name>
//! ENTRY:
//!   [AND|OR] <expr> <op> <expr>
//! EXIT:
//!   [AND|OR] <expr> <op> <expr>
//! STOP_LOSS:
//! TAKE_PROFIT:
//! ```
//!
//! `STOP_LOSS:` and `TAKE_PROFIT:` blocks are accepted but their lines are not
//! read; any other header is an error.
//!
//! `<expr>` is a numeric literal or `NAME(p1[,p2,...])`; `<op>` is one of
//! `>`, `<`, `>=`, `<=`, `==`. Blank lines and `#` comments are skipped.
//! Each condition line is read by a small recursive descent parser; any error
//! aborts compilation with the offending line.

use crate::domain::condition::{
    Combinator, ComparisonOp, Condition, Expression, StrategyDefinition,
};
use crate::domain::error::{DefinitionError, TradesimError};

pub const DEFAULT_STRATEGY_NAME: &str = "Unnamed";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Entry,
    Exit,
    /// Risk blocks: recognised, contents skipped.
    Ignored,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn found(&self) -> String {
        match self.peek() {
            Some(_) => format!("'{}'", self.remaining()),
            None => "end of line".to_string(),
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), String> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            _ => Err(format!("expected '{}', found {}", expected, self.found())),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && !remaining[keyword.len()..]
                .chars()
                .next()
                .map(|c| c.is_alphanumeric() || c == '_' || c == '(')
                .unwrap_or(false)
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn consume_exact(&mut self, s: &str) -> bool {
        if self.remaining().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn consume_digits(&mut self) -> usize {
        let mut digits = 0;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else {
                break;
            }
        }
        digits
    }

    fn parse_number(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        let start = self.pos;

        if matches!(self.peek(), Some('-') | Some('+')) {
            self.advance();
        }
        let mut digits = self.consume_digits();
        if self.peek() == Some('.') {
            self.advance();
            digits += self.consume_digits();
        }
        if digits == 0 {
            self.pos = start;
            return Err(format!("expected number, found {}", self.found()));
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek(), Some('-') | Some('+')) {
                self.advance();
            }
            if self.consume_digits() == 0 {
                return Err("malformed exponent".to_string());
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse::<f64>()
            .map_err(|_| format!("invalid number: {}", num_str))
    }

    fn parse_identifier(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn parse_expression(&mut self) -> Result<Expression, String> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch.is_ascii_uppercase() || ch == '_' => {
                let name = self.parse_identifier();
                self.expect_char('(')?;
                let mut params = vec![self.parse_number()?];
                loop {
                    self.skip_whitespace();
                    if self.consume_exact(",") {
                        params.push(self.parse_number()?);
                    } else {
                        break;
                    }
                }
                self.expect_char(')')?;
                Ok(Expression::Indicator {
                    name: name.to_string(),
                    params,
                })
            }
            Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => {
                Ok(Expression::Value {
                    value: self.parse_number()?,
                })
            }
            _ => Err(format!(
                "expected numeric literal or NAME(params), found {}",
                self.found()
            )),
        }
    }

    fn parse_operator(&mut self) -> Result<ComparisonOp, String> {
        self.skip_whitespace();
        // two-character operators first
        let op = if self.consume_exact(">=") {
            ComparisonOp::GreaterEqual
        } else if self.consume_exact("<=") {
            ComparisonOp::LessEqual
        } else if self.consume_exact("==") {
            ComparisonOp::Equal
        } else if self.consume_exact(">") {
            ComparisonOp::Greater
        } else if self.consume_exact("<") {
            ComparisonOp::Less
        } else {
            return Err(format!(
                "expected comparison operator (>, <, >=, <=, ==), found {}",
                self.found()
            ));
        };
        Ok(op)
    }

    fn parse_condition(&mut self) -> Result<Condition, String> {
        self.skip_whitespace();
        let combinator = if self.consume_keyword("AND") {
            Combinator::And
        } else if self.consume_keyword("OR") {
            Combinator::Or
        } else {
            Combinator::default()
        };

        let left = self.parse_expression()?;
        let operator = self.parse_operator()?;
        let right = self.parse_expression()?;

        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(format!("unexpected input after condition: '{}'", self.remaining()));
        }

        Ok(Condition {
            left,
            operator,
            right,
            combinator,
        })
    }
}

fn strategy_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("STRATEGY")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Compile a strategy script. No definition is produced unless every line is valid.
pub fn compile(script: &str) -> Result<StrategyDefinition, TradesimError> {
    let mut name: Option<String> = None;
    let mut section: Option<Section> = None;
    let mut entry_conditions = Vec::new();
    let mut exit_conditions = Vec::new();

    for (idx, raw_line) in script.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fail = |reason: String| DefinitionError {
            line_number: idx + 1,
            line: line.to_string(),
            reason,
        };

        if let Some(declared) = strategy_name(line) {
            if declared.is_empty() {
                return Err(fail("missing strategy name".to_string()).into());
            }
            name = Some(declared.to_string());
            continue;
        }

        if let Some(header) = line.strip_suffix(':') {
            section = match header.trim() {
                "ENTRY" => Some(Section::Entry),
                "EXIT" => Some(Section::Exit),
                "STOP_LOSS" | "TAKE_PROFIT" => Some(Section::Ignored),
                other => {
                    return Err(fail(format!(
                        "unknown section '{}' (expected ENTRY, EXIT, STOP_LOSS or TAKE_PROFIT)",
                        other
                    ))
                    .into());
                }
            };
            continue;
        }

        if section == Some(Section::Ignored) {
            continue;
        }

        let condition = Parser::new(line).parse_condition().map_err(fail)?;
        match section {
            Some(Section::Entry) => entry_conditions.push(condition),
            Some(Section::Exit) => exit_conditions.push(condition),
            Some(Section::Ignored) => continue,
            None => {
                return Err(fail("condition outside an ENTRY: or EXIT: block".to_string()).into());
            }
        }
    }

    Ok(StrategyDefinition {
        name: name.unwrap_or_else(|| DEFAULT_STRATEGY_NAME.to_string()),
        entry_conditions,
        exit_conditions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition_error(script: &str) -> DefinitionError {
        match compile(script) {
            Err(TradesimError::InvalidStrategyDefinition(e)) => e,
            other => panic!("expected InvalidStrategyDefinition, got {:?}", other),
        }
    }

    #[test]
    fn compile_single_entry_condition() {
        let def = compile("ENTRY:\n  RSI(14) < 30").unwrap();
        assert_eq!(def.entry_conditions.len(), 1);
        let c = &def.entry_conditions[0];
        assert_eq!(c.left, Expression::indicator("RSI", &[14.0]));
        assert_eq!(c.operator, ComparisonOp::Less);
        assert_eq!(c.right, Expression::value(30.0));
        assert!(def.exit_conditions.is_empty());
    }

    #[test]
    fn compile_full_script() {
        let script = "STRATEGY TestStrat\n\
                      ENTRY:\n  RSI(14) < 30\n\
                      EXIT:\n  RSI(14) > 70";
        let def = compile(script).unwrap();
        assert_eq!(def.name, "TestStrat");
        assert_eq!(def.entry_conditions.len(), 1);
        assert_eq!(def.exit_conditions.len(), 1);
        assert_eq!(def.exit_conditions[0].operator, ComparisonOp::Greater);
    }

    #[test]
    fn compile_compound_conditions() {
        let def = compile("ENTRY:\n  RSI(14) < 30\n  AND EMA(20) > 50").unwrap();
        assert_eq!(def.entry_conditions.len(), 2);
        assert_eq!(def.entry_conditions[1].combinator, Combinator::And);
        assert_eq!(
            def.entry_conditions[1].left,
            Expression::indicator("EMA", &[20.0])
        );
    }

    #[test]
    fn combinator_defaults_to_and() {
        let def = compile("ENTRY:\n  RSI(14) < 30\n  EMA(20) > 50\n  OR SMA(5) > 1").unwrap();
        assert_eq!(def.entry_conditions[1].combinator, Combinator::And);
        assert_eq!(def.entry_conditions[2].combinator, Combinator::Or);
    }

    #[test]
    fn two_character_operators() {
        let def = compile("ENTRY:\n RSI(14) >= 30\n RSI(14) <= 70\n RSI(14) == 50").unwrap();
        let ops: Vec<ComparisonOp> = def.entry_conditions.iter().map(|c| c.operator).collect();
        assert_eq!(
            ops,
            vec![
                ComparisonOp::GreaterEqual,
                ComparisonOp::LessEqual,
                ComparisonOp::Equal
            ]
        );
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let script = "# oversold bounce\n\nSTRATEGY Bounce\n\nENTRY:\n  # buy low\n  RSI(14) < 30\n";
        let def = compile(script).unwrap();
        assert_eq!(def.name, "Bounce");
        assert_eq!(def.entry_conditions.len(), 1);
    }

    #[test]
    fn name_defaults_when_absent() {
        let def = compile("EXIT:\n  RSI(14) > 70").unwrap();
        assert_eq!(def.name, DEFAULT_STRATEGY_NAME);
    }

    #[test]
    fn strategy_name_keeps_spaces() {
        let def = compile("STRATEGY  Golden Cross v2 \nENTRY:\n SMA(50) > SMA(200)").unwrap();
        assert_eq!(def.name, "Golden Cross v2");
    }

    #[test]
    fn multi_parameter_indicators() {
        let def = compile("ENTRY:\n  MACD(12, 26, 9) > MACD_SIGNAL(12,26,9)\n  BB_LOWER(20,2.5) > 10").unwrap();
        assert_eq!(
            def.entry_conditions[0].left,
            Expression::indicator("MACD", &[12.0, 26.0, 9.0])
        );
        assert_eq!(
            def.entry_conditions[1].left,
            Expression::indicator("BB_LOWER", &[20.0, 2.5])
        );
    }

    #[test]
    fn numeric_literals() {
        let def = compile("ENTRY:\n  ROC(5) > -2.5\n  ROC(5) < 1e2\n  -1 < .5").unwrap();
        assert_eq!(def.entry_conditions[0].right, Expression::value(-2.5));
        assert_eq!(def.entry_conditions[1].right, Expression::value(100.0));
        assert_eq!(def.entry_conditions[2].left, Expression::value(-1.0));
        assert_eq!(def.entry_conditions[2].right, Expression::value(0.5));
    }

    #[test]
    fn handles_crlf() {
        let def = compile("STRATEGY X\r\nENTRY:\r\n  RSI(14) < 30\r\n").unwrap();
        assert_eq!(def.name, "X");
        assert_eq!(def.entry_conditions.len(), 1);
    }

    #[test]
    fn unknown_indicator_name_still_compiles() {
        let def = compile("ENTRY:\n  FOO(3) > 1").unwrap();
        assert_eq!(def.unsupported_indicators(), vec!["FOO(3)"]);
    }

    #[test]
    fn error_missing_operator() {
        let err = definition_error("ENTRY:\n  RSI(14) 30");
        assert_eq!(err.line_number, 2);
        assert_eq!(err.line, "RSI(14) 30");
        assert!(err.reason.contains("comparison operator"));
    }

    #[test]
    fn error_unsupported_operator() {
        let err = definition_error("ENTRY:\n  RSI(14) != 30");
        assert!(err.reason.contains("comparison operator"));
    }

    #[test]
    fn error_trailing_input() {
        let err = definition_error("ENTRY:\n  RSI(14) < 30 AND");
        assert!(err.reason.contains("unexpected input"));
    }

    #[test]
    fn error_unparsable_expression() {
        let err = definition_error("ENTRY:\n  close > 30");
        assert!(err.reason.contains("expected numeric literal"));
    }

    #[test]
    fn error_missing_paren() {
        let err = definition_error("ENTRY:\n  RSI(14 < 30");
        assert!(err.reason.contains("expected ')'"));
    }

    #[test]
    fn error_empty_parameter_list() {
        let err = definition_error("ENTRY:\n  RSI() < 30");
        assert!(err.reason.contains("expected number"));
    }

    #[test]
    fn risk_sections_are_skipped() {
        let plain = compile("STRATEGY X\nENTRY:\n RSI(14) < 30\nEXIT:\n RSI(14) > 70").unwrap();
        let with_risk = compile(
            "STRATEGY X\nENTRY:\n RSI(14) < 30\nEXIT:\n RSI(14) > 70\n\
             STOP_LOSS:\n 2.0\nTAKE_PROFIT:\n 5.0",
        )
        .unwrap();
        assert_eq!(with_risk, plain);
    }

    #[test]
    fn conditions_after_risk_section_resume_parsing() {
        let def = compile("STOP_LOSS:\n ATR(14) * 2\nEXIT:\n RSI(14) > 70").unwrap();
        assert!(def.entry_conditions.is_empty());
        assert_eq!(def.exit_conditions.len(), 1);
    }

    #[test]
    fn error_unknown_section() {
        let err = definition_error("TRAILING:\n  RSI(14) < 30");
        assert_eq!(err.line_number, 1);
        assert!(err.reason.contains("unknown section"));
    }

    #[test]
    fn error_condition_outside_section() {
        let err = definition_error("STRATEGY X\nRSI(14) < 30");
        assert_eq!(err.line_number, 2);
    }

    #[test]
    fn error_missing_strategy_name() {
        let err = definition_error("STRATEGY\nENTRY:\n RSI(14) < 30");
        assert_eq!(err.line_number, 1);
    }

    #[test]
    fn error_reports_first_bad_line_only() {
        let err = definition_error("ENTRY:\n  RSI(14) < 30\n  EMA(20) >\n  SMA(x) < 1");
        assert_eq!(err.line_number, 3);
    }

    #[test]
    fn combinator_prefix_needs_word_boundary() {
        let def = compile("ENTRY:\n  OR_X(3) > 1").unwrap();
        assert_eq!(def.entry_conditions[0].combinator, Combinator::And);
        assert_eq!(
            def.entry_conditions[0].left,
            Expression::indicator("OR_X", &[3.0])
        );
    }
}
