//! Selection policy: thresholds plus a combine rule over the enabled signals.

use crate::domain::{Config, SignalValues};
use crate::error::PolicyError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Signal {
    Complexity,
    Coverage,
    Fanout,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complexity => "complexity",
            Self::Coverage => "coverage",
            Self::Fanout => "fanout",
        }
    }

    fn parse(name: &str) -> Result<Self, PolicyError> {
        match name {
            "complexity" => Ok(Self::Complexity),
            "coverage" => Ok(Self::Coverage),
            "fanout" => Ok(Self::Fanout),
            other => Err(PolicyError::UnknownSignal(other.to_string())),
        }
    }
}

/// Boolean combination of per-signal predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombineRule {
    Signal(Signal),
    Not(Box<CombineRule>),
    And(Box<CombineRule>, Box<CombineRule>),
    Or(Box<CombineRule>, Box<CombineRule>),
}

impl CombineRule {
    /// Compile a `policy` string: `complexity`, `all`, `any`, or an expression.
    pub fn compile(policy: &str, enabled: &[Signal]) -> Result<Self, PolicyError> {
        let optional = enabled.iter().copied().filter(|s| *s != Signal::Complexity);
        let base = Self::Signal(Signal::Complexity);
        let rule = match policy.trim().to_lowercase().as_str() {
            "" | "complexity" => base,
            "all" => optional.fold(base, |acc, s| Self::And(Box::new(acc), Box::new(Self::Signal(s)))),
            "any" => optional.fold(base, |acc, s| Self::Or(Box::new(acc), Box::new(Self::Signal(s)))),
            _ => ExprParser::new(policy)?.parse()?,
        };

        let referenced = rule.signals();
        if !referenced.contains(&Signal::Complexity) {
            return Err(PolicyError::MissingComplexity);
        }
        if let Some(disabled) = referenced.iter().find(|s| !enabled.contains(*s)) {
            return Err(PolicyError::SignalDisabled(disabled.as_str()));
        }
        Ok(rule)
    }

    pub fn evaluate(&self, predicate: &impl Fn(Signal) -> bool) -> bool {
        match self {
            Self::Signal(signal) => predicate(*signal),
            Self::Not(inner) => !inner.evaluate(predicate),
            Self::And(lhs, rhs) => lhs.evaluate(predicate) && rhs.evaluate(predicate),
            Self::Or(lhs, rhs) => lhs.evaluate(predicate) || rhs.evaluate(predicate),
        }
    }

    pub fn signals(&self) -> Vec<Signal> {
        let mut out = Vec::new();
        self.collect_signals(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect_signals(&self, out: &mut Vec<Signal>) {
        match self {
            Self::Signal(signal) => out.push(*signal),
            Self::Not(inner) => inner.collect_signals(out),
            Self::And(lhs, rhs) | Self::Or(lhs, rhs) => {
                lhs.collect_signals(out);
                rhs.collect_signals(out);
            }
        }
    }
}

impl fmt::Display for CombineRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => f.write_str(signal.as_str()),
            Self::Not(inner) => write!(f, "not {}", Grouped(inner)),
            Self::And(lhs, rhs) => write!(f, "{} and {}", Grouped(lhs), Grouped(rhs)),
            Self::Or(lhs, rhs) => write!(f, "{} or {}", Grouped(lhs), Grouped(rhs)),
        }
    }
}

struct Grouped<'a>(&'a CombineRule);

impl fmt::Display for Grouped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            CombineRule::Signal(_) => write!(f, "{}", self.0),
            other => write!(f, "({})", other),
        }
    }
}

/// Thresholds and combine rule, validated against the enabled signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub complexity_threshold: u32,
    pub fanout_threshold: usize,
    pub rule: CombineRule,
}

impl SelectionPolicy {
    pub fn from_config(config: &Config) -> Result<Self, PolicyError> {
        let mut enabled = vec![Signal::Complexity];
        if config.coverage.enabled {
            enabled.push(Signal::Coverage);
        }
        if config.fanout.enabled {
            enabled.push(Signal::Fanout);
        }
        Ok(Self {
            complexity_threshold: config.complexity_threshold,
            fanout_threshold: config.fanout.threshold,
            rule: CombineRule::compile(&config.policy, &enabled)?,
        })
    }

    /// Thresholds are exclusive: a score equal to the threshold is peripheral.
    pub fn is_core(&self, signals: &SignalValues, parse_failed: bool) -> bool {
        if parse_failed {
            return false;
        }
        self.rule.evaluate(&|signal| match signal {
            Signal::Complexity => signals.complexity > self.complexity_threshold,
            Signal::Coverage => signals.fully_covered.unwrap_or(false),
            Signal::Fanout => signals.fanout.map(|n| n > self.fanout_threshold).unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    And,
    Or,
    Not,
    Open,
    Close,
}

/// Deepest `not`/parenthesis nesting a rule may use.
const MAX_NESTING: usize = 64;
/// Longest rule, in tokens. Also bounds the depth of chained `and`/`or` trees.
const MAX_TOKENS: usize = 256;

/// Recursive-descent parser, lowest precedence first: `or`, `and`, `not`.
struct ExprParser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl ExprParser {
    fn new(input: &str) -> Result<Self, PolicyError> {
        let mut tokens = Vec::new();
        let chars: Vec<(usize, char)> = input.char_indices().collect();
        let mut i = 0;
        while i < chars.len() {
            let (offset, c) = chars[i];
            let next = chars.get(i + 1).map(|&(_, c)| c);
            match c {
                c if c.is_whitespace() => i += 1,
                '(' => {
                    tokens.push((Token::Open, offset));
                    i += 1;
                }
                ')' => {
                    tokens.push((Token::Close, offset));
                    i += 1;
                }
                '!' => {
                    tokens.push((Token::Not, offset));
                    i += 1;
                }
                '&' if next == Some('&') => {
                    tokens.push((Token::And, offset));
                    i += 2;
                }
                '|' if next == Some('|') => {
                    tokens.push((Token::Or, offset));
                    i += 2;
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let start = i;
                    while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_') {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().map(|&(_, c)| c.to_ascii_lowercase()).collect();
                    let token = match word.as_str() {
                        "and" => Token::And,
                        "or" => Token::Or,
                        "not" => Token::Not,
                        _ => Token::Ident(word),
                    };
                    tokens.push((token, offset));
                }
                other => {
                    return Err(PolicyError::UnexpectedToken { token: other.to_string(), offset });
                }
            }
        }
        if tokens.len() > MAX_TOKENS {
            return Err(PolicyError::TooLong { limit: MAX_TOKENS });
        }
        Ok(Self { tokens, pos: 0, depth: 0 })
    }

    fn parse(mut self) -> Result<CombineRule, PolicyError> {
        let rule = self.parse_or()?;
        match self.tokens.get(self.pos) {
            None => Ok(rule),
            Some((token, offset)) => Err(unexpected(token, *offset)),
        }
    }

    fn parse_or(&mut self) -> Result<CombineRule, PolicyError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = CombineRule::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<CombineRule, PolicyError> {
        let mut lhs = self.parse_unary()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_unary()?;
            lhs = CombineRule::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<CombineRule, PolicyError> {
        if self.depth >= MAX_NESTING {
            let offset = self.tokens.get(self.pos).map_or(0, |(_, o)| *o);
            return Err(PolicyError::TooDeep { limit: MAX_NESTING, offset });
        }
        self.depth += 1;
        let rule = self.parse_primary();
        self.depth -= 1;
        rule
    }

    fn parse_primary(&mut self) -> Result<CombineRule, PolicyError> {
        if self.eat(&Token::Not) {
            return Ok(CombineRule::Not(Box::new(self.parse_unary()?)));
        }
        let (token, offset) = self.tokens.get(self.pos).cloned().ok_or(PolicyError::UnexpectedEnd)?;
        self.pos += 1;
        match token {
            Token::Ident(name) => Ok(CombineRule::Signal(Signal::parse(&name)?)),
            Token::Open => {
                let inner = self.parse_or()?;
                if !self.eat(&Token::Close) {
                    return match self.tokens.get(self.pos) {
                        None => Err(PolicyError::UnexpectedEnd),
                        Some((token, offset)) => Err(unexpected(token, *offset)),
                    };
                }
                Ok(inner)
            }
            other => Err(unexpected(&other, offset)),
        }
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.tokens.get(self.pos).map(|(t, _)| t) == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

fn unexpected(token: &Token, offset: usize) -> PolicyError {
    let token = match token {
        Token::Ident(name) => name.clone(),
        Token::And => "and".into(),
        Token::Or => "or".into(),
        Token::Not => "not".into(),
        Token::Open => "(".into(),
        Token::Close => ")".into(),
    };
    PolicyError::UnexpectedToken { token, offset }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[Signal] = &[Signal::Complexity, Signal::Coverage, Signal::Fanout];

    fn values(complexity: u32, fully_covered: Option<bool>, fanout: Option<usize>) -> SignalValues {
        SignalValues { complexity, fully_covered, fanout }
    }

    fn policy(rule: &str, enabled: &[Signal]) -> SelectionPolicy {
        SelectionPolicy {
            complexity_threshold: 25,
            fanout_threshold: 5,
            rule: CombineRule::compile(rule, enabled).expect("valid rule"),
        }
    }

    #[test]
    fn threshold_is_exclusive() {
        let p = policy("complexity", &[Signal::Complexity]);
        assert!(!p.is_core(&values(25, None, None), false));
        assert!(p.is_core(&values(26, None, None), false));
        assert!(!p.is_core(&values(10, None, None), false));
    }

    #[test]
    fn parse_failure_is_always_peripheral() {
        let p = policy("not complexity or complexity", &[Signal::Complexity]);
        assert!(p.is_core(&values(0, None, None), false));
        assert!(!p.is_core(&values(0, None, None), true));
    }

    #[test]
    fn all_and_any_expand_over_enabled_signals() {
        let all = policy("all", ALL);
        assert_eq!(all.rule.to_string(), "(complexity and coverage) and fanout");
        assert!(all.is_core(&values(30, Some(true), Some(6)), false));
        assert!(!all.is_core(&values(30, Some(true), Some(5)), false));

        let any = policy("any", ALL);
        assert!(any.is_core(&values(0, Some(false), Some(6)), false));
        assert!(!any.is_core(&values(0, Some(false), Some(5)), false));

        let complexity_only = policy("all", &[Signal::Complexity]);
        assert_eq!(complexity_only.rule, CombineRule::Signal(Signal::Complexity));
    }

    #[test]
    fn expression_precedence_and_operators() {
        let rule = CombineRule::compile("complexity and not coverage || fanout", ALL).unwrap();
        assert_eq!(rule.to_string(), "(complexity and (not coverage)) or fanout");

        let grouped = CombineRule::compile("complexity && (!coverage or fanout)", ALL).unwrap();
        assert_eq!(grouped.to_string(), "complexity and ((not coverage) or fanout)");
    }

    #[test]
    fn missing_optional_signal_values_are_false() {
        let p = policy("complexity or fanout", ALL);
        assert!(!p.is_core(&values(1, None, None), false));
    }

    #[test]
    fn nesting_is_capped_instead_of_overflowing() {
        let deep = format!("{}complexity{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(CombineRule::compile(&deep, ALL), Err(PolicyError::TooLong { .. })));

        let mut parser = ExprParser::new("complexity").unwrap();
        parser.tokens = std::iter::repeat((Token::Not, 0))
            .take(100_000)
            .chain(std::iter::once((Token::Ident("complexity".into()), 0)))
            .collect();
        assert!(matches!(parser.parse(), Err(PolicyError::TooDeep { limit: 64, .. })));

        let nots = format!("{}complexity", "not ".repeat(70));
        assert!(matches!(CombineRule::compile(&nots, ALL), Err(PolicyError::TooDeep { limit: 64, offset: 256 })));

        let fine = format!("{}complexity{}", "(".repeat(60), ")".repeat(60));
        assert_eq!(CombineRule::compile(&fine, ALL), Ok(CombineRule::Signal(Signal::Complexity)));
    }

    #[test]
    fn rejects_invalid_rules() {
        assert_eq!(CombineRule::compile("coverage", ALL), Err(PolicyError::MissingComplexity));
        assert_eq!(
            CombineRule::compile("complexity and fanout", &[Signal::Complexity]),
            Err(PolicyError::SignalDisabled("fanout"))
        );
        assert_eq!(
            CombineRule::compile("complexity and size", ALL),
            Err(PolicyError::UnknownSignal("size".into()))
        );
        assert_eq!(CombineRule::compile("complexity and", ALL), Err(PolicyError::UnexpectedEnd));
        assert_eq!(
            CombineRule::compile(&"complexity and ".repeat(200), ALL),
            Err(PolicyError::TooLong { limit: 256 })
        );
        assert_eq!(CombineRule::compile("(complexity", ALL), Err(PolicyError::UnexpectedEnd));
        assert_eq!(
            CombineRule::compile("complexity coverage", ALL),
            Err(PolicyError::UnexpectedToken { token: "coverage".into(), offset: 11 })
        );
        assert!(matches!(
            CombineRule::compile("complexity & fanout", ALL),
            Err(PolicyError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn from_config_follows_enabled_flags() {
        let mut config = Config::default();
        config.policy = "complexity or coverage".into();
        assert_eq!(SelectionPolicy::from_config(&config), Err(PolicyError::SignalDisabled("coverage")));

        config.coverage.enabled = true;
        let p = SelectionPolicy::from_config(&config).unwrap();
        assert!(p.is_core(&values(0, Some(true), None), false));
    }
}
