// ============================================================
// Layer 5 - Model Arguments
// ============================================================
// Model constructor arguments arrive from the command line as
// strings:
//
//   --args 20000 2            → positional literals
//   --kwargs hidden_size=64   → keyword literals
//
// Each string is parsed into a typed Literal, then bound to
// the ordered parameter list of the chosen model variant:
//
//   params:     [vocab_size, num_classes, embedding_dim, ...]
//   positional:  20000       2
//   keyword:                                hidden_size=64
//
// Binding rejects extra positionals, unknown keywords and
// parameters given twice. Typed getters then reject values of
// the wrong kind, naming the offending parameter.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::ConfigError;

/// A parsed constructor argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<Literal>),
}

impl Literal {
    /// Parse `text` as a literal; `field` is only used in error messages.
    pub fn parse(field: &str, text: &str) -> Result<Self, ConfigError> {
        let mut parser = LiteralParser { chars: text.trim().chars().collect(), pos: 0 };
        let malformed = |reason: String| ConfigError::MalformedLiteral {
            field: field.to_string(),
            value: text.to_string(),
            reason,
        };

        let literal = parser.value().map_err(malformed)?;
        parser.skip_ws();
        if parser.pos != parser.chars.len() {
            return Err(malformed(format!("trailing input at offset {}", parser.pos)));
        }
        Ok(literal)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "string",
            Literal::Bool(_) => "bool",
            Literal::List(_) => "list",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// ─── Parser ───────────────────────────────────────────────────────────────────
struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn value(&mut self) -> Result<Literal, String> {
        self.skip_ws();
        match self.peek() {
            None => Err("empty value".to_string()),
            Some('[') => self.sequence(']'),
            Some('(') => self.sequence(')'),
            Some(q @ ('\'' | '"')) => self.string(q),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_alphabetic() => self.word(),
            Some(c) => Err(format!("unexpected character {c:?}")),
        }
    }

    fn sequence(&mut self, close: char) -> Result<Literal, String> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Literal::List(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => {}
                Some(c) => return Err(format!("expected ',' or {close:?}, found {c:?}")),
                None => return Err(format!("unclosed sequence, expected {close:?}")),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<Literal, String> {
        self.pos += 1;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                c if c == quote => return Ok(Literal::Str(out)),
                '\\' => {
                    let escaped = self.peek().ok_or("dangling escape")?;
                    self.pos += 1;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        '\\' | '\'' | '"' => escaped,
                        other => return Err(format!("unknown escape \\{other}")),
                    });
                }
                c => out.push(c),
            }
        }
        Err("unterminated string".to_string())
    }

    fn number(&mut self) -> Result<Literal, String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
        {
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().filter(|&&c| c != '_').collect();

        if let Ok(v) = token.parse::<i64>() {
            return Ok(Literal::Int(v));
        }
        // Rust accepts "inf"/"nan" spellings; a literal must start like a number.
        let digits = token.trim_start_matches(['-', '+']);
        if digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            if let Ok(v) = token.parse::<f64>() {
                if v.is_finite() {
                    return Ok(Literal::Float(v));
                }
            }
        }
        Err(format!("invalid number {token:?}"))
    }

    fn word(&mut self) -> Result<Literal, String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" | "true" => Ok(Literal::Bool(true)),
            "False" | "false" => Ok(Literal::Bool(false)),
            other => Err(format!("bare word {other:?} (quote strings)")),
        }
    }
}

// ─── ModelArgs ────────────────────────────────────────────────────────────────
/// Positional and keyword constructor arguments for a model variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelArgs {
    pub positional: Vec<Literal>,
    pub keyword: BTreeMap<String, Literal>,
    fallbacks: BTreeMap<String, Literal>,
}

impl ModelArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `--args` and `--kwargs` strings.
    pub fn parse<A, K>(args: &[A], kwargs: &[K]) -> Result<Self, ConfigError>
    where
        A: AsRef<str>,
        K: AsRef<str>,
    {
        let positional = args
            .iter()
            .enumerate()
            .map(|(i, a)| Literal::parse(&format!("args[{i}]"), a.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut keyword = BTreeMap::new();
        for kw in kwargs {
            let kw = kw.as_ref();
            let (key, value) = kw
                .split_once('=')
                .map(|(k, v)| (k.trim(), v))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| ConfigError::MalformedKeyword(kw.to_string()))?;
            keyword.insert(key.to_string(), Literal::parse(key, value)?);
        }

        Ok(Self { positional, keyword, fallbacks: BTreeMap::new() })
    }

    pub fn with_keyword(mut self, key: impl Into<String>, value: Literal) -> Self {
        self.keyword.insert(key.into(), value);
        self
    }

    /// Value used for `key` only when the caller bound nothing to it.
    pub fn with_fallback(mut self, key: impl Into<String>, value: Literal) -> Self {
        self.fallbacks.insert(key.into(), value);
        self
    }

    /// Bind these arguments to the ordered parameter list of `model`.
    pub fn bind<'a>(&self, model: &'a str, params: &[&'static str]) -> Result<BoundArgs<'a>, ConfigError> {
        let mismatch = |reason: String| ConfigError::ArgumentMismatch {
            model: model.to_string(),
            reason,
        };

        if self.positional.len() > params.len() {
            return Err(mismatch(format!(
                "takes at most {} positional arguments but {} were given",
                params.len(),
                self.positional.len()
            )));
        }

        let mut values: BTreeMap<&'static str, Literal> = params
            .iter()
            .copied()
            .zip(self.positional.iter().cloned())
            .collect();

        for (key, value) in &self.keyword {
            let param = params
                .iter()
                .copied()
                .find(|p| *p == key.as_str())
                .ok_or_else(|| mismatch(format!("unexpected keyword argument '{key}'")))?;
            if values.insert(param, value.clone()).is_some() {
                return Err(mismatch(format!("got multiple values for argument '{key}'")));
            }
        }

        for (key, value) in &self.fallbacks {
            if let Some(param) = params.iter().copied().find(|p| *p == key.as_str()) {
                values.entry(param).or_insert_with(|| value.clone());
            }
        }

        Ok(BoundArgs { model, values })
    }
}

// ─── BoundArgs ────────────────────────────────────────────────────────────────
/// Arguments resolved against a parameter list, with typed accessors.
#[derive(Debug)]
pub struct BoundArgs<'a> {
    model: &'a str,
    values: BTreeMap<&'static str, Literal>,
}

impl<'a> BoundArgs<'a> {
    fn invalid(&self, field: &str, expected: &str, found: &Literal) -> ConfigError {
        ConfigError::InvalidArgument {
            model: self.model.to_string(),
            field: field.to_string(),
            expected: expected.to_string(),
            found: format!("{} {}", found.kind(), found),
        }
    }

    fn missing(&self, field: &str) -> ConfigError {
        ConfigError::MissingArgument {
            model: self.model.to_string(),
            field: field.to_string(),
        }
    }

    pub fn is_bound(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// A strictly positive integer.
    pub fn size(&self, field: &str) -> Result<Option<usize>, ConfigError> {
        match self.values.get(field) {
            None => Ok(None),
            Some(Literal::Int(v)) if *v > 0 => Ok(Some(*v as usize)),
            Some(other) => Err(self.invalid(field, "a positive int", other)),
        }
    }

    pub fn required_size(&self, field: &str) -> Result<usize, ConfigError> {
        self.size(field)?.ok_or_else(|| self.missing(field))
    }

    /// A probability in `[0, 1)`; ints are accepted as floats.
    pub fn probability(&self, field: &str) -> Result<Option<f64>, ConfigError> {
        let value = match self.values.get(field) {
            None => return Ok(None),
            Some(Literal::Float(v)) => *v,
            Some(Literal::Int(v)) => *v as f64,
            Some(other) => return Err(self.invalid(field, "a float in [0, 1)", other)),
        };
        if (0.0..1.0).contains(&value) {
            Ok(Some(value))
        } else {
            Err(self.invalid(field, "a float in [0, 1)", &Literal::Float(value)))
        }
    }
}
