//! Text analysis components declared in an index schema.
//!
//! Tokenizers, token filters and custom analyzers are modelled as typed
//! values. They serialize to the `settings.analysis` section the engine
//! expects, and [`Analysis::analyze`] evaluates a declared analyzer locally
//! with the same semantics the engine applies, so analyzer behaviour can be
//! checked without a running cluster.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Tokenizers the engine ships with; analyzers may reference these without
/// declaring them.
const BUILTIN_TOKENIZERS: &[&str] = &[
    "standard",
    "letter",
    "lowercase",
    "whitespace",
    "keyword",
    "pattern",
    "classic",
    "ngram",
    "edge_ngram",
];

/// Token filters the engine ships with.
const BUILTIN_FILTERS: &[&str] = &[
    "lowercase",
    "uppercase",
    "asciifolding",
    "stop",
    "trim",
    "unique",
    "reverse",
    "porter_stem",
];

/// Analyzers the engine ships with; field mappings may reference these
/// without declaring them.
pub const BUILTIN_ANALYZERS: &[&str] = &[
    "standard",
    "simple",
    "whitespace",
    "stop",
    "keyword",
    "pattern",
    "fingerprint",
];

/// Errors from evaluating an analyzer locally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Unknown analyzer: {0}")]
    UnknownAnalyzer(String),

    #[error("Unknown tokenizer: {0}")]
    UnknownTokenizer(String),

    #[error("Unknown token filter: {0}")]
    UnknownFilter(String),

    #[error("Invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A tokenizer definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tokenizer {
    /// Emits every match of `pattern` as a token, left to right.
    SimplePattern { pattern: String },
}

impl Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, AnalysisError> {
        match self {
            Self::SimplePattern { pattern } => {
                let regex = compile(pattern)?;
                Ok(regex
                    .find_iter(text)
                    .map(|m| m.as_str())
                    .filter(|token| !token.is_empty())
                    .map(str::to_string)
                    .collect())
            }
        }
    }
}

/// A token filter definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenFilter {
    /// Keeps only the first `max_token_count` tokens.
    Limit { max_token_count: usize },
    /// Rewrites every match of `pattern` inside each token.
    ///
    /// `replacement` uses the engine's (Java) syntax, where `$1000` means
    /// group 1 followed by `000` when the pattern has fewer than 10 groups.
    PatternReplace {
        pattern: String,
        replacement: String,
    },
}

impl TokenFilter {
    fn apply(&self, mut tokens: Vec<String>) -> Result<Vec<String>, AnalysisError> {
        match self {
            Self::Limit { max_token_count } => {
                tokens.truncate(*max_token_count);
                Ok(tokens)
            }
            Self::PatternReplace {
                pattern,
                replacement,
            } => {
                let regex = compile(pattern)?;
                let groups = regex.captures_len().saturating_sub(1);
                let replacement = java_replacement(replacement, groups);
                Ok(tokens
                    .iter()
                    .map(|token| regex.replace_all(token, replacement.as_str()).into_owned())
                    .collect())
            }
        }
    }
}

/// A custom analyzer: one tokenizer followed by an ordered filter chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "custom")]
pub struct CustomAnalyzer {
    pub tokenizer: String,
    pub filter: Vec<String>,
}

impl CustomAnalyzer {
    pub fn new(tokenizer: impl Into<String>) -> Self {
        Self {
            tokenizer: tokenizer.into(),
            filter: Vec::new(),
        }
    }

    /// Append a filter to the chain.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter.push(filter.into());
        self
    }
}

/// The `settings.analysis` section of an index.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Analysis {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    analyzer: BTreeMap<String, CustomAnalyzer>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    tokenizer: BTreeMap<String, Tokenizer>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    filter: BTreeMap<String, TokenFilter>,
}

impl Analysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokenizer(mut self, name: impl Into<String>, tokenizer: Tokenizer) -> Self {
        self.tokenizer.insert(name.into(), tokenizer);
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, filter: TokenFilter) -> Self {
        self.filter.insert(name.into(), filter);
        self
    }

    pub fn with_analyzer(mut self, name: impl Into<String>, analyzer: CustomAnalyzer) -> Self {
        self.analyzer.insert(name.into(), analyzer);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.analyzer.is_empty() && self.tokenizer.is_empty() && self.filter.is_empty()
    }

    /// Whether a field mapping may reference `name` as its analyzer.
    pub fn provides_analyzer(&self, name: &str) -> bool {
        self.analyzer.contains_key(name) || BUILTIN_ANALYZERS.contains(&name)
    }

    /// Check that every tokenizer and filter an analyzer references is
    /// either declared here or built into the engine.
    ///
    /// Returns the first dangling reference found.
    pub fn check_references(&self) -> Result<(), String> {
        for (name, analyzer) in &self.analyzer {
            if !self.tokenizer.contains_key(&analyzer.tokenizer)
                && !BUILTIN_TOKENIZERS.contains(&analyzer.tokenizer.as_str())
            {
                return Err(format!(
                    "analyzer {} references undeclared tokenizer {}",
                    name, analyzer.tokenizer
                ));
            }
            for filter in &analyzer.filter {
                if !self.filter.contains_key(filter) && !BUILTIN_FILTERS.contains(&filter.as_str())
                {
                    return Err(format!(
                        "analyzer {} references undeclared filter {}",
                        name, filter
                    ));
                }
            }
        }
        Ok(())
    }

    /// Run a declared custom analyzer over `text`.
    ///
    /// Only components declared in this section can be evaluated; built-in
    /// engine components are reported as unknown.
    pub fn analyze(&self, analyzer: &str, text: &str) -> Result<Vec<String>, AnalysisError> {
        let definition = self
            .analyzer
            .get(analyzer)
            .ok_or_else(|| AnalysisError::UnknownAnalyzer(analyzer.to_string()))?;

        let tokenizer = self
            .tokenizer
            .get(&definition.tokenizer)
            .ok_or_else(|| AnalysisError::UnknownTokenizer(definition.tokenizer.clone()))?;

        let mut tokens = tokenizer.tokenize(text)?;
        for name in &definition.filter {
            let filter = self
                .filter
                .get(name)
                .ok_or_else(|| AnalysisError::UnknownFilter(name.clone()))?;
            tokens = filter.apply(tokens)?;
        }

        Ok(tokens)
    }
}

fn compile(pattern: &str) -> Result<Regex, AnalysisError> {
    Regex::new(pattern).map_err(|e| AnalysisError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Translate a Java regex replacement string into `regex` crate syntax.
///
/// Java reads `$` plus the longest run of digits that still names an existing
/// group, so with one group `$1000` is group 1 followed by a literal `000`.
/// The `regex` crate would read the same string as a group named `1000`.
fn java_replacement(replacement: &str, groups: usize) -> String {
    let mut out = String::with_capacity(replacement.len() + 4);
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_literal(&mut out, escaped);
                }
            }
            '$' => match chars.peek().copied() {
                Some('{') => {
                    chars.next();
                    let name: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    out.push_str(&format!("${{{}}}", name));
                }
                Some(first) if first.is_ascii_digit() => {
                    chars.next();
                    let mut group = first.to_digit(10).unwrap_or(0) as usize;
                    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                        let next = group * 10 + digit as usize;
                        if next > groups {
                            break;
                        }
                        group = next;
                        chars.next();
                    }
                    out.push_str(&format!("${{{}}}", group));
                }
                _ => push_literal(&mut out, '$'),
            },
            other => push_literal(&mut out, other),
        }
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '$' {
        out.push_str("$$");
    } else {
        out.push(c);
    }
}
