//! Matcher contract consumed by LIKE predicates, plus a compiled reference
//! implementation of SQL `LIKE`.

use std::fmt;

use memchr::memmem;
use regex::bytes::{Regex, RegexBuilder};

use crate::{
    error::PatternError,
    logging::{vecpred_log, LIKE_CTX},
    option::LikeOption,
};

/// Externally compiled pattern matcher.
///
/// `&self` is the matcher's execution context; it is owned by the enclosing
/// scan and only borrowed by predicates. Implementations must be pure for a
/// fixed pattern: the same value always yields the same answer.
pub trait LikeMatcher: Send + Sync {
    /// Returns true when `value` matches `pattern`.
    fn is_match(&self, value: &[u8], pattern: &[u8]) -> bool;
}

impl<F> LikeMatcher for F
where
    F: Fn(&[u8], &[u8]) -> bool + Send + Sync,
{
    #[inline]
    fn is_match(&self, value: &[u8], pattern: &[u8]) -> bool {
        self(value, pattern)
    }
}

/// Strategy picked when a pattern is compiled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikeKind {
    /// No wildcard: byte equality.
    Equals,
    /// `lit%`.
    StartsWith,
    /// `%lit`.
    EndsWith,
    /// `%lit%`.
    Contains,
    /// Only `%` wildcards: every value matches.
    MatchAll,
    /// Anything else, evaluated by an anchored regex.
    Regex,
}

impl fmt::Display for LikeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LikeKind::Equals => "equals",
            LikeKind::StartsWith => "starts_with",
            LikeKind::EndsWith => "ends_with",
            LikeKind::Contains => "contains",
            LikeKind::MatchAll => "match_all",
            LikeKind::Regex => "regex",
        })
    }
}

#[derive(Clone, Debug)]
enum Program {
    Equals(Vec<u8>),
    StartsWith(Vec<u8>),
    EndsWith(Vec<u8>),
    Contains(memmem::Finder<'static>),
    MatchAll,
    Regex(Regex),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    Literal(char),
    /// `%`
    Any,
    /// `_`
    One,
}

fn tokenize(pattern: &str, escape: char) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = if c == escape {
            // A trailing escape stands for itself.
            Token::Literal(chars.next().unwrap_or(escape))
        } else if c == '%' {
            Token::Any
        } else if c == '_' {
            Token::One
        } else {
            Token::Literal(c)
        };
        tokens.push(token);
    }
    tokens
}

fn literal_bytes(tokens: &[Token]) -> Option<Vec<u8>> {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Literal(c) => out.push(*c),
            Token::Any | Token::One => return None,
        }
    }
    Some(out.into_bytes())
}

fn regex_source(tokens: &[Token], binary: bool) -> String {
    let mut source = String::from("^");
    let mut buf = [0u8; 4];
    for token in tokens {
        match token {
            // Byte mode has no multi-byte literals, so spell them out.
            Token::Literal(c) if binary && !c.is_ascii() => {
                for byte in c.encode_utf8(&mut buf).bytes() {
                    source.push_str(&format!("\\x{byte:02X}"));
                }
            }
            Token::Literal(c) => source.push_str(&regex::escape(c.encode_utf8(&mut buf))),
            Token::Any => source.push_str(".*"),
            Token::One => source.push('.'),
        }
    }
    source.push('$');
    source
}

/// A LIKE pattern compiled once and shared by every predicate that uses it.
#[derive(Clone, Debug)]
pub struct LikeState {
    pattern: String,
    program: Program,
}

impl LikeState {
    /// Compiles `pattern` (`%` any sequence, `_` one character, or one byte
    /// under [`LikeOption::binary`]).
    pub fn compile(pattern: &str, option: &LikeOption) -> Result<Self, PatternError> {
        let tokens = tokenize(pattern, option.escape);
        let program = if option.case_insensitive {
            Self::regex(pattern, &tokens, option)?
        } else {
            Self::plan(pattern, &tokens, option)?
        };
        let state = Self {
            pattern: pattern.to_owned(),
            program,
        };
        vecpred_log!(
            log::Level::Debug,
            ctx: LIKE_CTX,
            "like_compiled",
            "pattern={:?} kind={} case_insensitive={} binary={}",
            pattern,
            state.kind(),
            option.case_insensitive,
            option.binary,
        );
        Ok(state)
    }

    fn plan(
        pattern: &str,
        tokens: &[Token],
        option: &LikeOption,
    ) -> Result<Program, PatternError> {
        let leading = tokens.iter().take_while(|t| **t == Token::Any).count();
        if leading == tokens.len() {
            return Ok(if leading == 0 {
                Program::Equals(Vec::new())
            } else {
                Program::MatchAll
            });
        }
        let trailing = tokens.iter().rev().take_while(|t| **t == Token::Any).count();
        let Some(literal) = literal_bytes(&tokens[leading..tokens.len() - trailing]) else {
            return Self::regex(pattern, tokens, option);
        };
        Ok(match (leading > 0, trailing > 0) {
            (false, false) => Program::Equals(literal),
            (false, true) => Program::StartsWith(literal),
            (true, false) => Program::EndsWith(literal),
            (true, true) => Program::Contains(memmem::Finder::new(&literal).into_owned()),
        })
    }

    fn regex(
        pattern: &str,
        tokens: &[Token],
        option: &LikeOption,
    ) -> Result<Program, PatternError> {
        let regex = RegexBuilder::new(&regex_source(tokens, option.binary))
            .case_insensitive(option.case_insensitive)
            .unicode(!option.binary)
            .dot_matches_new_line(true)
            .build()
            .map_err(|source| PatternError::Regex {
                pattern: pattern.to_owned(),
                source,
            })?;
        Ok(Program::Regex(regex))
    }

    /// Source pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Strategy chosen at compile time.
    pub fn kind(&self) -> LikeKind {
        match self.program {
            Program::Equals(_) => LikeKind::Equals,
            Program::StartsWith(_) => LikeKind::StartsWith,
            Program::EndsWith(_) => LikeKind::EndsWith,
            Program::Contains(_) => LikeKind::Contains,
            Program::MatchAll => LikeKind::MatchAll,
            Program::Regex(_) => LikeKind::Regex,
        }
    }

    /// Tests `value` against the compiled pattern.
    #[inline]
    pub fn matches(&self, value: &[u8]) -> bool {
        match &self.program {
            Program::Equals(lit) => value == lit.as_slice(),
            Program::StartsWith(lit) => value.starts_with(lit),
            Program::EndsWith(lit) => value.ends_with(lit),
            Program::Contains(finder) => finder.find(value).is_some(),
            Program::MatchAll => true,
            Program::Regex(regex) => regex.is_match(value),
        }
    }
}

impl LikeMatcher for LikeState {
    #[inline]
    fn is_match(&self, value: &[u8], pattern: &[u8]) -> bool {
        debug_assert_eq!(
            pattern,
            self.pattern.as_bytes(),
            "compiled LIKE state used with a different pattern"
        );
        self.matches(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> LikeState {
        LikeState::compile(pattern, &LikeOption::default()).expect("compile")
    }

    #[test]
    fn picks_fast_paths() {
        assert_eq!(compile("doris").kind(), LikeKind::Equals);
        assert_eq!(compile("").kind(), LikeKind::Equals);
        assert_eq!(compile("a%").kind(), LikeKind::StartsWith);
        assert_eq!(compile("%a").kind(), LikeKind::EndsWith);
        assert_eq!(compile("%doris%").kind(), LikeKind::Contains);
        assert_eq!(compile("%%").kind(), LikeKind::MatchAll);
        assert_eq!(compile("a%b").kind(), LikeKind::Regex);
        assert_eq!(compile("a_").kind(), LikeKind::Regex);
    }

    #[test]
    fn fast_path_semantics() {
        let contains = compile("%doris%");
        assert!(contains.matches(b"apachedoris"));
        assert!(contains.matches(b"dorisdb"));
        assert!(contains.matches(b"doris"));
        assert!(!contains.matches(b"hello"));

        let prefix = compile("a%");
        assert!(prefix.matches(b"abc"));
        assert!(prefix.matches(b"a"));
        assert!(!prefix.matches(b"xyz"));

        let suffix = compile("%z");
        assert!(suffix.matches(b"xyz"));
        assert!(!suffix.matches(b"zx"));

        let equals = compile("abc");
        assert!(equals.matches(b"abc"));
        assert!(!equals.matches(b"abcd"));

        let empty = compile("");
        assert!(empty.matches(b""));
        assert!(!empty.matches(b"a"));

        assert!(compile("%").matches(b""));
    }

    #[test]
    fn underscore_matches_one_character() {
        let state = compile("h_llo");
        assert!(state.matches(b"hello"));
        assert!(state.matches("héllo".as_bytes()));
        assert!(!state.matches(b"hllo"));
        assert!(!state.matches(b"heello"));
    }

    #[test]
    fn inner_percent_uses_regex() {
        let state = compile("a%c");
        assert!(state.matches(b"ac"));
        assert!(state.matches(b"abbbc"));
        assert!(state.matches(b"a\nc"));
        assert!(!state.matches(b"abcd"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let state = compile("a.b%");
        assert!(state.matches(b"a.bc"));
        assert!(!state.matches(b"axbc"));

        let state = compile("(x)_");
        assert!(state.matches(b"(x)1"));
        assert!(!state.matches(b"x1"));
    }

    #[test]
    fn escapes_make_wildcards_literal() {
        let state = compile(r"100\%");
        assert_eq!(state.kind(), LikeKind::Equals);
        assert!(state.matches(b"100%"));
        assert!(!state.matches(b"1000"));

        let state = compile(r"%\_%");
        assert_eq!(state.kind(), LikeKind::Contains);
        assert!(state.matches(b"snake_case"));
        assert!(!state.matches(b"camelCase"));

        let state = compile(r"ab\");
        assert!(state.matches(br"ab\"));

        let custom = LikeState::compile("5!%%", &LikeOption::default().escape('!'))
            .expect("compile");
        assert_eq!(custom.kind(), LikeKind::StartsWith);
        assert!(custom.matches(b"5% off"));
        assert!(!custom.matches(b"50 off"));
    }

    #[test]
    fn case_insensitive_matching() {
        let state = LikeState::compile("%Doris%", &LikeOption::default().case_insensitive(true))
            .expect("compile");
        assert_eq!(state.kind(), LikeKind::Regex);
        assert!(state.matches(b"APACHE DORIS"));
        assert!(state.matches(b"doris"));
        assert!(!state.matches(b"dors"));
    }

    #[test]
    fn binary_patterns_match_raw_bytes() {
        let binary = LikeOption::default().binary(true);
        let compile_binary =
            |pattern: &str| LikeState::compile(pattern, &binary).expect("compile");
        let value = b"a\xffb";

        assert!(compile_binary("a%").matches(value));
        assert!(compile_binary("%b").matches(value));
        assert!(compile_binary("a%b").matches(value));
        assert!(compile_binary("a_b").matches(value));
        assert!(!compile_binary("a__b").matches(value));

        // `_` is one byte, so a two-byte character needs two of them.
        assert!(!compile_binary("h_llo").matches("héllo".as_bytes()));
        assert!(compile_binary("h__llo").matches("héllo".as_bytes()));
        assert!(compile_binary("%é_").matches("café!".as_bytes()));

        let folded = LikeState::compile("%É%", &binary.clone().case_insensitive(true))
            .expect("compile");
        assert!(folded.matches("CAFÉ".as_bytes()));
        assert!(!folded.matches(b"\xff"));
    }

    #[test]
    fn text_patterns_match_characters() {
        assert!(compile("h_llo").matches("héllo".as_bytes()));
        assert!(!compile("h__llo").matches("héllo".as_bytes()));
    }

    #[test]
    fn matcher_contract_for_state_and_closures() {
        let state = compile("a%");
        assert!(state.is_match(b"abc", b"a%"));
        assert!(!state.is_match(b"xbc", b"a%"));

        let closure = |value: &[u8], pattern: &[u8]| value == pattern;
        assert!(closure.is_match(b"same", b"same"));
        assert!(!closure.is_match(b"same", b"other"));
        assert_eq!(state.pattern(), "a%");
    }
}
