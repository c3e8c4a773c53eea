// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Tokenization and penalty-token normalization.
//!
//! Raw text becomes a [`Sentence`]: a list of tokens that each keep their
//! surface form, their class, and whether they were glued to the previous
//! token. The *key* of a token (what the vocabulary sees) depends on the
//! active [`PenaltyTokens`]: an active class collapses to a placeholder so
//! `5 km` and `7 km` share word ids, and the surface difference is charged
//! later as a penalty instead of a full edit.

use serde::{Deserialize, Serialize};

#[cfg(feature = "unicode-normalization")]
use unicode_normalization::UnicodeNormalization;

/// Placeholder keys for normalized classes.
pub const TAG_PLACEHOLDER: &str = "｟tag｠";
pub const PCT_PLACEHOLDER: &str = "｟pct｠";
pub const SEP_PLACEHOLDER: &str = "｟sep｠";
pub const NBR_PLACEHOLDER: &str = "｟nbr｠";

/// Bitmask of token classes that are matched loosely and penalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PenaltyTokens(pub u8);

impl PenaltyTokens {
    pub const NONE: PenaltyTokens = PenaltyTokens(0);
    pub const TAG: PenaltyTokens = PenaltyTokens(1 << 0);
    pub const PCT: PenaltyTokens = PenaltyTokens(1 << 1);
    pub const SEP: PenaltyTokens = PenaltyTokens(1 << 2);
    pub const JNR: PenaltyTokens = PenaltyTokens(1 << 3);
    pub const NBR: PenaltyTokens = PenaltyTokens(1 << 4);
    pub const CAS: PenaltyTokens = PenaltyTokens(1 << 5);
    pub const ALL: PenaltyTokens = PenaltyTokens(0b0011_1111);

    pub fn contains(self, other: PenaltyTokens) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn with(self, other: PenaltyTokens) -> Self {
        PenaltyTokens(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parse a comma-separated list such as `"tag,nbr,cas"`.
    pub fn parse_list(list: &str) -> Result<Self, String> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(PenaltyTokens::NONE, |acc, name| {
                let flag = match name {
                    "none" => PenaltyTokens::NONE,
                    "tag" => PenaltyTokens::TAG,
                    "pct" => PenaltyTokens::PCT,
                    "sep" => PenaltyTokens::SEP,
                    "jnr" => PenaltyTokens::JNR,
                    "nbr" => PenaltyTokens::NBR,
                    "cas" => PenaltyTokens::CAS,
                    "all" => PenaltyTokens::ALL,
                    other => return Err(format!("unknown penalty token class '{}'", other)),
                };
                Ok(acc.with(flag))
            })
    }
}

impl std::ops::BitOr for PenaltyTokens {
    type Output = PenaltyTokens;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.with(rhs)
    }
}

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenClass {
    Word,
    Tag,
    Punctuation,
    Separator,
    Number,
}

/// One token with everything needed to compute penalties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub class: TokenClass,
    /// `true` when no whitespace separated this token from the previous one.
    pub joined: bool,
}

impl Token {
    pub fn new(surface: impl Into<String>, joined: bool) -> Self {
        let surface = surface.into();
        let class = classify(&surface);
        Self {
            surface,
            class,
            joined,
        }
    }

    /// Vocabulary key under the given penalty-token mask.
    pub fn key(&self, pt: PenaltyTokens) -> String {
        match self.class {
            TokenClass::Tag if pt.contains(PenaltyTokens::TAG) => TAG_PLACEHOLDER.to_string(),
            TokenClass::Punctuation if pt.contains(PenaltyTokens::PCT) => {
                PCT_PLACEHOLDER.to_string()
            }
            TokenClass::Separator if pt.contains(PenaltyTokens::SEP) => {
                SEP_PLACEHOLDER.to_string()
            }
            TokenClass::Number if pt.contains(PenaltyTokens::NBR) => NBR_PLACEHOLDER.to_string(),
            _ if pt.contains(PenaltyTokens::CAS) => self.surface.to_lowercase(),
            _ => self.surface.clone(),
        }
    }
}

/// A tokenized sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

impl Sentence {
    /// Wrap pre-tokenized input. Tokens are classified but never split.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| Token::new(t.as_ref(), false)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Vocabulary keys for every token.
    pub fn keys(&self, pt: PenaltyTokens) -> Vec<String> {
        self.tokens.iter().map(|t| t.key(pt)).collect()
    }

    /// Rebuild display text, honoring joiners.
    pub fn detokenize(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 && !token.joined {
                out.push(' ');
            }
            out.push_str(&token.surface);
        }
        out
    }
}

/// Splits raw text into [`Sentence`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize(&self, text: &str) -> Sentence {
        let text = compose(text);
        let mut tokens = Vec::new();
        for chunk in text.split_whitespace() {
            split_chunk(chunk, &mut tokens);
        }
        Sentence { tokens }
    }
}

#[cfg(feature = "unicode-normalization")]
fn compose(text: &str) -> String {
    text.nfc().collect()
}

#[cfg(not(feature = "unicode-normalization"))]
fn compose(text: &str) -> String {
    text.to_string()
}

/// Split a whitespace-free chunk. The first token is free-standing, every
/// following one is joined to its predecessor.
fn split_chunk(chunk: &str, tokens: &mut Vec<Token>) {
    let chars: Vec<char> = chunk.chars().collect();
    let mut i = 0;
    let mut first = true;

    while i < chars.len() {
        let c = chars[i];
        let end = if let Some(close) = tag_end(&chars, i) {
            close + 1
        } else if c.is_ascii_digit() {
            number_end(&chars, i)
        } else if c.is_alphanumeric() {
            let mut j = i + 1;
            while j < chars.len() && is_word_char(chars[j]) {
                j += 1;
            }
            j
        } else {
            i + 1
        };

        let surface: String = chars[i..end].iter().collect();
        tokens.push(Token::new(surface, !first));
        first = false;
        i = end;
    }
}

/// Index of the closing bracket when a tag opens at `start`.
fn tag_end(chars: &[char], start: usize) -> Option<usize> {
    let close = match chars[start] {
        '<' => '>',
        '{' => '}',
        _ => return None,
    };
    let end = chars[start + 1..].iter().position(|&c| c == close)? + start + 1;
    (end > start + 1).then_some(end)
}

fn number_end(chars: &[char], start: usize) -> usize {
    let mut j = start + 1;
    while j < chars.len() {
        if chars[j].is_ascii_digit() {
            j += 1;
        } else if matches!(chars[j], '.' | ',')
            && j + 1 < chars.len()
            && chars[j + 1].is_ascii_digit()
        {
            j += 2;
        } else {
            break;
        }
    }
    j
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '\u{0300}'..='\u{036F}')
}

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '–' | '—' | '/' | '\\' | '|' | '_' | '…')
}

/// Class of a complete token.
pub fn classify(token: &str) -> TokenClass {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return TokenClass::Word;
    };

    if token.len() > 2
        && ((first == '<' && token.ends_with('>')) || (first == '{' && token.ends_with('}')))
    {
        return TokenClass::Tag;
    }
    if first.is_ascii_digit()
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return TokenClass::Number;
    }
    if token.chars().all(|c| !c.is_alphanumeric()) {
        if token.chars().all(is_separator) {
            return TokenClass::Separator;
        }
        return TokenClass::Punctuation;
    }
    TokenClass::Word
}
