// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tokenizer for the supported Kotlin subset
//!
//! The token stream is lossless: whitespace and comments are emitted as
//! trivia tokens, so concatenating the text of all tokens reproduces the
//! input. Token payloads are not stored; the text is recovered from the
//! token range.

use crate::error::{ParseError, ParseResult};
use crate::span::TextRange;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use unicode_xid::UnicodeXID;

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Trivia
    /// Spaces, tabs and line breaks
    Whitespace,
    /// `// ...` up to (not including) the line break
    LineComment,
    /// `/* ... */`, possibly nested
    BlockComment,

    // Names
    /// Identifier, plain or backticked
    Identifier,
    /// `name@` label definition
    LabelDefinition,
    /// `@name` directly after `return`, `break`, `continue` or `this`
    LabelReference,
    /// `@Name` annotation
    AnnotationName,

    // Literals
    /// Integer literal
    IntegerLiteral,
    /// Floating point literal
    FloatLiteral,
    /// String literal, quotes included
    StringLiteral,
    /// Character literal, quotes included
    CharLiteral,

    // Keywords
    /// `fun`
    Fun,
    /// `val`
    Val,
    /// `var`
    Var,
    /// `if`
    If,
    /// `else`
    Else,
    /// `when`
    When,
    /// `return`
    Return,
    /// `throw`
    Throw,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `this`
    This,
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// `is`
    Is,
    /// `!is`
    NotIs,
    /// `in`
    In,
    /// `!in`
    NotIn,
    /// `as`
    As,
    /// `as?`
    AsSafe,
    /// `for`
    For,
    /// `while`
    While,
    /// `package`
    Package,
    /// `import`
    Import,

    // Operators and punctuation
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `/=`
    SlashAssign,
    /// `%=`
    PercentAssign,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `===`
    EqEqEq,
    /// `!==`
    NotEqEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// `!!`
    BangBang,
    /// `?:`
    Elvis,
    /// `?.`
    SafeAccess,
    /// `.`
    Dot,
    /// `..`
    RangeTo,
    /// `->`
    Arrow,
    /// `?`
    Question,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
}

impl TokenKind {
    /// Whitespace or comment
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    /// Keywords that may be followed by an `@label` reference
    #[inline]
    fn takes_label_reference(self) -> bool {
        matches!(
            self,
            TokenKind::Return | TokenKind::Break | TokenKind::Continue | TokenKind::This
        )
    }
}

/// A token with its source range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Token category
    pub kind: TokenKind,
    /// Source range
    pub range: TextRange,
}

impl Token {
    /// Source text of the token
    #[inline]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.range.start..self.range.end]
    }
}

/// Keyword lookup table
static KEYWORD_TABLE: Lazy<FxHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut map = FxHashMap::default();

    // Declarations
    map.insert("fun", TokenKind::Fun);
    map.insert("val", TokenKind::Val);
    map.insert("var", TokenKind::Var);
    map.insert("package", TokenKind::Package);
    map.insert("import", TokenKind::Import);

    // Control flow
    map.insert("if", TokenKind::If);
    map.insert("else", TokenKind::Else);
    map.insert("when", TokenKind::When);
    map.insert("for", TokenKind::For);
    map.insert("while", TokenKind::While);
    map.insert("return", TokenKind::Return);
    map.insert("throw", TokenKind::Throw);
    map.insert("break", TokenKind::Break);
    map.insert("continue", TokenKind::Continue);

    // Values and operators spelled as words
    map.insert("this", TokenKind::This);
    map.insert("null", TokenKind::Null);
    map.insert("true", TokenKind::True);
    map.insert("false", TokenKind::False);
    map.insert("is", TokenKind::Is);
    map.insert("in", TokenKind::In);
    map.insert("as", TokenKind::As);

    map
});

/// Tokenizer over a source string
#[derive(Clone)]
pub struct Tokenizer<'input> {
    input: &'input str,
    pos: usize,
    /// Last non-trivia token, used to recognise label references
    last_significant: Option<Token>,
}

impl<'input> Tokenizer<'input> {
    /// Create a new tokenizer
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            pos: 0,
            last_significant: None,
        }
    }

    /// Tokenize the whole input, trivia included
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity(self.input.len() / 3 + 1);
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Produce the next token, `None` at end of input
    pub fn next_token(&mut self) -> ParseResult<Option<Token>> {
        let Some(ch) = self.peek_char() else {
            return Ok(None);
        };
        let start = self.pos;

        let kind = match ch {
            c if c.is_whitespace() => {
                self.eat_while(char::is_whitespace);
                TokenKind::Whitespace
            }
            '/' if self.peek_char_at(1) == Some('/') => {
                self.eat_while(|c| c != '\n');
                TokenKind::LineComment
            }
            '/' if self.peek_char_at(1) == Some('*') => {
                self.block_comment(start)?;
                TokenKind::BlockComment
            }
            '"' => {
                self.string_literal(start)?;
                TokenKind::StringLiteral
            }
            '\'' => {
                self.char_literal(start)?;
                TokenKind::CharLiteral
            }
            '`' => {
                self.pos += 1;
                self.eat_while(|c| c != '`' && c != '\n');
                if self.peek_char() != Some('`') {
                    return Err(ParseError::InvalidLiteral {
                        literal_type: "identifier".to_string(),
                        value: self.input[start..self.pos].to_string(),
                        position: start,
                    });
                }
                self.pos += 1;
                self.after_word(TokenKind::Identifier)
            }
            '@' => self.at_sign(start)?,
            c if c.is_ascii_digit() => self.number(start)?,
            c if is_identifier_start(c) => {
                self.eat_while(is_identifier_continue);
                let word = &self.input[start..self.pos];
                let kind = self.classify_word(word);
                self.after_word(kind)
            }
            _ => self.operator(start, ch)?,
        };

        let token = Token {
            kind,
            range: TextRange::new(start, self.pos),
        };
        if !kind.is_trivia() {
            self.last_significant = Some(token);
        }
        Ok(Some(token))
    }

    fn classify_word(&mut self, word: &str) -> TokenKind {
        match KEYWORD_TABLE.get(word).copied() {
            // `as?` is a single operator
            Some(TokenKind::As)
                if self.peek_char() == Some('?') && self.peek_char_at(1) != Some('.') =>
            {
                self.pos += 1;
                TokenKind::AsSafe
            }
            Some(kind) => kind,
            None => TokenKind::Identifier,
        }
    }

    /// `name@` turns an identifier into a label definition
    fn after_word(&mut self, kind: TokenKind) -> TokenKind {
        if kind == TokenKind::Identifier && self.peek_char() == Some('@') {
            self.pos += 1;
            return TokenKind::LabelDefinition;
        }
        kind
    }

    fn at_sign(&mut self, start: usize) -> ParseResult<TokenKind> {
        let attached_to_jump = self
            .last_significant
            .is_some_and(|t| t.range.end == start && t.kind.takes_label_reference());

        self.pos += 1;
        match self.peek_char() {
            Some(c) if is_identifier_start(c) => {
                self.eat_while(is_identifier_continue);
            }
            Some('`') => {
                self.pos += 1;
                self.eat_while(|c| c != '`' && c != '\n');
                if self.peek_char() != Some('`') {
                    return Err(ParseError::UnexpectedCharacter {
                        character: '@',
                        position: start,
                    });
                }
                self.pos += 1;
            }
            _ => {
                return Err(ParseError::UnexpectedCharacter {
                    character: '@',
                    position: start,
                });
            }
        }

        Ok(if attached_to_jump {
            TokenKind::LabelReference
        } else {
            TokenKind::AnnotationName
        })
    }

    fn number(&mut self, start: usize) -> ParseResult<TokenKind> {
        let invalid = |this: &Self| ParseError::InvalidLiteral {
            literal_type: "number".to_string(),
            value: this.input[start..this.pos].to_string(),
            position: start,
        };

        if self.peek_char() == Some('0')
            && matches!(self.peek_char_at(1), Some('x' | 'X' | 'b' | 'B'))
        {
            self.pos += 2;
            let digits_start = self.pos;
            self.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
            if self.pos == digits_start {
                return Err(invalid(self));
            }
            self.integer_suffix();
            return Ok(TokenKind::IntegerLiteral);
        }

        self.eat_while(|c| c.is_ascii_digit() || c == '_');
        let mut is_float = false;

        // `1..2` is a range, not a float
        if self.peek_char() == Some('.') && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit() || c == '_');
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            self.eat_while(|c| c.is_ascii_digit());
            if self.pos == exp_start {
                return Err(invalid(self));
            }
        }

        if matches!(self.peek_char(), Some('f' | 'F')) {
            self.pos += 1;
            is_float = true;
        } else if !is_float {
            self.integer_suffix();
        }

        if self.peek_char().is_some_and(is_identifier_continue) {
            self.eat_while(is_identifier_continue);
            return Err(invalid(self));
        }

        Ok(if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntegerLiteral
        })
    }

    fn integer_suffix(&mut self) {
        if matches!(self.peek_char(), Some('u' | 'U')) {
            self.pos += 1;
        }
        if self.peek_char() == Some('L') {
            self.pos += 1;
        }
    }

    fn block_comment(&mut self, start: usize) -> ParseResult<()> {
        self.pos += 2;
        let mut depth = 1usize;
        while depth > 0 {
            match (self.peek_char(), self.peek_char_at(1)) {
                (Some('*'), Some('/')) => {
                    depth -= 1;
                    self.pos += 2;
                }
                (Some('/'), Some('*')) => {
                    depth += 1;
                    self.pos += 2;
                }
                (Some(c), _) => self.pos += c.len_utf8(),
                (None, _) => return Err(ParseError::UnterminatedComment { position: start }),
            }
        }
        Ok(())
    }

    fn string_literal(&mut self, start: usize) -> ParseResult<()> {
        if self.input[self.pos..].starts_with("\"\"\"") {
            self.pos += 3;
            loop {
                if self.input[self.pos..].starts_with("\"\"\"") {
                    self.pos += 3;
                    // Extra quotes belong to the content
                    self.eat_while(|c| c == '"');
                    return Ok(());
                }
                match self.peek_char() {
                    Some('$') if self.peek_char_at(1) == Some('{') => self.template_entry(start)?,
                    Some(c) => self.pos += c.len_utf8(),
                    None => return Err(ParseError::UnterminatedString { position: start }),
                }
            }
        }

        self.pos += 1;
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek_char() {
                        Some(c) if c != '\n' => self.pos += c.len_utf8(),
                        _ => return Err(ParseError::UnterminatedString { position: start }),
                    }
                }
                Some('$') if self.peek_char_at(1) == Some('{') => self.template_entry(start)?,
                Some('\n') | None => return Err(ParseError::UnterminatedString { position: start }),
                Some(c) => self.pos += c.len_utf8(),
            }
        }
    }

    /// Skip `${ ... }`, strings nested inside the entry included
    fn template_entry(&mut self, string_start: usize) -> ParseResult<()> {
        self.pos += 2;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek_char() {
                Some('{') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some('}') => {
                    depth -= 1;
                    self.pos += 1;
                }
                Some('"') => {
                    let nested = self.pos;
                    self.string_literal(nested)?;
                }
                Some(c) => self.pos += c.len_utf8(),
                None => {
                    return Err(ParseError::UnterminatedString {
                        position: string_start,
                    });
                }
            }
        }
        Ok(())
    }

    fn char_literal(&mut self, start: usize) -> ParseResult<()> {
        self.pos += 1;
        match self.peek_char() {
            Some('\\') => {
                self.pos += 1;
                if self.peek_char() == Some('u') {
                    self.pos += 1;
                    for _ in 0..4 {
                        match self.peek_char() {
                            Some(c) if c.is_ascii_hexdigit() => self.pos += 1,
                            _ => return Err(self.invalid_char(start)),
                        }
                    }
                } else {
                    match self.peek_char() {
                        Some(c) if c != '\n' => self.pos += c.len_utf8(),
                        _ => return Err(self.invalid_char(start)),
                    }
                }
            }
            Some(c) if c != '\'' && c != '\n' => self.pos += c.len_utf8(),
            _ => return Err(self.invalid_char(start)),
        }
        if self.peek_char() != Some('\'') {
            return Err(self.invalid_char(start));
        }
        self.pos += 1;
        Ok(())
    }

    fn invalid_char(&self, start: usize) -> ParseError {
        ParseError::InvalidLiteral {
            literal_type: "character".to_string(),
            value: self.input[start..self.pos].to_string(),
            position: start,
        }
    }

    fn operator(&mut self, start: usize, ch: char) -> ParseResult<TokenKind> {
        let rest = &self.input[self.pos..];

        // Longest match first
        const OPERATORS: &[(&str, TokenKind)] = &[
            ("===", TokenKind::EqEqEq),
            ("!==", TokenKind::NotEqEq),
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::NotEq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
            ("&&", TokenKind::AndAnd),
            ("||", TokenKind::OrOr),
            ("!!", TokenKind::BangBang),
            ("?:", TokenKind::Elvis),
            ("?.", TokenKind::SafeAccess),
            ("..", TokenKind::RangeTo),
            ("->", TokenKind::Arrow),
            ("++", TokenKind::PlusPlus),
            ("--", TokenKind::MinusMinus),
            ("+=", TokenKind::PlusAssign),
            ("-=", TokenKind::MinusAssign),
            ("*=", TokenKind::StarAssign),
            ("/=", TokenKind::SlashAssign),
            ("%=", TokenKind::PercentAssign),
        ];

        if ch == '!' {
            for (word, kind) in [("!is", TokenKind::NotIs), ("!in", TokenKind::NotIn)] {
                if rest.starts_with(word)
                    && !rest[word.len()..]
                        .chars()
                        .next()
                        .is_some_and(is_identifier_continue)
                {
                    self.pos += word.len();
                    return Ok(kind);
                }
            }
        }

        for (spelling, kind) in OPERATORS {
            if rest.starts_with(spelling) {
                self.pos += spelling.len();
                return Ok(*kind);
            }
        }

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Assign,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '!' => TokenKind::Bang,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            _ => {
                return Err(ParseError::UnexpectedCharacter {
                    character: ch,
                    position: start,
                });
            }
        };
        self.pos += ch.len_utf8();
        Ok(kind)
    }

    #[inline]
    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    #[inline]
    fn peek_char_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    #[inline]
    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !predicate(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }
}

#[inline]
fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_xid_start()
}

#[inline]
fn is_identifier_continue(c: char) -> bool {
    c == '_' || c.is_xid_continue()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Tokenizer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn test_lossless() {
        let input = "val x = list.map { it * 2 } // double\n/* done */ x";
        let tokens = Tokenizer::new(input).tokenize().unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.text(input)).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_labels_and_annotations() {
        assert_eq!(
            kinds("outer@{ return@outer 1 }"),
            vec![
                TokenKind::LabelDefinition,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::LabelReference,
                TokenKind::IntegerLiteral,
                TokenKind::RBrace,
            ]
        );
        assert_eq!(
            kinds("@Suppress(\"X\") value"),
            vec![
                TokenKind::AnnotationName,
                TokenKind::LParen,
                TokenKind::StringLiteral,
                TokenKind::RParen,
                TokenKind::Identifier,
            ]
        );
        // A space separates the keyword from an annotated value
        assert_eq!(
            kinds("return @Ann x"),
            vec![TokenKind::Return, TokenKind::AnnotationName, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_negated_keywords() {
        assert_eq!(
            kinds("a !is B && c !in d && !isOk"),
            vec![
                TokenKind::Identifier,
                TokenKind::NotIs,
                TokenKind::Identifier,
                TokenKind::AndAnd,
                TokenKind::Identifier,
                TokenKind::NotIn,
                TokenKind::Identifier,
                TokenKind::AndAnd,
                TokenKind::Bang,
                TokenKind::Identifier,
            ]
        );
        assert_eq!(
            kinds("x as? Int"),
            vec![TokenKind::Identifier, TokenKind::AsSafe, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1..10 2.5 3L 0xFF 1e3 2f"),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::RangeTo,
                TokenKind::IntegerLiteral,
                TokenKind::FloatLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
            ]
        );
        assert!(matches!(
            Tokenizer::new("12abc").tokenize(),
            Err(ParseError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            kinds(r#""a ${b.map { "c" }} d" 'x' '\n'"#),
            vec![
                TokenKind::StringLiteral,
                TokenKind::CharLiteral,
                TokenKind::CharLiteral
            ]
        );
        assert_eq!(
            Tokenizer::new("\"open").tokenize(),
            Err(ParseError::UnterminatedString { position: 0 })
        );
        assert_eq!(
            Tokenizer::new("/* /* */").tokenize(),
            Err(ParseError::UnterminatedComment { position: 0 })
        );
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(
            Tokenizer::new("a # b").tokenize(),
            Err(ParseError::UnexpectedCharacter {
                character: '#',
                position: 2
            })
        );
    }
}
