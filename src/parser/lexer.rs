//! Logos-based lexer for the host language
//!
//! Newlines are significant: a newline (or end of input) following an
//! identifier, literal, `break`, `continue`, `fallthrough`, `return`, `++`,
//! `--`, `)`, `]` or `}` becomes a statement terminator.

use logos::Logos;

/// A token with its kind, text, and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: u32,
}

impl Token<'_> {
    pub fn end(&self) -> u32 {
        self.offset + self.text.len() as u32
    }
}

/// A comment, kept aside for import docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment<'a> {
    pub text: &'a str,
    pub offset: u32,
}

/// Lexer output: significant tokens (terminators inserted) plus comments.
#[derive(Debug, Default)]
pub struct Tokens<'a> {
    pub tokens: Vec<Token<'a>>,
    pub comments: Vec<Comment<'a>>,
}

/// Byte range of input no token matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
    pub offset: u32,
}

/// Tokenize a whole file.
pub fn tokenize(input: &str) -> Result<Tokens<'_>, LexError> {
    let mut out = Tokens::default();
    let mut lexer = TokenKind::lexer(input);
    let mut terminate = false;

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        let offset = lexer.span().start as u32;
        let kind = result.map_err(|()| LexError { offset })?;

        match kind {
            TokenKind::Newline => {
                if terminate {
                    out.tokens.push(Token {
                        kind: TokenKind::Semicolon,
                        text: "\n",
                        offset,
                    });
                    terminate = false;
                }
                continue;
            }
            TokenKind::LineComment => {
                out.comments.push(Comment { text, offset });
                continue;
            }
            TokenKind::BlockComment => {
                out.comments.push(Comment { text, offset });
                if text.contains('\n') && terminate {
                    out.tokens.push(Token {
                        kind: TokenKind::Semicolon,
                        text: "\n",
                        offset,
                    });
                    terminate = false;
                }
                continue;
            }
            _ => {}
        }

        terminate = kind.ends_statement();
        out.tokens.push(Token { kind, text, offset });
    }

    if terminate {
        out.tokens.push(Token {
            kind: TokenKind::Semicolon,
            text: "",
            offset: input.len() as u32,
        });
    }
    Ok(out)
}

/// Extend a `/*` match through the closing `*/`; unterminated comments
/// are errors.
fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(idx) => {
            lex.bump(idx + 2);
            true
        }
        None => false,
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r]+")]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[token("\n")]
    Newline,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("fallthrough")]
    Fallthrough,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("return")]
    Return,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("type")]
    Type,
    #[token("var")]
    Var,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Ident,

    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"[0-9][0-9_]*")]
    Int,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+")]
    Float,

    #[regex(r"'([^'\\\n]|\\[^\n])+'")]
    Char,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    #[regex(r"`[^`]*`")]
    String,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("<<=")]
    ShlAssign,
    #[token(">>=")]
    ShrAssign,
    #[token("&^=")]
    AndNotAssign,
    #[token("+=")]
    AddAssign,
    #[token("-=")]
    SubAssign,
    #[token("*=")]
    MulAssign,
    #[token("/=")]
    DivAssign,
    #[token("%=")]
    RemAssign,
    #[token("&=")]
    AndAssign,
    #[token("|=")]
    OrAssign,
    #[token("^=")]
    XorAssign,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&^")]
    AndNot,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token(":=")]
    ColonEq,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
}

impl TokenKind {
    fn ends_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Char
                | TokenKind::String
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            kinds("package foo"),
            vec![TokenKind::Package, TokenKind::Ident, TokenKind::Semicolon]
        );
        assert_eq!(kinds("packages"), vec![TokenKind::Ident, TokenKind::Semicolon]);
    }

    #[test]
    fn test_semicolon_insertion() {
        assert_eq!(
            kinds("x++\ny := 1\nfunc (\n"),
            vec![
                TokenKind::Ident,
                TokenKind::PlusPlus,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::ColonEq,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Func,
                TokenKind::LParen,
            ]
        );
    }

    #[test]
    fn test_comments_are_collected() {
        let tokens = tokenize("// hello\n/* multi\nline */ x").unwrap();
        assert_eq!(tokens.comments.len(), 2);
        assert_eq!(tokens.comments[0].text, "// hello");
        assert_eq!(tokens.tokens[0].kind, TokenKind::Ident);
    }

    #[test]
    fn test_block_comments() {
        let tokens = tokenize("/* a * b ** */ x /**/ y /* one\ntwo */ z").unwrap();
        let texts: Vec<&str> = tokens.comments.iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["/* a * b ** */", "/**/", "/* one\ntwo */"]);
        assert_eq!(
            tokens.tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(tokenize("x /* open").unwrap_err().offset, 2);
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds(r#"1 0x1F 1.5 'a' "s\"q" `raw`"#),
            vec![
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Char,
                TokenKind::String,
                TokenKind::String,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_unknown_character() {
        assert_eq!(tokenize("x @ y").unwrap_err().offset, 2);
    }
}
