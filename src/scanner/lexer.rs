use winnow::combinator::{alt, cut_err, opt};
use winnow::error::ErrMode;
use winnow::prelude::*;
use winnow::stream::{LocatingSlice, Location};
use winnow::token::{any, take_till, take_while};

use crate::error::CompileError;
use crate::scanner::token::{Span, Token, TokenKind, keyword_kind};

type Input<'a> = LocatingSlice<&'a str>;

fn whitespace<'a>(input: &mut Input<'a>) -> ModalResult<()> {
    take_while(0.., |c: char| {
        c == ' ' || c == '\t' || c == '\r' || c == '\n'
    })
    .void()
    .parse_next(input)
}

/// Strings run to the next '"' with no escape processing, so a backslash
/// is just a character and a string may span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> ModalResult<Token> {
    let start = input.current_token_start();
    '"'.parse_next(input)?;
    let body: &str = take_till(0.., '"').parse_next(input)?;
    let lexeme = body.to_string();
    cut_err('"').parse_next(input)?;
    let end = input.current_token_start();
    Ok(Token::new(TokenKind::Str, lexeme, Span::new(start, end - start)))
}

/// Digits with an optional fraction; the fraction's digits may be absent,
/// so "3." is a single number token.
fn number_literal<'a>(input: &mut Input<'a>) -> ModalResult<Token> {
    let start = input.current_token_start();
    let whole: &str = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let mut lexeme = whole.to_string();

    if opt('.').parse_next(input)?.is_some() {
        let frac: &str = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
        lexeme.push('.');
        lexeme.push_str(frac);
    }

    let end = input.current_token_start();
    Ok(Token::new(
        TokenKind::Number,
        lexeme,
        Span::new(start, end - start),
    ))
}

fn identifier_or_keyword<'a>(input: &mut Input<'a>) -> ModalResult<Token> {
    let start = input.current_token_start();
    let first: char = any
        .verify(|c: &char| c.is_ascii_alphabetic() || *c == '_')
        .parse_next(input)?;
    let rest: &str =
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)?;
    let end = input.current_token_start();
    let mut lexeme = String::with_capacity(1 + rest.len());
    lexeme.push(first);
    lexeme.push_str(rest);
    let kind = keyword_kind(&lexeme).unwrap_or(TokenKind::Identifier);
    Ok(Token::new(kind, lexeme, Span::new(start, end - start)))
}

fn two_char_token<'a>(input: &mut Input<'a>) -> ModalResult<Token> {
    let start = input.current_token_start();
    let (kind, lexeme) = alt((
        "!=".value((TokenKind::BangEqual, "!=")),
        "==".value((TokenKind::EqualEqual, "==")),
        ">=".value((TokenKind::GreaterEqual, ">=")),
        "<=".value((TokenKind::LessEqual, "<=")),
    ))
    .parse_next(input)?;
    Ok(Token::new(kind, lexeme, Span::new(start, 2)))
}

fn single_char_token<'a>(input: &mut Input<'a>) -> ModalResult<Token> {
    let start = input.current_token_start();
    let c = any
        .verify(|c: &char| "(){};=<>+-*/".contains(*c))
        .parse_next(input)?;
    let kind = match c {
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        ';' => TokenKind::Semicolon,
        '=' => TokenKind::Assign,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        _ => unreachable!("verify guarantees valid char"),
    };
    Ok(Token::new(kind, c.to_string(), Span::new(start, 1)))
}

fn scan_token<'a>(input: &mut Input<'a>) -> ModalResult<Token> {
    alt((
        string_literal,
        number_literal,
        identifier_or_keyword,
        two_char_token,
        single_char_token,
    ))
    .parse_next(input)
}

/// Scan all tokens from source, stopping at the first character that
/// starts no token.
pub fn scan_all(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut input = LocatingSlice::new(source);
    let mut tokens = Vec::new();

    loop {
        if whitespace(&mut input).is_err() {
            break;
        }
        if input.is_empty() {
            break;
        }
        let start = input.current_token_start();
        match scan_token(&mut input) {
            Ok(token) => tokens.push(token),
            Err(ErrMode::Cut(_)) => {
                return Err(CompileError::lex(
                    "unterminated string",
                    start,
                    source.len() - start,
                ));
            }
            Err(_) => {
                let c = source[start..].chars().next().unwrap_or('?');
                return Err(CompileError::lex(
                    format!("unexpected character '{c}'"),
                    start,
                    c.len_utf8(),
                ));
            }
        }
    }

    let eof_offset = source.len();
    tokens.push(Token::new(TokenKind::Eof, "", Span::new(eof_offset, 0)));
    Ok(tokens)
}
