//! Lexer implementation using logos

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::{CompileError, Result};
use logos::Logos;

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                return Err(CompileError::lexer(
                    format!("unexpected character: {:?}", lexer.slice()),
                    span,
                ));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("  // just a comment\n /* block */ ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_keywords() {
        assert_eq!(
            kinds("class extends new var raise try catch"),
            vec![
                Token::Class,
                Token::Extends,
                Token::New,
                Token::Var,
                Token::Raise,
                Token::Try,
                Token::Catch
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(kinds("42"), vec![Token::IntLit(42)]);
        assert_eq!(kinds("0x1F"), vec![Token::IntLit(31)]);
        assert_eq!(kinds("0o17"), vec![Token::IntLit(15)]);
        assert!(matches!(kinds("2.5")[0], Token::FloatLit(n) if (n - 2.5).abs() < f64::EPSILON));
        assert!(matches!(kinds("1e3")[0], Token::FloatLit(n) if (n - 1000.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_tokenize_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n""#),
            vec![Token::StringLit("a\"b\n".to_string())]
        );
    }

    #[test]
    fn test_tokenize_word_operators() {
        assert_eq!(
            kinds("a and b or c"),
            vec![
                Token::Ident("a".into()),
                Token::AmpAmp,
                Token::Ident("b".into()),
                Token::PipePipe,
                Token::Ident("c".into())
            ]
        );
    }

    #[test]
    fn test_tokenize_compound_operators() {
        assert_eq!(
            kinds("+= ++ => <= <<"),
            vec![Token::PlusEq, Token::PlusPlus, Token::FatArrow, Token::LtEq, Token::LtLt]
        );
    }

    #[test]
    fn test_tokenize_spans() {
        let tokens = tokenize("var x").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 3));
        assert_eq!(tokens[1].1, Span::new(4, 5));
    }

    #[test]
    fn test_tokenize_unexpected_character() {
        let err = tokenize("var x = #;").unwrap_err();
        assert!(err.message().contains("unexpected character"));
        assert_eq!(err.span(), Some(Span::new(8, 9)));
    }
}
