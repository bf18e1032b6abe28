// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

fn tokens(input: &str) -> std::vec::Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut out = std::vec::Vec::new();
    while let Some(tok) = lexer.next_token().unwrap() {
        out.push(tok);
    }
    out
}

#[test]
fn splits_arithmetic_into_literal_and_word_tokens() {
    assert_eq!(
        tokens("2 3 +"),
        std::vec![
            Token::Int(2),
            Token::Int(3),
            Token::Word(std::string::String::from("+")),
        ]
    );
}

#[test]
fn parens_are_their_own_tokens() {
    assert_eq!(
        tokens("( 10 20 30 )"),
        std::vec![
            Token::LParen,
            Token::Int(10),
            Token::Int(20),
            Token::Int(30),
            Token::RParen,
        ]
    );
}

#[test]
fn negative_integers_lex_as_one_token() {
    assert_eq!(tokens("-7"), std::vec![Token::Int(-7)]);
}

#[test]
fn colon_and_semicolon_are_recognized() {
    assert_eq!(
        tokens(": f ;"),
        std::vec![
            Token::Colon,
            Token::Word(std::string::String::from("f")),
            Token::Semicolon,
        ]
    );
}

#[test]
fn a_bare_minus_is_a_word_not_a_number() {
    assert_eq!(tokens("-"), std::vec![Token::Word(std::string::String::from("-"))]);
}
