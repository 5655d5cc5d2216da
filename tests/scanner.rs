use loxide::scanner::{scan, Scanner};
use loxide::token::{Token, TokenType};

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let (tokens, errors) = scan(source.as_bytes());

    assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
    assert_eq!(
        tokens.len(),
        expected.len(),
        "token count mismatch for {:?}: {:?}",
        source,
        tokens
    );

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn single_character_symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn two_character_operators_use_lookahead() {
    assert_token_sequence(
        "! != = == < <= > >=",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn arithmetic_expression_tokens_in_order() {
    let (tokens, errors) = scan(b"1 + 2 * 3");

    assert!(errors.is_empty());

    let kinds: Vec<&str> = tokens.iter().map(|t| t.token_type.name()).collect();
    assert_eq!(kinds, ["NUMBER", "PLUS", "NUMBER", "STAR", "NUMBER", "EOF"]);

    let numbers: Vec<f64> = tokens
        .iter()
        .filter_map(|t| match t.token_type {
            TokenType::NUMBER(n) => Some(n),
            _ => None,
        })
        .collect();
    assert_eq!(numbers, [1.0, 2.0, 3.0]);

    // single line: every token reports line 1
    assert!(tokens.iter().all(|t| t.line == 1));
}

#[test]
fn comments_and_whitespace_emit_no_tokens() {
    assert_token_sequence(
        "// full line comment\n\t 42 // trailing\n",
        &[(TokenType::NUMBER(42.0), "42"), (TokenType::EOF, "")],
    );
}

#[test]
fn slash_without_second_slash_is_division() {
    assert_token_sequence(
        "8 / 2",
        &[
            (TokenType::NUMBER(8.0), "8"),
            (TokenType::SLASH, "/"),
            (TokenType::NUMBER(2.0), "2"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn string_literal_decodes_contents_without_quotes() {
    let (tokens, errors) = scan(br#""hello world""#);

    assert!(errors.is_empty());
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].lexeme, "\"hello world\"");

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hello world"),
        other => panic!("expected STRING, got {:?}", other),
    }
}

#[test]
fn multi_line_string_advances_line_counter() {
    let (tokens, errors) = scan(b"\"a\nb\"\nfoo");

    assert!(errors.is_empty());
    // the identifier after the two-line string sits on line 3
    assert_eq!(tokens[1].lexeme, "foo");
    assert_eq!(tokens[1].line, 3);
}

#[test]
fn unterminated_string_reports_error_and_still_yields_eof() {
    let (tokens, errors) = scan(b"1 \"never closed");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("Unterminated string."));

    // the number before the broken string and the EOF both survive
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].token_type, TokenType::NUMBER(1.0));
    assert_eq!(tokens[1].token_type, TokenType::EOF);
}

#[test]
fn trailing_dot_is_not_part_of_the_number() {
    assert_token_sequence(
        "123. 45.67",
        &[
            (TokenType::NUMBER(123.0), "123"),
            (TokenType::DOT, "."),
            (TokenType::NUMBER(45.67), "45.67"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn keywords_versus_identifiers() {
    assert_token_sequence(
        "var fortune = nil; andover or",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "fortune"),
            (TokenType::EQUAL, "="),
            (TokenType::NIL, "nil"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::IDENTIFIER, "andover"),
            (TokenType::OR, "or"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn reserved_words_always_lex_as_keywords() {
    assert_token_sequence(
        "class this super",
        &[
            (TokenType::CLASS, "class"),
            (TokenType::THIS, "this"),
            (TokenType::SUPER, "super"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn unexpected_characters_interleave_with_valid_tokens() {
    let results: Vec<_> = Scanner::new(b",.$(#").collect();

    // COMMA DOT err('$') LEFT_PAREN err('#') EOF
    assert_eq!(results.len(), 6);

    let ok_lexemes: Vec<&str> = results
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|t: &Token| t.lexeme))
        .collect();
    assert_eq!(ok_lexemes, [",", ".", "(", ""]);

    let errors: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err().map(|e| e.to_string()))
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("Unexpected character: $"));
    assert!(errors[1].contains("Unexpected character: #"));
}

#[test]
fn line_numbers_track_newlines() {
    let (tokens, errors) = scan(b"var a;\nvar b;\n\nvar c;");

    assert!(errors.is_empty());

    let var_lines: Vec<usize> = tokens
        .iter()
        .filter(|t| t.token_type == TokenType::VAR)
        .map(|t| t.line)
        .collect();
    assert_eq!(var_lines, [1, 2, 4]);
}

#[test]
fn scanner_is_fused_after_eof() {
    let mut scanner = Scanner::new(b"1");

    assert!(scanner.next().is_some()); // NUMBER
    assert!(scanner.next().is_some()); // EOF
    assert!(scanner.next().is_none());
    assert!(scanner.next().is_none());
}

#[test]
fn number_token_display_keeps_fractional_form() {
    let (tokens, _) = scan(b"3 3.14");

    assert_eq!(tokens[0].to_string(), "NUMBER 3 3.0");
    assert_eq!(tokens[1].to_string(), "NUMBER 3.14 3.14");
}
