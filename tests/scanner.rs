mod scanner_tests {
    use rslox::scanner::*;
    use rslox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn symbols() {
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
    fn two_char_operators() {
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
    fn keywords_and_identifiers() {
        assert_token_sequence(
            "class Foo < Bar { init() { super.init(); this.x = nil; } }",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Foo"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "Bar"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::IDENTIFIER, "init"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::SUPER, "super"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "init"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::THIS, "this"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::NIL, "nil"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn number_literals_carry_values() {
        let (tokens, errors) = Scanner::scan_all("12 3.5");
        assert!(errors.is_empty());

        assert_eq!(tokens[0].token_type, TokenType::NUMBER(0.0));
        match tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 12.0),
            _ => unreachable!(),
        }
        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 3.5),
            _ => unreachable!(),
        }
    }

    #[test]
    fn string_literal_strips_quotes() {
        let (tokens, errors) = Scanner::scan_all("\"hello\"");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].token_type, TokenType::STRING(String::new()));
        assert_eq!(tokens[0].lexeme, "\"hello\"");
        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        assert_token_sequence(
            "var a; // the rest of this line vanishes\nprint a;",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "a"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::PRINT, "print"),
                (TokenType::IDENTIFIER, "a"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let (tokens, errors) = Scanner::scan_all("var a;\n  a = 1;");
        assert!(errors.is_empty());

        // `var` at 1:1, `a` at 1:5; second-line `a` at 2:3.
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].col), (1, 5));
        assert_eq!((tokens[3].line, tokens[3].col), (2, 3));
    }

    #[test]
    fn unexpected_chars_accumulate_without_stopping_the_scan() {
        let (tokens, errors) = Scanner::scan_all(",.$(#");

        // Both bad bytes reported, all good tokens still produced.
        assert_eq!(errors.len(), 2);
        for e in &errors {
            assert!(
                e.to_string().contains("Unexpected character"),
                "unexpected message: {}",
                e
            );
        }

        let types: Vec<_> = tokens.iter().map(|t| t.token_type.clone()).collect();
        assert_eq!(
            types,
            vec![
                TokenType::COMMA,
                TokenType::DOT,
                TokenType::LEFT_PAREN,
                TokenType::EOF
            ]
        );
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let (_, errors) = Scanner::scan_all("\"oops");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string."));
    }

    #[test]
    fn multiline_strings_are_legal_and_count_lines() {
        let (tokens, errors) = Scanner::scan_all("\"a\nb\" var");
        assert!(errors.is_empty());
        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "a\nb"),
            _ => unreachable!(),
        }
        // `var` lands on line 2.
        assert_eq!(tokens[1].line, 2);
    }
}
