//! Adversarial inputs: malformed, truncated or oversized sources. The checker
//! must finish on every one of them without panicking.

#[cfg(test)]
mod tests {
    use crate::check_source;
    use crate::config::Config;
    use crate::error::ErrorStore;
    use crate::lexer::{Lexer, LexerOptions};
    use crate::report::Report;

    fn check(source: &str) -> Report {
        check_source(source, &Config::default())
    }

    fn count(report: &Report, message: &str) -> usize {
        report.errors.iter().filter(|d| d.message == message).count()
    }

    fn scope_errors(report: &Report) -> usize {
        count(report, "Scope not closed")
    }

    fn depth_errors(report: &Report) -> usize {
        count(report, "Chunk has too many syntax levels")
    }

    const SAMPLE: &str = "local t = { [1] = 'a', b = \"c\" }\n\
        function t.m:n(x, ...)\n\
          for i = 1, #x do\n\
            if x[i] == nil then break elseif i > 2 then return i else t(i) end\n\
          end\n\
          repeat local y = [==[long]==] until true\n\
          return function(a) return a .. x end\n\
        end\n";

    // -----------------------------------------------------------------------
    // Truncation
    // -----------------------------------------------------------------------

    #[test]
    fn test_every_prefix_terminates() {
        let chars: Vec<char> = SAMPLE.chars().collect();
        for end in 0..=chars.len() {
            let prefix: String = chars[..end].iter().collect();
            let report = check(&prefix);
            assert!(scope_errors(&report) <= 1, "prefix {:?}", prefix);
        }
    }

    #[test]
    fn test_every_suffix_terminates() {
        let chars: Vec<char> = SAMPLE.chars().collect();
        for start in 0..chars.len() {
            let suffix: String = chars[start..].iter().collect();
            let _ = check(&suffix);
        }
    }

    #[test]
    fn test_truncated_constructs() {
        let sources = [
            "function", "function (", "function f(", "function f(a,", "function f(a, ...",
            "local", "local function", "local x =", "local a, ...", "if", "if then else elseif",
            "for", "for i =", "for i = 1,", "for a, b in", "repeat", "repeat until", "while",
            "while x", "{", "x = {", "x = {[", "x = {[1", "x = {[1]", "a.b.c.d.", "a:b", "a:",
            "f(", "f(a,", "x = function", "return return return", "break break", "elseif",
            "until", "then", "in", ")", "]", "}", ";", ",", "=", "...", "(", "x = -", "x = not",
        ];
        for source in sources {
            let _ = check(source);
        }
    }

    // -----------------------------------------------------------------------
    // Unbalanced nesting
    // -----------------------------------------------------------------------

    #[test]
    fn test_unclosed_blocks_report_once() {
        for source in ["do", "do do do", "while 1 do if 2 then", "function f() function g()"] {
            let report = check(source);
            assert_eq!(scope_errors(&report), 1, "{:?}", source);
        }
    }

    #[test]
    fn test_surplus_block_terminators() {
        let report = check("end end end until else elseif");
        assert_eq!(report.errors.len(), 6);
    }

    #[test]
    fn test_deeply_nested_blocks() {
        let source = format!("{}{}", "do ".repeat(150), "end ".repeat(150));
        assert!(check(&source).errors.is_empty());

        let source = "do ".repeat(150);
        assert_eq!(scope_errors(&check(&source)), 1);
    }

    #[test]
    fn test_deeply_nested_parens() {
        let source = format!("x = {}1{}", "(".repeat(150), ")".repeat(150));
        assert!(check(&source).errors.is_empty());

        let source = format!("x = {}", "(".repeat(150));
        assert!(!check(&source).errors.is_empty());
    }

    #[test]
    fn test_deeply_nested_tables() {
        let source = format!("x = {}{}", "{".repeat(150), "}".repeat(150));
        assert!(check(&source).errors.is_empty());
    }

    // -----------------------------------------------------------------------
    // Nesting past the limit
    // -----------------------------------------------------------------------

    #[test]
    fn test_runaway_parens_stop_at_limit() {
        let levels = 100_000;
        let source = format!("x = {}1{}", "(".repeat(levels), ")".repeat(levels));
        let report = check(&source);
        let messages: Vec<String> = report.errors.iter().map(|d| d.to_string()).collect();
        assert_eq!(messages, vec!["1: Chunk has too many syntax levels."]);
    }

    #[test]
    fn test_runaway_blocks_stop_at_limit() {
        let levels = 50_000;
        let source = format!("{}{}", "do ".repeat(levels), "end ".repeat(levels));
        let report = check(&source);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(depth_errors(&report), 1);

        let report = check(&"do ".repeat(levels));
        assert_eq!(depth_errors(&report), 1);
        assert_eq!(scope_errors(&report), 0);
    }

    #[test]
    fn test_runaway_tables_stop_at_limit() {
        let levels = 100_000;
        let source = format!("x = {}{}", "{".repeat(levels), "}".repeat(levels));
        let report = check(&source);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(depth_errors(&report), 1);
    }

    #[test]
    fn test_runaway_calls_and_indexes_stop_at_limit() {
        for source in [
            format!("x = {}", "f(".repeat(100_000)),
            format!("x = {}1", "a[".repeat(100_000)),
            format!("x = {}", "function() return ".repeat(100_000)),
        ] {
            let report = check(&source);
            assert_eq!(depth_errors(&report), 1);
        }
    }

    #[test]
    fn test_limit_ends_the_parse() {
        let source = format!("x = {}1\ny z", "(".repeat(1_000));
        let report = check(&source);
        assert_eq!(report.errors.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Long inputs
    // -----------------------------------------------------------------------

    #[test]
    fn test_long_operator_chains() {
        let source = format!("x = {}1", "- ".repeat(10_000));
        assert!(check(&source).errors.is_empty());

        let source = format!("x = 1{}", " + 1".repeat(10_000));
        assert!(check(&source).errors.is_empty());
    }

    #[test]
    fn test_many_statements() {
        let source = "x = 1\n".repeat(10_000);
        let report = check(&source);
        assert!(report.errors.is_empty());
        assert_eq!(report.functions.len(), 0);
    }

    #[test]
    fn test_many_stray_names() {
        let source = "x ".repeat(5_000);
        let report = check(&source);
        assert_eq!(report.errors.len(), 5_000);
    }

    #[test]
    fn test_very_long_name() {
        let source = format!("{} = 1", "a".repeat(50_000));
        assert!(check(&source).errors.is_empty());
    }

    #[test]
    fn test_very_long_unterminated_string() {
        let source = format!("x = \"{}", "y".repeat(50_000));
        let report = check(&source);
        assert_eq!(report.errors.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Odd characters
    // -----------------------------------------------------------------------

    #[test]
    fn test_control_characters() {
        for byte in 0u8..32 {
            let source = format!("x = 1{}y = 2", byte as char);
            let _ = check(&source);
        }
    }

    #[test]
    fn test_only_symbols() {
        let _ = check("+-*/%^#(){}[];:,.....===~=<=>=<>");
        let _ = check("[[[[[[]]]]]]");
        let _ = check("[=[=[=[");
    }

    #[test]
    fn test_unicode_noise() {
        let report = check("ƒ = λ(x) → x² ✓");
        assert!(!report.errors.is_empty());
    }

    #[test]
    fn test_all_printable_ascii() {
        let source: String = (32u8..127).map(|b| b as char).collect();
        let _ = check(&source);
        let reversed: String = source.chars().rev().collect();
        let _ = check(&reversed);
    }

    #[test]
    fn test_comment_edge_cases() {
        let options = LexerOptions { lua_comments: true };
        for source in ["--", "--[", "--[=", "--[[", "--[==[ x ]=]", "x --\n--"] {
            let mut errors = ErrorStore::new();
            let _ = Lexer::new(source, &mut errors)
                .with_options(options)
                .tokenize();
        }
    }

    #[test]
    fn test_number_edge_cases() {
        let sources = [
            "0x", "1e", "1e+", "1..2", "1...2", "9.9.9.9", "1e1e1e1", "0x0x0x", "1-", "1e-",
        ];
        for source in sources {
            let _ = check(&format!("x = {}", source));
        }
    }
}
