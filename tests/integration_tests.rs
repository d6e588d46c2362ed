// Parser robustness tests for Jiki
//
// Table-driven: each suite is a list of sources that must parse, or must be
// rejected with a specific syntax error type, without ever panicking.

use jiki::ast::NodeType;
use jiki::error::{SyntaxError, SyntaxErrorType};
use jiki::features::LanguageFeatures;
use jiki::parser::parse;

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error: Option<SyntaxErrorType>,
    pub features: LanguageFeatures,
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite
    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ✓ {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  ✗ {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  💥 {}: CRASHED - {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());

        if self.crashed > 0 {
            println!("\n⚠️  WARNING: {} tests caused crashes!", self.crashed);
        }

        if self.failed > 0 {
            println!("\n❌ {} tests had unexpected results.", self.failed);
        }
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Run a single test case
fn run_single_test(test: &TestCase) -> TestResult {
    // Catch any panics to detect crashes
    let result = std::panic::catch_unwind(|| parse_input(&test.input, &test.features));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(()), true) => TestResult::Pass,
            (Ok(()), false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (Err(error), false) => match &test.expected_error {
                Some(expected) if &error.error_type != expected => TestResult::Fail(format!(
                    "Expected {}, got {} ({})",
                    expected.name(),
                    error.error_type.name(),
                    error.message
                )),
                _ => TestResult::Pass,
            },
            (Err(error), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got {}: {}",
                error.error_type.name(),
                error.message
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

fn parse_input(input: &str, features: &LanguageFeatures) -> Result<(), SyntaxError> {
    parse(input, features).map(|_| ())
}

/// Test case builder for convenience
impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error: None,
            features: LanguageFeatures::default(),
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            should_succeed: false,
            ..Self::should_succeed(name, input)
        }
    }

    pub fn should_fail_with(name: &str, input: &str, expected: SyntaxErrorType) -> Self {
        Self {
            expected_error: Some(expected),
            ..Self::should_fail(name, input)
        }
    }

    /// Restricts the syntax available to this case.
    pub fn allowing(mut self, nodes: &[NodeType]) -> Self {
        self.features.allowed_nodes = Some(nodes.to_vec());
        self
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_malformed_expressions_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    // === PARENTHESES TESTS ===

    suite.add_test(TestCase::should_fail_with(
        "unmatched_opening_paren",
        "(1 + 2",
        SyntaxErrorType::MissingRightParen,
    ));

    suite.add_test(TestCase::should_fail_with(
        "unmatched_opening_paren_nested",
        "((1 + 2)",
        SyntaxErrorType::MissingRightParen,
    ));

    suite.add_test(TestCase::should_fail_with(
        "unmatched_closing_paren",
        "1 + 2)",
        SyntaxErrorType::UnexpectedTokenAfterStatement,
    ));

    suite.add_test(TestCase::should_fail_with(
        "empty_parentheses",
        "()",
        SyntaxErrorType::MissingExpression,
    ));

    suite.add_test(TestCase::should_fail_with(
        "empty_parentheses_in_expression",
        "1 + ()",
        SyntaxErrorType::MissingExpression,
    ));

    // === BRACKET TESTS ===

    suite.add_test(TestCase::should_fail_with(
        "unmatched_opening_bracket",
        "[1, 2",
        SyntaxErrorType::MissingRightBracket,
    ));

    suite.add_test(TestCase::should_fail_with(
        "mixed_paren_bracket_error",
        "x = [1 + (2 * 3]",
        SyntaxErrorType::MissingRightParen,
    ));

    suite.add_test(TestCase::should_fail_with(
        "unclosed_subscript",
        "items[0",
        SyntaxErrorType::MissingRightBracket,
    ));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n  \n"));
    suite.add_test(TestCase::should_succeed("only_comment", "# nothing to see\n"));
    suite.add_test(TestCase::should_succeed("no_trailing_newline", "x = 1"));

    // EOF conditions
    suite.add_test(TestCase::should_fail_with(
        "unexpected_eof_after_operator",
        "1 +",
        SyntaxErrorType::MissingExpression,
    ));
    suite.add_test(TestCase::should_fail("unexpected_eof_in_expression", "1 + ("));

    let deep_parens = "(".repeat(50) + "1" + &")".repeat(50);
    suite.add_test(TestCase::should_succeed("deeply_nested_parens", &deep_parens));

    suite.add_test(TestCase::should_fail_with(
        "unexpected_character",
        "x = 1 $ 2",
        SyntaxErrorType::UnexpectedCharacter,
    ));

    suite
}

fn create_operator_tests() -> TestSuite {
    let mut suite = TestSuite::new("Operator Tests");

    // Missing operands
    suite.add_test(TestCase::should_fail_with(
        "missing_left_operand",
        "+ 1",
        SyntaxErrorType::MissingExpression,
    ));
    suite.add_test(TestCase::should_fail("missing_both_operands", "+"));
    suite.add_test(TestCase::should_fail("double_plus", "1 ++ 2"));

    // Parsed as 1 - (-2)
    suite.add_test(TestCase::should_succeed("double_minus", "1 -- 2"));
    suite.add_test(TestCase::should_succeed("negative_exponent", "2 ** -1"));
    suite.add_test(TestCase::should_succeed("floor_and_modulo", "7 // 2 % 3"));
    suite.add_test(TestCase::should_succeed("logical_chain", "not True and False or True"));

    // Comparison operators
    suite.add_test(TestCase::should_succeed("comparison_equal", "1 == 2"));
    suite.add_test(TestCase::should_succeed("comparison_not_equal", "1 != 2"));
    suite.add_test(TestCase::should_succeed("comparison_less_equal", "1 <= 2"));
    suite.add_test(TestCase::should_succeed("comparison_greater_equal", "1 >= 2"));

    suite
}

fn create_indentation_tests() -> TestSuite {
    let mut suite = TestSuite::new("Indentation Tests");

    suite.add_test(TestCase::should_succeed("indented_block", "if x:\n    y = 1\n"));
    suite.add_test(TestCase::should_succeed(
        "nested_blocks",
        "if a:\n    if b:\n        c = 1\n    d = 2\ne = 3\n",
    ));
    suite.add_test(TestCase::should_succeed(
        "blank_lines_inside_block",
        "while x:\n    y = 1\n\n    # still inside\n    z = 2\n",
    ));
    suite.add_test(TestCase::should_fail_with(
        "missing_indent",
        "if x:\ny = 1\n",
        SyntaxErrorType::MissingIndent,
    ));
    suite.add_test(TestCase::should_fail_with(
        "block_on_same_line",
        "if x: y = 1\n",
        SyntaxErrorType::MissingIndent,
    ));
    suite.add_test(TestCase::should_fail_with(
        "two_space_indent",
        "if x:\n  y = 1\n",
        SyntaxErrorType::IndentationError,
    ));
    suite.add_test(TestCase::should_fail_with(
        "tab_indent",
        "if x:\n\ty = 1\n",
        SyntaxErrorType::IndentationError,
    ));
    suite.add_test(TestCase::should_fail_with(
        "unexpected_indent",
        "x = 1\n    y = 2\n",
        SyntaxErrorType::UnexpectedIndentation,
    ));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow Tests");

    // If statements
    suite.add_test(TestCase::should_succeed(
        "if_elif_else",
        "if x == 1:\n    y = 1\nelif x == 2:\n    y = 2\nelse:\n    y = 3\n",
    ));
    suite.add_test(TestCase::should_fail_with(
        "if_missing_colon",
        "if x\n    y = 1\n",
        SyntaxErrorType::MissingColon,
    ));
    suite.add_test(TestCase::should_fail_with(
        "if_missing_condition",
        "if :\n    y = 1\n",
        SyntaxErrorType::MissingExpression,
    ));

    // While loops
    suite.add_test(TestCase::should_succeed("valid_while", "while x < 3:\n    x = x + 1\n"));
    suite.add_test(TestCase::should_succeed(
        "break_and_continue",
        "while True:\n    if x:\n        break\n    continue\n",
    ));

    // For loops
    suite.add_test(TestCase::should_succeed("valid_for", "for i in [1, 2]:\n    print(i)\n"));
    suite.add_test(TestCase::should_fail_with(
        "for_missing_variable",
        "for in [1]:\n    x\n",
        SyntaxErrorType::MissingIdentifier,
    ));
    suite.add_test(TestCase::should_fail_with(
        "for_missing_in",
        "for i [1]:\n    x\n",
        SyntaxErrorType::MissingIn,
    ));

    // Loop control placement
    suite.add_test(TestCase::should_fail_with(
        "break_outside_loop",
        "break\n",
        SyntaxErrorType::BreakOutsideLoop,
    ));
    suite.add_test(TestCase::should_fail_with(
        "continue_outside_loop",
        "if True:\n    continue\n",
        SyntaxErrorType::ContinueOutsideLoop,
    ));
    suite.add_test(TestCase::should_fail_with(
        "break_in_function_inside_loop",
        "while True:\n    def f():\n        break\n",
        SyntaxErrorType::BreakOutsideLoop,
    ));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literal Tests");

    // Valid literals
    suite.add_test(TestCase::should_succeed("integer_literal", "42"));
    suite.add_test(TestCase::should_succeed("float_literal", "3.14"));
    suite.add_test(TestCase::should_succeed("exponent_literal", "1e3"));
    suite.add_test(TestCase::should_succeed("single_quoted", "'hello'"));
    suite.add_test(TestCase::should_succeed("double_quoted", "\"hello\""));
    suite.add_test(TestCase::should_succeed("boolean_true", "True"));
    suite.add_test(TestCase::should_succeed("none_literal", "None"));
    suite.add_test(TestCase::should_succeed("fstring", "f\"x is {x + 1}!\""));

    // Unterminated strings
    suite.add_test(TestCase::should_fail_with(
        "unterminated_string",
        "\"hello",
        SyntaxErrorType::UnterminatedString,
    ));
    suite.add_test(TestCase::should_fail_with(
        "unterminated_string_with_newline",
        "\"hello\nworld\"",
        SyntaxErrorType::UnterminatedString,
    ));
    suite.add_test(TestCase::should_fail_with(
        "fstring_missing_brace",
        "f\"{x\"",
        SyntaxErrorType::MissingRightBraceInFString,
    ));

    // Reserved but unsupported
    suite.add_test(TestCase::should_fail_with(
        "import_statement",
        "import random",
        SyntaxErrorType::UnimplementedToken,
    ));
    suite.add_test(TestCase::should_fail_with(
        "semicolon",
        "x = 1; y = 2",
        SyntaxErrorType::UnimplementedToken,
    ));

    suite
}

fn create_function_tests() -> TestSuite {
    let mut suite = TestSuite::new("Function Tests");

    // Calls
    suite.add_test(TestCase::should_succeed("simple_function_call", "foo()"));
    suite.add_test(TestCase::should_succeed("function_call_with_args", "foo(1, 2, 3)"));
    suite.add_test(TestCase::should_succeed("trailing_comma", "foo(1, 2,)"));
    suite.add_test(TestCase::should_succeed("method_call", "items.index(2)"));
    suite.add_test(TestCase::should_succeed("chained_postfix", "grid[0][1].upper()"));
    suite.add_test(TestCase::should_fail_with(
        "missing_closing_paren",
        "foo(1, 2",
        SyntaxErrorType::MissingRightParenthesisAfterFunctionCall,
    ));
    suite.add_test(TestCase::should_fail_with(
        "missing_attribute_name",
        "items.(2)",
        SyntaxErrorType::MissingAttributeName,
    ));

    // Declarations
    suite.add_test(TestCase::should_succeed(
        "valid_declaration",
        "def add(a, b):\n    return a + b\n",
    ));
    suite.add_test(TestCase::should_succeed("bare_return", "def f():\n    return\n"));
    suite.add_test(TestCase::should_fail_with(
        "missing_function_name",
        "def (a):\n    return a\n",
        SyntaxErrorType::MissingFunctionName,
    ));
    suite.add_test(TestCase::should_fail_with(
        "missing_left_paren",
        "def f a:\n    return a\n",
        SyntaxErrorType::MissingLeftParenthesisAfterFunctionName,
    ));
    suite.add_test(TestCase::should_fail_with(
        "missing_parameter_name",
        "def f(a,):\n    return a\n",
        SyntaxErrorType::MissingParameterName,
    ));
    suite.add_test(TestCase::should_fail_with(
        "missing_right_paren",
        "def f(a:\n    return a\n",
        SyntaxErrorType::MissingRightParenthesisAfterParameters,
    ));
    suite.add_test(TestCase::should_fail_with(
        "missing_signature_colon",
        "def f(a)\n    return a\n",
        SyntaxErrorType::MissingColonAfterFunctionSignature,
    ));
    suite.add_test(TestCase::should_fail_with(
        "duplicate_parameter",
        "def f(a, a):\n    return a\n",
        SyntaxErrorType::DuplicateParameterName,
    ));

    suite
}

fn create_assignment_tests() -> TestSuite {
    let mut suite = TestSuite::new("Assignment Tests");

    suite.add_test(TestCase::should_succeed("simple_assignment", "x = 1"));
    suite.add_test(TestCase::should_succeed("assignment_with_expression", "x = 1 + 2"));
    suite.add_test(TestCase::should_succeed("subscript_assignment", "items[0] = 5"));
    suite.add_test(TestCase::should_succeed("nested_subscript_assignment", "grid[0][1] = 5"));
    suite.add_test(TestCase::should_succeed("equality_is_not_assignment", "x == 1"));

    suite.add_test(TestCase::should_fail_with(
        "missing_value",
        "x =",
        SyntaxErrorType::MissingExpression,
    ));
    suite.add_test(TestCase::should_fail_with(
        "literal_target",
        "1 = x",
        SyntaxErrorType::InvalidAssignmentTarget,
    ));
    suite.add_test(TestCase::should_fail_with(
        "call_target",
        "f() = 3",
        SyntaxErrorType::InvalidAssignmentTarget,
    ));

    suite
}

fn create_node_gating_tests() -> TestSuite {
    let mut suite = TestSuite::new("Node Gating Tests");

    let basics = [NodeType::ExpressionStatement, NodeType::LiteralExpression];

    suite.add_test(TestCase::should_succeed("allowed_literal", "1").allowing(&basics));
    suite.add_test(
        TestCase::should_fail_with(
            "assignment_not_allowed",
            "x = 1",
            SyntaxErrorType::NodeNotAllowed(NodeType::AssignmentStatement),
        )
        .allowing(&basics),
    );
    suite.add_test(
        TestCase::should_fail_with(
            "binary_not_allowed",
            "1 + 2",
            SyntaxErrorType::NodeNotAllowed(NodeType::BinaryExpression),
        )
        .allowing(&basics),
    );
    suite.add_test(
        TestCase::should_fail_with(
            "nothing_allowed",
            "1",
            SyntaxErrorType::NodeNotAllowed(NodeType::ExpressionStatement),
        )
        .allowing(&[]),
    );
    suite.add_test(
        TestCase::should_fail_with(
            "functions_not_unlocked",
            "def f():\n    return 1\n",
            SyntaxErrorType::NodeNotAllowed(NodeType::FunctionDeclaration),
        )
        .allowing(&[
            NodeType::ExpressionStatement,
            NodeType::LiteralExpression,
            NodeType::ReturnStatement,
            NodeType::BlockStatement,
        ]),
    );

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    println!("🧪 Jiki Parser Robustness Test Suite");
    println!("====================================\n");

    let mut all_passed = true;

    let suites = vec![
        create_malformed_expressions_tests(),
        create_edge_case_tests(),
        create_operator_tests(),
        create_indentation_tests(),
        create_control_flow_tests(),
        create_literal_tests(),
        create_function_tests(),
        create_assignment_tests(),
        create_node_gating_tests(),
    ];

    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            all_passed = false;
        }
    }

    assert!(all_passed, "some parser cases failed, see output above");
}

#[test]
fn node_not_allowed_errors_name_the_node() {
    let features = LanguageFeatures {
        allowed_nodes: Some(vec![NodeType::ExpressionStatement, NodeType::LiteralExpression]),
        ..LanguageFeatures::default()
    };
    let error = parse("x = 1", &features).unwrap_err();
    assert_eq!(error.error_type.name(), "AssignmentStatementNotAllowed");
    assert_eq!(error.context["nodeType"], "AssignmentStatement");
}
