/// End-to-end integration tests for complete pseudocode programs
/// Demonstrates: Scanner → Parser → Interpreter working together
use camscript::lexer::tokenize;
use camscript::parser::parse_program;
use camscript::runtime::run_source;

fn run(source: &str) -> String {
    run_source(source, "").unwrap()
}

#[test]
fn test_e2e_simple_arithmetic() {
    let source = "OUTPUT 1 + 2 * 3";
    assert_eq!(run(source), "7\n");
}

#[test]
fn test_e2e_grouping_overrides_precedence() {
    assert_eq!(run("OUTPUT (1 + 2) * 3"), "9\n");
}

#[test]
fn test_e2e_variables_and_assignment() {
    let source = "DECLARE x : INTEGER\n\
                  DECLARE y : INTEGER\n\
                  x <- 10\n\
                  y <- 20\n\
                  OUTPUT x + y";
    assert_eq!(run(source), "30\n");
}

#[test]
fn test_e2e_reassignment() {
    let source = "DECLARE counter : INTEGER\n\
                  counter <- 0\n\
                  counter <- counter + 1\n\
                  counter <- counter + 1\n\
                  OUTPUT counter";
    assert_eq!(run(source), "2\n");
}

#[test]
fn test_e2e_if_selection() {
    let source = "DECLARE x : INTEGER\n\
                  x <- 10\n\
                  IF x > 5 THEN\n\
                      OUTPUT \"large\"\n\
                  ELSE\n\
                      OUTPUT \"small\"\n\
                  ENDIF";
    assert_eq!(run(source), "large\n");
}

#[test]
fn test_e2e_nested_if() {
    let source = "DECLARE n : INTEGER\n\
                  n <- 0\n\
                  IF n >= 0 THEN\n\
                      IF n = 0 THEN\n\
                          OUTPUT \"zero\"\n\
                      ELSE\n\
                          OUTPUT \"positive\"\n\
                      ENDIF\n\
                  ELSE\n\
                      OUTPUT \"negative\"\n\
                  ENDIF";
    assert_eq!(run(source), "zero\n");
}

#[test]
fn test_e2e_case_selection() {
    let source = "DECLARE grade : STRING\n\
                  grade <- \"B\"\n\
                  CASE OF grade\n\
                      \"A\" : OUTPUT \"excellent\"\n\
                      \"B\" : OUTPUT \"good\"\n\
                      OTHERWISE : OUTPUT \"try again\"\n\
                  ENDCASE";
    assert_eq!(run(source), "good\n");
}

#[test]
fn test_e2e_for_loop_sum() {
    let source = "DECLARE total : INTEGER\n\
                  DECLARE i : INTEGER\n\
                  total <- 0\n\
                  FOR i <- 1 TO 10\n\
                      total <- total + i\n\
                  NEXT i\n\
                  OUTPUT total";
    assert_eq!(run(source), "55\n");
}

#[test]
fn test_e2e_for_loop_bounds_are_inclusive() {
    let source = "DECLARE i : INTEGER\n\
                  FOR i <- 1 TO 3\n\
                      OUTPUT i\n\
                  NEXT i";
    assert_eq!(run(source), "1\n2\n3\n");
}

#[test]
fn test_e2e_for_loop_empty_when_start_past_end() {
    let source = "DECLARE i : INTEGER\n\
                  FOR i <- 5 TO 1\n\
                      OUTPUT i\n\
                  NEXT i\n\
                  OUTPUT \"after\"";
    assert_eq!(run(source), "after\n");
}

#[test]
fn test_e2e_while_countdown() {
    let source = "DECLARE n : INTEGER\n\
                  n <- 3\n\
                  WHILE n > 0 DO\n\
                      OUTPUT n\n\
                      n <- n - 1\n\
                  ENDWHILE\n\
                  OUTPUT \"liftoff\"";
    assert_eq!(run(source), "3\n2\n1\nliftoff\n");
}

#[test]
fn test_e2e_repeat_runs_at_least_once() {
    let source = "DECLARE n : INTEGER\n\
                  n <- 10\n\
                  REPEAT\n\
                      OUTPUT n\n\
                  UNTIL n = 10";
    assert_eq!(run(source), "10\n");
}

#[test]
fn test_e2e_procedure_with_parameters() {
    let source = "PROCEDURE Greet(name : STRING)\n\
                      OUTPUT \"hello \", name\n\
                  ENDPROCEDURE\n\
                  CALL Greet(\"world\")\n\
                  CALL Greet(\"again\")";
    assert_eq!(run(source), "hello world\nhello again\n");
}

#[test]
fn test_e2e_function_composition() {
    let source = "FUNCTION Double(n : INTEGER) RETURNS INTEGER\n\
                      RETURN n * 2\n\
                  ENDFUNCTION\n\
                  OUTPUT Double(Double(3))";
    assert_eq!(run(source), "12\n");
}

#[test]
fn test_e2e_recursive_fibonacci() {
    let source = "FUNCTION Fib(n : INTEGER) RETURNS INTEGER\n\
                      IF n <= 1 THEN\n\
                          RETURN n\n\
                      ELSE\n\
                          RETURN Fib(n - 1) + Fib(n - 2)\n\
                      ENDIF\n\
                  ENDFUNCTION\n\
                  OUTPUT Fib(10)";
    assert_eq!(run(source), "55\n");
}

#[test]
fn test_e2e_constants_in_expressions() {
    let source = "CONSTANT Tax <- 0.2\n\
                  DECLARE price : REAL\n\
                  price <- 50.0\n\
                  OUTPUT price * Tax";
    assert_eq!(run(source), "10.0\n");
}

#[test]
fn test_e2e_input_drives_branching() {
    let source = "DECLARE age : INTEGER\n\
                  INPUT age\n\
                  IF age >= 18 THEN\n\
                      OUTPUT \"adult\"\n\
                  ELSE\n\
                      OUTPUT \"minor\"\n\
                  ENDIF";
    assert_eq!(run_source(source, "21\n").unwrap(), "adult\n");
    assert_eq!(run_source(source, "12\n").unwrap(), "minor\n");
}

#[test]
fn test_e2e_multiple_inputs_read_in_order() {
    let source = "DECLARE a : INTEGER\n\
                  DECLARE b : INTEGER\n\
                  INPUT a\n\
                  INPUT b\n\
                  OUTPUT a - b";
    assert_eq!(run_source(source, "10\n3\n").unwrap(), "7\n");
}

#[test]
fn test_e2e_output_concatenates_mixed_values() {
    let source = "OUTPUT \"result: \", 2 ^ 5, \" (\", TRUE, \")\"";
    assert_eq!(run(source), "result: 32 (TRUE)\n");
}

#[test]
fn test_e2e_string_indexing() {
    let source = "DECLARE word : STRING\n\
                  DECLARE i : INTEGER\n\
                  word <- \"cab\"\n\
                  FOR i <- 1 TO 3\n\
                      OUTPUT word[i]\n\
                  NEXT i";
    assert_eq!(run(source), "c\na\nb\n");
}

#[test]
fn test_e2e_comments_are_ignored() {
    let source = "// leading comment\n\
                  DECLARE x : INTEGER # trailing comment\n\
                  /* block\n\
                     comment */\n\
                  x <- 4\n\
                  OUTPUT x";
    assert_eq!(run(source), "4\n");
}

#[test]
fn test_e2e_file_write_then_read() {
    let dir = std::env::temp_dir().join(format!("camscript-e2e-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("numbers.txt");
    let path = path.to_str().unwrap();

    let source = format!(
        "OPENFILE \"{path}\" FOR WRITE\n\
         WRITEFILE \"{path}\", \"first\"\n\
         WRITEFILE \"{path}\", \"second\"\n\
         CLOSEFILE \"{path}\"\n\
         DECLARE line : STRING\n\
         OPENFILE \"{path}\" FOR READ\n\
         READFILE \"{path}\", line\n\
         OUTPUT line\n\
         READFILE \"{path}\", line\n\
         OUTPUT line\n\
         CLOSEFILE \"{path}\""
    );
    assert_eq!(run(&source), "first\nsecond\n");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_e2e_pipeline_stages_compose() {
    // The same source driven stage by stage instead of via run_source
    let source = "DECLARE x : INTEGER\nx <- 6 * 7\nOUTPUT x";
    let tokens = tokenize(source).unwrap();
    let program = parse_program(tokens).unwrap();
    assert_eq!(program.statements.len(), 3);
    assert_eq!(run_source(source, "").unwrap(), "42\n");
}
