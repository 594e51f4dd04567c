//! Interpretación directa del programa.
//!
//! El intérprete vuelve a recorrer el fuente línea por línea con su
//! propio subconjunto de formas (declaración con inicialización,
//! asignación, impresión de identificador, de literal de cadena o de
//! expresión, y retorno de literal entero). Cada línea procesada
//! agrega una entrada legible a la traza de ejecución y cualquier
//! falla de evaluación se registra y no detiene las líneas
//! siguientes.
//!
//! # Evaluación de expresiones
//! El evaluador trabaja sobre una lista de tokens (operandos y
//! operadores) y reduce por niveles: primero toda multiplicación de
//! izquierda a derecha, luego división entera con piso, luego módulo,
//! y por último suma y resta plegadas de izquierda a derecha. Esto
//! produce la precedencia usual con asociatividad izquierda dentro de
//! cada nivel. La división y el módulo entre cero están definidos
//! como `0`: es una política explícita de esta capa, no un error.
//!
//! # Resolución de variables
//! Un identificador sin valor asignado evalúa a `0`. Esta capa es
//! deliberadamente más permisiva que el análisis semántico, que sí
//! diagnostica la referencia; son políticas distintas por diseño.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::source;

/// Falla local a la evaluación de una expresión.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Un operando no cabe en el rango de enteros soportado.
    #[error("Integer literal out of range: {0}")]
    OutOfRange(String),

    /// El resultado intermedio desborda la aritmética entera.
    #[error("Arithmetic overflow while evaluating expression")]
    Overflow,
}

/// Registro de la evaluación de una expresión compuesta.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Evaluation {
    pub expression: String,
    pub result: i64,
    pub variables_used: Vec<String>,
    pub step: String,
}

/// Resultado completo de la ejecución.
#[derive(Clone, Debug, Serialize)]
pub struct ExecutionReport {
    pub phase: &'static str,
    pub success: bool,
    pub variables: BTreeMap<String, i64>,
    pub expressions: Vec<Evaluation>,
    pub output: String,
    pub output_lines: Vec<String>,
    pub status: &'static str,
    pub exit_code: i32,
    pub execution_steps: Vec<String>,
    pub total_steps: usize,
    pub variables_count: usize,
}

lazy_static! {
    static ref DECLARATION: Regex =
        Regex::new(r"^int\s+([a-zA-Z][a-zA-Z0-9_]*)\s*=\s*(.+);$").unwrap();
    static ref ASSIGNMENT: Regex =
        Regex::new(r"^([a-zA-Z][a-zA-Z0-9_]*)\s*=\s*(.+);$").unwrap();
    static ref PRINT_IDENTIFIER: Regex =
        Regex::new(r"^print\s+([a-zA-Z][a-zA-Z0-9_]*);$").unwrap();
    static ref PRINT_STRING: Regex = Regex::new(r#"^print\s+"([^"]*)";$"#).unwrap();
    static ref PRINT_EXPRESSION: Regex = Regex::new(r"^print\s+(.+);$").unwrap();
    static ref RETURN: Regex = Regex::new(r"(?i)^return\s+(\d+);$").unwrap();
    static ref IDENTIFIER_ONLY: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").unwrap();
    static ref COMPOUND: Regex = Regex::new(r"[+\-*/]").unwrap();
}

/// Interpreta el fuente y produce su salida junto a la traza.
pub fn execute(source_code: &str) -> ExecutionReport {
    let mut interpreter = Interpreter {
        variables: BTreeMap::new(),
        expressions: Vec::new(),
        output_lines: Vec::new(),
        steps: Vec::new(),
    };

    for (line_number, line) in source::numbered_lines(source_code) {
        if line.is_empty() || line.starts_with("//") || line.starts_with("/*") {
            continue;
        }

        if let Err(error) = interpreter.line(line) {
            // Aislamiento por línea: se anota y se continúa
            interpreter
                .steps
                .push(format!("Error on line {}: {}", line_number, error));
        }
    }

    let Interpreter {
        variables,
        expressions,
        output_lines,
        steps,
    } = interpreter;

    ExecutionReport {
        phase: "execution",
        success: true,
        output: output_lines.join("\n"),
        status: "Program executed successfully",
        exit_code: 0,
        total_steps: steps.len(),
        variables_count: variables.len(),
        variables,
        expressions,
        output_lines,
        execution_steps: steps,
    }
}

struct Interpreter {
    variables: BTreeMap<String, i64>,
    expressions: Vec<Evaluation>,
    output_lines: Vec<String>,
    steps: Vec<String>,
}

impl Interpreter {
    fn line(&mut self, line: &str) -> Result<(), EvalError> {
        if let Some(c) = DECLARATION.captures(line) {
            let variable = c[1].to_owned();
            let expression = c[2].trim().to_owned();

            let value = evaluate(&expression, &self.variables)?;
            self.variables.insert(variable.clone(), value);
            self.steps
                .push(format!("{} = {} → {}", variable, expression, value));

            if COMPOUND.is_match(&expression) {
                self.expressions.push(Evaluation {
                    expression: format!("{} = {}", variable, expression),
                    result: value,
                    variables_used: source::identifiers(&expression),
                    step: format!("{} = {} = {}", variable, expression, value),
                });
            }
        } else if let Some(c) = ASSIGNMENT.captures(line) {
            let variable = c[1].to_owned();
            let expression = c[2].trim().to_owned();

            let value = evaluate(&expression, &self.variables)?;
            self.variables.insert(variable.clone(), value);
            self.steps
                .push(format!("{} = {} → {}", variable, expression, value));
        } else if let Some(c) = PRINT_IDENTIFIER.captures(line) {
            let variable = &c[1];

            match self.variables.get(variable) {
                Some(value) => {
                    self.output_lines.push(value.to_string());
                    self.steps
                        .push(format!("print {} → output: {}", variable, value));
                }

                None => {
                    self.output_lines
                        .push(format!("undefined variable: {}", variable));
                    self.steps
                        .push(format!("print {} → error: undefined variable", variable));
                }
            }
        } else if let Some(c) = PRINT_STRING.captures(line) {
            let text = &c[1];
            self.output_lines.push(text.to_owned());
            self.steps
                .push(format!("print \"{}\" → output: {}", text, text));
        } else if let Some(c) = PRINT_EXPRESSION.captures(line) {
            let expression = c[1].trim().to_owned();

            let value = evaluate(&expression, &self.variables)?;
            self.output_lines.push(value.to_string());
            self.steps
                .push(format!("print {} → output: {}", expression, value));
        } else if let Some(c) = RETURN.captures(line) {
            self.steps.push(format!("return {} → program exit", &c[1]));
        }

        Ok(())
    }
}

/// Token del evaluador: operando textual u operador de un carácter.
#[derive(Clone, Debug, PartialEq)]
enum Piece {
    Operand(String),
    Operator(char),
}

/// Evalúa una expresión aritmética entera sobre el estado actual.
///
/// Los identificadores sin valor asignado evalúan a `0`; la división
/// y el módulo entre cero producen `0`.
pub fn evaluate(expression: &str, variables: &BTreeMap<String, i64>) -> Result<i64, EvalError> {
    let compact: String = expression.chars().filter(|c| !c.is_whitespace()).collect();

    // Constante numérica completa
    if source::is_numeric(&compact) {
        return literal(&compact);
    }

    // Identificador simple
    if IDENTIFIER_ONLY.is_match(&compact) {
        return Ok(variables.get(&compact).copied().unwrap_or(0));
    }

    let mut pieces = split_pieces(&compact);

    // Niveles de precedencia: `*`, luego `/`, luego `%`
    reduce(&mut pieces, '*', variables)?;
    reduce(&mut pieces, '/', variables)?;
    reduce(&mut pieces, '%', variables)?;

    // Suma y resta de izquierda a derecha sobre lo que queda
    let mut result = 0i64;
    let mut pending = '+';
    for piece in pieces {
        match piece {
            Piece::Operator(operator) => pending = operator,
            Piece::Operand(text) => {
                let value = operand(&text, variables)?;
                result = match pending {
                    '-' => result.checked_sub(value).ok_or(EvalError::Overflow)?,
                    _ => result.checked_add(value).ok_or(EvalError::Overflow)?,
                };
            }
        }
    }

    Ok(result)
}

/// Separa la expresión compacta en operandos y operadores.
fn split_pieces(compact: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut operand = String::new();

    for c in compact.chars() {
        if matches!(c, '+' | '-' | '*' | '/' | '%') {
            if !operand.is_empty() {
                pieces.push(Piece::Operand(std::mem::take(&mut operand)));
            }
            pieces.push(Piece::Operator(c));
        } else {
            operand.push(c);
        }
    }

    if !operand.is_empty() {
        pieces.push(Piece::Operand(operand));
    }

    pieces
}

/// Reduce todas las apariciones del operador, de izquierda a
/// derecha, reemplazando cada trío operando-operador-operando por el
/// operando del resultado.
fn reduce(
    pieces: &mut Vec<Piece>,
    target: char,
    variables: &BTreeMap<String, i64>,
) -> Result<(), EvalError> {
    loop {
        let position = pieces
            .iter()
            .position(|piece| *piece == Piece::Operator(target));

        let index = match position {
            Some(index) if index > 0 && index + 1 < pieces.len() => index,
            _ => return Ok(()),
        };

        let left = match &pieces[index - 1] {
            Piece::Operand(text) => operand(text, variables)?,
            Piece::Operator(_) => return Ok(()),
        };
        let right = match &pieces[index + 1] {
            Piece::Operand(text) => operand(text, variables)?,
            Piece::Operator(_) => return Ok(()),
        };

        let value = match target {
            '*' => left.checked_mul(right).ok_or(EvalError::Overflow)?,
            '/' if right == 0 => 0,
            '/' => floor_div(left, right),
            '%' if right == 0 => 0,
            _ => left.checked_rem(right).unwrap_or(0),
        };

        pieces.splice(index - 1..=index + 1, [Piece::Operand(value.to_string())]);
    }
}

/// División entera con redondeo hacia menos infinito.
fn floor_div(left: i64, right: i64) -> i64 {
    let quotient = left / right;
    if left % right != 0 && (left < 0) != (right < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// Valor de un operando: constante numérica o variable (con `0` como
/// valor por omisión).
fn operand(text: &str, variables: &BTreeMap<String, i64>) -> Result<i64, EvalError> {
    if source::is_numeric(text) {
        literal(text)
    } else {
        Ok(variables.get(text).copied().unwrap_or(0))
    }
}

/// Valor entero de una constante numérica; un literal con punto
/// decimal se trunca hacia cero.
fn literal(text: &str) -> Result<i64, EvalError> {
    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }

    let value = text
        .parse::<f64>()
        .map_err(|_| EvalError::OutOfRange(text.to_owned()))?;
    if value.is_finite() && value.abs() < i64::MAX as f64 {
        Ok(value.trunc() as i64)
    } else {
        Err(EvalError::OutOfRange(text.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str) -> i64 {
        evaluate(expression, &BTreeMap::new()).expect("expresión válida")
    }

    fn eval_with(expression: &str, bindings: &[(&str, i64)]) -> i64 {
        let variables = bindings
            .iter()
            .map(|&(name, value)| (name.to_owned(), value))
            .collect();
        evaluate(expression, &variables).expect("expresión válida")
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(eval("2 + 3 * 4"), 14);
        assert_eq!(eval("3 * 4 + 2"), 14);
    }

    #[test]
    fn same_tier_folds_left_to_right() {
        assert_eq!(eval("10 - 2 - 3"), 5);
        assert_eq!(eval("2 * 3 * 4"), 24);
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(eval("10 / 0"), 0);
        assert_eq!(eval("7 % 0"), 0);
        assert_eq!(eval("5 + 10 / 0"), 5);
    }

    #[test]
    fn division_floors_toward_negative_infinity() {
        assert_eq!(eval("7 / 2"), 3);
        assert_eq!(eval_with("a / 2", &[("a", -7)]), -4);
    }

    #[test]
    fn unset_variables_default_to_zero() {
        assert_eq!(eval("x"), 0);
        assert_eq!(eval("x + 5"), 5);
    }

    #[test]
    fn float_literals_truncate() {
        assert_eq!(eval("3.9"), 3);
    }

    #[test]
    fn declaration_then_print_outputs_the_value() {
        let report = execute("int x = 3;\nprint x;");

        assert_eq!(report.output_lines, vec!["3"]);
        assert_eq!(report.output, "3");
        assert_eq!(report.exit_code, 0);
        assert_eq!(
            report.execution_steps,
            vec!["x = 3 → 3", "print x → output: 3"]
        );
    }

    #[test]
    fn end_to_end_sum_program() {
        let report = execute("int x = 10;\nint y = 20;\nint sum = x + y;\nprint sum;");

        assert_eq!(report.output, "30");
        assert_eq!(report.variables["sum"], 30);
        assert_eq!(report.variables_count, 3);
        assert_eq!(report.total_steps, 4);
    }

    #[test]
    fn compound_expressions_are_recorded() {
        let report = execute("int x = 2;\nint y = x * 5;");

        assert_eq!(report.expressions.len(), 1);
        let record = &report.expressions[0];
        assert_eq!(record.expression, "y = x * 5");
        assert_eq!(record.result, 10);
        assert_eq!(record.variables_used, vec!["x"]);
        assert_eq!(record.step, "y = x * 5 = 10");
    }

    #[test]
    fn print_of_undefined_variable_is_annotated() {
        let report = execute("print z;");

        assert_eq!(report.output_lines, vec!["undefined variable: z"]);
        assert_eq!(
            report.execution_steps,
            vec!["print z → error: undefined variable"]
        );
    }

    #[test]
    fn print_of_string_literal_passes_through() {
        let report = execute("print \"hola mundo\";");

        assert_eq!(report.output_lines, vec!["hola mundo"]);
    }

    #[test]
    fn print_of_expression_evaluates_in_place() {
        let report = execute("int a = 6;\nprint a / 4 + 1;");

        assert_eq!(report.output_lines, vec!["2"]);
    }

    #[test]
    fn return_statement_traces_program_exit() {
        let report = execute("return 0;");

        assert_eq!(report.execution_steps, vec!["return 0 → program exit"]);
        assert!(report.output_lines.is_empty());
    }

    #[test]
    fn faulty_line_does_not_stop_the_run() {
        let report = execute("int x = 99999999999999999999;\nint y = 1;\nprint y;");

        assert_eq!(report.output_lines, vec!["1"]);
        assert!(report.execution_steps[0].starts_with("Error on line 1:"));
        assert!(!report.variables.contains_key("x"));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let report = execute("// inicio\n\n/* bloque\nint x = 1;\nprint x;");

        assert_eq!(report.output_lines, vec!["1"]);
        assert_eq!(report.total_steps, 2);
    }
}
