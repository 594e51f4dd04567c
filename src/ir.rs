//! Generación de código intermedio de tres direcciones.
//!
//! Recorre las sentencias en orden, hilando contadores de temporales
//! y de etiquetas que solo crecen dentro de una misma generación. El
//! resultado es una lista textual de instrucciones (`dest = a op b`,
//! `GOTO L1`, `IF_FALSE t3 GOTO L2`, marcadores `L1:` y directivas
//! `ALLOC`/`PARAM`/`CALL`/`RETURN`/`PRINT`/`FUNC`), particionada en
//! bloques básicos.
//!
//! # Descomposición de expresiones
//! Una expresión se examina contra los operadores `+ - * /` en ese
//! orden fijo; la primera aparición parte la expresión en exactamente
//! dos operandos, cada uno cargado en un temporal fresco, y un tercer
//! temporal recibe la operación binaria. Las condiciones siguen la
//! misma regla sobre `== != <= >= < >`. No hay descomposición
//! recursiva: la restricción de dos operandos del lenguaje aplica
//! también aquí.
//!
//! # Cuerpos anidados
//! Al igual que el reconocedor, esta fase no baja a los cuerpos de
//! lazos, condicionales ni funciones; en su lugar emite una
//! instrucción de comentario donde iría el cuerpo.

use serde::Serialize;

use crate::recognize::Statement;

/// Operadores aritméticos que disparan descomposición, en orden de
/// prueba.
const ARITHMETIC: &[char] = &['+', '-', '*', '/'];

/// Operadores relacionales que disparan descomposición, en orden de
/// prueba (multicarácter primero).
const RELATIONAL: &[&str] = &["==", "!=", "<=", ">=", "<", ">"];

/// Bloque básico: corrida maximal de instrucciones con una sola
/// etiqueta de entrada y ninguna etiqueta interna.
///
/// Los conjuntos de predecesores y sucesores se dejan vacíos; llenar
/// el grafo de flujo le corresponde al llamador.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<String>,
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
}

/// Conteos derivados de una generación.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Statistics {
    pub total_instructions: usize,
    pub temporaries_used: usize,
    pub labels_used: usize,
}

/// Resultado completo de la fase intermedia.
#[derive(Clone, Debug, Serialize)]
pub struct IrReport {
    pub phase: &'static str,
    pub success: bool,
    pub ir_code: Vec<String>,
    pub basic_blocks: Vec<BasicBlock>,
    pub statistics: Statistics,
}

/// Genera el código intermedio para la secuencia de sentencias.
pub fn generate(statements: &[Statement]) -> IrReport {
    let mut generator = Generator {
        instructions: Vec::new(),
        temporaries: 0,
        labels: 0,
    };

    for statement in statements {
        generator.lower(statement);
    }

    let basic_blocks = partition(&generator.instructions);
    IrReport {
        phase: "ir",
        success: true,
        statistics: Statistics {
            total_instructions: generator.instructions.len(),
            temporaries_used: generator.temporaries,
            labels_used: generator.labels,
        },
        basic_blocks,
        ir_code: generator.instructions,
    }
}

/// Estado de una generación. Los contadores viven únicamente dentro
/// de una llamada a [`generate`]; no hay estado compartido entre
/// ejecuciones.
struct Generator {
    instructions: Vec<String>,
    temporaries: usize,
    labels: usize,
}

impl Generator {
    /// Nombra el siguiente temporal; nunca se reutiliza dentro de
    /// una misma generación.
    fn temporary(&mut self) -> String {
        self.temporaries += 1;
        format!("t{}", self.temporaries)
    }

    /// Nombra la siguiente etiqueta.
    fn label(&mut self) -> String {
        self.labels += 1;
        format!("L{}", self.labels)
    }

    fn push(&mut self, instruction: String) {
        self.instructions.push(instruction);
    }

    fn lower(&mut self, statement: &Statement) {
        use Statement::*;

        match statement {
            Declaration {
                variable, value, ..
            } => {
                let result = self.expression(value);
                self.push(format!("{} = {}", variable, result));
            }

            ArrayDeclaration { variable, size, .. } => {
                self.push(format!("ALLOC {}, {}", variable, size));
            }

            ArrayAssignment {
                variable,
                index,
                value,
                ..
            } => {
                let result = self.expression(value);
                self.push(format!("{}[{}] = {}", variable, index, result));
            }

            WhileHeader { condition, .. } => {
                let start = self.label();
                let end = self.label();

                self.push(format!("{}:", start));
                let result = self.condition(condition);
                self.push(format!("IF_FALSE {} GOTO {}", result, end));
                self.push(String::from("// Loop body here"));
                self.push(format!("GOTO {}", start));
                self.push(format!("{}:", end));
            }

            ForHeader {
                init,
                condition,
                update,
                ..
            } => {
                let start = self.label();
                let step = self.label();
                let end = self.label();

                self.push(format!("// For loop init: {}", init));
                self.push(format!("{}:", start));
                let result = self.condition(condition);
                self.push(format!("IF_FALSE {} GOTO {}", result, end));
                self.push(String::from("// Loop body here"));
                self.push(format!("{}:", step));
                self.push(format!("// For loop update: {}", update));
                self.push(format!("GOTO {}", start));
                self.push(format!("{}:", end));
            }

            FunctionDefinition {
                name, parameters, ..
            } => {
                self.push(format!("FUNC {}:", name));
                self.push(format!("// Parameters: {}", parameters));
                self.push(String::from("// Function body here"));
            }

            FunctionCall {
                name, arguments, ..
            } => {
                if !arguments.is_empty() {
                    self.push(format!("PARAM {}", arguments));
                }
                self.push(format!("CALL {}", name));
            }

            Return { expression, .. } => {
                let result = self.expression(expression);
                self.push(format!("RETURN {}", result));
            }

            IfHeader { condition, .. } => {
                let end = self.label();

                let result = self.condition(condition);
                self.push(format!("IF_FALSE {} GOTO {}", result, end));
                self.push(String::from("// If body here"));
                self.push(format!("{}:", end));
            }

            Print { expression, .. } => {
                let result = self.expression(expression);
                self.push(format!("PRINT {}", result));
            }

            Assignment {
                variable,
                expression,
                ..
            } => {
                let result = self.expression(expression);
                self.push(format!("{} = {}", variable, result));
            }

            Unrecognized { .. } => {}
        }
    }

    /// Descompone una expresión aritmética y retorna el operando que
    /// contiene su valor: el tercer temporal si hubo operador, o el
    /// texto literal si no lo hubo.
    fn expression(&mut self, expression: &str) -> String {
        for &operator in ARITHMETIC {
            if expression.contains(operator) {
                let (left, right) = split_operands(expression, &operator.to_string());
                return self.binary(&left, operator.to_string().as_str(), &right);
            }
        }

        expression.to_owned()
    }

    /// Descompone una condición relacional con la misma disciplina
    /// que [`Generator::expression`].
    fn condition(&mut self, condition: &str) -> String {
        for &operator in RELATIONAL {
            if condition.contains(operator) {
                let (left, right) = split_operands(condition, operator);
                return self.binary(&left, operator, &right);
            }
        }

        condition.to_owned()
    }

    fn binary(&mut self, left: &str, operator: &str, right: &str) -> String {
        let left_temp = self.temporary();
        let right_temp = self.temporary();
        let result = self.temporary();

        self.push(format!("{} = {}", left_temp, left));
        self.push(format!("{} = {}", right_temp, right));
        self.push(format!("{} = {} {} {}", result, left_temp, operator, right_temp));

        result
    }
}

/// Parte sobre la primera aparición del operador; los operandos más
/// allá del segundo se descartan.
fn split_operands(expression: &str, operator: &str) -> (String, String) {
    let parts: Vec<&str> = expression.split(operator).collect();
    let left = parts[0].trim().to_owned();
    let right = parts.get(1).map(|part| part.trim()).unwrap_or("").to_owned();

    (left, right)
}

/// Particiona la lista de instrucciones en bloques básicos: un bloque
/// nuevo comienza exactamente en cada marcador de etiqueta (texto que
/// termina en `:`); un flujo sin etiquetas produce un único bloque.
fn partition(instructions: &[String]) -> Vec<BasicBlock> {
    let block = |label: &str| BasicBlock {
        label: label.to_owned(),
        instructions: Vec::new(),
        predecessors: Vec::new(),
        successors: Vec::new(),
    };

    let mut blocks = Vec::new();
    let mut current = block("BB0");

    for instruction in instructions {
        if instruction.ends_with(':') {
            if !current.instructions.is_empty() {
                blocks.push(current);
            }
            current = block(instruction.trim_end_matches(':'));
        } else {
            current.instructions.push(instruction.clone());
        }
    }

    if !current.instructions.is_empty() {
        blocks.push(current);
    }

    if blocks.is_empty() {
        let mut fallback = block("BB0");
        fallback.instructions = instructions.to_vec();
        return vec![fallback];
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::recognize;

    fn generate_source(source_code: &str) -> IrReport {
        generate(&recognize(source_code))
    }

    #[test]
    fn sum_declaration_uses_exactly_three_temporaries() {
        let report = generate_source("int sum = a + b;");

        assert_eq!(
            report.ir_code,
            vec!["t1 = a", "t2 = b", "t3 = t1 + t2", "sum = t3"]
        );
        assert_eq!(report.statistics.temporaries_used, 3);
        assert_eq!(report.statistics.labels_used, 0);
    }

    #[test]
    fn simple_declaration_assigns_the_literal() {
        let report = generate_source("int x = 10;");

        assert_eq!(report.ir_code, vec!["x = 10"]);
        assert_eq!(report.statistics.temporaries_used, 0);
    }

    #[test]
    fn temporaries_never_repeat_within_one_pass() {
        let report = generate_source("int a = x + y;\nint b = x * y;\nprint a + b;");

        let mut seen = Vec::new();
        for instruction in &report.ir_code {
            if let Some(name) = instruction.split(" = ").next() {
                if name.starts_with('t') {
                    assert!(!seen.contains(&name.to_owned()), "temporal repetido {}", name);
                    seen.push(name.to_owned());
                }
            }
        }
        assert_eq!(report.statistics.temporaries_used, 9);
    }

    #[test]
    fn plus_is_tested_before_the_other_operators() {
        // `b - c` queda como operando opaco: solo el primer operador
        // en el orden fijo descompone
        let report = generate_source("int x = a + b - c;");

        assert_eq!(
            report.ir_code,
            vec!["t1 = a", "t2 = b - c", "t3 = t1 + t2", "x = t3"]
        );
    }

    #[test]
    fn while_shape_wraps_condition_and_placeholder_body() {
        let report = generate_source("while (i < 10) {");

        assert_eq!(
            report.ir_code,
            vec![
                "L1:",
                "t1 = i",
                "t2 = 10",
                "t3 = t1 < t2",
                "IF_FALSE t3 GOTO L2",
                "// Loop body here",
                "GOTO L1",
                "L2:",
            ]
        );
        assert_eq!(report.statistics.labels_used, 2);
    }

    #[test]
    fn for_shape_uses_three_fresh_labels() {
        let report = generate_source("for (i = 0; i < 3; i = i + 1) {");

        assert_eq!(
            report.ir_code,
            vec![
                "// For loop init: i = 0",
                "L1:",
                "t1 = i",
                "t2 = 3",
                "t3 = t1 < t2",
                "IF_FALSE t3 GOTO L3",
                "// Loop body here",
                "L2:",
                "// For loop update: i = i + 1",
                "GOTO L1",
                "L3:",
            ]
        );
        assert_eq!(report.statistics.labels_used, 3);
    }

    #[test]
    fn relational_decomposition_prefers_two_character_operators() {
        let report = generate_source("if (x <= 5) {");

        assert_eq!(report.ir_code[2], "t3 = t1 <= t2");
    }

    #[test]
    fn function_call_emits_param_then_call() {
        let report = generate_source("void f(int a) {\nf(3);");

        assert_eq!(
            report.ir_code,
            vec![
                "FUNC f:",
                "// Parameters: int a",
                "// Function body here",
                "PARAM 3",
                "CALL f",
            ]
        );
    }

    #[test]
    fn label_free_stream_is_a_single_block() {
        let report = generate_source("int x = 1;\nint y = 2;");

        assert_eq!(report.basic_blocks.len(), 1);
        assert_eq!(report.basic_blocks[0].label, "BB0");
        assert_eq!(report.basic_blocks[0].instructions.len(), 2);
    }

    #[test]
    fn blocks_break_at_every_label_marker() {
        let report = generate_source("int i = 0;\nwhile (i < 2) {");

        let labels: Vec<&str> = report
            .basic_blocks
            .iter()
            .map(|block| block.label.as_str())
            .collect();
        assert_eq!(labels, vec!["BB0", "L1"]);

        // El bloque L2 queda vacío y no se materializa
        assert!(report
            .basic_blocks
            .iter()
            .all(|block| !block.instructions.is_empty()));
    }

    #[test]
    fn generation_is_idempotent() {
        let statements = recognize("int a = x + y;\nwhile (a > 0) {");

        let first = generate(&statements);
        let second = generate(&statements);
        assert_eq!(first.ir_code, second.ir_code);
        assert_eq!(first.statistics, second.statistics);
    }
}
