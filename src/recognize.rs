//! Reconocimiento de sentencias por línea.
//!
//! Esta fase aproxima una gramática mediante un catálogo ordenado de
//! formas de sentencia, evaluado línea física por línea física. Cada
//! línea no vacía y que no sea comentario se prueba contra las formas
//! en orden fijo y la primera que coincide gana. El orden es parte
//! del contrato: la declaración de arreglo debe probarse junto a la
//! declaración simple para que no compitan por la misma línea, y la
//! asignación simple va de última por ser la forma menos específica.
//!
//! Una línea que no coincide con ninguna forma produce la variante
//! [`Statement::Unrecognized`], de modo que las fases posteriores y
//! las pruebas puedan razonar sobre la cobertura del fuente en vez
//! de perder líneas en silencio.
//!
//! # Limitación estructural
//! No se reconocen bloques anidados: los cuerpos de `while`, `for`,
//! `if` y de las definiciones de función quedan representados solo
//! por su encabezado. Las sentencias contenidas aparecen como
//! sentencias planas subsiguientes.

use lazy_static::lazy_static;
use regex::Regex;

use crate::source;

/// Una sentencia tipificada, derivada de una línea del fuente.
///
/// Cada variante carga únicamente los campos propios de su forma,
/// además de la línea física 1-based de la que se derivó.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Declaration {
        data_type: String,
        variable: String,
        value: String,
        line: usize,
    },

    ArrayDeclaration {
        data_type: String,
        variable: String,
        size: usize,
        line: usize,
    },

    ArrayAssignment {
        variable: String,
        index: i64,
        value: String,
        line: usize,
    },

    WhileHeader {
        condition: String,
        line: usize,
    },

    ForHeader {
        init: String,
        condition: String,
        update: String,
        line: usize,
    },

    FunctionDefinition {
        return_type: String,
        name: String,
        parameters: String,
        line: usize,
    },

    FunctionCall {
        name: String,
        arguments: String,
        line: usize,
    },

    Print {
        expression: String,
        line: usize,
    },

    Return {
        expression: String,
        line: usize,
    },

    IfHeader {
        condition: String,
        line: usize,
    },

    Assignment {
        variable: String,
        expression: String,
        line: usize,
    },

    /// Línea que ninguna forma cubre. No es un error en esta capa.
    Unrecognized {
        text: String,
        line: usize,
    },
}

impl Statement {
    /// Línea física de la que se derivó la sentencia.
    pub fn line(&self) -> usize {
        use Statement::*;

        match self {
            Declaration { line, .. }
            | ArrayDeclaration { line, .. }
            | ArrayAssignment { line, .. }
            | WhileHeader { line, .. }
            | ForHeader { line, .. }
            | FunctionDefinition { line, .. }
            | FunctionCall { line, .. }
            | Print { line, .. }
            | Return { line, .. }
            | IfHeader { line, .. }
            | Assignment { line, .. }
            | Unrecognized { line, .. } => *line,
        }
    }

    /// Determina si la sentencia fue efectivamente reconocida.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Statement::Unrecognized { .. })
    }
}

lazy_static! {
    static ref DECLARATION: Regex =
        Regex::new(r"^(int|float|string|bool)\s+([a-zA-Z][a-zA-Z0-9_]*)\s*=\s*(.+);$").unwrap();
    static ref ARRAY_DECLARATION: Regex =
        Regex::new(r"^(int|float|string|bool)\s+([a-zA-Z][a-zA-Z0-9_]*)\s*\[\s*(\d+)\s*\]\s*;$")
            .unwrap();
    static ref ARRAY_ASSIGNMENT: Regex =
        Regex::new(r"^([a-zA-Z][a-zA-Z0-9_]*)\s*\[\s*(\d+)\s*\]\s*=\s*(.+);$").unwrap();
    static ref WHILE_HEADER: Regex = Regex::new(r"^while\s*\((.+)\)\s*\{?$").unwrap();
    static ref FOR_HEADER: Regex = Regex::new(r"^for\s*\((.+);(.+);(.+)\)\s*\{?$").unwrap();
    static ref FUNCTION_DEFINITION: Regex =
        Regex::new(r"^(int|float|string|bool|void)\s+([a-zA-Z][a-zA-Z0-9_]*)\s*\(([^)]*)\)\s*\{?$")
            .unwrap();
    static ref FUNCTION_CALL: Regex =
        Regex::new(r"^([a-zA-Z][a-zA-Z0-9_]*)\s*\(([^)]*)\)\s*;$").unwrap();
    static ref PRINT: Regex = Regex::new(r"^print\s+(.+);$").unwrap();
    static ref RETURN: Regex = Regex::new(r"^return\s*(.+);$").unwrap();
    static ref IF_HEADER: Regex = Regex::new(r"^if\s*\((.+)\)\s*\{?$").unwrap();
    static ref ASSIGNMENT: Regex =
        Regex::new(r"^([a-zA-Z][a-zA-Z0-9_]*)\s*=\s*(.+);$").unwrap();
}

/// Reduce el fuente a su secuencia ordenada de sentencias.
pub fn recognize(source_code: &str) -> Vec<Statement> {
    source::numbered_lines(source_code)
        .filter(|(_, text)| !text.is_empty() && !text.starts_with("//"))
        .map(|(line, text)| recognize_line(text, line))
        .collect()
}

fn recognize_line(text: &str, line: usize) -> Statement {
    let capture = |c: &regex::Captures, i: usize| c[i].trim().to_owned();

    if let Some(c) = DECLARATION.captures(text) {
        Statement::Declaration {
            data_type: capture(&c, 1),
            variable: capture(&c, 2),
            value: capture(&c, 3),
            line,
        }
    } else if let Some(c) = ARRAY_DECLARATION.captures(text) {
        Statement::ArrayDeclaration {
            data_type: capture(&c, 1),
            variable: capture(&c, 2),
            size: c[3].parse().unwrap_or(0),
            line,
        }
    } else if let Some(c) = ARRAY_ASSIGNMENT.captures(text) {
        Statement::ArrayAssignment {
            variable: capture(&c, 1),
            index: c[2].parse().unwrap_or(0),
            value: capture(&c, 3),
            line,
        }
    } else if let Some(c) = WHILE_HEADER.captures(text) {
        Statement::WhileHeader {
            condition: capture(&c, 1),
            line,
        }
    } else if let Some(c) = FOR_HEADER.captures(text) {
        Statement::ForHeader {
            init: capture(&c, 1),
            condition: capture(&c, 2),
            update: capture(&c, 3),
            line,
        }
    } else if let Some(c) = FUNCTION_DEFINITION.captures(text) {
        Statement::FunctionDefinition {
            return_type: capture(&c, 1),
            name: capture(&c, 2),
            parameters: capture(&c, 3),
            line,
        }
    } else if let Some(c) = FUNCTION_CALL.captures(text) {
        Statement::FunctionCall {
            name: capture(&c, 1),
            arguments: capture(&c, 2),
            line,
        }
    } else if let Some(c) = PRINT.captures(text) {
        Statement::Print {
            expression: capture(&c, 1),
            line,
        }
    } else if let Some(c) = RETURN.captures(text) {
        Statement::Return {
            expression: capture(&c, 1),
            line,
        }
    } else if let Some(c) = IF_HEADER.captures(text) {
        Statement::IfHeader {
            condition: capture(&c, 1),
            line,
        }
    } else if let Some(c) = ASSIGNMENT.captures(text) {
        Statement::Assignment {
            variable: capture(&c, 1),
            expression: capture(&c, 2),
            line,
        }
    } else {
        Statement::Unrecognized {
            text: text.to_owned(),
            line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_statement_per_meaningful_line() {
        let statements = recognize("int x = 1;\n\n// comentario\nprint x;");

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].line(), 1);
        assert_eq!(statements[1].line(), 4);
    }

    #[test]
    fn array_declaration_wins_over_plain_declaration() {
        let statements = recognize("int a[3];");

        assert_eq!(
            statements[0],
            Statement::ArrayDeclaration {
                data_type: "int".into(),
                variable: "a".into(),
                size: 3,
                line: 1,
            }
        );
    }

    #[test]
    fn declaration_captures_raw_right_hand_side() {
        let statements = recognize("int suma = a + b;");

        assert_eq!(
            statements[0],
            Statement::Declaration {
                data_type: "int".into(),
                variable: "suma".into(),
                value: "a + b".into(),
                line: 1,
            }
        );
    }

    #[test]
    fn for_header_splits_its_three_clauses() {
        let statements = recognize("for (i = 0; i < 10; i = i + 1) {");

        assert_eq!(
            statements[0],
            Statement::ForHeader {
                init: "i = 0".into(),
                condition: "i < 10".into(),
                update: "i = i + 1".into(),
                line: 1,
            }
        );
    }

    #[test]
    fn function_definition_header_with_open_brace() {
        let statements = recognize("int suma(int a, int b) {");

        assert_eq!(
            statements[0],
            Statement::FunctionDefinition {
                return_type: "int".into(),
                name: "suma".into(),
                parameters: "int a, int b".into(),
                line: 1,
            }
        );
    }

    #[test]
    fn assignment_is_tried_after_specific_shapes() {
        let statements = recognize("a[2] = 5;\nx = 5;");

        assert!(matches!(statements[0], Statement::ArrayAssignment { .. }));
        assert!(matches!(statements[1], Statement::Assignment { .. }));
    }

    #[test]
    fn unmatched_lines_become_unrecognized() {
        let statements = recognize("} else {");

        assert_eq!(
            statements[0],
            Statement::Unrecognized {
                text: "} else {".into(),
                line: 1,
            }
        );
        assert!(!statements[0].is_recognized());
    }
}
