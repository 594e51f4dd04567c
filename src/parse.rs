//! Construcción de estructura sintáctica simplificada.
//!
//! A partir de la secuencia de sentencias reconocidas se emite un
//! árbol de derivación basado en terminales: cada sentencia aporta un
//! nodo `Statement` cuyos hijos son los tokens literales del fuente,
//! junto a una cadena de paso de derivación numerada. Solamente las
//! formas de declaración, impresión y asignación producen terminales
//! en forma canónica; las demás formas aportan un nodo vacío, como
//! registro de su presencia en el programa.
//!
//! Las expresiones se parten sobre una única aparición de `+` o `*`;
//! una expresión con otro operador, o con más de uno, se representa
//! como un solo terminal opaco. Esa es la restricción de expresiones
//! de dos operandos del lenguaje, no una omisión.

use serde::Serialize;
use thiserror::Error;

use crate::recognize::Statement;

/// El fuente no contiene ninguna sentencia reconocible.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("No valid statements found in source code")]
pub struct NoStatements;

/// Hoja del árbol: un token literal del fuente.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Terminal {
    #[serde(rename = "type")]
    pub label: String,
    pub value: String,
    #[serde(rename = "isTerminal")]
    pub is_terminal: bool,
}

impl Terminal {
    fn from(text: &str) -> Self {
        Terminal {
            label: text.to_owned(),
            value: text.to_owned(),
            is_terminal: true,
        }
    }
}

/// Nodo de sentencia con su secuencia de terminales.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatementNode {
    #[serde(rename = "type")]
    pub label: &'static str,
    pub children: Vec<Terminal>,
}

/// Raíz del árbol sintáctico simplificado.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParseTree {
    #[serde(rename = "type")]
    pub label: &'static str,
    pub children: Vec<StatementNode>,
}

/// Resultado completo de la fase sintáctica.
#[derive(Clone, Debug, Serialize)]
pub struct ParseStructure {
    pub phase: &'static str,
    pub success: bool,
    pub parse_tree: ParseTree,
    pub grammar_rules_applied: Vec<&'static str>,
    pub derivation_steps: Vec<String>,
    pub tree_description: String,
}

/// Reglas de la gramática de referencia que el árbol ilustra.
const GRAMMAR_RULES: &[&str] = &[
    "Program -> StatementList",
    "StatementList -> Statement StatementList | Statement",
    "Statement -> Declaration | Print | Assignment",
    "Declaration -> Type ID = Expression ;",
    "Print -> print ID ;",
    "Expression -> ID + ID | ID * ID | ID | NUM",
];

/// Construye el árbol de terminales y la traza de derivación.
///
/// Falla con [`NoStatements`] cuando ninguna sentencia del fuente
/// fue reconocida.
pub fn build(statements: &[Statement]) -> Result<ParseStructure, NoStatements> {
    let recognized: Vec<&Statement> = statements
        .iter()
        .filter(|statement| statement.is_recognized())
        .collect();

    if recognized.is_empty() {
        return Err(NoStatements);
    }

    let mut derivation_steps = Vec::new();
    let mut children = Vec::new();
    let mut step = 1;

    for statement in &recognized {
        let terminals = match statement {
            Statement::Declaration {
                data_type,
                variable,
                value,
                ..
            } => {
                let mut terminals = vec![
                    Terminal::from(data_type),
                    Terminal::from(variable),
                    Terminal::from("="),
                ];

                let expansion = push_expression(&mut terminals, value);
                derivation_steps.push(format!(
                    "{}. Declaration -> {} {} = {} ;",
                    step, data_type, variable, expansion
                ));
                step += 1;

                terminals.push(Terminal::from(";"));
                terminals
            }

            Statement::Print { expression, .. } => {
                derivation_steps.push(format!("{}. Print -> print {} ;", step, expression));
                step += 1;

                vec![
                    Terminal::from("print"),
                    Terminal::from(expression),
                    Terminal::from(";"),
                ]
            }

            Statement::Assignment {
                variable,
                expression,
                ..
            } => {
                let mut terminals = vec![Terminal::from(variable), Terminal::from("=")];

                // La asignación solo expande sumas; cualquier otra
                // expresión queda como terminal opaco
                if let Some((left, right)) = split_once_on(expression, '+') {
                    terminals.push(Terminal::from(&left));
                    terminals.push(Terminal::from("+"));
                    terminals.push(Terminal::from(&right));
                } else {
                    terminals.push(Terminal::from(expression));
                }

                terminals.push(Terminal::from(";"));
                derivation_steps.push(format!(
                    "{}. Assignment -> {} = {} ;",
                    step, variable, expression
                ));
                step += 1;

                terminals
            }

            // Las demás formas no tienen expansión canónica
            _ => Vec::new(),
        };

        children.push(StatementNode {
            label: "Statement",
            children: terminals,
        });
    }

    let tree_description = format!(
        "Terminal-based parse tree showing actual code tokens for {} statement(s)",
        recognized.len()
    );

    Ok(ParseStructure {
        phase: "parsetree",
        success: true,
        parse_tree: ParseTree {
            label: "Program",
            children,
        },
        grammar_rules_applied: GRAMMAR_RULES.to_vec(),
        derivation_steps,
        tree_description,
    })
}

/// Expande una expresión de declaración en sus terminales y retorna
/// el texto que corresponde al paso de derivación.
fn push_expression(terminals: &mut Vec<Terminal>, value: &str) -> String {
    for operator in &['+', '*'] {
        if let Some((left, right)) = split_once_on(value, *operator) {
            terminals.push(Terminal::from(&left));
            terminals.push(Terminal::from(&operator.to_string()));
            terminals.push(Terminal::from(&right));

            return format!("{} {} {}", left, operator, right);
        }
    }

    terminals.push(Terminal::from(value));
    value.to_owned()
}

/// Parte una expresión sobre la primera aparición del operador,
/// descartando todo operando más allá del segundo.
fn split_once_on(expression: &str, operator: char) -> Option<(String, String)> {
    if !expression.contains(operator) {
        return None;
    }

    let parts: Vec<&str> = expression.split(operator).collect();
    let left = parts[0].trim().to_owned();
    let right = parts.get(1).map(|part| part.trim()).unwrap_or("").to_owned();

    Some((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::recognize;

    #[test]
    fn empty_input_yields_no_statements() {
        assert!(matches!(build(&[]), Err(NoStatements)));
    }

    #[test]
    fn unrecognized_only_input_yields_no_statements() {
        let statements = recognize("} else {");
        assert!(build(&statements).is_err());
    }

    #[test]
    fn declaration_expands_into_literal_terminals() {
        let statements = recognize("int x = 130;");
        let structure = build(&statements).expect("declaración válida");

        let terminals: Vec<&str> = structure.parse_tree.children[0]
            .children
            .iter()
            .map(|t| t.value.as_str())
            .collect();

        assert_eq!(terminals, vec!["int", "x", "=", "130", ";"]);
        assert_eq!(
            structure.derivation_steps,
            vec!["1. Declaration -> int x = 130 ;"]
        );
    }

    #[test]
    fn sum_expression_splits_on_first_plus() {
        let statements = recognize("int suma = x + y;");
        let structure = build(&statements).expect("declaración válida");

        let terminals: Vec<&str> = structure.parse_tree.children[0]
            .children
            .iter()
            .map(|t| t.value.as_str())
            .collect();

        assert_eq!(terminals, vec!["int", "suma", "=", "x", "+", "y", ";"]);
    }

    #[test]
    fn foreign_operator_stays_opaque() {
        let statements = recognize("int resta = x - y;");
        let structure = build(&statements).expect("declaración válida");

        let terminals: Vec<&str> = structure.parse_tree.children[0]
            .children
            .iter()
            .map(|t| t.value.as_str())
            .collect();

        assert_eq!(terminals, vec!["int", "resta", "=", "x - y", ";"]);
    }

    #[test]
    fn non_canonical_shapes_keep_an_empty_node() {
        let statements = recognize("while (x < 10) {\nint x = 1;");
        let structure = build(&statements).expect("hay sentencias");

        assert_eq!(structure.parse_tree.children.len(), 2);
        assert!(structure.parse_tree.children[0].children.is_empty());
        assert_eq!(structure.derivation_steps.len(), 1);
    }

    #[test]
    fn steps_are_numbered_sequentially() {
        let statements = recognize("int x = 1;\nint y = 2;\nprint x;");
        let structure = build(&statements).expect("hay sentencias");

        assert_eq!(
            structure.derivation_steps,
            vec![
                "1. Declaration -> int x = 1 ;",
                "2. Declaration -> int y = 2 ;",
                "3. Print -> print x ;",
            ]
        );
    }
}
