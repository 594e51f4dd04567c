//! Análisis semántico.
//!
//! Recorre la secuencia de sentencias en orden, manteniendo una tabla
//! de símbolos con ámbitos y una tabla de funciones. Los diagnósticos
//! se acumulan sin detener el análisis: la bandera de éxito de la
//! fase se deriva de que la lista quede vacía.
//!
//! # Resolución de nombres
//! La severidad de la búsqueda difiere a propósito según la forma:
//! una declaración verifica unicidad **solo en el ámbito actual**,
//! mientras que una asignación o una impresión aceptan un símbolo
//! declarado en **cualquier** ámbito. Son dos políticas distintas y
//! ambas están cubiertas por pruebas; unificarlas cambiaría qué
//! programas se aceptan.
//!
//! # Ámbitos
//! La pila de ámbitos inicia en `"global"` y una definición de
//! función empuja el ámbito con su nombre. Como el reconocedor es
//! por línea y no hay evento de cierre de bloque, la pila nunca se
//! desempila: todas las sentencias posteriores a una definición
//! pertenecen a su ámbito. Es una simplificación conocida del
//! modelo de lenguaje plano.

use serde::Serialize;

use crate::recognize::Statement;
use crate::source;

/// Palabras reservadas que no cuentan como identificador dentro de
/// una expresión.
const KEYWORDS: &[&str] = &[
    "int", "float", "string", "bool", "true", "false", "print", "return",
];

/// Clase de diagnóstico semántico.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Redeclaration,
    TypeMismatch,
    UndeclaredVariable,
    ArrayBounds,
    FunctionRedefinition,
    UndefinedFunction,
}

impl DiagnosticKind {
    fn as_str(&self) -> &'static str {
        use DiagnosticKind::*;

        match self {
            Redeclaration => "redeclaration",
            TypeMismatch => "type_mismatch",
            UndeclaredVariable => "undeclared_variable",
            ArrayBounds => "array_bounds",
            FunctionRedefinition => "function_redefinition",
            UndefinedFunction => "undefined_function",
        }
    }
}

/// Un diagnóstico puntual, asociado a la línea física de la
/// sentencia que lo provocó.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
}

/// Clase de símbolo dentro de la tabla.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolCategory {
    Variable,
    Array,
}

/// Entrada de la tabla de símbolos.
///
/// Invariante: a lo sumo un símbolo activo por par (nombre, ámbito);
/// la redeclaración produce un diagnóstico y no reemplaza la entrada.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Symbol {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub scope: String,
    pub line: usize,
    pub initialized: bool,
    pub category: SymbolCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Entrada de la tabla de funciones. Los nombres son únicos en todo
/// el programa; no hay sobrecarga.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FunctionEntry {
    pub name: String,
    pub return_type: String,
    pub parameters: String,
    pub line: usize,
}

/// Sub-resumen derivado: solo los diagnósticos de tipos.
#[derive(Clone, Debug, Serialize)]
pub struct TypeChecking {
    pub passed: bool,
    pub issues: Vec<Diagnostic>,
}

/// Resultado completo de la fase semántica.
#[derive(Clone, Debug, Serialize)]
pub struct SemanticReport {
    pub phase: &'static str,
    pub success: bool,
    pub symbol_table: Vec<Symbol>,
    pub function_table: Vec<FunctionEntry>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub scopes: Vec<String>,
    pub type_checking: TypeChecking,
}

/// Pila de ámbitos, sembrada con `"global"`.
///
/// Solo se empuja: no existe evento de salida de función en el
/// flujo plano de sentencias.
struct ScopeStack {
    names: Vec<String>,
}

impl ScopeStack {
    fn new() -> Self {
        ScopeStack {
            names: vec![String::from("global")],
        }
    }

    fn current(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or("global")
    }

    fn enter(&mut self, name: &str) {
        self.names.push(name.to_owned());
    }
}

/// Analiza la secuencia de sentencias y produce el reporte.
pub fn analyze(statements: &[Statement]) -> SemanticReport {
    let mut analyzer = Analyzer {
        symbols: Vec::new(),
        functions: Vec::new(),
        errors: Vec::new(),
        scopes: ScopeStack::new(),
    };

    for statement in statements {
        analyzer.check(statement);
    }

    analyzer.into_report()
}

struct Analyzer {
    symbols: Vec<Symbol>,
    functions: Vec<FunctionEntry>,
    errors: Vec<Diagnostic>,
    scopes: ScopeStack,
}

impl Analyzer {
    fn check(&mut self, statement: &Statement) {
        use Statement::*;

        match statement {
            Declaration {
                data_type,
                variable,
                value,
                line,
            } => self.declaration(data_type, variable, value, *line),

            ArrayDeclaration {
                data_type,
                variable,
                size,
                line,
            } => self.array_declaration(data_type, variable, *size, *line),

            ArrayAssignment {
                variable,
                index,
                line,
                ..
            } => self.array_assignment(variable, *index, *line),

            FunctionDefinition {
                return_type,
                name,
                parameters,
                line,
            } => self.function_definition(return_type, name, parameters, *line),

            FunctionCall { name, line, .. } => self.function_call(name, *line),

            Assignment { variable, line, .. } => self.assignment(variable, *line),

            Print {
                expression, line, ..
            } => self.print(expression, *line),

            // Los encabezados de control y las líneas no reconocidas
            // no introducen ni consultan símbolos
            WhileHeader { .. } | ForHeader { .. } | IfHeader { .. } | Return { .. }
            | Unrecognized { .. } => {}
        }
    }

    fn declaration(&mut self, data_type: &str, variable: &str, value: &str, line: usize) {
        if self.lookup_in_current_scope(variable).is_some() {
            self.error(
                DiagnosticKind::Redeclaration,
                format!(
                    "Variable '{}' already declared in scope '{}'",
                    variable,
                    self.scopes.current()
                ),
                line,
            );
            return;
        }

        if let Err(actual) = self.check_type(data_type, value) {
            self.error(
                DiagnosticKind::TypeMismatch,
                format!(
                    "Cannot assign {} to {} variable '{}'",
                    actual, data_type, variable
                ),
                line,
            );
        }

        // Se inserta aún con tipo incompatible, para que las
        // referencias posteriores resuelvan
        self.symbols.push(Symbol {
            name: variable.to_owned(),
            data_type: data_type.to_owned(),
            scope: self.scopes.current().to_owned(),
            line,
            initialized: true,
            category: SymbolCategory::Variable,
            size: None,
            value: Some(value.to_owned()),
        });
    }

    fn array_declaration(&mut self, data_type: &str, variable: &str, size: usize, line: usize) {
        if self.lookup_in_current_scope(variable).is_some() {
            self.error(
                DiagnosticKind::Redeclaration,
                format!(
                    "Array '{}' already declared in scope '{}'",
                    variable,
                    self.scopes.current()
                ),
                line,
            );
            return;
        }

        self.symbols.push(Symbol {
            name: variable.to_owned(),
            data_type: data_type.to_owned(),
            scope: self.scopes.current().to_owned(),
            line,
            initialized: false,
            category: SymbolCategory::Array,
            size: Some(size),
            value: None,
        });
    }

    fn array_assignment(&mut self, variable: &str, index: i64, line: usize) {
        let array = self
            .symbols
            .iter()
            .find(|symbol| symbol.name == variable && symbol.category == SymbolCategory::Array);

        match array {
            None => self.error(
                DiagnosticKind::UndeclaredVariable,
                format!("Array '{}' not declared", variable),
                line,
            ),

            Some(array) => {
                let size = array.size.unwrap_or(0);
                if index < 0 || index as usize >= size {
                    self.error(
                        DiagnosticKind::ArrayBounds,
                        format!(
                            "Array index {} out of bounds for array '{}' of size {}",
                            index, variable, size
                        ),
                        line,
                    );
                }
            }
        }
    }

    fn function_definition(&mut self, return_type: &str, name: &str, parameters: &str, line: usize) {
        if self.functions.iter().any(|func| func.name == name) {
            self.error(
                DiagnosticKind::FunctionRedefinition,
                format!("Function '{}' already defined", name),
                line,
            );
            return;
        }

        self.functions.push(FunctionEntry {
            name: name.to_owned(),
            return_type: return_type.to_owned(),
            parameters: parameters.to_owned(),
            line,
        });

        // Toda sentencia posterior pertenece al ámbito de la función
        self.scopes.enter(name);
    }

    fn function_call(&mut self, name: &str, line: usize) {
        if !self.functions.iter().any(|func| func.name == name) {
            self.error(
                DiagnosticKind::UndefinedFunction,
                format!("Function '{}' not defined", name),
                line,
            );
        }
    }

    fn assignment(&mut self, variable: &str, line: usize) {
        // Búsqueda por nombre en cualquier ámbito, deliberadamente
        // más laxa que la verificación de la declaración
        if self.lookup_any_scope(variable).is_none() {
            self.error(
                DiagnosticKind::UndeclaredVariable,
                format!("Variable '{}' not declared", variable),
                line,
            );
        }
    }

    fn print(&mut self, expression: &str, line: usize) {
        for name in expression_identifiers(expression) {
            if self.lookup_any_scope(&name).is_none() {
                self.error(
                    DiagnosticKind::UndeclaredVariable,
                    format!("Variable '{}' in print statement not declared", name),
                    line,
                );
            }
        }
    }

    /// Verifica la compatibilidad del lado derecho con el tipo
    /// declarado; en caso de incompatibilidad retorna el tipo real.
    fn check_type(&self, expected: &str, value: &str) -> Result<(), String> {
        if value.starts_with('"') && value.ends_with('"') {
            return if expected == "string" {
                Ok(())
            } else {
                Err(String::from("string"))
            };
        }

        if value == "true" || value == "false" {
            return if expected == "bool" {
                Ok(())
            } else {
                Err(String::from("bool"))
            };
        }

        if source::is_numeric(value) {
            let actual = if value.contains('.') { "float" } else { "int" };
            return if expected == actual {
                Ok(())
            } else {
                Err(actual.to_owned())
            };
        }

        // Expresión con identificadores: todos deben existir y
        // coincidir con el tipo objetivo
        for name in expression_identifiers(value) {
            match self.lookup_any_scope(&name) {
                None => return Err(String::from("undefined")),
                Some(symbol) if symbol.data_type != expected => {
                    return Err(symbol.data_type.clone())
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Búsqueda restringida al ámbito actual; gobierna la unicidad
    /// de las declaraciones.
    fn lookup_in_current_scope(&self, name: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|symbol| symbol.name == name && symbol.scope == self.scopes.current())
    }

    /// Búsqueda por nombre sin calificar por ámbito; gobierna los
    /// usos (asignación, impresión, expresiones).
    fn lookup_any_scope(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }

    fn error(&mut self, kind: DiagnosticKind, message: String, line: usize) {
        self.errors.push(Diagnostic {
            kind,
            message,
            line,
        });
    }

    fn into_report(self) -> SemanticReport {
        let issues: Vec<Diagnostic> = self
            .errors
            .iter()
            .filter(|diagnostic| diagnostic.kind.as_str().contains("type"))
            .cloned()
            .collect();

        SemanticReport {
            phase: "semantic",
            success: self.errors.is_empty(),
            symbol_table: self.symbols,
            function_table: self.functions,
            type_checking: TypeChecking {
                passed: issues.is_empty(),
                issues,
            },
            errors: self.errors,
            warnings: Vec::new(),
            scopes: self.scopes.names,
        }
    }
}

/// Identificadores de una expresión, sin palabras reservadas.
fn expression_identifiers(expression: &str) -> Vec<String> {
    source::identifiers(expression)
        .into_iter()
        .filter(|name| !KEYWORDS.contains(&name.as_str()))
        .collect()
}
