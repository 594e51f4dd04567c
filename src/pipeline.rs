//! Orquestación de las fases del compilador.
//!
//! Cada fase es una función pura sobre el fuente o sobre las
//! sentencias reconocidas, y puede pedirse de forma individual o como
//! corrida completa. La corrida completa nunca se detiene en una fase
//! fallida: el resultado agrega el reporte de cada fase con su propia
//! bandera `success`, de modo que una falla sintáctica convive con la
//! salida del intérprete.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::codegen::{self, CodegenReport};
use crate::exec::{self, ExecutionReport};
use crate::ir::{self, IrReport};
use crate::lex::{self, TokenStream};
use crate::parse::{self, ParseStructure};
use crate::recognize;
use crate::semantic::{self, SemanticReport};

/// Fase solicitada por el usuario.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Lexer,
    ParseTree,
    Semantic,
    Ir,
    Codegen,
    Execution,
    All,
}

/// El nombre de fase no corresponde a ninguna fase conocida.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Unknown phase: {0}")]
pub struct UnknownPhase(String);

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "lexer" => Ok(Phase::Lexer),
            "parsetree" => Ok(Phase::ParseTree),
            "semantic" => Ok(Phase::Semantic),
            "ir" => Ok(Phase::Ir),
            "codegen" => Ok(Phase::Codegen),
            "run" => Ok(Phase::Execution),
            "all" => Ok(Phase::All),
            other => Err(UnknownPhase(other.to_owned())),
        }
    }
}

/// Reporte sintáctico con la falla representada como dato.
///
/// Las demás fases son totales; la sintáctica es la única que puede
/// rechazar el fuente, y su rechazo viaja dentro del resultado con el
/// mismo sobre `phase`/`success` que los reportes exitosos.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ParseOutcome {
    Built(ParseStructure),
    Failed {
        phase: &'static str,
        success: bool,
        error: String,
    },
}

/// Reporte agregado de la corrida completa.
#[derive(Clone, Debug, Serialize)]
pub struct CompileResult {
    pub phase: &'static str,
    pub success: bool,
    pub phases: PhaseReports,
    pub source_lines: usize,
    pub compilation_timestamp: u128,
}

#[derive(Clone, Debug, Serialize)]
pub struct PhaseReports {
    pub lexer: TokenStream,
    pub parsetree: ParseOutcome,
    pub semantic: SemanticReport,
    pub ir: IrReport,
    pub codegen: CodegenReport,
    pub execution: ExecutionReport,
}

/// Ejecuta la fase pedida y serializa su reporte.
pub fn run(phase: Phase, source: &str) -> Result<Value, serde_json::Error> {
    match phase {
        Phase::Lexer => serde_json::to_value(lex::tokenize(source)),
        Phase::ParseTree => serde_json::to_value(parse_outcome(source)),
        Phase::Semantic => serde_json::to_value(semantic::analyze(&recognize::recognize(source))),
        Phase::Ir => serde_json::to_value(ir::generate(&recognize::recognize(source))),
        Phase::Codegen => serde_json::to_value(codegen::generate(&recognize::recognize(source))),
        Phase::Execution => serde_json::to_value(exec::execute(source)),
        Phase::All => serde_json::to_value(compile(source)),
    }
}

/// Corre todas las fases sobre el mismo fuente.
pub fn compile(source: &str) -> CompileResult {
    let statements = recognize::recognize(source);

    CompileResult {
        phase: "all",
        success: true,
        phases: PhaseReports {
            lexer: lex::tokenize(source),
            parsetree: parse_outcome(source),
            semantic: semantic::analyze(&statements),
            ir: ir::generate(&statements),
            codegen: codegen::generate(&statements),
            execution: exec::execute(source),
        },
        source_lines: source.lines().count(),
        compilation_timestamp: timestamp_millis(),
    }
}

fn parse_outcome(source: &str) -> ParseOutcome {
    match parse::build(&recognize::recognize(source)) {
        Ok(structure) => ParseOutcome::Built(structure),
        Err(error) => ParseOutcome::Failed {
            phase: "parsetree",
            success: false,
            error: error.to_string(),
        },
    }
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}
