//! Pruebas de extremo a extremo sobre la corrida completa.

use codewizard::pipeline::{self, ParseOutcome, Phase};

const SUM_PROGRAM: &str = "int x = 10;\nint y = 20;\nint suma = x + y;\nprint suma;";

#[test]
fn sum_program_flows_through_every_phase() {
    let result = pipeline::compile(SUM_PROGRAM);

    assert!(result.success);
    assert_eq!(result.phase, "all");
    assert_eq!(result.source_lines, 4);

    let phases = &result.phases;
    assert!(phases.lexer.success);
    assert!(phases.lexer.statistics.total_tokens > 0);

    match &phases.parsetree {
        ParseOutcome::Built(structure) => {
            assert_eq!(structure.parse_tree.children.len(), 4);
            assert_eq!(structure.derivation_steps.len(), 4);
        }
        ParseOutcome::Failed { .. } => panic!("el programa es sintácticamente válido"),
    }

    assert!(phases.semantic.success);
    assert!(phases.semantic.errors.is_empty());
    assert_eq!(phases.semantic.symbol_table.len(), 3);

    assert!(phases.ir.statistics.total_instructions > 0);
    assert!(phases
        .ir
        .ir_code
        .iter()
        .any(|instruction| instruction.contains("t1 + t2") || instruction.contains("x + y")));

    assert!(phases.codegen.assembly_code.contains(".data"));
    assert!(phases.codegen.assembly_code.contains("_start:"));

    assert_eq!(phases.execution.output, "30");
    assert_eq!(phases.execution.exit_code, 0);
}

#[test]
fn semantic_faults_do_not_block_later_phases() {
    let source = "int x = 1;\nint x = 2;\nprint y;";
    let result = pipeline::compile(source);

    assert!(result.success);
    assert!(!result.phases.semantic.success);
    assert_eq!(result.phases.semantic.errors.len(), 2);

    // El intérprete corre de todos modos y aplica sus propias reglas
    assert_eq!(result.phases.execution.output, "undefined variable: y");
    assert_eq!(result.phases.execution.variables["x"], 2);
}

#[test]
fn unrecognizable_source_fails_only_the_parse_phase() {
    let result = pipeline::compile("} else {");

    assert!(result.success);
    match &result.phases.parsetree {
        ParseOutcome::Failed { error, .. } => {
            assert_eq!(error, "No valid statements found in source code");
        }
        ParseOutcome::Built(_) => panic!("no hay sentencias reconocibles"),
    }

    assert!(result.phases.lexer.success);
    assert!(result.phases.execution.output_lines.is_empty());
}

#[test]
fn phase_reports_carry_their_own_envelope() {
    for name in &["lexer", "parsetree", "semantic", "ir", "codegen", "run"] {
        let phase: Phase = name.parse().expect("nombre de fase válido");
        let report = pipeline::run(phase, SUM_PROGRAM).expect("reporte serializable");

        let expected = match *name {
            "run" => "execution",
            other => other,
        };
        assert_eq!(report["phase"], expected, "fase {}", name);
        assert_eq!(report["success"], true, "fase {}", name);
    }
}

#[test]
fn repeated_runs_are_idempotent() {
    let mut first =
        serde_json::to_value(pipeline::compile(SUM_PROGRAM)).expect("reporte serializable");
    let mut second =
        serde_json::to_value(pipeline::compile(SUM_PROGRAM)).expect("reporte serializable");

    first["compilation_timestamp"] = 0.into();
    second["compilation_timestamp"] = 0.into();
    assert_eq!(first, second);
}

#[test]
fn token_order_is_stable_by_position() {
    let report = pipeline::run(Phase::Lexer, SUM_PROGRAM).expect("reporte serializable");
    let tokens = report["tokens"].as_array().expect("lista de tokens");

    let positions: Vec<(u64, u64)> = tokens
        .iter()
        .map(|token| {
            (
                token["line"].as_u64().expect("línea"),
                token["column"].as_u64().expect("columna"),
            )
        })
        .collect();

    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);
}

#[test]
fn loops_produce_labels_and_array_faults_are_reported() {
    let source = "int arr[5];\narr[9] = 1;\nfor (int i = 0; i < 3; i++) {\nwhile (x < 10) {";
    let result = pipeline::compile(source);

    let errors = &result.phases.semantic.errors;
    assert!(errors
        .iter()
        .any(|diagnostic| diagnostic.message.contains("out of bounds")));

    assert_eq!(result.phases.ir.statistics.labels_used, 5);
    assert!(result
        .phases
        .ir
        .ir_code
        .iter()
        .any(|instruction| instruction.ends_with(':')));
    assert!(!result.phases.ir.basic_blocks.is_empty());
}
