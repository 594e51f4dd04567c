//! Punto de entrada ("driver").
//!
//! Este módulo expone una CLI que lee un fuente, corre la fase pedida
//! (o la corrida completa) y escribe el reporte en JSON.

use anyhow::{self, bail, Context};
use clap::{self, crate_version, Arg};
use codewizard::pipeline::{self, Phase};

use std::{fs, str::FromStr};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = clap::App::new("CodeWizard compiler")
        .version(crate_version!())
        .arg(
            Arg::new("phase")
                .short('p')
                .long("phase")
                .value_name("PHASE")
                .takes_value(true)
                .default_value("all")
                .possible_values(&[
                    "lexer",
                    "parsetree",
                    "semantic",
                    "ir",
                    "codegen",
                    "run",
                    "all",
                ])
                .about("Compiler phase to run"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .takes_value(true)
                .default_value("-")
                .value_name("FILE")
                .about("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("SOURCE")
                .required(true)
                .value_name("SOURCE")
                .about("Source file to compile"),
        )
        .get_matches();

    // Se extraen argumentos necesarios
    let phase = args.value_of("phase").unwrap();
    let phase = Phase::from_str(&phase).expect("main.rs allowed a bad phase");
    let output = args.value_of("output").unwrap();
    let path = args.value_of("SOURCE").unwrap();

    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file: {}", path))?;
    if source.trim().is_empty() {
        bail!("Source file is empty: {}", path);
    }

    let report = pipeline::run(phase, &source).context("Failed to serialize phase report")?;
    let rendered =
        serde_json::to_string_pretty(&report).context("Failed to render phase report")?;

    match output {
        "-" => println!("{}", rendered),
        path => fs::write(path, rendered + "\n")
            .with_context(|| format!("Failed to write report to: {}", path))?,
    }

    Ok(())
}
