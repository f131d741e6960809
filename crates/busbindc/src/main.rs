use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use busbind_contracts::BUSBINDC_REPORT_SCHEMA_VERSION;
use busbindc::compile::{compile_document, CompileOptions};
use busbindc::diagnostics;

#[derive(Parser)]
#[command(name = "busbindc")]
#[command(about = "Interface-description to binding-model compiler.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Compile an introspection document into a binding-model JSON document.
    Compile {
        #[arg(long)]
        input: PathBuf,
        /// Where to write the model; stdout when absent.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Emit the machine-readable report on stdout instead of rendering
        /// diagnostics on stderr.
        #[arg(long)]
        report_json: bool,
    },
}

#[derive(Debug, Serialize)]
struct BusbindcToolReport {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    r#in: String,
    diagnostics_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<diagnostics::Diagnostic>,
    exit_code: u8,
}

fn main() -> std::process::ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Compile {
            input,
            out,
            report_json,
        } => {
            let xml = std::fs::read_to_string(&input)
                .with_context(|| format!("read input {}", input.display()))?;

            let output = match compile_document(&xml, &CompileOptions::default()) {
                Ok(output) => output,
                Err(err) => {
                    if report_json {
                        let report = BusbindcToolReport {
                            schema_version: BUSBINDC_REPORT_SCHEMA_VERSION,
                            command: "compile",
                            ok: false,
                            r#in: input.display().to_string(),
                            diagnostics_count: 1,
                            diagnostics: vec![diagnostics::Diagnostic::error(
                                "BBC-COMPILE-0001",
                                err.kind.stage(),
                                err.message.clone(),
                                err.line,
                            )],
                            exit_code: 1,
                        };
                        print_json(&report)?;
                        return Ok(std::process::ExitCode::from(1));
                    }
                    eprintln!("error: {err}");
                    return Ok(std::process::ExitCode::from(1));
                }
            };

            if report_json {
                let report = BusbindcToolReport {
                    schema_version: BUSBINDC_REPORT_SCHEMA_VERSION,
                    command: "compile",
                    ok: output.report.ok,
                    r#in: input.display().to_string(),
                    diagnostics_count: output.report.diagnostics.len(),
                    diagnostics: output.report.diagnostics.clone(),
                    exit_code: 0,
                };
                print_json(&report)?;
            } else {
                for diagnostic in &output.report.diagnostics {
                    eprintln!("{diagnostic}");
                }
            }

            let model = serde_json::to_string_pretty(&output.model)?;
            match out {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("create output dir: {}", parent.display()))?;
                    }
                    std::fs::write(&path, model.as_bytes())
                        .with_context(|| format!("write: {}", path.display()))?;
                }
                None => println!("{model}"),
            }
            Ok(std::process::ExitCode::SUCCESS)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
