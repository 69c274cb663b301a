use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use stercus_core::config::{DATA_SIZE, MAX_CALL_DEPTH};
use stercus_core::{Config, FunctionTable, emit_c, interpret_table, parse, text};
use tracing::{Level, debug, info};

/// Interpreter and C translator for the Stercus language.
#[derive(Parser, Debug)]
#[command(name = "stercus", version, about, long_about = None)]
struct Cli {
    #[arg(short, long, help = "Source file (reads stdin when omitted)")]
    input: Option<PathBuf>,

    #[arg(short, long, help = "Output file (writes stdout when omitted)")]
    output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "run",
        help = "What to do with the input: run, c, table, text"
    )]
    emit: String,

    #[arg(
        long,
        help = "Treat the input as a JSON function table instead of source"
    )]
    from_table: bool,

    #[arg(
        long,
        value_name = "COMPILER",
        help = "After emitting C, build it with this compiler (e.g. cc)"
    )]
    cc: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        requires = "cc",
        help = "Executable produced by --cc (defaults to the output path without extension)"
    )]
    binary: Option<PathBuf>,

    #[arg(long, default_value_t = DATA_SIZE, help = "Number of memory cells")]
    data_size: usize,

    #[arg(
        long,
        default_value_t = MAX_CALL_DEPTH,
        help = "Interpreter call depth limit"
    )]
    max_call_depth: usize,

    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase log verbosity"
    )]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let config = Config::default()
        .with_data_size(cli.data_size)
        .with_max_call_depth(cli.max_call_depth);

    let source = read_input(cli.input.as_deref())?;

    match cli.emit.as_str() {
        "run" => {
            let table = load_table(&source, cli.from_table)?;
            let stdin = io::stdin().lock();
            match &cli.output {
                Some(path) => {
                    let file = fs::File::create(path).with_context(|| {
                        format!("failed to create output file {}", path.display())
                    })?;
                    interpret_table(&table, stdin, io::BufWriter::new(file), &config)?;
                }
                None => {
                    interpret_table(&table, stdin, io::stdout().lock(), &config)?;
                }
            }
        }
        "c" => {
            if cli.cc.is_some() && cli.output.is_none() {
                bail!("--cc needs --output so the C source can be handed to the compiler");
            }
            let table = load_table(&source, cli.from_table)?;
            let c_source = emit_c(&table, &config)?;
            write_output(cli.output.as_deref(), c_source.as_bytes())?;
            if let (Some(compiler), Some(c_path)) = (&cli.cc, &cli.output) {
                let binary = cli
                    .binary
                    .clone()
                    .unwrap_or_else(|| c_path.with_extension(""));
                build_native(compiler, c_path, &binary)?;
            }
        }
        "table" => {
            let table = load_table(&source, cli.from_table)?;
            let json = table.to_json()?;
            write_output(cli.output.as_deref(), json.as_bytes())?;
        }
        "text" => {
            let program = text::encode(&source);
            write_output(cli.output.as_deref(), program.as_bytes())?;
        }
        other => bail!("unsupported emit format: {other}"),
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read source from stdin")?;
            Ok(buffer)
        }
    }
}

fn load_table(input: &str, from_table: bool) -> Result<FunctionTable> {
    let table = if from_table {
        FunctionTable::from_json(input)?
    } else {
        parse(input)?
    };
    debug!(applications = table.len(), "function table ready");
    Ok(table)
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    let Some(path) = path else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}

fn build_native(compiler: &str, c_path: &Path, binary: &Path) -> Result<()> {
    info!(compiler, source = %c_path.display(), binary = %binary.display(), "invoking C compiler");
    let status = Command::new(compiler)
        .arg(c_path)
        .arg("-o")
        .arg(binary)
        .status()
        .with_context(|| format!("failed to run C compiler {compiler}"))?;
    if !status.success() {
        bail!("C compiler {compiler} exited with {status}");
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::tempdir;

    fn stercus() -> Command {
        Command::cargo_bin("stercus").expect("binary exists")
    }

    #[test]
    fn runs_program() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("hello.sc");
        fs::write(&input_path, "# greet\n[0 72 .] [0 105 .]").expect("write input");

        stercus()
            .arg("--input")
            .arg(&input_path)
            .assert()
            .success()
            .stdout("Hi");
    }

    #[test]
    fn program_reads_stdin() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("echo.sc");
        fs::write(&input_path, "[0 , + .]").expect("write input");

        stercus()
            .arg("--input")
            .arg(&input_path)
            .write_stdin("A")
            .assert()
            .success()
            .stdout("B");
    }

    #[test]
    fn emits_c_source() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("inc.sc");
        fs::write(&input_path, "{inc [$ +]} [0 inc]").expect("write input");
        let output_path = dir.path().join("out/inc.c");

        stercus()
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&output_path)
            .arg("--emit")
            .arg("c")
            .assert()
            .success();

        let c = fs::read_to_string(&output_path).expect("read c");
        assert!(c.contains("void a_inc(unsigned int s0);"));
        assert!(c.contains("int main(void)"));
    }

    #[test]
    fn table_stage_round_trips() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("inc.sc");
        fs::write(&input_path, "{inc [$ +]} [0 64 inc .]").expect("write input");
        let table_path = dir.path().join("inc.json");

        stercus()
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&table_path)
            .arg("--emit")
            .arg("table")
            .assert()
            .success();

        let json = fs::read_to_string(&table_path).expect("read table");
        assert!(json.contains("\"inc\""));

        stercus()
            .arg("--input")
            .arg(&table_path)
            .arg("--from-table")
            .assert()
            .success()
            .stdout("A");
    }

    #[test]
    fn encodes_text() {
        stercus()
            .arg("--emit")
            .arg("text")
            .write_stdin("Hi")
            .assert()
            .success()
            .stdout("[0 72 . 105 .]");
    }

    #[test]
    fn reports_address_out_of_range() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("oob.sc");
        fs::write(&input_path, "[0 65 .] [10000 +]").expect("write input");

        stercus()
            .arg("--input")
            .arg(&input_path)
            .assert()
            .failure()
            .stdout("A")
            .stderr(predicate::str::contains("address 10000 is out of range"));
    }

    #[test]
    fn reports_unbalanced_brackets() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("bad.sc");
        fs::write(&input_path, "[0 65 .] (0 [0 -]").expect("write input");

        stercus()
            .arg("--input")
            .arg(&input_path)
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("unterminated"));
    }

    #[test]
    fn rejects_unknown_emit_format() {
        stercus()
            .arg("--emit")
            .arg("wasm")
            .write_stdin("[0 +]")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unsupported emit format"));
    }

    #[test]
    fn cc_requires_output_file() {
        stercus()
            .arg("--emit")
            .arg("c")
            .arg("--cc")
            .arg("cc")
            .write_stdin("[0 +]")
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("--cc needs --output"));
    }

    fn c_compiler_available() -> bool {
        std::process::Command::new("cc")
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success())
    }

    #[test]
    fn native_build_matches_interpreter() {
        if !c_compiler_available() {
            eprintln!("skipping: no `cc` on PATH");
            return;
        }
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("shift.sc");
        fs::write(
            &input_path,
            "{bump [$ +]} {puts [$ .]} [0 ,] (0 [0 bump puts] [0 ,]) [1 10 .]",
        )
        .expect("write input");
        let c_path = dir.path().join("shift.c");
        let binary_path = dir.path().join("shift-bin");
        let stdin = b"21xyz\0ignored";

        let interpreted = stercus()
            .arg("--input")
            .arg(&input_path)
            .write_stdin(&stdin[..])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(interpreted, b"32yz{\n");

        stercus()
            .arg("--input")
            .arg(&input_path)
            .arg("--emit")
            .arg("c")
            .arg("--output")
            .arg(&c_path)
            .arg("--cc")
            .arg("cc")
            .arg("--binary")
            .arg(&binary_path)
            .assert()
            .success();

        Command::new(&binary_path)
            .write_stdin(&stdin[..])
            .assert()
            .success()
            .stdout(interpreted);
    }

    #[test]
    fn reports_missing_compiler() {
        let dir = tempdir().expect("tempdir");
        let output_path = dir.path().join("prog.c");

        stercus()
            .arg("--emit")
            .arg("c")
            .arg("--output")
            .arg(&output_path)
            .arg("--cc")
            .arg("definitely-not-a-c-compiler")
            .write_stdin("[0 +]")
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to run C compiler"));

        assert!(output_path.exists(), "C output was not written");
    }
}
