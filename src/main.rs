use std::collections::BTreeMap;
use std::io::{BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Parser as ClapParser, Subcommand};

use druid::ast::Program;
use druid::diagnostic::{ansi::AnsiRenderer, json, registry, Diagnostic};
use druid::interpreter::{FunctionTable, Interpreter, Value};
use druid::parser;

#[derive(ClapParser)]
#[command(name = "druid")]
#[command(about = "Run druid scripts with reactive (derived) variables")]
struct Cli {
    /// Emit results and errors as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script file and print the final program scope
    Run {
        /// Path to a .druid file
        file: PathBuf,
    },
    /// Run inline code and print the final program scope
    Eval {
        /// The code to evaluate
        code: String,
    },
    /// Print the parsed AST as JSON
    Ast {
        /// Path to a .druid file
        file: PathBuf,
    },
    /// Run a script, then re-evaluate on signal identities read from stdin
    Watch {
        /// Path to a .druid file
        file: PathBuf,
    },
    /// Explain an error code
    Explain {
        /// Code such as DRD-R011; lists every code when omitted
        code: Option<String>,
    },
}

type Values = BTreeMap<String, Option<Value>>;

fn main() -> ExitCode {
    druid::init_tracing();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run { file } => read(file).and_then(|src| run_source(&src, cli.json)),
        Commands::Eval { code } => run_source(code, cli.json),
        Commands::Ast { file } => read(file).and_then(|src| print_ast(&src)),
        Commands::Watch { file } => read(file).and_then(|src| watch(&src, cli.json)),
        Commands::Explain { code } => explain(code.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(d) => {
            report(&d, cli.json);
            ExitCode::FAILURE
        }
    }
}

fn report(d: &Diagnostic, as_json: bool) {
    if as_json {
        eprintln!("{}", json::render(d));
    } else {
        let renderer = AnsiRenderer { use_color: std::io::stderr().is_terminal() };
        eprint!("{}", renderer.render(d));
    }
}

fn read(path: &Path) -> Result<String, Diagnostic> {
    std::fs::read_to_string(path)
        .map_err(|e| Diagnostic::error(format!("cannot read {}: {}", path.display(), e)))
}

fn parse(source: &str) -> Result<Program, Diagnostic> {
    parser::parse_source(source).map_err(|e| Diagnostic::from(&e).with_source(source))
}

fn run_source(source: &str, as_json: bool) -> Result<(), Diagnostic> {
    let program = parse(source)?;
    let functions = FunctionTable::from_program(&program).map_err(|e| Diagnostic::from(&e))?;
    let mut interpreter = Interpreter::new(&functions);
    interpreter
        .execute(&program.statements)
        .map_err(|e| Diagnostic::from(&e))?;
    print_values(&interpreter.values(), as_json);
    Ok(())
}

fn print_ast(source: &str) -> Result<(), Diagnostic> {
    let program = parse(source)?;
    let json = serde_json::to_string_pretty(&program)
        .map_err(|e| Diagnostic::error(format!("serialization error: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// How long `watch` waits for a notification before checking whether stdin
/// is exhausted.
const WATCH_POLL: Duration = Duration::from_millis(50);

fn watch(source: &str, as_json: bool) -> Result<(), Diagnostic> {
    let program = parse(source)?;
    let functions = FunctionTable::from_program(&program).map_err(|e| Diagnostic::from(&e))?;
    let mut interpreter = Interpreter::new(&functions);
    interpreter
        .execute(&program.statements)
        .map_err(|e| Diagnostic::from(&e))?;
    print_values(&interpreter.values(), as_json);

    for identity in interpreter.signals().identities() {
        eprintln!("watching {}", identity);
    }

    // stdin is read on its own thread and delivered like any other producer.
    let sender = interpreter.signal_sender();
    let reader = thread::spawn(move || -> std::io::Result<()> {
        for line in std::io::stdin().lock().lines() {
            let line = line?;
            let identity = line.trim();
            if !identity.is_empty() && !sender.notify(identity) {
                break;
            }
        }
        Ok(())
    });

    loop {
        let finished = reader.is_finished();
        match interpreter.wait_signal(WATCH_POLL).map_err(|e| Diagnostic::from(&e))? {
            Some(identity) => {
                if interpreter.signals().get(&identity).is_none() {
                    report(
                        &Diagnostic::warning(format!("no signal '{}' is registered", identity))
                            .with_note("nothing depends on it, the scope is unchanged"),
                        as_json,
                    );
                }
                print_values(&interpreter.values(), as_json);
            }
            None if finished => break,
            None => {}
        }
    }

    match reader.join() {
        Ok(result) => result.map_err(|e| Diagnostic::error(format!("cannot read stdin: {}", e))),
        Err(_) => Err(Diagnostic::error("stdin reader panicked")),
    }
}

fn explain(code: Option<&str>) -> Result<(), Diagnostic> {
    match code {
        Some(code) => {
            let entry = registry::lookup(code)
                .ok_or_else(|| Diagnostic::error(format!("unknown error code '{}'", code)))?;
            print!("{}", entry.long);
        }
        None => {
            for entry in registry::REGISTRY {
                println!("{}  {}", entry.code, entry.short);
            }
        }
    }
    Ok(())
}

fn print_values(values: &Values, as_json: bool) {
    if as_json {
        match serde_json::to_string(values) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Serialization error: {}", e),
        }
        return;
    }
    for (name, value) in values {
        match value {
            Some(Value::String(s)) => println!("{} = {:?}", name, s),
            Some(v) => println!("{} = {}", name, v),
            None => println!("{} = <unset>", name),
        }
    }
}
