//! REPL (Read-Eval-Print Loop) for PineTree, and the host bindings shared
//! with `pinetree run`

use crate::error::report_error;
use crate::interp::{Callable, Engine, EngineConfig, EngineError, InterpResult, RuntimeError, Value};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const PROMPT: &str = "PineTree> ";
const HISTORY_FILE: &str = ".pinetree_history";

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    config: EngineConfig,
    engine: Engine,
    history_path: Option<PathBuf>,
    /// Directory whose scripts run before the first prompt and after `:reset`
    preload_dir: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(config: EngineConfig) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let engine = prepared_engine(config.clone());

        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            config,
            engine,
            history_path,
            preload_dir: None,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run every script in `dir` now and again after each `:reset`
    pub fn preload(&mut self, dir: &Path) {
        self.preload_dir = Some(dir.to_path_buf());
        self.run_preload();
    }

    fn run_preload(&mut self) {
        let Some(dir) = self.preload_dir.clone() else {
            return;
        };
        let extension = self.config.module_extension.clone();
        if let Err(err) = preload_scripts(&mut self.engine, &dir, &extension) {
            eprintln!("Error: cannot read {}: {err}", dir.display());
        }
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("PineTree REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    match eval_line(&mut self.engine, line) {
                        Ok(Some(text)) => println!("{text}"),
                        Ok(None) => {}
                        Err(message) => eprintln!("{message}"),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :); returns true to exit
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                print_help();
                false
            }
            ":reset" => {
                self.engine = prepared_engine(self.config.clone());
                self.run_preload();
                println!("Engine reset.");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }
}

fn print_help() {
    println!("PineTree REPL Commands:");
    println!("  :help, :h, :?   Show this help");
    println!("  :quit, :q       Exit the REPL");
    println!("  :reset          Discard all definitions and variables");
    println!();
    println!("You can enter:");
    println!("  - Expressions: 1 + 2, \"a\" * 3");
    println!("  - Declarations: var x = 5; class Point {{ int x; int y; }}");
    println!("  - Methods: int twice(int n) {{ return n * 2; }}");
    println!();
    println!("Host bindings:");
    println!("  console.println(x)   Print values with newline");
    println!("  console.print(x)     Print values without newline");
    println!("  console.readln()     Read a line from standard input");
    println!("  Math.sqrt(x)         Square root (also abs, pow)");
    println!("  type(x)              Type name of a value");
    println!("  exit()               Leave the process");
}

/// Engine with the console bindings installed
pub fn prepared_engine(config: EngineConfig) -> Engine {
    let mut engine = Engine::with_config(config);
    install_prelude(&mut engine);
    engine
}

/// Evaluate one line of input; a missing trailing `;` is supplied.
/// Returns the display text of a non-null result.
pub fn eval_line(engine: &mut Engine, input: &str) -> Result<Option<String>, String> {
    let source = if input.ends_with(';') || input.ends_with('}') {
        input.to_string()
    } else {
        format!("{input};")
    };

    let value = engine.execute(&source).map_err(|err| match err {
        EngineError::Compile(err) => err.to_string(),
        EngineError::Runtime(err) => err.to_string(),
    })?;
    if value.is_null() {
        return Ok(None);
    }
    engine.display(&value).map(Some).map_err(|err| err.to_string())
}

/// Execute each `*.<extension>` file in `dir`, in file-name order.
/// A failing script is reported and skipped; returns the scripts that ran.
pub fn preload_scripts(engine: &mut Engine, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut scripts: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == extension))
        .collect();
    scripts.sort();

    let mut loaded = Vec::new();
    for path in scripts {
        let source = fs::read_to_string(&path)?;
        let filename = path.display().to_string();
        match engine.execute(&source) {
            Ok(_) => {
                tracing::debug!(script = %filename, "preloaded");
                loaded.push(path);
            }
            Err(EngineError::Compile(err)) => report_error(&filename, &source, &err),
            Err(EngineError::Runtime(err)) => eprintln!("{filename}: {err}"),
        }
    }
    Ok(loaded)
}

/// Bind `console`, `Math`, `type` and `exit`
pub fn install_prelude(engine: &mut Engine) {
    engine.set_namespace(
        "console",
        vec![
            Callable::native("println", None, |engine, args| {
                let line = join_display(engine, &args)?;
                write_out(&format!("{line}\n"))
            }),
            Callable::native("print", None, |engine, args| {
                let text = join_display(engine, &args)?;
                write_out(&text)
            }),
            Callable::native("readln", Some(0), |_, _| {
                let mut line = String::new();
                io::stdin()
                    .lock()
                    .read_line(&mut line)
                    .map_err(|e| RuntimeError::host(e.to_string()))?;
                Ok(Value::string(line.trim_end_matches(['\r', '\n'])))
            }),
        ],
    );
    engine.set_namespace(
        "Math",
        vec![
            Callable::native("sqrt", Some(1), |_, args| Ok(Value::float(number(&args, 0)?.sqrt()))),
            Callable::native("abs", Some(1), |_, args| match args.first().and_then(Value::as_int) {
                Some(n) => Ok(Value::int(n.wrapping_abs())),
                None => Ok(Value::float(number(&args, 0)?.abs())),
            }),
            Callable::native("pow", Some(2), |_, args| {
                Ok(Value::float(number(&args, 0)?.powf(number(&args, 1)?)))
            }),
        ],
    );
    engine.set_native("type", Some(1), |_, args| {
        Ok(Value::string(args.first().map(Value::type_name).unwrap_or("null")))
    });
    engine.set_native("exit", None, |_, args| {
        let code = args.first().and_then(Value::as_int).unwrap_or(0);
        std::process::exit(code as i32)
    });
}

fn number(args: &[Value], index: usize) -> InterpResult<f64> {
    match args.get(index) {
        Some(arg) => arg
            .as_float()
            .ok_or_else(|| RuntimeError::type_error("float", arg.type_name())),
        None => Err(RuntimeError::type_error("float", "null")),
    }
}

fn join_display(engine: &mut Engine, args: &[Value]) -> InterpResult<String> {
    let parts = args
        .iter()
        .map(|arg| engine.display(arg))
        .collect::<InterpResult<Vec<_>>>()?;
    Ok(parts.join(" "))
}

fn write_out(text: &str) -> InterpResult<Value> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(|e| RuntimeError::host(e.to_string()))?;
    Ok(Value::Null)
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        prepared_engine(EngineConfig::default())
    }

    #[test]
    fn test_constants() {
        assert_eq!(PROMPT, "PineTree> ");
        assert_eq!(HISTORY_FILE, ".pinetree_history");
    }

    #[test]
    fn test_eval_line_supplies_semicolon() {
        let mut engine = engine();
        assert_eq!(eval_line(&mut engine, "1 + 2"), Ok(Some("3".to_string())));
        assert_eq!(eval_line(&mut engine, "1 + 2;"), Ok(Some("3".to_string())));
    }

    #[test]
    fn test_eval_line_null_prints_nothing() {
        let mut engine = engine();
        assert_eq!(eval_line(&mut engine, "var x = 5"), Ok(None));
        assert_eq!(eval_line(&mut engine, "x"), Ok(Some("5".to_string())));
    }

    #[test]
    fn test_eval_line_keeps_definitions() {
        let mut engine = engine();
        assert_eq!(
            eval_line(&mut engine, "int twice(int n) { return n * 2; }"),
            Ok(None)
        );
        assert_eq!(eval_line(&mut engine, "twice(21)"), Ok(Some("42".to_string())));
    }

    #[test]
    fn test_eval_line_reports_errors() {
        let mut engine = engine();
        let err = eval_line(&mut engine, "undefined_thing").unwrap_err();
        assert!(err.contains("undefined_thing"));
        let err = eval_line(&mut engine, "var = ").unwrap_err();
        assert!(err.starts_with("Parser error"));
    }

    #[test]
    fn test_eval_line_uses_to_string() {
        let mut engine = engine();
        eval_line(
            &mut engine,
            "class P { string toString() { return \"P!\"; } }",
        )
        .unwrap();
        assert_eq!(eval_line(&mut engine, "new P()"), Ok(Some("P!".to_string())));
    }

    #[test]
    fn test_prelude_type() {
        let mut engine = engine();
        assert_eq!(
            eval_line(&mut engine, "type(1.5)"),
            Ok(Some("float".to_string()))
        );
        assert_eq!(
            eval_line(&mut engine, "type(console)"),
            Ok(Some("console".to_string()))
        );
    }

    #[test]
    fn test_math_namespace() {
        let mut engine = engine();
        assert_eq!(engine.execute("Math.sqrt(16);").unwrap(), Value::float(4.0));
        assert_eq!(engine.execute("Math.sqrt(2.25);").unwrap(), Value::float(1.5));
        assert_eq!(engine.execute("Math.abs(-3);").unwrap(), Value::int(3));
        assert_eq!(engine.execute("Math.pow(2, 10);").unwrap(), Value::float(1024.0));
        assert!(engine.execute("Math.sqrt(\"x\");").is_err());
    }

    #[test]
    fn test_preload_scripts_runs_matching_files_in_order() {
        let dir = std::env::temp_dir().join(format!("pinetree-preload-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.pt"), "var base = 20;").unwrap();
        fs::write(dir.join("b.pt"), "int bump(int n) { return n + base; }").unwrap();
        fs::write(dir.join("broken.pt"), "var = ;").unwrap();
        fs::write(dir.join("notes.txt"), "not a script").unwrap();

        let mut engine = engine();
        let loaded = preload_scripts(&mut engine, &dir, "pt").unwrap();
        let names: Vec<_> = loaded
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, ["a.pt", "b.pt"]);
        assert_eq!(eval_line(&mut engine, "bump(1)"), Ok(Some("21".to_string())));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_preload_missing_directory() {
        let mut engine = engine();
        let missing = std::env::temp_dir().join("pinetree-no-such-dir-for-preload");
        assert!(preload_scripts(&mut engine, &missing, "pt").is_err());
    }

    #[test]
    fn test_console_print_returns_null() {
        let mut engine = engine();
        assert_eq!(eval_line(&mut engine, "console.print(\"\")"), Ok(None));
    }
}
