//! rsonnet-drv - Pipeline driver.
//!
//! Glue for the interpreter: read a file (or take source text), run
//! lexer → parser → evaluator, and serialize the result to JSON. The
//! [`Session`] struct owns one invocation's configuration; the free
//! functions [`loads`], [`load`], and [`evaluate_file`] are the
//! programmatic API over it.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use rsonnet_eval::manifest::{self, WriteOptions};
use rsonnet_eval::{Evaluator, NativeCallback};
use rsonnet_lex::Lexer;
use rsonnet_par::Parser;

/// Errors surfaced by the driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The program failed to parse; one message per syntax error.
    #[error("{}", errors.join("\n"))]
    Syntax {
        /// Accumulated parser diagnostics.
        errors: Vec<String>,
    },

    /// Evaluation failed.
    #[error("Runtime Error: {0}")]
    Runtime(String),

    /// The input file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Configuration for one interpreter invocation.
#[derive(Default)]
pub struct Config {
    /// External string variables, reachable via `std.extVar`.
    pub ext_vars: Vec<(String, String)>,
    /// Native callbacks, reachable via `std.native`.
    pub native_callbacks: Vec<(String, NativeCallback)>,
    /// Override for the evaluator's recursion limit.
    pub max_depth: Option<usize>,
}

/// One interpreter invocation.
pub struct Session {
    config: Config,
}

impl Session {
    /// Creates a session with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Parses source text into an AST.
    ///
    /// # Errors
    ///
    /// [`DriverError::Syntax`] carrying every accumulated message.
    pub fn parse(&self, source: &str) -> Result<rsonnet_par::Expr> {
        debug!(bytes = source.len(), "parsing program");
        let mut parser = Parser::new(Lexer::new(source));
        match parser.parse() {
            Some(ast) => Ok(ast),
            None => Err(DriverError::Syntax {
                errors: parser.errors(),
            }),
        }
    }

    /// Evaluates source text to a JSON tree.
    pub fn loads(&self, source: &str) -> Result<serde_json::Value> {
        let ast = self.parse(source)?;
        self.eval_ast(&ast, None)
    }

    /// Reads and evaluates a file to a JSON tree.
    pub fn load(&self, path: &Path) -> Result<serde_json::Value> {
        let source = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ast = self.parse(&source)?;
        self.eval_ast(&ast, Some(path))
    }

    fn eval_ast(&self, ast: &rsonnet_par::Expr, file: Option<&Path>) -> Result<serde_json::Value> {
        let mut evaluator = Evaluator::new();
        for (name, value) in &self.config.ext_vars {
            evaluator.add_ext_var(name.clone(), value.clone());
        }
        for (name, cb) in &self.config.native_callbacks {
            evaluator.add_native(name.clone(), cb.clone());
        }
        if let Some(max_depth) = self.config.max_depth {
            evaluator.set_max_depth(max_depth);
        }

        debug!("evaluating program");
        let value = match file {
            Some(path) => evaluator.evaluate_in_file(ast, path.to_path_buf()),
            None => evaluator.evaluate(ast),
        }
        .map_err(|e| DriverError::Runtime(e.message))?;

        manifest::to_json(&evaluator, &value).map_err(|e| DriverError::Runtime(e.message))
    }
}

/// Evaluates a Jsonnet program given as text.
pub fn loads(
    source: &str,
    ext_vars: Vec<(String, String)>,
    native_callbacks: Vec<(String, NativeCallback)>,
) -> Result<serde_json::Value> {
    Session::new(Config {
        ext_vars,
        native_callbacks,
        max_depth: None,
    })
    .loads(source)
}

/// Evaluates a Jsonnet file.
pub fn load(
    path: impl AsRef<Path>,
    ext_vars: Vec<(String, String)>,
    native_callbacks: Vec<(String, NativeCallback)>,
) -> Result<serde_json::Value> {
    Session::new(Config {
        ext_vars,
        native_callbacks,
        max_depth: None,
    })
    .load(path.as_ref())
}

/// Evaluates a Jsonnet file and serializes the result.
pub fn evaluate_file(
    path: impl AsRef<Path>,
    ext_vars: Vec<(String, String)>,
    native_callbacks: Vec<(String, NativeCallback)>,
    indent: Option<usize>,
    ensure_ascii: bool,
) -> Result<String> {
    let json = load(path, ext_vars, native_callbacks)?;
    Ok(render(&json, indent, ensure_ascii))
}

/// Serializes an evaluated JSON tree using the CLI output rules.
pub fn render(json: &serde_json::Value, indent: Option<usize>, ensure_ascii: bool) -> String {
    let mut options = match indent {
        Some(width) => WriteOptions::indented(width),
        None => WriteOptions::spaced(),
    };
    options.ensure_ascii = ensure_ascii;
    manifest::write_json(json, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_loads_simple() {
        let json = loads("{a: 1 + 2}", vec![], vec![]).unwrap();
        assert_eq!(json, serde_json::json!({"a": 3}));
    }

    #[test]
    fn test_loads_syntax_error() {
        let err = loads("{a:}", vec![], vec![]).unwrap_err();
        let DriverError::Syntax { errors } = err else {
            panic!("expected syntax error, got {err:?}");
        };
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_loads_runtime_error() {
        let err = loads("1 / 0", vec![], vec![]).unwrap_err();
        assert_eq!(err.to_string(), "Runtime Error: Division by zero");
    }

    #[test]
    fn test_ext_vars() {
        let json = loads(
            "std.extVar('env')",
            vec![("env".to_string(), "prod".to_string())],
            vec![],
        )
        .unwrap();
        assert_eq!(json, serde_json::json!("prod"));
    }

    #[test]
    fn test_native_callbacks() {
        let cb: NativeCallback = Rc::new(|args: &[serde_json::Value]| {
            let a = args[0].as_f64().ok_or("expected a number")?;
            let b = args[1].as_f64().ok_or("expected a number")?;
            Ok(serde_json::json!(a * b))
        });
        let json = loads(
            "std.native('mul')(6, 7)",
            vec![],
            vec![("mul".to_string(), cb)],
        )
        .unwrap();
        assert_eq!(json, serde_json::json!(42));
    }

    #[test]
    fn test_render_indent() {
        let json = serde_json::json!({"a": 1});
        assert_eq!(render(&json, None, false), "{\"a\": 1}");
        assert_eq!(render(&json, Some(2), false), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_pure_json_idempotence() {
        let text = r#"{"a": [1, 2.5, "s", null, true]}"#;
        let json = loads(text, vec![], vec![]).unwrap();
        let expected: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(json, expected);
    }
}
