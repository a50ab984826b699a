//! Import resolution.
//!
//! `import` re-invokes the full pipeline on the target file; `importstr`
//! and `importbin` read it raw. Paths resolve relative to the importing
//! file's directory. Evaluated imports are cached per evaluator, keyed by
//! canonical path; the cache is unobservable for pure programs beyond
//! identity of the produced value.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use rsonnet_lex::Lexer;
use rsonnet_par::Parser;
use tracing::debug;

use crate::error::{eval_err, EvalError, EvalResult};
use crate::thunk::Thunk;
use crate::value::Value;
use crate::Evaluator;

impl Evaluator {
    /// Evaluates `import "path"`.
    pub(crate) fn eval_import(&self, path: &str) -> EvalResult<Value> {
        let resolved = self.resolve_import_path(path);
        let canonical = resolved
            .canonicalize()
            .map_err(|e| import_error(path, &e.to_string()))?;

        if let Some(cached) = self.import_cache.borrow().get(&canonical) {
            return Ok(cached.clone());
        }
        if self.file_stack.borrow().contains(&canonical) {
            eval_err!("Import cycle detected: {path}");
        }

        debug!(path = %canonical.display(), "importing file");
        let source = std::fs::read_to_string(&canonical)
            .map_err(|e| import_error(path, &e.to_string()))?;

        let mut parser = Parser::new(Lexer::new(&source));
        let Some(ast) = parser.parse() else {
            let details = parser.errors().join("; ");
            eval_err!("Failed to parse import \"{path}\": {details}");
        };

        let value = self.evaluate_in_file(&ast, canonical.clone())?;
        self.import_cache
            .borrow_mut()
            .insert(canonical, value.clone());
        Ok(value)
    }

    /// Evaluates `importstr "path"`: the file's text as a string.
    pub(crate) fn eval_importstr(&self, path: &str) -> EvalResult<Value> {
        let resolved = self.resolve_import_path(path);
        let text = std::fs::read_to_string(&resolved)
            .map_err(|e| import_error(path, &e.to_string()))?;
        Ok(Value::str(text))
    }

    /// Evaluates `importbin "path"`: the file's bytes as an array of
    /// numbers.
    pub(crate) fn eval_importbin(&self, path: &str) -> EvalResult<Value> {
        let resolved = self.resolve_import_path(path);
        let bytes =
            std::fs::read(&resolved).map_err(|e| import_error(path, &e.to_string()))?;
        let thunks = bytes
            .into_iter()
            .map(|b| Thunk::done(Value::Num(f64::from(b))))
            .collect();
        Ok(Value::Arr(Rc::new(thunks)))
    }

    /// Resolves an import target against the importing file's directory.
    fn resolve_import_path(&self, path: &str) -> PathBuf {
        let target = Path::new(path);
        if target.is_absolute() {
            return target.to_path_buf();
        }
        match self.current_file() {
            Some(current) => match current.parent() {
                Some(dir) => dir.join(target),
                None => target.to_path_buf(),
            },
            None => target.to_path_buf(),
        }
    }
}

fn import_error(path: &str, details: &str) -> EvalError {
    EvalError::new(format!("Failed to import \"{path}\": {details}"))
}
