use crate::error::{Diagnostic, ErrorStore};
use crate::functions::FunctionTable;
use serde::Serialize;
use std::fmt;

/// Outcome of checking one file: either diagnostics or, when there are none,
/// the declared functions.
#[derive(Debug, Serialize)]
pub struct Report {
    pub errors: Vec<Diagnostic>,
    pub functions: FunctionTable,
}

impl Report {
    pub fn new(errors: &ErrorStore, functions: FunctionTable) -> Self {
        Self {
            errors: errors.diagnostics().to_vec(),
            functions,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.has_errors() {
            writeln!(f, "Errors found")?;
            for diagnostic in &self.errors {
                writeln!(f, "{}", diagnostic)?;
            }
            return Ok(());
        }

        writeln!(f, "No errors found")?;
        for (name, params) in self.functions.iter() {
            let params: Vec<String> = params.iter().map(|param| format!("'{}'", param)).collect();
            writeln!(f, "{} [{}]", name, params.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_functions_when_clean() {
        let mut functions = FunctionTable::new();
        functions.declare("f");
        functions.add_params("f", ["a".to_string(), "b".to_string()]);
        functions.declare("Unnamed function 0 on line 3");
        functions.mark_variadic("Unnamed function 0 on line 3");

        let report = Report::new(&ErrorStore::new(), functions);
        assert_eq!(
            report.to_string(),
            "No errors found\nUnnamed function 0 on line 3 ['...']\nf ['a', 'b']\n"
        );
    }

    #[test]
    fn test_errors_hide_function_list() {
        let mut errors = ErrorStore::new();
        errors.report(Some(2), "'y' not expected. '=' expected");
        errors.report(None, "Scope not closed");
        let mut functions = FunctionTable::new();
        functions.declare("f");

        let report = Report::new(&errors, functions);
        assert_eq!(
            report.to_string(),
            "Errors found\n2: 'y' not expected. '=' expected.\nEOF: Scope not closed.\n"
        );
    }

    #[test]
    fn test_json_shape() {
        let mut errors = ErrorStore::new();
        errors.report(None, "Scope not closed");
        let mut functions = FunctionTable::new();
        functions.declare("g");
        functions.mark_variadic("g");

        let rendered = Report::new(&errors, functions).to_json().unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json["errors"][0]["line"], serde_json::Value::Null);
        assert_eq!(json["errors"][0]["message"], "Scope not closed");
        assert_eq!(json["functions"]["g"][0], "...");
    }
}
