// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data-driven record substitution and iteration (§4.C).

use serde_json::Value;
use std::collections::BTreeMap;

use super::descriptor::Case;
use crate::report::Reporter;

/// The `{"data": [...]}` shape of a `<case-file>.json` data-driven file.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DataDrivenFile {
    pub data: Vec<BTreeMap<String, Value>>,
}

/// Recursively substitute `"%(name)s"` occurrences in string values against `vars`.
/// Non-string values, and strings without the pattern, are returned unchanged.
pub fn substitute_vars(value: &Value, vars: &BTreeMap<String, Value>) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_string(s, vars)),
        Value::Array(items) => Value::Array(items.iter().map(|item| substitute_vars(item, vars)).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, val) in map {
                out.insert(key.clone(), substitute_vars(val, vars));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn substitute_string(input: &str, vars: &BTreeMap<String, Value>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("%(") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(close) = after.find(")s") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..close];
        if let Some(replacement) = vars.get(name) {
            out.push_str(&value_to_plain_string(replacement));
        } else {
            out.push_str(&rest[start..start + 2 + close + 2]);
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute `<func:name>` tokens by invoking `case.call_data_function(name)`.
/// Fails (propagating the case's error) if the function isn't found — matching the
/// reference source's method-not-found failure.
pub fn substitute_functions(value: &Value, case: &mut dyn Case) -> anyhow::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_function_string(s, case)?)),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(substitute_functions(item, case)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, val) in map {
                out.insert(key.clone(), substitute_functions(val, case)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_function_string(input: &str, case: &mut dyn Case) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("<func:") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 6..];
        let Some(close) = after.find('>') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let name = &after[..close];
        out.push_str(&case.call_data_function(name)?);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Run every record in `file` through `case.test_with_record`, each under its own
/// step group. `stop_on_error = false` turns a record-level exception into an
/// `EXCEPTION` step and continues to the next record; `stop_on_error = true`
/// propagates the exception out of the whole data-driven run.
pub fn run_data_driven(
    file: &DataDrivenFile,
    case: &mut dyn Case,
    reporter: &Reporter,
    stop_on_error: bool,
) -> anyhow::Result<()> {
    for record in &file.data {
        let header = record
            .get("header")
            .and_then(Value::as_str)
            .unwrap_or("data record")
            .to_string();
        reporter.add_step_group(&header);
        let substituted: BTreeMap<String, Value> = record
            .iter()
            .map(|(k, v)| (k.clone(), substitute_vars(v, record)))
            .collect();
        let with_functions = substitute_functions(&Value::Object(substituted.into_iter().collect()), case);
        let outcome = with_functions.and_then(|record_value| {
            case.test_with_record(&record_value)
                .map_err(|err| anyhow::anyhow!(err))
        });
        match outcome {
            Ok(()) => {}
            Err(err) if stop_on_error => {
                reporter.end_step_group();
                return Err(err);
            }
            Err(err) => {
                reporter.add(campaign_metadata::Status::Exception, "data record failed", &err.to_string());
            }
        }
        reporter.end_step_group();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_var() {
        let mut vars = BTreeMap::new();
        vars.insert("name".to_string(), Value::String("alice".to_string()));
        assert_eq!(substitute_string("hello %(name)s", &vars), "hello alice");
    }

    #[test]
    fn leaves_unknown_var_token_untouched() {
        let vars = BTreeMap::new();
        assert_eq!(substitute_string("hello %(missing)s", &vars), "hello %(missing)s");
    }

    #[test]
    fn substitutes_numeric_var_as_plain_text() {
        let mut vars = BTreeMap::new();
        vars.insert("count".to_string(), Value::from(3));
        assert_eq!(substitute_string("n=%(count)s", &vars), "n=3");
    }

    struct RecordingCase {
        seen: Vec<Value>,
        fail_on: Option<usize>,
    }

    impl Case for RecordingCase {
        fn test(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
        fn test_with_record(&mut self, record: &Value) -> anyhow::Result<()> {
            self.seen.push(record.clone());
            if self.fail_on == Some(self.seen.len() - 1) {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    #[test]
    fn continues_past_a_failed_record_when_not_stop_on_error() {
        let file = DataDrivenFile {
            data: vec![
                BTreeMap::from([("header".to_string(), Value::String("r0".to_string()))]),
                BTreeMap::from([("header".to_string(), Value::String("r1".to_string()))]),
                BTreeMap::from([("header".to_string(), Value::String("r2".to_string()))]),
            ],
        };
        let mut case = RecordingCase { seen: Vec::new(), fail_on: Some(1) };
        let reporter = Reporter::new();
        reporter.add_test("case");
        run_data_driven(&file, &mut case, &reporter, false).unwrap();
        reporter.end_test();
        assert_eq!(case.seen.len(), 3, "all three records should still run");
    }

    #[test]
    fn stop_on_error_propagates_and_halts_iteration() {
        let file = DataDrivenFile {
            data: vec![
                BTreeMap::from([("header".to_string(), Value::String("r0".to_string()))]),
                BTreeMap::from([("header".to_string(), Value::String("r1".to_string()))]),
            ],
        };
        let mut case = RecordingCase { seen: Vec::new(), fail_on: Some(0) };
        let reporter = Reporter::new();
        reporter.add_test("case");
        let result = run_data_driven(&file, &mut case, &reporter, true);
        reporter.end_test();
        assert!(result.is_err());
        assert_eq!(case.seen.len(), 1, "iteration must stop after the failing record");
    }
}
