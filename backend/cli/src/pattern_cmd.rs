//! `argot pattern`: decode a pattern string and show how it matches.

use argot_commands::{PatternError, PatternSpec};

use crate::terminal_output::{note_error, render_table, Column};

pub fn run(pattern: &str) -> Result<(), PatternError> {
    match describe(pattern) {
        Ok(report) => {
            print!("{report}");
            Ok(())
        }
        Err(e) => {
            note_error(&format!("`{pattern}`: {e}"));
            Err(e)
        }
    }
}

fn describe(pattern: &str) -> Result<String, PatternError> {
    let spec = PatternSpec::parse(pattern)?;

    let arity = match (spec.min_args(), spec.max_args()) {
        (min, Some(max)) if min == max => min.to_string(),
        (min, Some(max)) => format!("{min}-{max}"),
        (min, None) => format!("at least {min}"),
    };

    let mut out = format!(
        "pattern  {}\narity    {arity}\nusage    {}\n",
        spec.encode(),
        if spec.is_empty() { "(no arguments)".to_string() } else { spec.usage() },
    );

    if !spec.is_empty() {
        let rows: Vec<Vec<String>> = spec
            .slots()
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let kind = if slot.variadic {
                    "variadic"
                } else if slot.optional {
                    "optional"
                } else {
                    "required"
                };
                vec![(i + 1).to_string(), slot.code.to_string(), slot.code.describe().to_string(), kind.to_string()]
            })
            .collect();
        let columns = [Column::right("#"), Column::left("Code"), Column::left("Type"), Column::left("Kind")];
        out.push('\n');
        out.push_str(&render_table(&columns, &rows));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_quest_pattern() {
        let report = describe("SRRRRS?S?L?%?").unwrap();
        assert!(report.contains("arity    5-9"));
        assert!(report.contains("usage    (text) (number) (number) (number) (number) [text] [text] [image link] [percentage]"));
        assert!(report.contains("optional"));
    }

    #[test]
    fn describes_variadic_pattern() {
        let report = describe("IP*").unwrap();
        assert!(report.contains("arity    at least 2"));
        assert!(report.contains("variadic"));
    }

    #[test]
    fn empty_pattern_takes_nothing() {
        let report = describe("").unwrap();
        assert!(report.contains("arity    0"));
        assert!(report.contains("(no arguments)"));
    }

    #[test]
    fn reports_decoding_errors() {
        assert_eq!(describe("S?I").unwrap_err(), PatternError::MandatoryAfterOptional { slot: 1 });
    }
}
