use super::error::FlowError;
use std::collections::HashMap;

/// Batch script used when the selected environment names no template file.
pub const DEFAULT_SLURM_TEMPLATE: &str = "#!/bin/bash
#SBATCH --job-name={{ job_name }}
#SBATCH --partition={{ partition }}
#SBATCH --nodes=1
#SBATCH --ntasks=1
#SBATCH --gres=gpu:{{ ngpu }}
#SBATCH --output={{ job_name }}.o%j

cd {{ project_root }}
{{ command }}
";

/// Substitutes every `{{ name }}` placeholder in `template` with `vars[name]`.
///
/// Whitespace inside the braces is ignored. A placeholder without a value, or an opening
/// `{{` without its closing `}}`, is an error rather than being left in the output.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> Result<String, FlowError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or(FlowError::UnterminatedPlaceholder(offset + start))?;
        let key = after[..end].trim();
        let value = vars
            .get(key)
            .ok_or_else(|| FlowError::UnknownPlaceholder(key.to_string()))?;
        out.push_str(value);

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Quotes `value` for a POSIX shell. Values made only of characters with no special meaning
/// are returned unchanged.
pub fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn substitutes_placeholders_with_or_without_spaces() {
        let rendered = render(
            "a={{ a }} b={{b}} a-again={{  a  }}",
            &vars(&[("a", "1"), ("b", "two")]),
        )
        .unwrap();
        assert_eq!(rendered, "a=1 b=two a-again=1");
    }

    #[test]
    fn default_template_renders_completely() {
        let rendered = render(
            DEFAULT_SLURM_TEMPLATE,
            &vars(&[
                ("job_name", "nvt-0123abcd"),
                ("partition", "batch"),
                ("ngpu", "1"),
                ("executable", "python -u"),
                ("project_root", "/scratch/sweep"),
                ("command", "mdsweep run -o nvt -i 0123abcd"),
            ]),
        )
        .unwrap();
        assert!(rendered.contains("#SBATCH --partition=batch"));
        assert!(rendered.contains("#SBATCH --gres=gpu:1"));
        assert!(rendered.contains("cd /scratch/sweep\nmdsweep run -o nvt -i 0123abcd\n"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let result = render("{{ missing }}", &vars(&[]));
        assert!(matches!(result, Err(FlowError::UnknownPlaceholder(k)) if k == "missing"));
    }

    #[test]
    fn unterminated_placeholder_reports_its_offset() {
        let result = render("ok {{ a }} then {{ broken", &vars(&[("a", "1")]));
        assert!(matches!(result, Err(FlowError::UnterminatedPlaceholder(16))));
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let text = "#!/bin/bash\necho }} {\n";
        assert_eq!(render(text, &vars(&[])).unwrap(), text);
    }

    #[test]
    fn shell_quote_leaves_plain_paths_alone() {
        assert_eq!(shell_quote("/scratch/sweep-1/a.b"), "/scratch/sweep-1/a.b");
        assert_eq!(shell_quote("/home/me/my sweep"), "'/home/me/my sweep'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}
