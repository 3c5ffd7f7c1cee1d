//! Temporary file generation with shell export statements and special outputs.

use crate::descriptor::{ArgValue, Descriptor};
use crate::registry::Args;
use anyhow::Result;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Heredoc delimiter for help output.
const HELP_DELIMITER: &str = "ARGDEF_HELP";

/// Default prefix for exported variable names.
pub const DEFAULT_PREFIX: &str = "ARGDEF_";

/// Escape a string for safe use in a shell double-quoted context.
///
/// Escapes: $, `, \, ", and !
fn escape_shell_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' => escaped.push_str("\\$"),
            '`' => escaped.push_str("\\`"),
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '!' => escaped.push_str("\\!"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Convert an option name to a shell variable name.
///
/// Leading dashes are dropped, the rest is upper-cased and inner dashes
/// become underscores: `--out-dir` gives `OUT_DIR`.
fn to_shell_var_name(name: &str) -> String {
    name.trim_start_matches('-')
        .to_uppercase()
        .replace('-', "_")
}

/// Text exported for an option's current value. Lists are space separated;
/// choices export their selected label.
fn export_value(descriptor: &Descriptor) -> String {
    match descriptor.value() {
        ArgValue::Boolean { value, .. } => value.to_string(),
        ArgValue::Integer { value, .. } => value.to_string(),
        ArgValue::Real { value, .. } => value.to_string(),
        ArgValue::String { value, .. } => value.clone(),
        ArgValue::StringList { values, .. } => values.join(" "),
        ArgValue::Choice { value, choices, .. } => usize::try_from(*value)
            .ok()
            .and_then(|index| choices.get(index))
            .cloned()
            .unwrap_or_else(|| value.to_string()),
    }
}

/// Find two options that would export the same variable, or an option that
/// would shadow `<PREFIX>ARGS`. Returns a message naming the clash.
pub fn find_var_collision(args: &Args, prefix: &str) -> Option<String> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for descriptor in args.descriptors() {
        let var_name = to_shell_var_name(descriptor.name());
        if var_name == "ARGS" {
            return Some(format!(
                "option {} collides with {}ARGS",
                descriptor.name(),
                prefix
            ));
        }
        if let Some(first) = seen.insert(var_name.clone(), descriptor.name()) {
            return Some(format!(
                "options {} and {} both export {}{}",
                first,
                descriptor.name(),
                prefix,
                var_name
            ));
        }
    }

    None
}

/// Generate the export statements as a string.
///
/// One line per declared option in declaration order, then `<PREFIX>ARGS`
/// holding the arguments no option consumed.
pub fn generate_output_string(args: &Args, leftovers: &[String], prefix: &str) -> String {
    let mut output = String::new();

    for descriptor in args.descriptors() {
        let var_name = format!("{}{}", prefix, to_shell_var_name(descriptor.name()));
        let escaped_value = escape_shell_value(&export_value(descriptor));
        output.push_str(&format!("export {}=\"{}\"\n", var_name, escaped_value));
    }

    let escaped_args = escape_shell_value(&leftovers.join(" "));
    output.push_str(&format!("export {}ARGS=\"{}\"\n", prefix, escaped_args));

    output
}

/// Generate a temporary file with shell export statements.
///
/// Returns the path to the temporary file. The file will persist
/// until it's manually deleted.
pub fn generate_output(args: &Args, leftovers: &[String], prefix: &str) -> Result<PathBuf> {
    let content = generate_output_string(args, leftovers, prefix);
    write_temp_file(&content)
}

/// Generate an error output file.
///
/// When sourced, the file will print the error message to stderr and exit 1.
pub fn generate_error_output(message: &str) -> Result<PathBuf> {
    let content = generate_error_string(message);
    write_temp_file(&content)
}

/// Generate an error output as a string (for testing).
pub fn generate_error_string(message: &str) -> String {
    let escaped = escape_shell_value(message);
    format!("echo \"argdef: {}\" >&2\nexit 1\n", escaped)
}

/// Generate a help output file.
///
/// When sourced, the file will print the usage text and exit 0.
pub fn generate_help_output(usage: &str) -> Result<PathBuf> {
    let content = generate_help_output_string(usage);
    write_temp_file(&content)
}

/// Generate a help output as a string (for testing).
pub fn generate_help_output_string(usage: &str) -> String {
    format!(
        "cat <<'{delimiter}' >&2\n{text}{delimiter}\nexit 0\n",
        delimiter = HELP_DELIMITER,
        text = usage
    )
}

/// Write content to a temporary file and return its path.
fn write_temp_file(content: &str) -> Result<PathBuf> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    let path = file.into_temp_path().keep()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(spec: &str, argv: &[&str]) -> (Args, Vec<String>) {
        let mut args = Args::new(spec).unwrap();
        let mut argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        args.parse_compact(&mut argv);
        argv.remove(0);
        (args, argv)
    }

    #[test]
    fn test_basic_output() {
        let (args, rest) = parsed("-v -o:s", &["prog", "-v", "-o", "file.txt"]);
        let output = generate_output_string(&args, &rest, "ARGDEF_");

        assert_eq!(
            output,
            "export ARGDEF_V=\"true\"\nexport ARGDEF_O=\"file.txt\"\nexport ARGDEF_ARGS=\"\"\n"
        );
    }

    #[test]
    fn test_every_kind() {
        let (args, rest) = parsed(
            "-n:i -r:r -l:sm -c:c[fast,slow] -q",
            &["prog", "-n", "-3", "-r", "0.5", "-l", "a", "-l", "b", "-c", "slow", "in.txt"],
        );
        let output = generate_output_string(&args, &rest, "X_");

        assert!(output.contains("export X_N=\"-3\"\n"));
        assert!(output.contains("export X_R=\"0.5\"\n"));
        assert!(output.contains("export X_L=\"a b\"\n"));
        assert!(output.contains("export X_C=\"slow\"\n"));
        assert!(output.contains("export X_Q=\"false\"\n"));
        assert!(output.ends_with("export X_ARGS=\"in.txt\"\n"));
    }

    #[test]
    fn test_choice_index_out_of_range_exports_number() {
        let (args, rest) = parsed("-c:c[a,b]=7", &["prog"]);
        let output = generate_output_string(&args, &rest, "T_");
        assert!(output.contains("export T_C=\"7\""));
    }

    #[test]
    fn test_var_names() {
        assert_eq!(to_shell_var_name("-v"), "V");
        assert_eq!(to_shell_var_name("--out-dir"), "OUT_DIR");
        assert_eq!(to_shell_var_name("--out_dir"), "OUT_DIR");
        assert_eq!(to_shell_var_name("-Name"), "NAME");
    }

    #[test]
    fn test_var_collision_on_case() {
        let args = Args::new("-v -V").unwrap();
        assert_eq!(
            find_var_collision(&args, "P_"),
            Some("options -v and -V both export P_V".to_string())
        );
    }

    #[test]
    fn test_var_collision_on_dashes() {
        let args = Args::new("-o:s -p --o:s").unwrap();
        assert_eq!(
            find_var_collision(&args, "P_"),
            Some("options -o and --o both export P_O".to_string())
        );
    }

    #[test]
    fn test_var_collision_with_args() {
        let args = Args::new("--args:s").unwrap();
        assert_eq!(
            find_var_collision(&args, "P_"),
            Some("option --args collides with P_ARGS".to_string())
        );
    }

    #[test]
    fn test_no_var_collision() {
        let args = Args::new("-v --verbose -o:s --out_dir:s -O_X").unwrap();
        assert_eq!(find_var_collision(&args, "P_"), None);
    }

    #[test]
    fn test_escape_dollar() {
        let (args, rest) = parsed("-s:s", &["prog", "-s", "$HOME/path"]);
        let output = generate_output_string(&args, &rest, "ARGDEF_");

        assert!(output.contains("export ARGDEF_S=\"\\$HOME/path\""));
    }

    #[test]
    fn test_complex_escaping() {
        let value = "$var \"quoted\" `cmd` \\path!";
        let (args, rest) = parsed("-s:s", &["prog", "-s", value]);
        let output = generate_output_string(&args, &rest, "TEST_");

        assert!(
            output.contains("export TEST_S=\"\\$var \\\"quoted\\\" \\`cmd\\` \\\\path\\!\"")
        );
    }

    #[test]
    fn test_escape_newline() {
        assert_eq!(escape_shell_value("line1\nline2"), "line1\\nline2");
    }

    #[test]
    fn test_leftovers_escaped() {
        let (args, rest) = parsed("-v", &["prog", "a b", "$x"]);
        let output = generate_output_string(&args, &rest, "P_");
        assert!(output.contains("export P_ARGS=\"a b \\$x\""));
    }

    #[test]
    fn test_generate_output_creates_file() {
        let (args, rest) = parsed("-t:s", &["prog", "-t", "value"]);
        let path = generate_output(&args, &rest, "ARGDEF_").unwrap();

        assert!(path.exists());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("export ARGDEF_T=\"value\""));

        // Clean up
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_generate_error_string() {
        let output = generate_error_string("required argument -i not supplied");
        assert!(output.contains("echo \"argdef: required argument -i not supplied\" >&2"));
        assert!(output.contains("exit 1"));
    }

    #[test]
    fn test_generate_error_string_escapes_special_chars() {
        let output = generate_error_string("invalid value $HOME `test` for -i");
        assert!(output.contains("\\$HOME"));
        assert!(output.contains("\\`test\\`"));
        assert!(output.contains("exit 1"));
    }

    #[test]
    fn test_generate_help_output_string() {
        let usage = "prog [-v] \n -v : verbose\n";
        let output = generate_help_output_string(usage);

        assert!(output.starts_with("cat <<'ARGDEF_HELP' >&2\n"));
        assert!(output.contains("prog [-v] \n"));
        assert!(output.ends_with("ARGDEF_HELP\nexit 0\n"));
    }

    #[test]
    fn test_generate_error_output_creates_file() {
        let path = generate_error_output("test error").unwrap();
        assert!(path.exists());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("argdef: test error"));
        assert!(contents.contains("exit 1"));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_generate_help_output_creates_file() {
        let path = generate_help_output("test usage text\n").unwrap();
        assert!(path.exists());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("test usage text"));
        assert!(contents.contains("exit 0"));

        std::fs::remove_file(path).unwrap();
    }
}
