//! Usage text generation.

use crate::descriptor::{Descriptor, Kind};

/// Generate the usage text: a one line synopsis followed by a table of
/// option descriptions.
///
/// Optional options are bracketed; value options show a typed placeholder,
/// separated from the name by a space unless the value is attached.
pub fn generate_usage(descriptors: &[Descriptor], program: &str) -> String {
    let mut usage = generate_synopsis(descriptors, program);
    usage.push('\n');
    usage.push_str(&generate_option_table(descriptors));
    usage
}

/// Generate the synopsis line, without a trailing newline.
pub fn generate_synopsis(descriptors: &[Descriptor], program: &str) -> String {
    let mut line = format!("{} ", program);

    for descriptor in descriptors {
        let optional = !descriptor.is_required();

        if optional {
            line.push('[');
        }
        line.push_str(descriptor.name());

        let kind = descriptor.kind();
        if kind != Kind::Boolean && !descriptor.is_attached() {
            line.push(' ');
        }
        if let Some(placeholder) = kind.placeholder() {
            line.push_str(placeholder);
        }

        if optional {
            line.push(']');
        }
        line.push(' ');
    }

    line
}

/// Generate one `name : description` row per option, names padded to the
/// longest name.
pub fn generate_option_table(descriptors: &[Descriptor]) -> String {
    let width = descriptors
        .iter()
        .map(|d| d.name().len())
        .max()
        .unwrap_or(0);

    let mut table = String::new();
    for descriptor in descriptors {
        table.push_str(&format!(
            " {:<width$} : {}\n",
            descriptor.name(),
            descriptor.description(),
            width = width
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::compile;

    #[test]
    fn test_synopsis_placeholders() {
        let descriptors = compile("-v -i:i -I:I -r:rr -s:S -l:sm -c:c[a,b]").unwrap();
        let synopsis = generate_synopsis(&descriptors, "prog");
        assert_eq!(
            synopsis,
            "prog [-v] [-i <integer>] [-I<integer>] -r <real> [-s<string>] [-l <string>] [-c <choice>] "
        );
    }

    #[test]
    fn test_option_table_alignment() {
        let descriptors = compile("-a (first) --long:s (second) -b").unwrap();
        let table = generate_option_table(&descriptors);
        assert_eq!(
            table,
            " -a     : first\n --long : second\n -b     : \n"
        );
    }

    #[test]
    fn test_usage_combines_both() {
        let descriptors = compile("-x:fr (the x flag)").unwrap();
        let usage = generate_usage(&descriptors, "tool");
        assert_eq!(usage, "tool -x \n -x : the x flag\n");
    }

    #[test]
    fn test_usage_without_options() {
        let usage = generate_usage(&[], "tool");
        assert_eq!(usage, "tool \n");
    }
}
