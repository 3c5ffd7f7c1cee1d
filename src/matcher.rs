//! Matching of command line tokens against compiled descriptors.

use crate::descriptor::Descriptor;
use crate::diagnostic::{Diagnostic, DiagnosticSink};
use crate::help::generate_usage;
use crate::settings::{MissingValuePolicy, Settings};

/// Transient state of a registry between and during scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchState {
    /// Set once a literal `--` is seen; later tokens are never options.
    pub skip_remaining: bool,
    /// Set once `--help` is seen. Never cleared by a scan.
    pub help_requested: bool,
}

/// Result of one scan over an argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// False when a required option was left unset.
    pub success: bool,
    /// The argument list with consumed tokens removed, when compaction
    /// was requested.
    pub compacted: Option<Vec<String>>,
}

/// Scan `args` (program name first) and assign values to `descriptors`.
///
/// Values and set flags are updated in place; nothing is rolled back on
/// failure. Required options are checked once the scan ends.
pub fn match_args<S: AsRef<str>>(
    descriptors: &mut [Descriptor],
    state: &mut MatchState,
    settings: &Settings,
    args: &[S],
    compact: bool,
    sink: &mut dyn DiagnosticSink,
) -> MatchOutcome {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

    let mut matcher = Matcher {
        descriptors,
        state,
        settings,
        sink,
        output: Vec::with_capacity(args.len()),
    };
    matcher.scan(&args);

    let Matcher {
        descriptors,
        sink,
        output,
        ..
    } = matcher;

    let success = check_required(descriptors, sink);

    MatchOutcome {
        success,
        compacted: compact.then_some(output),
    }
}

/// Report every required option that is not set. Returns true when all
/// required options were supplied.
pub fn check_required(descriptors: &[Descriptor], sink: &mut dyn DiagnosticSink) -> bool {
    let mut all_found = true;

    for descriptor in descriptors {
        if descriptor.is_required() && !descriptor.is_set() {
            sink.report(Diagnostic::RequiredMissing(descriptor.name().to_string()));
            all_found = false;
        }
    }

    all_found
}

/// Internal scan state.
struct Matcher<'a, 's> {
    descriptors: &'a mut [Descriptor],
    state: &'a mut MatchState,
    settings: &'a Settings,
    sink: &'a mut (dyn DiagnosticSink + 's),
    output: Vec<String>,
}

impl Matcher<'_, '_> {
    fn keep(&mut self, token: &str) {
        self.output.push(token.to_string());
    }

    fn scan(&mut self, args: &[&str]) {
        self.state.skip_remaining = false;

        let Some(program) = args.first().copied() else {
            return;
        };
        self.keep(program);

        let mut i = 1;
        while i < args.len() {
            let token = args[i];

            if self.state.skip_remaining || !token.starts_with('-') {
                self.keep(token);
                i += 1;
                continue;
            }

            if token == "--" {
                self.state.skip_remaining = true;
                i += 1;
                continue;
            }

            if self.settings.help_option && token == "--help" {
                self.state.help_requested = true;
                let usage = generate_usage(&*self.descriptors, program);
                self.sink.report(Diagnostic::HelpRequested { usage });
                i += 1;
                continue;
            }

            match self.descriptors.iter().position(|d| d.option_matches(token)) {
                Some(index) => match self.option(index, args, i) {
                    Some(next) => i = next,
                    None => break,
                },
                None => {
                    self.cluster(token);
                    i += 1;
                }
            }
        }
    }

    /// Handle a token that matched the descriptor at `index`. Returns the
    /// index of the next token to scan, or `None` to stop scanning.
    fn option(&mut self, index: usize, args: &[&str], i: usize) -> Option<usize> {
        let token = args[i];
        let count = self.descriptors[index].following_count();

        if i + count >= args.len() {
            self.sink.report(Diagnostic::MissingValue(token.to_string()));
            return match self.settings.missing_value {
                MissingValuePolicy::Halt => None,
                MissingValuePolicy::Continue => {
                    self.keep(token);
                    Some(i + 1)
                }
            };
        }

        let following = &args[i + 1..i + 1 + count];
        let descriptor = &mut self.descriptors[index];

        if !descriptor.set_value(token, following) {
            let value = if descriptor.is_attached() {
                token.get(descriptor.name().len()..).unwrap_or("")
            } else {
                following.first().copied().unwrap_or("")
            };
            let option = if descriptor.is_attached() {
                descriptor.name()
            } else {
                token
            };
            let diagnostic = Diagnostic::InvalidValue {
                option: option.to_string(),
                value: value.to_string(),
            };
            self.sink.report(diagnostic);
        }

        if self.descriptors[index].is_skip() {
            self.keep(token);
            for value in following {
                self.keep(value);
            }
        }

        Some(i + 1 + count)
    }

    /// Treat an unmatched token as a cluster of short flags (`-abc`).
    ///
    /// Every letter must name a short flag, otherwise nothing is set and the
    /// token is kept as is.
    fn cluster(&mut self, token: &str) {
        if !self.descriptors.iter().any(Descriptor::is_short_flag) {
            self.sink
                .report(Diagnostic::UnrecognisedArgument(token.to_string()));
            self.keep(token);
            return;
        }

        let letters: Vec<char> = token.chars().skip(1).collect();

        let unknown = letters
            .iter()
            .copied()
            .find(|&c| !self.descriptors.iter().any(|d| d.short_letter() == Some(c)));

        if letters.is_empty() || unknown.is_some() {
            if let Some(c) = unknown {
                self.sink.report(Diagnostic::UnrecognisedFlag(c));
            }
            self.keep(token);
            return;
        }

        for c in letters {
            for index in 0..self.descriptors.len() {
                if self.descriptors[index].short_letter() != Some(c) {
                    continue;
                }
                self.descriptors[index].set_value("", &[]);
                if self.descriptors[index].is_skip() {
                    self.output.push(format!("-{}", c));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::compile;
    use crate::diagnostic::Collector;

    struct Run {
        descriptors: Vec<Descriptor>,
        state: MatchState,
        outcome: MatchOutcome,
        diagnostics: Vec<Diagnostic>,
    }

    fn run_with(spec: &str, args: &[&str], settings: &Settings) -> Run {
        let mut descriptors = compile(spec).unwrap();
        let mut state = MatchState::default();
        let mut sink = Collector::new();
        let outcome = match_args(&mut descriptors, &mut state, settings, args, true, &mut sink);
        Run {
            descriptors,
            state,
            outcome,
            diagnostics: sink.diagnostics,
        }
    }

    fn run(spec: &str, args: &[&str]) -> Run {
        run_with(spec, args, &Settings::default())
    }

    fn find<'a>(run: &'a Run, name: &str) -> &'a Descriptor {
        run.descriptors.iter().find(|d| d.name() == name).unwrap()
    }

    fn compacted(run: &Run) -> Vec<&str> {
        run.outcome
            .compacted
            .as_ref()
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_empty_args() {
        let empty: [&str; 0] = [];
        let r = run("-v", &empty);
        assert!(r.outcome.success);
        assert!(compacted(&r).is_empty());
    }

    #[test]
    fn test_program_name_passed_through() {
        let r = run("-v", &["-v"]);
        assert_eq!(compacted(&r), vec!["-v"]);
        assert_eq!(find(&r, "-v").as_bool(), Some(false));
    }

    #[test]
    fn test_unattached_value() {
        let r = run("-i:ir", &["prog", "-i", "42", "rest"]);
        assert!(r.outcome.success);
        assert_eq!(find(&r, "-i").as_integer(), Some(42));
        assert!(find(&r, "-i").is_set());
        assert_eq!(compacted(&r), vec!["prog", "rest"]);
    }

    #[test]
    fn test_attached_value() {
        let r = run("-I:Ir", &["prog", "-I42"]);
        assert!(r.outcome.success);
        assert_eq!(find(&r, "-I").as_integer(), Some(42));
        assert_eq!(compacted(&r), vec!["prog"]);
    }

    #[test]
    fn test_unattached_does_not_match_joined_token() {
        let r = run("-i:ir", &["prog", "-i42"]);
        assert!(!r.outcome.success);
        assert_eq!(compacted(&r), vec!["prog", "-i42"]);
        assert_eq!(
            r.diagnostics,
            vec![
                Diagnostic::UnrecognisedArgument("-i42".to_string()),
                Diagnostic::RequiredMissing("-i".to_string()),
            ]
        );
    }

    #[test]
    fn test_first_declared_match_wins() {
        let r = run("-D:S -Dx:S", &["prog", "-Dxvalue"]);
        assert_eq!(find(&r, "-D").as_str(), Some("xvalue"));
        assert!(!find(&r, "-Dx").is_set());
    }

    #[test]
    fn test_missing_value_halts_scan() {
        let r = run("-v -s:s", &["prog", "plain", "-s"]);
        assert_eq!(r.diagnostics, vec![Diagnostic::MissingValue("-s".to_string())]);
        assert_eq!(compacted(&r), vec!["prog", "plain"]);
        assert!(r.outcome.success);
    }

    #[test]
    fn test_missing_value_drops_rest() {
        let r = run("-a:i -b:s", &["prog", "-b", "-a"]);
        // "-b" consumes "-a" as its value, so nothing is missing here.
        assert_eq!(find(&r, "-b").as_str(), Some("-a"));

        let r = run("-a:i -b", &["prog", "x", "-a"]);
        assert_eq!(compacted(&r), vec!["prog", "x"]);
    }

    #[test]
    fn test_missing_value_continue_policy() {
        let settings = Settings {
            missing_value: MissingValuePolicy::Continue,
            ..Settings::default()
        };
        let r = run_with("-s:s -v", &["prog", "-v", "-s"], &settings);
        assert_eq!(compacted(&r), vec!["prog", "-s"]);
        assert!(find(&r, "-v").is_set());

        let r = run_with("-s:S -v", &["prog", "-s", "-v"], &settings);
        // Attached "-s" needs a longer token, so "-s" is not an option at all.
        assert_eq!(compacted(&r), vec!["prog", "-s"]);
    }

    #[test]
    fn test_invalid_value_continues() {
        let r = run("-i:i=5 -v", &["prog", "-i", "abc", "-v"]);
        assert_eq!(find(&r, "-i").as_integer(), Some(5));
        assert!(!find(&r, "-i").is_set());
        assert!(find(&r, "-v").is_set());
        assert_eq!(
            r.diagnostics,
            vec![Diagnostic::InvalidValue {
                option: "-i".to_string(),
                value: "abc".to_string(),
            }]
        );
        assert_eq!(compacted(&r), vec!["prog"]);
    }

    #[test]
    fn test_invalid_attached_value_reports_inline_text() {
        let r = run("-R:R", &["prog", "-Rxyz"]);
        assert_eq!(
            r.diagnostics,
            vec![Diagnostic::InvalidValue {
                option: "-R".to_string(),
                value: "xyz".to_string(),
            }]
        );
    }

    #[test]
    fn test_choice_values() {
        let r = run("-c:c[a,b,c]", &["prog", "-c", "b"]);
        assert_eq!(find(&r, "-c").as_choice(), Some(1));

        let r = run("-c:c[a,b,c]=2", &["prog", "-c", "z"]);
        assert_eq!(find(&r, "-c").as_choice(), Some(2));
        assert!(r.diagnostics[0].is_error());
    }

    #[test]
    fn test_flag_cluster() {
        let r = run("-a -b -c", &["prog", "-ab"]);
        assert!(find(&r, "-a").is_set());
        assert!(find(&r, "-b").is_set());
        assert!(!find(&r, "-c").is_set());
        assert_eq!(compacted(&r), vec!["prog"]);
        assert!(r.diagnostics.is_empty());
    }

    #[test]
    fn test_flag_cluster_unknown_letter() {
        let r = run("-a -b", &["prog", "-az"]);
        assert!(!find(&r, "-a").is_set());
        assert!(!find(&r, "-b").is_set());
        assert_eq!(compacted(&r), vec!["prog", "-az"]);
        assert_eq!(r.diagnostics, vec![Diagnostic::UnrecognisedFlag('z')]);
    }

    #[test]
    fn test_flag_cluster_skip_letters_rebuilt() {
        let r = run("-a:fs -b", &["prog", "-ba"]);
        assert!(find(&r, "-a").is_set());
        assert!(find(&r, "-b").is_set());
        assert_eq!(compacted(&r), vec!["prog", "-a"]);
    }

    #[test]
    fn test_cluster_is_case_sensitive() {
        let r = run("-a:fn", &["prog", "-A"]);
        // "-A" matches "-a" whole-token because of the no-case flag.
        assert!(find(&r, "-a").is_set());

        let r = run("-a:fn -b", &["prog", "-bA"]);
        assert!(!find(&r, "-a").is_set());
        assert_eq!(r.diagnostics, vec![Diagnostic::UnrecognisedFlag('A')]);
    }

    #[test]
    fn test_no_short_flags_means_unrecognised() {
        let r = run("--verbose -i:i", &["prog", "-xy"]);
        assert_eq!(
            r.diagnostics,
            vec![Diagnostic::UnrecognisedArgument("-xy".to_string())]
        );
        assert_eq!(compacted(&r), vec!["prog", "-xy"]);
    }

    #[test]
    fn test_lone_dash_kept_quietly_with_short_flags() {
        let r = run("-a", &["prog", "-"]);
        assert!(r.diagnostics.is_empty());
        assert_eq!(compacted(&r), vec!["prog", "-"]);
    }

    #[test]
    fn test_skip_flag_keeps_tokens() {
        let r = run("-s:ss -t:s", &["prog", "-s", "one", "-t", "two", "x"]);
        assert_eq!(find(&r, "-s").as_str(), Some("one"));
        assert_eq!(find(&r, "-t").as_str(), Some("two"));
        assert_eq!(compacted(&r), vec!["prog", "-s", "one", "x"]);
    }

    #[test]
    fn test_double_dash_stops_options() {
        let r = run("-v -i:i", &["prog", "--", "-v", "-i", "3", "--"]);
        assert!(!find(&r, "-v").is_set());
        assert!(!find(&r, "-i").is_set());
        assert_eq!(compacted(&r), vec!["prog", "-v", "-i", "3", "--"]);
        assert!(r.state.skip_remaining);
        assert!(r.diagnostics.is_empty());
    }

    #[test]
    fn test_help_does_not_abort() {
        let r = run("-v (verbose)", &["prog", "--help", "-v"]);
        assert!(r.state.help_requested);
        assert!(find(&r, "-v").is_set());
        assert_eq!(compacted(&r), vec!["prog"]);
        match &r.diagnostics[0] {
            Diagnostic::HelpRequested { usage } => {
                assert!(usage.starts_with("prog [-v] \n"));
                assert!(usage.contains("-v : verbose"));
            }
            other => panic!("Expected HelpRequested, got {:?}", other),
        }
    }

    #[test]
    fn test_help_option_disabled() {
        let settings = Settings {
            help_option: false,
            ..Settings::default()
        };
        let r = run_with("-v", &["prog", "--help"], &settings);
        assert!(!r.state.help_requested);
        assert_eq!(compacted(&r), vec!["prog", "--help"]);
    }

    #[test]
    fn test_string_list_accumulates() {
        let r = run("-f:sm", &["prog", "-f", "a", "x", "-f", "b"]);
        assert_eq!(
            find(&r, "-f").as_list(),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert_eq!(compacted(&r), vec!["prog", "x"]);
    }

    #[test]
    fn test_string_list_takes_one_value_per_occurrence() {
        let r = run("-f:sm", &["prog", "-f", "a", "-f", "b", "-f", "c", "d"]);
        let f = find(&r, "-f");
        assert_eq!(f.arity(), 1);
        assert_eq!(
            f.as_list(),
            Some(&["a".to_string(), "b".to_string(), "c".to_string()][..])
        );
        assert_eq!(compacted(&r), vec!["prog", "d"]);
        assert!(r.diagnostics.is_empty());
    }

    #[test]
    fn test_string_list_skip_keeps_each_pair() {
        let r = run("-f:sms", &["prog", "-f", "a", "x", "-f", "b"]);
        assert_eq!(
            find(&r, "-f").as_list(),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert_eq!(compacted(&r), vec!["prog", "-f", "a", "x", "-f", "b"]);
    }

    #[test]
    fn test_required_not_rolled_back() {
        let r = run("-i:i -s:sr", &["prog", "-i", "9"]);
        assert!(!r.outcome.success);
        assert_eq!(find(&r, "-i").as_integer(), Some(9));
        assert_eq!(
            r.diagnostics,
            vec![Diagnostic::RequiredMissing("-s".to_string())]
        );
    }

    #[test]
    fn test_no_compaction_requested() {
        let mut descriptors = compile("-v").unwrap();
        let mut state = MatchState::default();
        let mut sink = Collector::new();
        let outcome = match_args(
            &mut descriptors,
            &mut state,
            &Settings::default(),
            &["prog", "-v"],
            false,
            &mut sink,
        );
        assert!(outcome.success);
        assert!(outcome.compacted.is_none());
        assert!(descriptors[0].is_set());
    }

    #[test]
    fn test_non_dash_and_empty_tokens_kept() {
        let r = run("-v", &["prog", "", "file", "-v"]);
        assert_eq!(compacted(&r), vec!["prog", "", "file"]);
    }
}
