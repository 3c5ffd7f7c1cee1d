//! argdef - command line parsing driven by a compact option-definition grammar.
//!
//! Options are declared in a single string such as
//! `"-v (verbose) -n:ir=1 (count) -I:Im (include dir)"`, compiled into
//! descriptors, and matched against an argument list. Matched tokens can be
//! removed from the list, leaving the remaining arguments for the caller.
//!
//! ```no_run
//! use argdef::Args;
//!
//! let mut args = Args::new("-v (verbose) -n:i=3 (count)")?;
//! let mut argv: Vec<String> = std::env::args().collect();
//! if !args.parse_compact(&mut argv) {
//!     std::process::exit(1);
//! }
//! let verbose = args.get_bool("-v");
//! let count = args.get_integer("-n");
//! # Ok::<(), argdef::DefinitionError>(())
//! ```

pub mod bind;
pub mod definition;
pub mod descriptor;
pub mod diagnostic;
pub mod help;
pub mod matcher;
pub mod output;
pub mod registry;
pub mod settings;
pub mod value;

pub use bind::{BindError, Slot};
pub use definition::{compile, DefinitionError};
pub use descriptor::{ArgValue, Descriptor, Flags, Kind};
pub use diagnostic::{Collector, Diagnostic, DiagnosticSink, Ignore, LogSink};
pub use help::generate_usage;
pub use matcher::{MatchOutcome, MatchState};
pub use output::{generate_output, generate_output_string};
pub use registry::{ArgError, Args, DescriptorSnapshot, FromArg};
pub use settings::{MissingValuePolicy, Settings, SettingsError};
