use clap::ValueEnum;

/// How command results are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Pretty-printed JSON envelope
	#[default]
	Json,
	/// One JSON envelope per line
	Ndjson,
	/// Result data followed by diagnostics, for terminals
	Text,
}
