use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "transforge")]
#[command(author, version, about = "Rule-driven batch transcoding with a resumable job queue")]
#[command(after_help = "\
Profiles given with -p apply to the files (and --from-file list) that follow \
them, up to the next -p. Without files, the configured default_queue_file is \
processed.")]
pub struct Cli {
    /// Media files or directories to transcode
    pub files: Vec<PathBuf>,

    /// Process the paths listed in FILE, one per line, and remove finished ones from it
    #[arg(long = "from-file", value_name = "FILE")]
    pub from_file: Option<PathBuf>,

    /// Force a profile for the inputs that follow
    #[arg(short = 'p', long = "profile", value_name = "NAME", action = ArgAction::Append)]
    pub profile: Vec<String>,

    /// Path to config file
    #[arg(short = 'y', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run one transcode at a time regardless of concurrent_jobs
    #[arg(short, long)]
    pub sequential: bool,

    /// Keep source files; outputs keep their .tmp name
    #[arg(short, long)]
    pub keep_source: bool,

    /// Print the commands that would run without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    List(PathBuf),
}

/// An input with the profile forced for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArg {
    pub source: Source,
    pub profile: Option<String>,
}

/// Parsed command line with `-p` resolved against argument positions.
#[derive(Debug)]
pub struct Invocation {
    pub cli: Cli,
    /// Inputs in command-line order.
    pub sources: Vec<SourceArg>,
    /// The last `-p` given; applies to the default queue file.
    pub last_profile: Option<String>,
}

impl Invocation {
    /// Parse `std::env::args_os`, exiting on error or `--help`.
    pub fn parse() -> Self {
        Self::try_parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Cli::command().try_get_matches_from(args)?;
        let cli = Cli::from_arg_matches(&matches)?;

        let profiles: Vec<(usize, String)> = indexed(&matches, "profile");
        let profile_at = |index: usize| {
            profiles
                .iter()
                .take_while(|(i, _)| *i < index)
                .last()
                .map(|(_, name)| name.clone())
        };

        let mut sources: Vec<(usize, Source)> = indexed::<PathBuf>(&matches, "files")
            .into_iter()
            .map(|(i, path)| (i, Source::File(path)))
            .collect();
        sources.extend(
            indexed::<PathBuf>(&matches, "from_file")
                .into_iter()
                .map(|(i, path)| (i, Source::List(path))),
        );
        sources.sort_by_key(|(i, _)| *i);

        let sources = sources
            .into_iter()
            .map(|(i, source)| SourceArg {
                source,
                profile: profile_at(i),
            })
            .collect();

        Ok(Self {
            last_profile: profiles.last().map(|(_, name)| name.clone()),
            cli,
            sources,
        })
    }
}

/// Values of argument `id` paired with their positions on the command line.
fn indexed<T>(matches: &ArgMatches, id: &str) -> Vec<(usize, T)>
where
    T: Clone + Send + Sync + 'static,
{
    match (matches.indices_of(id), matches.get_many::<T>(id)) {
        (Some(indices), Some(values)) => indices.zip(values.cloned()).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Invocation {
        let mut argv = vec!["transforge"];
        argv.extend_from_slice(args);
        Invocation::try_parse_from(argv).unwrap()
    }

    fn file(path: &str, profile: Option<&str>) -> SourceArg {
        SourceArg {
            source: Source::File(PathBuf::from(path)),
            profile: profile.map(str::to_string),
        }
    }

    #[test]
    fn test_no_profile() {
        let inv = parse(&["a.avi", "b.avi"]);
        assert_eq!(inv.sources, [file("a.avi", None), file("b.avi", None)]);
        assert_eq!(inv.last_profile, None);
    }

    #[test]
    fn test_profile_applies_to_following_files() {
        let inv = parse(&["a.avi", "-p", "hevc", "b.avi", "c.avi", "-p", "mobile", "d.avi"]);
        assert_eq!(
            inv.sources,
            [
                file("a.avi", None),
                file("b.avi", Some("hevc")),
                file("c.avi", Some("hevc")),
                file("d.avi", Some("mobile")),
            ]
        );
        assert_eq!(inv.last_profile.as_deref(), Some("mobile"));
    }

    #[test]
    fn test_profile_applies_to_list() {
        let inv = parse(&["-p", "hevc", "--from-file", "queue.txt", "a.avi"]);
        assert_eq!(
            inv.sources,
            [
                SourceArg {
                    source: Source::List(PathBuf::from("queue.txt")),
                    profile: Some("hevc".to_string()),
                },
                file("a.avi", Some("hevc")),
            ]
        );
    }

    #[test]
    fn test_flags() {
        let inv = parse(&["-s", "-k", "--dry-run", "-v", "-y", "/etc/t.toml"]);
        assert!(inv.cli.sequential);
        assert!(inv.cli.keep_source);
        assert!(inv.cli.dry_run);
        assert!(inv.cli.verbose);
        assert_eq!(inv.cli.config, Some(PathBuf::from("/etc/t.toml")));
        assert!(inv.sources.is_empty());
    }

    #[test]
    fn test_help_is_reported() {
        let err = Invocation::try_parse_from(["transforge", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
