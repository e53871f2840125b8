//! `catcolab-doc`: offline tool for CatColab document files

mod commands;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let file = |name: &'static str, help: &'static str| {
        Arg::new(name)
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help(help)
    };

    Command::new("catcolab-doc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Migrate, diff and hash CatColab document JSON files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("migrate")
                .about("Migrate a document to the current schema version")
                .arg(file("file", "Document JSON file"))
                .arg(
                    Arg::new("patch")
                        .long("patch")
                        .action(ArgAction::SetTrue)
                        .help("Print the structural patch instead of the migrated document"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to this file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Print the structural patch between two documents")
                .arg(file("before", "Original document"))
                .arg(file("after", "Changed document")),
        )
        .subcommand(
            Command::new("hash")
                .about("Print the content hash of a document")
                .arg(file("file", "Document JSON file")),
        )
        .subcommand(
            Command::new("inspect")
                .about("Summarize a document after migration")
                .arg(file("file", "Document JSON file")),
        )
}

fn path_arg<'a>(args: &'a clap::ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing argument <{name}>"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let (output, out_file) = match matches.subcommand() {
        Some(("migrate", args)) => {
            let file = path_arg(args, "file")?;
            (
                commands::migrate(file, args.get_flag("patch"))?,
                args.get_one::<PathBuf>("output"),
            )
        }
        Some(("diff", args)) => (
            commands::diff_files(path_arg(args, "before")?, path_arg(args, "after")?)?,
            None,
        ),
        Some(("hash", args)) => (commands::hash(path_arg(args, "file")?)?, None),
        Some(("inspect", args)) => (commands::inspect(path_arg(args, "file")?)?, None),
        _ => anyhow::bail!("no command given"),
    };

    match out_file {
        Some(path) => {
            std::fs::write(path, format!("{output}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("wrote {}", path.display());
        }
        None => println!("{output}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_migrate_flags() {
        let matches = cli()
            .try_get_matches_from(["catcolab-doc", "migrate", "doc.json", "--patch", "-o", "out.json"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "migrate");
        assert!(args.get_flag("patch"));
        assert_eq!(path_arg(args, "output").unwrap(), &PathBuf::from("out.json"));
    }

    #[test]
    fn diff_requires_two_files() {
        assert!(cli()
            .try_get_matches_from(["catcolab-doc", "diff", "a.json"])
            .is_err());
    }
}
