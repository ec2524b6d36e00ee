use anyhow::Result;
use clap::Parser;
use grundle::commands::{self, Config};
use grundle::runtime::RealRuntime;
use grundle::ui::Action;
use std::path::PathBuf;

/// grundle - AppImage installer for GitHub releases
///
/// Downloads AppImage release artifacts and exposes each one behind a
/// stable symlink under the install root, so the path you invoke never
/// changes across upgrades.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for
/// authentication. This is useful for accessing private repositories or
/// avoiding rate limits.
///
/// Examples:
///   grundle list            # Browse known packages
///   grundle install helix   # Install a catalog package
///   grundle install owner/repo
#[derive(Parser, Debug)]
#[command(author, version = env!("GRUNDLE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Install root directory (overrides ~/.grundle; also via GRUNDLE_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "GRUNDLE_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub install_root: Option<PathBuf>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List known packages and their installed state
    List,

    /// Install the latest stable release of a package
    Install(PackageArgs),

    /// Upgrade an installed package to the latest stable release
    Upgrade(PackageArgs),

    /// Remove a package and its stable link
    Remove(PackageArgs),
}

#[derive(clap::Args, Debug)]
pub struct PackageArgs {
    /// A catalog package name, or "owner/repo"
    #[arg(value_name = "PACKAGE")]
    pub package: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let action = match cli.command {
        Commands::List => Action::List,
        Commands::Install(args) => Action::Install(args.package),
        Commands::Upgrade(args) => Action::Upgrade(args.package),
        Commands::Remove(args) => Action::Remove(args.package),
    };

    let config = Config::new(cli.install_root, cli.api_url)?;
    commands::dispatch(&runtime, action, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_install_parsing() {
        let cli = Cli::try_parse_from(["grundle", "install", "helix"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.package, "helix");
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_list_parsing() {
        let cli = Cli::try_parse_from(["grundle", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_cli_upgrade_and_remove_parsing() {
        let cli = Cli::try_parse_from(["grundle", "upgrade", "helix"]).unwrap();
        assert!(matches!(cli.command, Commands::Upgrade(_)));

        let cli = Cli::try_parse_from(["grundle", "remove", "helix"]).unwrap();
        assert!(matches!(cli.command, Commands::Remove(_)));
    }

    #[test]
    fn test_cli_install_root_parsing() {
        let cli =
            Cli::try_parse_from(["grundle", "install", "helix", "--root", "/tmp"]).unwrap();
        assert_eq!(cli.install_root, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_cli_global_flags_before_subcommand() {
        let cli = Cli::try_parse_from([
            "grundle",
            "--root",
            "/tmp",
            "--api-url",
            "http://localhost:1234",
            "list",
        ])
        .unwrap();
        assert_eq!(cli.install_root, Some(PathBuf::from("/tmp")));
        assert_eq!(cli.api_url, Some("http://localhost:1234".to_string()));
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["grundle", "helix"]);
        assert!(result.is_err());
    }
}
