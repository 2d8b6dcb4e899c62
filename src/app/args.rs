use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "vip-parser")]
#[command(about = "Opens video pages through third-party parse lines")]
#[command(version)]
pub struct AppArgs {
    #[arg(long, help = "Config file path (default: <data-dir>/config.json)")]
    pub config: Option<String>,

    #[arg(long, default_value = "data", help = "Data directory")]
    pub data_dir: String,

    #[arg(short, long, help = "Enable debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Parse one video page and open the result
    Parse {
        url: String,

        #[arg(short, long, help = "Line number or name (default: best available)")]
        line: Option<String>,

        #[arg(short, long, help = "Allow pages from unsupported sites")]
        force: bool,

        #[arg(short, long, help = "Print the URL instead of opening a browser")]
        print: bool,
    },
    /// Probe every line and print the ranking
    Rank,
    /// List configured lines
    Lines,
    /// Check the update server for a newer version
    CheckUpdate {
        #[arg(long, help = "Open the download link if an update is available")]
        apply: bool,
    },
    /// Interactive shell (default)
    Shell,
}

impl AppArgs {
    pub fn from_cli() -> Self {
        <Self as Parser>::parse()
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Shell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_shell() {
        let args = AppArgs::try_parse_from(["vip-parser"]).unwrap();
        assert_eq!(args.data_dir, "data");
        assert_eq!(args.command(), Command::Shell);
    }

    #[test]
    fn test_parse_subcommand() {
        let args = AppArgs::try_parse_from([
            "vip-parser",
            "--data-dir",
            "/tmp/vip",
            "parse",
            "https://v.qq.com/x/1.html",
            "--line",
            "2",
            "--print",
        ])
        .unwrap();

        assert_eq!(args.data_dir, "/tmp/vip");
        assert_eq!(
            args.command(),
            Command::Parse {
                url: "https://v.qq.com/x/1.html".to_string(),
                line: Some("2".to_string()),
                force: false,
                print: true,
            }
        );
    }

    #[test]
    fn test_check_update_apply_flag() {
        let args = AppArgs::try_parse_from(["vip-parser", "check-update", "--apply"]).unwrap();
        assert_eq!(args.command(), Command::CheckUpdate { apply: true });
    }
}
