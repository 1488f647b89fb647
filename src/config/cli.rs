use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "bitable-ads")]
#[command(about = "Create TikTok campaigns, ad groups and ads from a Feishu Bitable")]
pub struct Cli {
    #[arg(long, short, default_value = "bitable-ads.toml")]
    pub config: PathBuf,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 讀取表格並依序建立系列、組與廣告
    Run(RunArgs),
    /// 以授權碼換取 TikTok access token
    Auth {
        #[arg(long)]
        auth_code: String,
    },
    /// 列出設定中的 access token 可操作的廣告帳戶
    Advertisers,
    /// 檢查飛書應用能否存取設定的資料表
    Verify,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// 只處理這些記錄 (以逗號分隔)，未指定時處理整張表
    #[arg(long, value_delimiter = ',')]
    pub records: Vec<String>,

    /// 把每筆結果寫成 CSV
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// 不呼叫 TikTok、不回寫表格
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::parse_from([
            "bitable-ads",
            "--config",
            "ads.toml",
            "run",
            "--records",
            "recA,recB",
            "--report",
            "out/report.csv",
            "--dry-run",
            "--verbose",
        ]);

        assert_eq!(cli.config, PathBuf::from("ads.toml"));
        assert!(cli.verbose);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.records, vec!["recA", "recB"]);
                assert_eq!(args.report, Some(PathBuf::from("out/report.csv")));
                assert!(args.dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_auth_command() {
        let cli = Cli::parse_from(["bitable-ads", "auth", "--auth-code", "abc"]);
        assert_eq!(cli.config, PathBuf::from("bitable-ads.toml"));
        assert!(matches!(cli.command, Command::Auth { auth_code } if auth_code == "abc"));
    }

    #[test]
    fn test_verify_requires_no_arguments() {
        let cli = Cli::parse_from(["bitable-ads", "--log-json", "verify"]);
        assert!(cli.log_json);
        assert!(matches!(cli.command, Command::Verify));
    }

    #[test]
    fn test_parse_advertisers_command() {
        let cli = Cli::parse_from(["bitable-ads", "-c", "ads.toml", "advertisers"]);
        assert_eq!(cli.config, PathBuf::from("ads.toml"));
        assert!(matches!(cli.command, Command::Advertisers));
    }
}
