use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "voterd",
    about = "In-memory voter registry HTTP API",
    version = crate::version::VERSION,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the voter registry HTTP server (default).
    Run,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    #[arg(
        long,
        global = true,
        env = "VOTERD_BIND",
        value_name = "ADDR",
        default_value = "127.0.0.1:1080"
    )]
    pub bind: SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_flags_absent() {
        let cli = Cli::try_parse_from(["voterd"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config.bind, SocketAddr::from(([127, 0, 0, 1], 1080)));
    }

    #[test]
    fn bind_flag_overrides_the_default() {
        let cli = Cli::try_parse_from(["voterd", "run", "--bind", "0.0.0.0:8080"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Run)));
        assert_eq!(cli.config.bind, SocketAddr::from(([0, 0, 0, 0], 8080)));
    }

    #[test]
    fn non_address_bind_is_rejected() {
        assert!(Cli::try_parse_from(["voterd", "--bind", "not-an-addr"]).is_err());
    }
}
