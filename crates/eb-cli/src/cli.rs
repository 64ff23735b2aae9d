use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "eb",
    about = "Earthbind: inspect and edit a persisted session, make and redeem invitations",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Session file
    #[arg(long, global = true, default_value = "earthbind-session.json")]
    pub store: PathBuf,

    /// Key prefix inside the session file (overrides the config file)
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show or change session state
    Session(SessionArgs),
    /// Manage the signed-in identity
    Identity(IdentityArgs),
    /// Attach shares
    Share(ShareArgs),
    /// Manage known sync servers
    Server(ServerArgs),
    /// Make or read invitations
    Invite(InviteArgs),
}

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Print the session
    Show,
    /// Turn live sync on or off
    Live { state: Toggle },
    /// Select a share, or clear the selection
    Select {
        share: Option<String>,
        #[arg(long, conflicts_with = "share")]
        clear: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Args)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub action: IdentityAction,
}

#[derive(Subcommand)]
pub enum IdentityAction {
    /// Generate a new author identity and sign in with it
    New {
        /// Four-character short name
        name: String,
    },
    /// Sign out
    Clear,
}

#[derive(Args)]
pub struct ShareArgs {
    #[command(subcommand)]
    pub action: ShareAction,
}

#[derive(Subcommand)]
pub enum ShareAction {
    /// Attach a share
    Add {
        share: String,
        /// Also select it
        #[arg(long)]
        select: bool,
    },
    /// List attached shares
    List,
}

#[derive(Args)]
pub struct ServerArgs {
    #[command(subcommand)]
    pub action: ServerAction,
}

#[derive(Subcommand)]
pub enum ServerAction {
    Add { url: String },
    Remove { url: String },
    List,
}

#[derive(Args)]
pub struct InviteArgs {
    #[command(subcommand)]
    pub action: InviteAction,
}

#[derive(Subcommand)]
pub enum InviteAction {
    /// Make an invitation to a share
    Encode {
        /// Known server to include (repeatable)
        #[arg(long = "pub")]
        pubs: Vec<String>,
        /// Share to invite to (default: the selected share)
        #[arg(long)]
        share: Option<String>,
    },
    /// Read an invitation
    Decode {
        invitation: String,
        /// Attach the share and add its servers
        #[arg(long)]
        redeem: bool,
        /// Server to leave out when redeeming (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_session_show() {
        let cli = Cli::try_parse_from(["eb", "session", "show"]).unwrap();
        if let Command::Session(args) = cli.command {
            assert!(matches!(args.action, SessionAction::Show));
        } else {
            panic!("wrong command");
        }
        assert_eq!(cli.store, PathBuf::from("earthbind-session.json"));
    }

    #[test]
    fn parse_session_live_off() {
        let cli = Cli::try_parse_from(["eb", "session", "live", "off"]).unwrap();
        if let Command::Session(args) = cli.command {
            assert!(matches!(args.action, SessionAction::Live { state: Toggle::Off }));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_select_clear() {
        let cli = Cli::try_parse_from(["eb", "session", "select", "--clear"]).unwrap();
        if let Command::Session(args) = cli.command {
            assert!(matches!(
                args.action,
                SessionAction::Select { share: None, clear: true }
            ));
        } else {
            panic!("wrong command");
        }
        assert!(Cli::try_parse_from(["eb", "session", "select", "+a.b", "--clear"]).is_err());
    }

    #[test]
    fn parse_share_add() {
        let cli = Cli::try_parse_from(["eb", "share", "add", "+garden.abc", "--select"]).unwrap();
        if let Command::Share(args) = cli.command {
            match args.action {
                ShareAction::Add { share, select } => {
                    assert_eq!(share, "+garden.abc");
                    assert!(select);
                }
                _ => panic!("wrong action"),
            }
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_server_remove() {
        let cli = Cli::try_parse_from(["eb", "server", "remove", "https://a.example"]).unwrap();
        if let Command::Server(args) = cli.command {
            assert!(matches!(args.action, ServerAction::Remove { .. }));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_invite_encode_repeated_pubs() {
        let cli = Cli::try_parse_from([
            "eb",
            "invite",
            "encode",
            "--pub",
            "https://a.example",
            "--pub",
            "https://b.example",
        ])
        .unwrap();
        if let Command::Invite(args) = cli.command {
            match args.action {
                InviteAction::Encode { pubs, share } => {
                    assert_eq!(pubs.len(), 2);
                    assert!(share.is_none());
                }
                _ => panic!("wrong action"),
            }
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_invite_decode_redeem() {
        let cli = Cli::try_parse_from([
            "eb",
            "invite",
            "decode",
            "earthstar:///?workspace=+a.b&v=1",
            "--redeem",
            "--exclude",
            "https://a.example",
        ])
        .unwrap();
        if let Command::Invite(args) = cli.command {
            match args.action {
                InviteAction::Decode { redeem, exclude, .. } => {
                    assert!(redeem);
                    assert_eq!(exclude, vec!["https://a.example".to_string()]);
                }
                _ => panic!("wrong action"),
            }
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "eb",
            "--verbose",
            "--namespace",
            "notes",
            "--store",
            "/tmp/s.json",
            "--format",
            "json",
            "server",
            "list",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.namespace.as_deref(), Some("notes"));
        assert_eq!(cli.store, PathBuf::from("/tmp/s.json"));
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
