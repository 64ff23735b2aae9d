use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use eb_engine::generate_identity;
use eb_sdk::{
    identity_label, AddShare, AppConfig, Earthbind, JsonFileStore, Peer, ShareAddress,
    SyncServerUrl,
};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut app = open_app(&cli)?;
    match cli.command {
        Command::Session(args) => cmd_session(&mut app, args, &cli.format),
        Command::Identity(args) => cmd_identity(&app, args),
        Command::Share(args) => cmd_share(&app, args, &cli.format),
        Command::Server(args) => cmd_server(&app, args, &cli.format),
        Command::Invite(args) => cmd_invite(&app, args, &cli.format),
    }
}

fn open_app(cli: &Cli) -> anyhow::Result<Earthbind> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(namespace) = &cli.namespace {
        config = config.with_namespace(namespace.clone());
    }
    let store = JsonFileStore::open(&cli.store)
        .with_context(|| format!("opening session file {}", cli.store.display()))?;
    debug!(store = %cli.store.display(), namespace = %config.namespace, "opening session");
    Ok(Earthbind::in_memory(config, Arc::new(store)))
}

fn parse_share(raw: &str) -> anyhow::Result<ShareAddress> {
    ShareAddress::new(raw).with_context(|| format!("bad share address {raw:?}"))
}

fn parse_server(raw: &str) -> anyhow::Result<SyncServerUrl> {
    SyncServerUrl::parse(raw).with_context(|| format!("bad server URL {raw:?}"))
}

fn cmd_session(
    app: &mut Earthbind,
    args: SessionArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match args.action {
        SessionAction::Show => {
            let report = app.tick()?;
            let state = app.session().snapshot();
            match format {
                OutputFormat::Json => {
                    let out = json!({
                        "namespace": app.config().namespace,
                        "identity": state.identity.as_ref().map(|i| &i.address),
                        "sync_servers": state.sync_servers,
                        "shares": state.shares,
                        "current_share": report.cache_share,
                        "is_live": state.is_live,
                        "open_syncs": app.live_sync().open_servers(),
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                OutputFormat::Text => {
                    println!("Identity: {}", identity_label(state.identity.as_ref()).bold());
                    let live = if state.is_live {
                        "live".green()
                    } else {
                        "offline".yellow()
                    };
                    println!("Sync: {live}");
                    match &report.cache_share {
                        Some(share) => println!("Current share: {}", share.to_string().cyan()),
                        None => println!("Current share: {}", "none".dimmed()),
                    }
                    println!("Shares:");
                    for share in &state.shares {
                        let marker = if app.peer().has_share(share) {
                            "✓".green()
                        } else {
                            "✗".red()
                        };
                        println!("  {marker} {share}");
                    }
                    println!("Sync servers:");
                    for server in &state.sync_servers {
                        let marker = if app.live_sync().is_open(server) {
                            "●".green()
                        } else {
                            "○".dimmed()
                        };
                        println!("  {marker} {server}");
                    }
                }
            }
        }
        SessionAction::Live { state } => {
            let live = state == Toggle::On;
            app.set_live(live);
            let word = if live { "live".green() } else { "offline".yellow() };
            println!("{} Session is now {word}.", "✓".green().bold());
        }
        SessionAction::Select { share, clear } => {
            let Some(raw) = share.filter(|_| !clear) else {
                app.select_share(None);
                println!("{} Selection cleared.", "✓".green().bold());
                return Ok(());
            };
            let share = parse_share(&raw)?;
            if !app.peer().has_share(&share) {
                bail!("share {share} is not attached; run `eb share add {share}` first");
            }
            app.select_share(Some(share.clone()));
            println!("{} Selected {}.", "✓".green().bold(), share.to_string().cyan());
        }
    }
    Ok(())
}

fn cmd_identity(app: &Earthbind, args: IdentityArgs) -> anyhow::Result<()> {
    match args.action {
        IdentityAction::New { name } => {
            let identity = generate_identity(&name)?;
            println!("{} Signed in as {}", "✓".green().bold(), identity.address.bold());
            app.sign_in(identity);
        }
        IdentityAction::Clear => {
            app.sign_out();
            println!("{} Signed out.", "✓".green().bold());
        }
    }
    Ok(())
}

fn cmd_share(app: &Earthbind, args: ShareArgs, format: &OutputFormat) -> anyhow::Result<()> {
    match args.action {
        ShareAction::Add { share, select } => {
            let share = parse_share(&share)?;
            match app.add_share(&share) {
                AddShare::Attached => {
                    println!("{} Attached {}.", "✓".green().bold(), share.to_string().cyan())
                }
                AddShare::AlreadyAttached => {
                    println!("{} already attached.", share.to_string().cyan())
                }
                AddShare::Failed(e) => bail!(e),
            }
            if select {
                app.select_share(Some(share));
            }
        }
        ShareAction::List => {
            let shares = app.session().shares();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shares)?),
                OutputFormat::Text if shares.is_empty() => println!("No shares."),
                OutputFormat::Text => {
                    for share in shares {
                        println!("{share}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn cmd_server(app: &Earthbind, args: ServerArgs, format: &OutputFormat) -> anyhow::Result<()> {
    match args.action {
        ServerAction::Add { url } => {
            let server = parse_server(&url)?;
            app.add_sync_server(server.clone());
            println!("{} Added {}.", "✓".green().bold(), server.to_string().blue());
        }
        ServerAction::Remove { url } => {
            let server = parse_server(&url)?;
            app.remove_sync_server(&server);
            println!("{} Removed {}.", "✓".green().bold(), server.to_string().blue());
        }
        ServerAction::List => {
            let servers = app.session().sync_servers();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&servers)?),
                OutputFormat::Text if servers.is_empty() => println!("No sync servers."),
                OutputFormat::Text => {
                    for server in servers {
                        println!("{server}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn cmd_invite(app: &Earthbind, args: InviteArgs, format: &OutputFormat) -> anyhow::Result<()> {
    match args.action {
        InviteAction::Encode { pubs, share } => {
            let included = pubs
                .iter()
                .map(|raw| parse_server(raw))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let share = share.as_deref().map(parse_share).transpose()?;
            let code = app.make_invitation(&included, share.as_ref())?;
            println!("{code}");
        }
        InviteAction::Decode {
            invitation,
            redeem,
            exclude,
        } => {
            let excluded = exclude
                .iter()
                .map(|raw| parse_server(raw))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let decoded = app.decode_invitation(&invitation)?;
            match format {
                OutputFormat::Json => {
                    let out = json!({ "share": decoded.share, "servers": decoded.servers });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                OutputFormat::Text => {
                    println!("Share: {}", decoded.share.to_string().cyan());
                    for server in &decoded.servers {
                        println!("  pub: {}", server.to_string().blue());
                    }
                }
            }
            if redeem {
                match decoded.redeem(app.container(), &excluded) {
                    AddShare::Failed(e) => bail!(e),
                    _ => println!("{} Invitation redeemed.", "✓".green().bold()),
                }
            }
        }
    }
    Ok(())
}
