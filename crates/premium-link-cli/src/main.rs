// Premium Link CLI - command-line client for the premium link server

mod client;

use clap::{Parser, Subcommand};
use colored::Colorize;
use premium_link_types::{ProfileId, UserStatus, WalletAddress};
use serde::Serialize;

use client::PremiumClient;

/// Premium Link - link wallets to premium profiles
#[derive(Parser)]
#[command(name = "premium-link")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the premium link server
    #[arg(
        long,
        global = true,
        env = "PREMIUM_LINK_SERVER",
        default_value = "http://localhost:3000"
    )]
    server: String,

    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a wallet's membership status
    Status {
        /// Wallet address (0x + 40 hex characters)
        wallet: String,
    },
    /// List the profiles a wallet can link
    Profiles {
        /// Wallet address
        wallet: String,
    },
    /// Link a wallet to a profile it owns
    Link {
        /// Wallet address
        wallet: String,

        /// Profile identifier
        profile: String,
    },
    /// Link a wallet to its first eligible profile
    AutoLink {
        /// Wallet address
        wallet: String,
    },
    /// Remove a wallet's active link
    Unlink {
        /// Wallet address
        wallet: String,
    },
    /// Show every link a wallet has held
    History {
        /// Wallet address
        wallet: String,
    },
    /// Revoke whatever link holds a profile (admin)
    Revoke {
        /// Profile identifier
        profile: String,

        /// Admin bearer token
        #[arg(long, env = "PREMIUM_LINK_ADMIN_TOKEN", hide_env_values = true)]
        admin_token: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let client = PremiumClient::new(&cli.server);

    let result = match cli.command {
        Commands::Status { wallet } => handle_status(&client, &wallet, cli.json),
        Commands::Profiles { wallet } => handle_profiles(&client, &wallet, cli.json),
        Commands::Link { wallet, profile } => handle_link(&client, &wallet, &profile, cli.json),
        Commands::AutoLink { wallet } => handle_auto_link(&client, &wallet, cli.json),
        Commands::Unlink { wallet } => handle_unlink(&client, &wallet, cli.json),
        Commands::History { wallet } => handle_history(&client, &wallet, cli.json),
        Commands::Revoke {
            profile,
            admin_token,
        } => handle_revoke(&client, &profile, &admin_token, cli.json),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "✗".red().bold(), format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn parse_wallet(raw: &str) -> anyhow::Result<WalletAddress> {
    WalletAddress::parse(raw).map_err(|e| anyhow::anyhow!("Invalid wallet address '{}': {}", raw, e))
}

fn parse_profile(raw: &str) -> anyhow::Result<ProfileId> {
    ProfileId::parse(raw).map_err(|e| anyhow::anyhow!("Invalid profile id '{}': {}", raw, e))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_label(status: UserStatus) -> String {
    match status {
        UserStatus::ProLinked => status.as_str().green().bold().to_string(),
        UserStatus::OnChainUnlinked => status.as_str().yellow().bold().to_string(),
        UserStatus::Standard => status.as_str().dimmed().to_string(),
    }
}

fn premium_label(status: UserStatus) -> &'static str {
    if status.is_premium() {
        "yes"
    } else {
        "no"
    }
}

fn handle_status(client: &PremiumClient, wallet: &str, json: bool) -> anyhow::Result<()> {
    let wallet = parse_wallet(wallet)?;
    let info = client.status(&wallet)?;
    if json {
        return print_json(&info);
    }

    println!("  Wallet:  {}", wallet);
    println!("  Status:  {}", status_label(info.user_status));
    println!("  Premium: {}", premium_label(info.user_status));
    if let Some(linked) = &info.linked_profile {
        println!("  Profile: {} (linked {})", linked.profile_id, linked.linked_at);
    } else if info.user_status == UserStatus::OnChainUnlinked {
        println!();
        println!(
            "  Run `premium-link auto-link {}` to link an owned profile.",
            wallet
        );
    }
    Ok(())
}

fn handle_profiles(client: &PremiumClient, wallet: &str, json: bool) -> anyhow::Result<()> {
    let wallet = parse_wallet(wallet)?;
    let info = client.profiles(&wallet)?;
    if json {
        return print_json(&info);
    }

    if info.profiles.is_empty() {
        println!("No linkable profiles for {}", wallet);
    } else {
        println!("Profiles for {}:", wallet);
        for profile in &info.profiles {
            let linked = info
                .linked_profile
                .as_ref()
                .is_some_and(|l| l.profile_id == profile.id);
            let marker = if linked {
                "(linked)".green().to_string()
            } else {
                String::new()
            };
            match &profile.handle {
                Some(handle) => println!("    - {} {} {}", profile.id, handle.cyan(), marker),
                None => println!("    - {} {}", profile.id, marker),
            }
        }
    }

    println!();
    println!(
        "  Can link: {}",
        if info.can_link { "yes".green() } else { "no".dimmed() }
    );
    Ok(())
}

fn handle_link(
    client: &PremiumClient,
    wallet: &str,
    profile: &str,
    json: bool,
) -> anyhow::Result<()> {
    let wallet = parse_wallet(wallet)?;
    let profile = parse_profile(profile)?;
    let binding = client.link(&wallet, &profile)?;
    if json {
        return print_json(&binding);
    }

    println!("{} Profile linked", "✓".green().bold());
    println!();
    println!("  Wallet:  {}", binding.wallet_address);
    println!("  Profile: {}", binding.profile_id);
    println!("  Linked:  {}", binding.linked_at);
    Ok(())
}

fn handle_auto_link(client: &PremiumClient, wallet: &str, json: bool) -> anyhow::Result<()> {
    let wallet = parse_wallet(wallet)?;
    let binding = client.auto_link(&wallet)?;
    if json {
        return print_json(&binding);
    }

    println!("{} Profile linked", "✓".green().bold());
    println!();
    println!("  Wallet:  {}", binding.wallet_address);
    println!("  Profile: {}", binding.profile_id);
    Ok(())
}

fn handle_unlink(client: &PremiumClient, wallet: &str, json: bool) -> anyhow::Result<()> {
    let wallet = parse_wallet(wallet)?;
    let info = client.unlink(&wallet)?;
    if json {
        return print_json(&info);
    }

    if info.unlinked {
        println!("{} Unlinked {}", "✓".green().bold(), wallet);
    } else {
        println!("{} had no active link", wallet);
    }
    Ok(())
}

fn handle_history(client: &PremiumClient, wallet: &str, json: bool) -> anyhow::Result<()> {
    let wallet = parse_wallet(wallet)?;
    let info = client.history(&wallet)?;
    if json {
        return print_json(&info);
    }

    if info.bindings.is_empty() {
        println!("No links recorded for {}", wallet);
        return Ok(());
    }

    println!("Link history for {} (newest first):", info.wallet_address);
    for entry in &info.bindings {
        let state = if entry.is_active {
            "active".green().to_string()
        } else {
            entry
                .deactivation_reason
                .as_deref()
                .unwrap_or("inactive")
                .dimmed()
                .to_string()
        };
        println!("    - {} linked {} [{}]", entry.profile_id, entry.linked_at, state);
    }
    Ok(())
}

fn handle_revoke(
    client: &PremiumClient,
    profile: &str,
    admin_token: &str,
    json: bool,
) -> anyhow::Result<()> {
    let profile = parse_profile(profile)?;
    let info = client.revoke(&profile, admin_token)?;
    if json {
        return print_json(&info);
    }

    match (info.revoked, &info.wallet_address) {
        (true, Some(wallet)) => println!(
            "{} Revoked {} from {}",
            "✓".green().bold(),
            profile,
            wallet
        ),
        (true, None) => println!("{} Revoked {}", "✓".green().bold(), profile),
        (false, _) => println!("{} had no active link", profile),
    }
    Ok(())
}
