mod config;

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::StreamExt;
use perk_events::{EventBus, RewardEvent};
use perk_events_memory::MemoryEventBus;
use perk_session::{
    AdReadiness, CountdownEvent, Screen, Session, SessionConfig, SimulatedAdDelivery, WatchAd,
    WithdrawalRequest, WITHDRAWAL_THRESHOLD,
};
use perk_storage::ProfileStore;
use perk_store_file::FileStore;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "perk")]
#[command(about = "Watch ads, earn coins, withdraw once you reach 100")]
struct Args {
    /// Profile store path (JSON document). Defaults to ~/.perk/profiles.json
    #[arg(long)]
    store: Option<PathBuf>,

    /// Ad countdown length in seconds
    #[arg(long)]
    ad_duration: Option<u32>,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = CliConfig::from_env()?;
    if let Some(duration) = args.ad_duration {
        config.ad_duration_secs = duration;
    }
    if let Some(path) = args.store {
        config.store_path = Some(path);
    }

    let store: Arc<dyn ProfileStore> = match &config.store_path {
        Some(path) => Arc::new(FileStore::open(path.clone())),
        None => Arc::new(FileStore::open_default()?),
    };
    let events = Arc::new(MemoryEventBus::new());
    let delivery = Arc::new(SimulatedAdDelivery::new(Duration::from_millis(
        config.ad_load_millis,
    )));
    let mut session = Session::new(
        store,
        events.clone(),
        delivery,
        SessionConfig {
            ad_duration_secs: config.ad_duration_secs,
            tick_interval: Duration::from_secs(1),
        },
    );

    info!(
        ad_duration_secs = config.ad_duration_secs,
        "perk client starting"
    );

    // Celebratory notifications arrive out-of-band on the bus.
    let mut notifications = events.subscribe(&session.id()).await?;
    tokio::spawn(async move {
        while let Some(event) = notifications.next().await {
            match event {
                RewardEvent::CheckpointReached { balance } => println!(
                    "\n🎉 Checkpoint reached! You have collected {} coins. You may withdraw now.",
                    balance
                ),
                RewardEvent::WithdrawalCompleted { amount, card_last4 } => println!(
                    "\n✅ Successfully withdrew {} coins to card ending in {}.",
                    amount, card_last4
                ),
            }
        }
    });

    println!("🎁 perk: watch ads, earn coins");
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_prompt(&session);
        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        match session.screen() {
            Screen::LoggedOut => handle_logged_out(&mut session, &line).await,
            Screen::Dashboard => handle_dashboard(&mut session, &mut input, &line).await,
            // The two sub-flows below drive their own screens to completion,
            // so the main loop only ever prompts on these two.
            Screen::Watching | Screen::WithdrawalForm | Screen::OtpPending => {
                println!("(busy)");
            }
        }
    }

    println!("Bye.");
    Ok(())
}

fn print_prompt(session: &Session) {
    match session.screen() {
        Screen::LoggedOut => print!("login <email> <password> | quit\n> "),
        Screen::Dashboard => {
            if let Some(profile) = session.profile() {
                println!(
                    "💰 {} coins | 📺 {} ads watched | 🎯 {}",
                    profile.coins,
                    profile.ads_watched,
                    if profile.coins >= WITHDRAWAL_THRESHOLD {
                        "withdrawal available".to_string()
                    } else {
                        format!("{} coins to withdrawal", WITHDRAWAL_THRESHOLD - profile.coins)
                    }
                );
            }
            print!("watch | withdraw | logout | quit\n> ");
        }
        _ => print!("> "),
    }
    let _ = std::io::stdout().flush();
}

async fn handle_logged_out(session: &mut Session, line: &str) {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("login") => {
            let email = parts.next().unwrap_or_default();
            let password = parts.next().unwrap_or_default();
            match session.login(email, password).await {
                Ok(profile) => println!("Welcome, {}!", profile.email),
                Err(e) => println!("⚠️  {}", e),
            }
        }
        _ => println!("Unknown command: {}", line),
    }
}

async fn handle_dashboard(session: &mut Session, input: &mut Input, line: &str) {
    match line {
        "watch" => watch_ad(session).await,
        "withdraw" => withdrawal_flow(session, input).await,
        "logout" => match session.logout().await {
            Ok(()) => println!("Signed out."),
            Err(e) => println!("⚠️  {}", e),
        },
        other => println!("Unknown command: {}", other),
    }
}

/// One `watch` keypress: either starts playback of a staged ad or requests a
/// load, exactly like the original's two-step button.
async fn watch_ad(session: &mut Session) {
    match session.watch_ad() {
        Ok(WatchAd::Started(mut events)) => {
            println!("📺 Advertisement playing...");
            while let Some(event) = events.recv().await {
                match event {
                    CountdownEvent::Tick { remaining_secs } => {
                        print!("\r⏱️  {:02}s remaining ", remaining_secs);
                        let _ = std::io::stdout().flush();
                    }
                    CountdownEvent::Completed => {
                        println!();
                        match session.complete_ad_watch().await {
                            Ok(outcome) => println!(
                                "💰 +1 coin, balance {} ({} ads watched)",
                                outcome.balance, outcome.ads_watched
                            ),
                            Err(e) => println!("⚠️  {}", e),
                        }
                        return;
                    }
                }
            }
        }
        Ok(WatchAd::LoadStarted) => {
            print!("Loading ad...");
            let _ = std::io::stdout().flush();
            let mut readiness = session.watch_ad_readiness();
            let settled = readiness
                .wait_for(|s| matches!(s, AdReadiness::Ready | AdReadiness::Failed(_)))
                .await;
            match settled.as_deref() {
                Ok(AdReadiness::Ready) => {
                    println!(" done. Type `watch` to play.");
                }
                _ => println!(" failed. Type `watch` to see why."),
            }
        }
        Err(e) => println!("⚠️  {}", e),
    }
}

/// Collect the form field by field, submit, then confirm the one-time code.
async fn withdrawal_flow(session: &mut Session, input: &mut Input) {
    if let Err(e) = session.open_withdrawal() {
        println!("⚠️  {}", e);
        return;
    }
    if let Some(profile) = session.profile() {
        if profile.coins < WITHDRAWAL_THRESHOLD {
            println!(
                "⚠️  You need at least {} coins to withdraw (current: {}).",
                WITHDRAWAL_THRESHOLD, profile.coins
            );
        }
    }

    let fields = [
        "Email address",
        "Phone number",
        "Cardholder name",
        "Card number",
        "Expiry date (MM/YY)",
        "CVV",
    ];
    let mut answers = Vec::with_capacity(fields.len());
    for field in fields {
        print!("{} (or `cancel`): ", field);
        let _ = std::io::stdout().flush();
        match input.next_line().await {
            Ok(Some(line)) if line.trim() != "cancel" => answers.push(line.trim().to_string()),
            _ => {
                let _ = session.cancel_withdrawal();
                println!("Withdrawal cancelled.");
                return;
            }
        }
    }

    let [email, phone_number, cardholder_name, card_number, expiry, cvv]: [String; 6] =
        match answers.try_into() {
            Ok(a) => a,
            Err(_) => return,
        };
    let form = WithdrawalRequest {
        email,
        card_number,
        expiry,
        cvv,
        cardholder_name,
        phone_number,
    };

    let dispatch = match session.request_withdrawal(form) {
        Ok(d) => d,
        Err(e) => {
            println!("⚠️  {}", e);
            let _ = session.cancel_withdrawal();
            return;
        }
    };
    // Dispatch is simulated: surface the code the way the original did.
    println!("📱 OTP sent to {}: {}", dispatch.phone_number, dispatch.code);

    while session.screen() == Screen::OtpPending {
        print!("Enter the 6-digit code (or `back`): ");
        let _ = std::io::stdout().flush();
        let code = match input.next_line().await {
            Ok(Some(line)) => line.trim().to_string(),
            _ => break,
        };
        if code == "back" {
            let _ = session.cancel_otp();
            let _ = session.cancel_withdrawal();
            println!("Withdrawal cancelled.");
            return;
        }
        match session.confirm_otp(&code).await {
            Ok(receipt) => {
                println!(
                    "Withdrew {} coins to card ending in {}.",
                    receipt.amount, receipt.card_last4
                );
                return;
            }
            Err(e) => println!("⚠️  {}", e),
        }
    }

    // Expiry/exhaustion kicked us back to the form; leave it for the menu.
    if session.screen() == Screen::WithdrawalForm {
        let _ = session.cancel_withdrawal();
    }
}
