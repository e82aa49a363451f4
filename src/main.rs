//! Friction Combat - interactive demo
//!
//! Fights a simulated guard from the terminal. Every line typed is an action
//! description; the guard answers through reaction windows and NPC
//! counter-reactions, printed as they happen.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use friction_combat::combat::constants::npc_base_damage;
use friction_combat::core::dice;
use friction_combat::core::types::{ActorId, ActorKind, Rank, RoomId};
use friction_combat::narration::TemplateNarrator;
use friction_combat::ports::{ActorProfile, Collaborators, ForwardingChannel, InMemoryCharacterStore};
use friction_combat::reaction::ReactionRequest;
use friction_combat::{CombatEngine, CounterOutcome, EngineConfig, Result};

/// Friction Combat - fight a guard with free-text actions
#[derive(Parser, Debug)]
#[command(name = "friction-combat")]
#[command(about = "Text-driven combat against a simulated guard")]
struct Args {
    /// TOML file overriding engine constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "C")]
    player_rank: Rank,

    #[arg(long, default_value = "S")]
    npc_rank: Rank,

    /// Room the notifications are addressed to
    #[arg(long, default_value = "arene")]
    room: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("friction_combat=info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let player = ActorId::from("joueur");
    let npc = ActorId::from("garde");
    let room = RoomId::new(args.room.clone());

    let store = Arc::new(InMemoryCharacterStore::with_actors([
        ActorProfile::new("joueur", "Vous", ActorKind::Player, args.player_rank),
        ActorProfile::new("garde", "Le garde", ActorKind::NonPlayer, args.npc_rank),
    ]));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let collaborators = Collaborators::new(
        store.clone(),
        Arc::new(ForwardingChannel::new(tx)),
        Arc::new(TemplateNarrator::new()),
    );
    rt.spawn(async move {
        while let Some(notification) = rx.recv().await {
            println!("[{}] {}", notification.room, notification.text);
        }
    });

    let dice = match args.seed {
        Some(seed) => dice::shared(dice::seeded(seed)),
        None => dice::shared(dice::from_entropy()),
    };
    let engine = CombatEngine::new(config, collaborators, dice)?;

    println!("\n=== FRICTION COMBAT ===");
    println!("Vous ({}) affrontez un garde ({}).", args.player_rank, args.npc_rank);
    println!();
    println!("Commands:");
    println!("  <texte>          - Décrire une action contre le garde");
    println!("  defendre / d     - Réagir à l'attaque en cours");
    println!("  contre <texte>   - Contre-attaquer pendant la fenêtre de réaction");
    println!("  status / s       - Afficher l'état (JSON)");
    println!("  quit / q         - Quitter");
    println!();

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        match input {
            "" => continue,
            "quit" | "q" => break,
            "status" | "s" => {
                let status = engine.status(&player)?;
                match serde_json::to_string_pretty(&status) {
                    Ok(json) => println!("{}", json),
                    Err(e) => tracing::warn!("Could not serialize status: {}", e),
                }
                if let Some(sheet) = store.sheet(&player) {
                    println!("PV: {:.0}  Énergie: {:.0}  Réputation: {}", sheet.health, sheet.energy, sheet.reputation);
                }
            }
            "defendre" | "d" => match engine.reactions().pending_for(&player) {
                Some(action_id) => println!("{:?}", engine.respond(&action_id)?),
                None => println!("Aucune attaque en cours."),
            },
            _ if input.starts_with("contre ") => match engine.reactions().pending_for(&player) {
                Some(action_id) => match engine.counter(&action_id, &input["contre ".len()..])? {
                    CounterOutcome::Resolved { .. } => {}
                    CounterOutcome::TooLate { status } => println!("Trop tard ({:?}).", status),
                },
                None => println!("Aucune attaque à contrer."),
            },
            action => {
                let attempt = engine.attempt(&player, action, Some(&npc))?;
                println!("{}", attempt.narration);

                let request = if attempt.outcome.is_success() {
                    ReactionRequest::new(npc.clone(), room.clone(), action)
                        .from_attacker(player.clone())
                        .with_damage(npc_base_damage(args.player_rank))
                } else if attempt.outcome.is_busy() {
                    continue;
                } else {
                    ReactionRequest::new(player.clone(), room.clone(), "une attaque du garde")
                        .from_attacker(npc.clone())
                        .with_damage(npc_base_damage(args.npc_rank))
                };
                if let Err(e) = engine.start_reaction(request) {
                    tracing::warn!("Could not open reaction window: {}", e);
                }
            }
        }
    }

    tracing::info!("Friction Combat shutting down");
    Ok(())
}
