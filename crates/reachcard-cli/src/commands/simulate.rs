//! Drive a card through full sessions on mock hardware.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use reachcard_runtime::mock::{MockJackBackend, MockMixer, MockTransport};
use reachcard_runtime::{
    Collaborators, Direction, HwParams, InitAction, LinkSession, SoundCard, TriggerCommand,
};

use super::common;

/// Simulate a card's session lifecycle.
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to the card description (TOML)
    pub file: PathBuf,

    /// Only run the link with this canonical or declared name
    #[arg(long)]
    pub link: Option<String>,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let description = common::load(&args.file)?;
    description.validate()?;
    let transport = Arc::new(MockTransport::new());
    let jacks = Arc::new(MockJackBackend::new());
    let mixer = Arc::new(MockMixer::new());

    let card = SoundCard::bring_up(
        description.card_metadata()?,
        &description.endpoint_records(),
        description.provider_table(),
        Collaborators {
            transport: transport.clone(),
            jacks: jacks.clone(),
            mixer: mixer.clone(),
        },
        description.volume_policy(),
    )?;

    let registration = card.registration();
    println!(
        "Card: {} (driver {}), {} links, {} widgets, {} routes",
        registration.name,
        registration.driver_name,
        registration.links.len(),
        registration.widgets.len(),
        registration.routes.len()
    );

    println!();
    println!("Init:");
    for init in card.init_links() {
        match init.outcome {
            Ok(InitAction::VolumeLimited) => println!("  {}: speaker volume limited", init.link),
            Ok(InitAction::DisplayJack(jack)) => println!("  {}: created {jack}", init.link),
            Ok(InitAction::HeadsetJack {
                jack,
                attached: true,
            }) => println!("  {}: attached {jack}", init.link),
            Ok(InitAction::HeadsetJack {
                jack,
                attached: false,
            }) => println!("  {}: set up {jack}", init.link),
            Err(err) => println!("  {}: FAILED: {err}", init.link),
        }
    }

    let sessions: Vec<&LinkSession> = match &args.link {
        Some(name) => vec![find_session(&card, name)?],
        None => card.sessions().collect(),
    };

    println!();
    println!("Sessions:");
    for session in sessions {
        run_cycle(session)?;
    }

    println!();
    println!(
        "Transport: {} opened, {} allocated, {} prepared, {} released",
        transport.opens(),
        transport.allocations(),
        transport.prepares(),
        transport.releases()
    );
    println!(
        "Jacks: {} created, {} keys bound; mixer limits: {}",
        jacks.created_total(),
        jacks.bound_keys().len(),
        mixer.limits().len()
    );
    Ok(())
}

fn find_session<'a>(card: &'a SoundCard, name: &str) -> anyhow::Result<&'a LinkSession> {
    if let Some(session) = card.session_by_name(name) {
        return Ok(session);
    }
    if let Some(session) = card
        .sessions()
        .find(|s| s.link().declared_name() == name)
    {
        return Ok(session);
    }
    anyhow::bail!("no link named '{name}'")
}

fn run_cycle(session: &LinkSession) -> anyhow::Result<()> {
    let link = session.link();
    let direction = if link.id().is_mono_capture() {
        Direction::Capture
    } else {
        Direction::Playback
    };

    session.startup()?;
    let fixed = session.hw_params(HwParams::new(direction))?;
    session.prepare()?;
    session.trigger(TriggerCommand::Start)?;
    let running = session.state();
    session.trigger(TriggerCommand::Stop)?;
    session.hw_free()?;
    session.shutdown();
    tracing::debug!(link = link.name(), id = link.id().get(), "session cycle complete");

    println!(
        "  {:<28} {:>6} Hz {} ch  {:?} -> {:?}",
        link.name(),
        fixed.rate.min,
        fixed.channels.min,
        running,
        session.state()
    );
    Ok(())
}
