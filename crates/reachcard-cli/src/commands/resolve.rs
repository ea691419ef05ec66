//! Print the resolved link table of a card description.

use clap::Args;
use reachcard_core::{Link, LinkTable};
use std::path::PathBuf;

use super::common;

/// Resolve a card description.
#[derive(Args)]
pub struct ResolveArgs {
    /// Path to the card description (TOML)
    pub file: PathBuf,

    /// Print the table as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the resolve command.
pub fn run(args: ResolveArgs) -> anyhow::Result<()> {
    let description = common::load(&args.file)?;
    let table = common::resolve(&description)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&table))?);
        return Ok(());
    }

    println!(
        "Card: {} ({} links)",
        description.card_name().unwrap_or("<unnamed>"),
        table.len()
    );
    println!();
    println!(
        "{:>5}  {:<28} {:<9} {:<8} {:<4} {:<22} {}",
        "ID", "NAME", "ROLE", "PCM", "OPS", "CODECS", "DECLARED"
    );
    for link in &table {
        println!(
            "{:>5}  {:<28} {:<9} {:<8} {:<4} {:<22} {}",
            link.id(),
            link.name(),
            format!("{:?}", link.role()),
            format!("{:?}", link.pcm_mode()),
            if link.has_ops() { "yes" } else { "-" },
            link.codecs().dai_names().join(","),
            link.declared_name(),
        );
    }
    Ok(())
}

fn link_json(link: &Link) -> serde_json::Value {
    let flags = link.flags();
    serde_json::json!({
        "id": link.id().get(),
        "name": link.name(),
        "stream_name": link.stream_name(),
        "declared_name": link.declared_name(),
        "role": format!("{:?}", link.role()),
        "pcm_mode": format!("{:?}", link.pcm_mode()),
        "has_ops": link.has_ops(),
        "cpu": {
            "node": link.cpu().node,
            "dai": link.cpu().dai_name,
        },
        "codecs": link.codecs().dai_names(),
        "dummy_codec": link.codecs().is_dummy(),
        "platform": link.platform().node,
        "flags": {
            "no_pcm": flags.no_pcm,
            "ignore_pmdown_time": flags.ignore_pmdown_time,
            "ignore_suspend": flags.ignore_suspend,
            "nonatomic": flags.nonatomic,
            "dynamic": flags.dynamic,
        },
    })
}

fn to_json(table: &LinkTable) -> serde_json::Value {
    serde_json::Value::Array(table.iter().map(link_json).collect())
}
