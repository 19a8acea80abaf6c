//! Inspect and edit NPC content from the command line.
//!
//! Reads the API location from `NPC_EDITOR_URL` (see [`EditorConfig`]).
//!
//! # Examples
//!
//! ```sh
//! # List NPCs with their prompt badge
//! npc-editor list --filter smith
//!
//! # Show one NPC's prompt bindings and inventory
//! npc-editor show blacksmith
//!
//! # Replace prompt text from a file
//! npc-editor prompt set brom_main --file brom.txt
//!
//! # Pipe prompt text from stdin
//! cat greeting.txt | npc-editor prompt set greta_good --stdin
//!
//! # Inventory edits
//! npc-editor inventory blacksmith add iron_sword --quantity 2
//! npc-editor inventory blacksmith remove iron_sword
//!
//! # Create a tiered NPC
//! npc-editor create herbalist --name "Mira" --tiered
//! ```

use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use npc_editor::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Inspect and edit NPC prompts, names and inventories.
#[derive(Parser)]
#[command(name = "npc-editor", version)]
struct Cli {
    /// Editor API base URL (overrides NPC_EDITOR_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides NPC_EDITOR_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List NPCs with their prompt binding count
    List {
        /// Only NPCs whose id or name contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show one NPC: prompt bindings, text sizes and inventory
    Show { npc: String },
    /// List catalog items
    Items {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Read or replace prompt text
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },
    /// Change an NPC's display name
    Rename { npc: String, name: String },
    /// Edit an NPC's starting inventory
    Inventory {
        npc: String,
        #[command(subcommand)]
        action: InventoryAction,
    },
    /// Create a new NPC stub
    Create {
        id: String,
        #[arg(long)]
        name: String,
        /// Create one prompt per friendliness tier instead of a single prompt
        #[arg(long)]
        tiered: bool,
    },
}

#[derive(Subcommand)]
enum PromptAction {
    /// Print the text stored under a key
    Get { key: String },
    /// Replace the text stored under a key
    #[command(group(
        clap::ArgGroup::new("source")
            .required(true)
            .args(["text", "file", "stdin"])
    ))]
    Set {
        key: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        stdin: bool,
    },
}

#[derive(Subcommand)]
enum InventoryAction {
    /// Add an item, or raise its quantity if already present
    Add {
        item: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove every entry for an item
    Remove { item: String },
    /// Empty the inventory
    Clear,
}

// ── Helpers ────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "npc_editor=info",
        2 => "npc_editor=debug",
        _ => "npc_editor=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn build_config(cli: &Cli) -> Result<EditorConfig, EditorError> {
    let mut config = EditorConfig::from_env()?;
    if let Some(ref url) = cli.base_url {
        config = config.with_base_url(url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

/// Resolve `prompt set` input. Exactly one source is present (clap group).
fn read_prompt_source(
    text: Option<&str>,
    file: Option<&PathBuf>,
    stdin: bool,
) -> Result<String, EditorError> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .map_err(|e| EditorError::Io(format!("failed to read '{}': {e}", path.display())));
    }
    if stdin {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| EditorError::Io(format!("failed to read stdin: {e}")))?;
        return Ok(buf);
    }
    Err(EditorError::Config(
        "provide --text, --file or --stdin".to_string(),
    ))
}

fn format_npc_list(rows: &[NpcSummary]) -> String {
    if rows.is_empty() {
        return "No NPCs found.\n".to_string();
    }
    let width = rows.iter().map(|r| r.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let shape = if row.tiered { " tiered" } else { "" };
        let _ = writeln!(
            out,
            "{:<width$}  {}  [{}{shape}]",
            row.id, row.name, row.binding_count
        );
    }
    out
}

fn format_npc(state: &EditorState, id: &str) -> Result<String, EditorError> {
    let npc = state
        .npc(id)
        .ok_or_else(|| EditorError::NotFound(format!("NPC '{id}'")))?;
    let mut out = String::new();
    let _ = writeln!(out, "{} ({id})", npc.display_name(id));
    if let Some(model) = npc.model_text() {
        let _ = writeln!(out, "  model:    {model}");
    }
    if let Some(portrait) = npc.portrait_text() {
        let _ = writeln!(out, "  portrait: {portrait}");
    }
    if let Some(value) = npc.stat(Stat::Friendly.as_str()) {
        match Tier::for_friendliness(value) {
            Some(tier) => {
                let _ = writeln!(out, "  friendly: {value} ({tier})");
            }
            None => {
                let _ = writeln!(out, "  friendly: {value}");
            }
        }
    }

    let bindings = resolve(Some(npc));
    if bindings.is_empty() {
        out.push_str("\nNo prompts configured.\n");
    } else {
        out.push_str("\nPrompts:\n");
        for binding in &bindings {
            let stats = PromptStats::of(state.prompt_text(&binding.key));
            let _ = writeln!(
                out,
                "  {:<16} {}  ({})",
                binding.tier.label(),
                binding.key,
                stats.summary()
            );
            let aliases = state.key_aliases(&binding.key);
            if aliases.len() > 1 {
                let _ = writeln!(out, "    shared with: {}", aliases.join(", "));
            }
        }
    }

    let inventory = npc.inventory();
    if inventory.is_empty() {
        out.push_str("\nInventory: empty\n");
    } else {
        out.push_str("\nInventory:\n");
        for entry in inventory {
            if let Some(ref raw) = entry.raw {
                let _ = writeln!(out, "  (unrecognised entry) {raw}");
                continue;
            }
            let _ = writeln!(
                out,
                "  {} x{} ({})",
                state.item_name(&entry.item_id),
                entry.quantity,
                entry.item_id
            );
        }
    }
    Ok(out)
}

fn format_items(rows: &[(&str, &Item)]) -> String {
    if rows.is_empty() {
        return "No items found.\n".to_string();
    }
    let mut out = String::new();
    for (id, item) in rows {
        match item.name.as_deref() {
            Some(name) => {
                let _ = writeln!(out, "{id}  {name}");
            }
            None => {
                let _ = writeln!(out, "{id}");
            }
        }
    }
    out
}

fn current_inventory(
    session: &EditorSession<EditorClient>,
    npc_id: &str,
) -> Result<Vec<InventoryEntry>, EditorError> {
    session
        .read(|s| s.npc(npc_id).map(|n| n.inventory().to_vec()))
        .ok_or_else(|| EditorError::NotFound(format!("NPC '{npc_id}'")))
}

// ── Commands ───────────────────────────────────────────────────────

async fn run(cli: &Cli) -> Result<String, EditorError> {
    let config = build_config(cli)?;
    let client = EditorClient::from_config(&config)?;
    let session = EditorSession::new(client, EditorState::new().shared())
        .with_status_ttl(config.status_ttl);

    session.load().await?;

    match &cli.command {
        Command::List { filter } => {
            let rows = session.read(|s| s.filter_npcs(filter.as_deref().unwrap_or("")));
            Ok(format_npc_list(&rows))
        }
        Command::Show { npc } => session.read(|s| format_npc(s, npc)),
        Command::Items { filter } => Ok(session.read(|s| {
            format_items(&s.filter_items(filter.as_deref().unwrap_or("")))
        })),
        Command::Prompt { action } => match action {
            PromptAction::Get { key } => session
                .read(|s| s.prompt_text(key).map(String::from))
                .ok_or_else(|| EditorError::NotFound(format!("prompt '{key}'"))),
            PromptAction::Set {
                key,
                text,
                file,
                stdin,
            } => {
                let text = read_prompt_source(text.as_deref(), file.as_ref(), *stdin)?;
                let aliases = session.read(|s| s.key_aliases(key));
                if aliases.len() > 1 {
                    eprintln!(
                        "  Warning: '{key}' is shared by {}; all of them will change",
                        aliases.join(", ")
                    );
                }
                session.save_prompt(key, &text).await?;
                Ok(format!(
                    "Saved prompt {key} ({})\n",
                    PromptStats::of(Some(&text)).summary()
                ))
            }
        },
        Command::Rename { npc, name } => {
            if !session.read(|s| s.npcs.contains_key(npc)) {
                return Err(EditorError::NotFound(format!("NPC '{npc}'")));
            }
            session.rename(npc, name).await?;
            Ok(format!("Renamed {npc} to {name}\n"))
        }
        Command::Inventory { npc, action } => {
            let inventory = current_inventory(&session, npc)?;
            let updated = match action {
                InventoryAction::Add { item, quantity } => {
                    if session.read(|s| !s.items.contains_key(item)) {
                        eprintln!("  Warning: '{item}' is not in the item catalog");
                    }
                    with_added(&inventory, item, *quantity)
                }
                InventoryAction::Remove { item } => without(&inventory, item)
                    .ok_or_else(|| EditorError::NotFound(format!("item '{item}' on {npc}")))?,
                InventoryAction::Clear => Vec::new(),
            };
            let count = updated.len();
            session.set_inventory(npc, updated).await?;
            let noun = if count == 1 { "entry" } else { "entries" };
            Ok(format!("Updated {npc}: {count} inventory {noun}\n"))
        }
        Command::Create { id, name, tiered } => {
            let npc = NewNpc {
                npc_id: id.clone(),
                name: name.clone(),
                prompt_type: if *tiered {
                    PromptType::Tiered
                } else {
                    PromptType::Single
                },
            };
            session.create_npc(&npc).await?;
            let mut out = format!("Created {id}\n");
            if let Ok(detail) = session.read(|s| format_npc(s, id)) {
                out.push('\n');
                out.push_str(&detail);
            }
            Ok(out)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn loaded_state() -> EditorState {
        let data: EditorData = serde_json::from_value(json!({
            "npcs": {
                "blacksmith": {
                    "name": "Brom",
                    "promptKey": "shared",
                    "inventory": [{"itemId": "sword", "quantity": 2}],
                    "stats": {"friendly": 50}
                },
                "guard": {"promptKey": "shared"}
            },
            "prompts": {"shared": "Halt.\nWho goes there?"},
            "items": {"sword": {"name": "Iron Sword"}}
        }))
        .unwrap();
        let mut state = EditorState::new();
        state.replace_data(data);
        state
    }

    #[test]
    fn cli_parses_prompt_set_sources() {
        let cli = Cli::try_parse_from(["npc-editor", "prompt", "set", "k", "--text", "hi"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Prompt {
                action: PromptAction::Set { ref text, .. }
            } if text.as_deref() == Some("hi")
        ));

        // No source, or two sources, are rejected.
        assert!(Cli::try_parse_from(["npc-editor", "prompt", "set", "k"]).is_err());
        assert!(
            Cli::try_parse_from(["npc-editor", "prompt", "set", "k", "--text", "a", "--stdin"])
                .is_err()
        );
    }

    #[test]
    fn cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "npc-editor",
            "list",
            "--base-url",
            "http://h/api",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://h/api"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn prompt_text_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "line one\nline two").unwrap();
        let path = file.path().to_path_buf();
        let text = read_prompt_source(None, Some(&path), false).unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn missing_prompt_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let err = read_prompt_source(None, Some(&path), false).unwrap_err();
        assert!(matches!(err, EditorError::Io(_)));
    }

    #[test]
    fn list_shows_badge_counts() {
        let state = loaded_state();
        let out = format_npc_list(&state.filter_npcs(""));
        assert!(out.contains("blacksmith  Brom  [1]"));
        assert!(out.contains("guard       guard  [1]"));
        assert_eq!(format_npc_list(&[]), "No NPCs found.\n");
    }

    #[test]
    fn show_lists_bindings_aliases_and_inventory() {
        let state = loaded_state();
        let out = format_npc(&state, "blacksmith").unwrap();
        assert!(out.starts_with("Brom (blacksmith)\n"));
        assert!(out.contains("friendly: 50 (GOOD)"));
        assert!(out.contains("DEFAULT"));
        assert!(out.contains("21 chars \u{b7} 2 lines \u{b7} ~6 tokens"));
        assert!(out.contains("shared with: blacksmith, guard"));
        assert!(out.contains("Iron Sword x2 (sword)"));
    }

    #[test]
    fn show_prints_opaque_fields_verbatim() {
        let data: EditorData = serde_json::from_value(json!({
            "npcs": {"mira": {
                "name": "Mira",
                "model": {"path": "m.glb"},
                "inventory": [{"sku": "sword-2"}]
            }}
        }))
        .unwrap();
        let mut state = EditorState::new();
        state.replace_data(data);
        let out = format_npc(&state, "mira").unwrap();
        assert!(out.contains(r#"model:    {"path":"m.glb"}"#));
        assert!(out.contains(r#"(unrecognised entry) {"sku":"sword-2"}"#));
    }

    #[test]
    fn show_unknown_npc_is_not_found() {
        let state = loaded_state();
        assert!(matches!(
            format_npc(&state, "ghost"),
            Err(EditorError::NotFound(_))
        ));
    }
}
