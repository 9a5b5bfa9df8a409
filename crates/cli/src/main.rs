use anyhow::Result;
use clap::{Parser, Subcommand};
use clip_rename::commands::*;

/// Clipboard-driven symbol renaming for reverse-engineering projects.
///
/// This CLI is a thin wrapper around `clip-rename-core` (exposed in code as
/// `clip_rename_core`). It plays the host: it keeps one symbol namespace per
/// binary and runs the hotkey action against a cursor address.
#[derive(Parser, Debug)]
#[command(
    name = "clip-rename",
    version,
    about = "Rename symbols from the clipboard",
    long_about = None
)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new project at the given root.
    ///
    /// This will:
    /// - Create a `.cliprename` metadata directory.
    /// - Write a `.cliprename/project.json` config file.
    /// - Create the project database.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show basic information about an existing project.
    ProjectInfo {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Register a binary in the project database.
    AddBinary {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the binary to register.
        #[arg(long)]
        path: String,

        /// Optional human-friendly name. Defaults to the file name.
        #[arg(long)]
        name: Option<String>,

        /// Optional architecture (e.g., x86_64, arm64). Detected from the header when omitted.
        #[arg(long)]
        arch: Option<String>,

        /// Optional precomputed hash. If omitted, the CLI computes SHA-256 unless `--skip-hash` is set.
        #[arg(long)]
        hash: Option<String>,

        /// Skip hash computation (stores no hash).
        #[arg(long, default_value_t = false)]
        skip_hash: bool,
    },

    /// List all binaries registered in the project database.
    ListBinaries {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List symbol sources compiled into this binary.
    ListSources {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Seed a binary's symbol namespace from a symbol source or a name map.
    ImportSymbols {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Binary to import into. May be omitted when only one is registered.
        #[arg(long)]
        binary: Option<String>,

        /// Symbol source name (see list-sources).
        #[arg(long, conflicts_with = "from_file")]
        source: Option<String>,

        /// YAML or JSON list of `{address, name}` entries.
        #[arg(long)]
        from_file: Option<String>,
    },

    /// List the named addresses of a binary.
    ListSymbols {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        binary: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Choose the rename method bound to the hotkey.
    ///
    /// `address` renames the cursor address; `operand` renames the address held
    /// by an instruction operand. `cancel` keeps the current binding.
    Configure {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// address | operand | cancel
        #[arg(long)]
        method: Option<String>,

        /// Operand index for operand-based renaming. Blank selects 1.
        #[arg(long)]
        operand_index: Option<String>,

        /// Key to bind the rename action to.
        #[arg(long)]
        hotkey: Option<String>,
    },

    /// Rename the target at the cursor address using the clipboard text.
    Rename {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        binary: Option<String>,

        /// Cursor address (0x-prefixed hex, h-suffixed hex, or decimal).
        #[arg(long)]
        at: String,

        /// Override the configured method for this rename only.
        #[arg(long)]
        method: Option<String>,

        /// Override the configured operand index for this rename only.
        #[arg(long)]
        operand_index: Option<String>,

        /// Use this text instead of the clipboard.
        #[arg(long)]
        name: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show what a text would be renamed to.
    Sanitize {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        text: String,
    },

    /// Show recorded renames.
    History {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        binary: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    clip_rename_core::logging::init_tracing(cli.verbose);

    match cli.command {
        Command::InitProject { root, name } => init_project_command(&root, name)?,
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::AddBinary { root, path, name, arch, hash, skip_hash } => {
            add_binary_command(&root, &path, name, arch, hash, skip_hash)?
        }
        Command::ListBinaries { root, json } => list_binaries_command(&root, json)?,
        Command::ListSources { json } => list_sources_command(json)?,
        Command::ImportSymbols { root, binary, source, from_file } => import_symbols_command(
            &root,
            binary.as_deref(),
            source.as_deref(),
            from_file.as_deref(),
        )?,
        Command::ListSymbols { root, binary, json } => {
            list_symbols_command(&root, binary.as_deref(), json)?
        }
        Command::Configure { root, method, operand_index, hotkey } => configure_command(
            &root,
            method.as_deref(),
            operand_index.as_deref(),
            hotkey.as_deref(),
        )?,
        Command::Rename { root, binary, at, method, operand_index, name, json } => rename_command(
            &root,
            binary.as_deref(),
            &at,
            method.as_deref(),
            operand_index.as_deref(),
            name,
            json,
        )?,
        Command::Sanitize { root, text } => sanitize_command(&root, &text)?,
        Command::History { root, binary, json } => {
            history_command(&root, binary.as_deref(), json)?
        }
    }

    Ok(())
}
