use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rackedit", about = "Minimal CLI editor for Ableton rack/set parameters")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the group/track/device/parameter hierarchy of a file
    Show {
        /// Path to the rack/set XML file (.adg, .als)
        file: String,
    },
    /// Interactively edit parameter values and save to <name>Edit.<ext>
    Edit {
        /// Path to the rack/set XML file (.adg, .als)
        file: String,
    },
}
