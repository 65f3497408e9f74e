mod cli;
mod edit;
mod model;
mod session;
mod xml;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Command};
use model::{Device, ParamKind, Rack, Track};
use xml::Document;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Show { file } => show(Path::new(&file)),
        Command::Edit { file } => edit_interactive(Path::new(&file)),
    }
}

fn show(path: &Path) -> anyhow::Result<()> {
    let doc = Document::load(path)?;
    let rack = Rack::build(&doc);

    println!("=== Groups ===");
    if rack.groups.is_empty() {
        println!("  (none found)");
    }
    for group in &rack.groups {
        println!("  {} (Id {})", group.name, group.id);
        for device in &group.devices {
            print_device(device, "    ");
        }
        for track in &group.audio_tracks {
            print_track(track, "AudioTrack");
        }
        for track in &group.midi_tracks {
            print_track(track, "MidiTrack");
        }
    }
    Ok(())
}

fn print_track(track: &Track, kind: &str) {
    println!("    {kind}: {}", track.name);
    for device in &track.devices {
        print_device(device, "      ");
    }
}

fn print_device(device: &Device, indent: &str) {
    println!("{indent}Device: {}", device.name);
    for param in &device.params {
        let kind = match param.kind {
            ParamKind::Boolean => "boolean",
            ParamKind::Number => "number",
            ParamKind::Unrecognized => "unrecognized",
        };
        println!("{indent}  {} = {} ({kind})", param.path, param.value);
    }
}

fn edit_interactive(path: &Path) -> anyhow::Result<()> {
    let mut doc = Document::load(path)?;
    let mut rack = Rack::build(&doc);
    log::info!(
        "loaded {} with {} group(s)",
        path.display(),
        rack.groups.len()
    );

    session::run(
        &mut doc,
        &mut rack,
        &mut std::io::stdin().lock(),
        &mut std::io::stdout().lock(),
    )?;

    let target = xml::edit_output_path(path);
    doc.write_to(&target)?;
    println!("Saved edited file as {}", target.display());
    Ok(())
}
