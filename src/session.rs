//! Interactive navigation over a [`Rack`]: group menu, group view, track
//! view, per-device parameter prompts. Runs over generic reader/writer
//! handles so tests can drive it with in-memory buffers.
//!
//! Menu rules: `b` goes one level up, `q` at the group menu ends the
//! session. Malformed or out-of-range selections redisplay the same menu
//! without any state change. EOF on the input ends whatever menu is active.

use std::io::{BufRead, Write};

use crate::edit::{self, EditOutcome};
use crate::model::{Device, Group, Rack, Track};
use crate::xml::Document;

/// Drive the whole session until the operator quits or input ends.
/// Mutations land in `doc` (and the mirrored parameter values) as they
/// are accepted; the caller serializes afterwards.
pub fn run<R: BufRead, W: Write>(
    doc: &mut Document,
    rack: &mut Rack,
    input: &mut R,
    out: &mut W,
) -> std::io::Result<()> {
    loop {
        writeln!(out)?;
        writeln!(out, "Groups:")?;
        for (i, group) in rack.groups.iter().enumerate() {
            writeln!(out, "  {}) {} (Id {})", i + 1, group.name, group.id)?;
        }
        let Some(choice) = prompt(input, out, "Select group number to edit (q to quit): ")?
        else {
            break;
        };
        if choice.eq_ignore_ascii_case("q") {
            break;
        }
        if let Some(group) = select(&choice, rack.groups.len()).map(|i| &mut rack.groups[i]) {
            handle_group(doc, group, input, out)?;
        }
    }
    Ok(())
}

fn handle_group<R: BufRead, W: Write>(
    doc: &mut Document,
    group: &mut Group,
    input: &mut R,
    out: &mut W,
) -> std::io::Result<()> {
    loop {
        writeln!(out, "Group: {}", group.name)?;
        let mut idx = 1;
        for dev in &group.devices {
            writeln!(out, "  {idx}) Group Device: {}", dev.name)?;
            idx += 1;
        }
        for track in &group.audio_tracks {
            writeln!(out, "  {idx}) AudioTrack: {}", track.name)?;
            idx += 1;
        }
        for track in &group.midi_tracks {
            writeln!(out, "  {idx}) MidiTrack: {}", track.name)?;
            idx += 1;
        }
        let Some(choice) = prompt(input, out, "Select item to edit (b to go back): ")? else {
            break;
        };
        if choice.eq_ignore_ascii_case("b") {
            break;
        }
        let devices = group.devices.len();
        let audio = group.audio_tracks.len();
        let total = devices + audio + group.midi_tracks.len();
        match select(&choice, total) {
            Some(i) if i < devices => edit_params(doc, &mut group.devices[i], input, out)?,
            Some(i) if i < devices + audio => {
                handle_track(doc, &mut group.audio_tracks[i - devices], input, out)?;
            }
            Some(i) => handle_track(doc, &mut group.midi_tracks[i - devices - audio], input, out)?,
            None => {}
        }
    }
    Ok(())
}

fn handle_track<R: BufRead, W: Write>(
    doc: &mut Document,
    track: &mut Track,
    input: &mut R,
    out: &mut W,
) -> std::io::Result<()> {
    loop {
        writeln!(out, "Track: {}", track.name)?;
        for (i, dev) in track.devices.iter().enumerate() {
            writeln!(out, "  {}) Device: {}", i + 1, dev.name)?;
        }
        let Some(choice) = prompt(input, out, "Select device number to edit (b to go back): ")?
        else {
            break;
        };
        if choice.eq_ignore_ascii_case("b") {
            break;
        }
        if let Some(i) = select(&choice, track.devices.len()) {
            edit_params(doc, &mut track.devices[i], input, out)?;
        }
    }
    Ok(())
}

/// Walk every parameter of one device, prompting for a replacement value.
fn edit_params<R: BufRead, W: Write>(
    doc: &mut Document,
    device: &mut Device,
    input: &mut R,
    out: &mut W,
) -> std::io::Result<()> {
    for param in &mut device.params {
        let msg = format!("{} - {} [{}]: ", device.name, param.path, param.value);
        let Some(proposal) = prompt(input, out, &msg)? else {
            break;
        };
        match edit::apply(doc, param, &proposal) {
            EditOutcome::Updated => {}
            EditOutcome::KeptOriginal => writeln!(out, "Empty input, keeping original.")?,
            EditOutcome::InvalidBoolean => writeln!(out, "Invalid boolean, using original.")?,
            EditOutcome::InvalidNumber => writeln!(out, "Invalid number, using original.")?,
        }
    }
    Ok(())
}

/// Write a prompt, read one trimmed line. `None` means end of input.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    message: &str,
) -> std::io::Result<Option<String>> {
    write!(out, "{message}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Parse a 1-based menu selection; anything malformed or out of range is `None`.
fn select(choice: &str, len: usize) -> Option<usize> {
    let n: usize = choice.parse().ok()?;
    n.checked_sub(1).filter(|&i| i < len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rack;
    use std::io::Cursor;

    const RACK: &str = r#"<Ableton>
        <GroupTrack Id="1">
            <Name><EffectiveName Value="Bus"/></Name>
            <DeviceChain/>
        </GroupTrack>
        <AudioTrack>
            <Name><EffectiveName Value="Lead"/></Name>
            <TrackGroupId Value="1"/>
            <DeviceChain>
                <Devices>
                    <Gain>
                        <DeviceId Name="MyGain"/>
                        <Amount><Manual Value="0.3"/></Amount>
                        <On><Manual Value="true"/></On>
                    </Gain>
                </Devices>
            </DeviceChain>
        </AudioTrack>
    </Ableton>"#;

    fn run_session(xml: &str, script: &str) -> (Document, Rack, String) {
        let mut doc = Document::parse(xml).unwrap();
        let mut rack = Rack::build(&doc);
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        run(&mut doc, &mut rack, &mut input, &mut out).unwrap();
        (doc, rack, String::from_utf8(out).unwrap())
    }

    #[test]
    fn quit_immediately() {
        let (_, _, out) = run_session(RACK, "q\n");
        assert!(out.contains("Groups:"));
        assert!(out.contains("1) Bus (Id 1)"));
    }

    #[test]
    fn eof_ends_session() {
        let (_, _, out) = run_session(RACK, "");
        assert!(out.contains("Groups:"));
    }

    #[test]
    fn junk_input_redisplays_menu() {
        let (_, _, out) = run_session(RACK, "huh\n0\n99\nq\n");
        // Initial display plus one redisplay per ignored input
        assert_eq!(out.matches("Groups:").count(), 4);
    }

    #[test]
    fn navigates_to_track_device_and_edits() {
        // group 1 → track (item 1) → device 1 → set Amount, keep On → back out
        let (doc, rack, out) = run_session(RACK, "1\n1\n1\n0.9\n\nb\nb\nq\n");
        assert!(out.contains("Group: Bus"));
        assert!(out.contains("1) AudioTrack: Lead"));
        assert!(out.contains("MyGain - Amount [0.3]: "));
        assert!(out.contains("Empty input, keeping original."));

        let param = &rack.groups[0].audio_tracks[0].devices[0].params[0];
        assert_eq!(param.value, "0.9");
        assert_eq!(doc.attr(param.node, "Value"), Some("0.9"));
    }

    #[test]
    fn rejected_edit_prints_diagnostic_and_continues() {
        let (doc, rack, out) = run_session(RACK, "1\n1\n1\nabc\nmaybe\nb\nb\nq\n");
        assert!(out.contains("Invalid number, using original."));
        assert!(out.contains("Invalid boolean, using original."));

        let device = &rack.groups[0].audio_tracks[0].devices[0];
        assert_eq!(device.params[0].value, "0.3");
        assert_eq!(device.params[1].value, "true");
        assert_eq!(doc.attr(device.params[0].node, "Value"), Some("0.3"));
    }

    #[test]
    fn back_token_is_case_insensitive() {
        let (_, _, out) = run_session(RACK, "1\nB\nQ\n");
        assert!(out.contains("Group: Bus"));
        assert_eq!(out.matches("Group: Bus").count(), 1);
    }

    #[test]
    fn end_to_end_edit_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("rack.adg");
        std::fs::write(&src, RACK).unwrap();

        let mut doc = Document::parse(RACK).unwrap();
        let mut rack = Rack::build(&doc);
        let mut input = Cursor::new(b"1\n1\n1\n0.9\n\nb\nb\nq\n".to_vec());
        let mut out = Vec::new();
        run(&mut doc, &mut rack, &mut input, &mut out).unwrap();

        let target = crate::xml::edit_output_path(&src);
        doc.write_to(&target).unwrap();
        assert_eq!(target, dir.path().join("rackEdit.adg"));

        let saved = Document::load(&target).unwrap();
        let saved_rack = Rack::build(&saved);
        let device = &saved_rack.groups[0].audio_tracks[0].devices[0];
        assert_eq!(device.params[0].value, "0.9");
        assert_eq!(device.params[1].value, "true");
        // Untouched structure survives the round trip
        assert_eq!(saved_rack.groups[0].name, "Bus");
        assert_eq!(device.name, "MyGain");
    }
}
