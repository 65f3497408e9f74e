//! Domain model over the parsed document: groups own devices and tracks,
//! tracks own devices, devices own parameters. Every object keeps a
//! [`NodeId`] back to its source node; the document stays the sole owner.

use crate::xml::{Document, NodeId};

/// Value shape of a parameter, decided once at discovery time from the
/// current value. Editing treats `Unrecognized` exactly like `Number`:
/// anything that is not a boolean literal can only be replaced by a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Boolean,
    Number,
    Unrecognized,
}

impl ParamKind {
    pub fn infer(value: &str) -> Self {
        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            ParamKind::Boolean
        } else if value.parse::<f64>().is_ok() {
            ParamKind::Number
        } else {
            ParamKind::Unrecognized
        }
    }
}

/// One tunable leaf under a device. `path` is the dot-joined tag lineage
/// from the device root and is unique within the device; `node` is the
/// single leaf node whose `Value` attribute this parameter mirrors.
pub struct Parameter {
    pub path: String,
    pub value: String,
    pub kind: ParamKind,
    pub node: NodeId,
}

pub struct Device {
    pub name: String,
    pub params: Vec<Parameter>,
    pub node: NodeId,
}

pub struct Track {
    pub name: String,
    pub devices: Vec<Device>,
    pub node: NodeId,
}

pub struct Group {
    pub id: String,
    pub name: String,
    pub devices: Vec<Device>,
    pub audio_tracks: Vec<Track>,
    pub midi_tracks: Vec<Track>,
    pub node: NodeId,
}

/// The whole navigable hierarchy. Built once after load; shape is read-only
/// afterwards — only parameter values mutate.
pub struct Rack {
    pub groups: Vec<Group>,
}

impl Rack {
    pub fn build(doc: &Document) -> Rack {
        let Some(root) = doc.root() else {
            return Rack { groups: Vec::new() };
        };

        let mut groups: Vec<Group> = Vec::new();
        for node in tagged(doc, root, "GroupTrack") {
            let Some(id) = group_identity(doc, node) else {
                log::debug!("skipping GroupTrack without Id attribute or child");
                continue;
            };
            if groups.iter().any(|g| g.id == id) {
                log::warn!("duplicate group Id {id}, keeping the first occurrence");
                continue;
            }
            groups.push(Group {
                id,
                name: effective_name(doc, node),
                devices: parse_devices(doc, node),
                audio_tracks: Vec::new(),
                midi_tracks: Vec::new(),
                node,
            });
        }

        // Tracks may sit anywhere in the document; each names its owning
        // group through TrackGroupId. Unmatched tracks are dropped.
        for tag in ["AudioTrack", "MidiTrack"] {
            for node in tagged(doc, root, tag) {
                let group_ref = doc
                    .child_by_tag(node, "TrackGroupId")
                    .and_then(|id| doc.attr(id, "Value"));
                let Some(group) = group_ref.and_then(|r| groups.iter_mut().find(|g| g.id == r))
                else {
                    log::debug!("dropping {tag} with no matching group (ref {group_ref:?})");
                    continue;
                };
                let track = Track {
                    name: effective_name(doc, node),
                    devices: parse_devices(doc, node),
                    node,
                };
                match tag {
                    "AudioTrack" => group.audio_tracks.push(track),
                    _ => group.midi_tracks.push(track),
                }
            }
        }

        Rack { groups }
    }
}

fn tagged<'a>(doc: &'a Document, root: NodeId, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
    doc.descendants(root).filter(move |&n| doc.tag(n) == Some(tag))
}

/// Group identity: `Id` attribute first, then a child `Id` element's value.
/// An empty attribute counts as absent, like an empty device name.
fn group_identity(doc: &Document, node: NodeId) -> Option<String> {
    if let Some(id) = doc.attr(node, "Id").filter(|s| !s.is_empty()) {
        return Some(id.to_string());
    }
    let child = doc.child_by_tag(node, "Id")?;
    doc.attr(child, "Value").map(str::to_string)
}

/// Display name from `Name/EffectiveName`, empty when absent.
fn effective_name(doc: &Document, node: NodeId) -> String {
    doc.child_by_tag(node, "Name")
        .and_then(|n| doc.child_by_tag(n, "EffectiveName"))
        .and_then(|n| doc.attr(n, "Value"))
        .unwrap_or_default()
        .to_string()
}

/// Devices of a group or track: direct children of every `Devices`
/// container under the owner's `DeviceChain`. A child qualifies only if it
/// has both a `DeviceId` descendant and a tunable `Manual` descendant;
/// anything else is skipped without being traversed as a device.
fn parse_devices(doc: &Document, owner: NodeId) -> Vec<Device> {
    let Some(chain) = doc.child_by_tag(owner, "DeviceChain") else {
        return Vec::new();
    };
    let mut devices = Vec::new();
    for container in tagged(doc, chain, "Devices") {
        for candidate in doc.children(container) {
            if doc.find_descendant(candidate, "DeviceId").is_some()
                && doc.find_descendant(candidate, "Manual").is_some()
            {
                devices.push(parse_device(doc, candidate));
            }
        }
    }
    devices
}

fn parse_device(doc: &Document, node: NodeId) -> Device {
    // Direct DeviceId child with a non-empty Name overrides the tag
    let name = doc
        .child_by_tag(node, "DeviceId")
        .and_then(|id| doc.attr(id, "Name"))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| doc.tag(node).unwrap_or_default())
        .to_string();
    let mut params = Vec::new();
    collect_manuals(doc, node, &mut Vec::new(), &mut params);
    Device { name, params, node }
}

/// Recursive discovery of every `Manual` leaf beneath a device. The path
/// accumulates the tags of intermediate nodes, so leaves with the same
/// local tag in different branches still get distinct names. A later leaf
/// with an identical path replaces the earlier one.
fn collect_manuals(doc: &Document, node: NodeId, path: &mut Vec<String>, out: &mut Vec<Parameter>) {
    for child in doc.children(node) {
        let tag = doc.tag(child).unwrap_or_default();
        if tag == "Manual" {
            let value = doc.attr(child, "Value").unwrap_or_default().to_string();
            let param = Parameter {
                path: path.join("."),
                kind: ParamKind::infer(&value),
                value,
                node: child,
            };
            match out.iter_mut().find(|p| p.path == param.path) {
                Some(existing) => *existing = param,
                None => out.push(param),
            }
        } else {
            path.push(tag.to_string());
            collect_manuals(doc, child, path, out);
            path.pop();
        }
    }
}
