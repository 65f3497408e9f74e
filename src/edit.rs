//! Type-aware parameter edits. Validation is decided by the kind inferred
//! from the parameter's original value; accepted values are written to both
//! the parameter and its back-linked node immediately.

use crate::model::{ParamKind, Parameter};
use crate::xml::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Value accepted and written through to the node.
    Updated,
    /// Empty proposal, original kept. Not an error.
    KeptOriginal,
    InvalidBoolean,
    InvalidNumber,
}

/// Validate `proposal` against the parameter's kind and apply it.
/// On rejection nothing changes, the caller decides how to surface it.
pub fn apply(doc: &mut Document, param: &mut Parameter, proposal: &str) -> EditOutcome {
    if proposal.is_empty() {
        return EditOutcome::KeptOriginal;
    }
    let accepted = match param.kind {
        ParamKind::Boolean => {
            if proposal.eq_ignore_ascii_case("true") || proposal.eq_ignore_ascii_case("false") {
                // Booleans are normalized to lowercase
                Some(proposal.to_ascii_lowercase())
            } else {
                return EditOutcome::InvalidBoolean;
            }
        }
        // A parameter whose original value fits neither shape still edits as
        // a number; only floats can ever replace it
        ParamKind::Number | ParamKind::Unrecognized => {
            if proposal.parse::<f64>().is_ok() {
                // Numbers keep the literal exactly as typed
                Some(proposal.to_string())
            } else {
                return EditOutcome::InvalidNumber;
            }
        }
    };
    if let Some(value) = accepted {
        doc.set_attr(param.node, "Value", &value);
        param.value = value;
    }
    EditOutcome::Updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rack;

    fn one_param(value: &str) -> (Document, Parameter) {
        let xml = format!(
            r#"<Ableton><GroupTrack Id="1"><DeviceChain><Devices>
                <Dev><DeviceId Name="D"/><Amount><Manual Value="{value}"/></Amount></Dev>
            </Devices></DeviceChain></GroupTrack></Ableton>"#
        );
        let doc = Document::parse(&xml).unwrap();
        let mut rack = Rack::build(&doc);
        let param = rack.groups.remove(0).devices.remove(0).params.remove(0);
        (doc, param)
    }

    #[test]
    fn boolean_accepts_and_normalizes() {
        let (mut doc, mut p) = one_param("true");
        assert_eq!(apply(&mut doc, &mut p, "FALSE"), EditOutcome::Updated);
        assert_eq!(p.value, "false");
        assert_eq!(doc.attr(p.node, "Value"), Some("false"));
    }

    #[test]
    fn boolean_rejects_non_boolean() {
        let (mut doc, mut p) = one_param("true");
        assert_eq!(apply(&mut doc, &mut p, "maybe"), EditOutcome::InvalidBoolean);
        assert_eq!(p.value, "true");
        assert_eq!(doc.attr(p.node, "Value"), Some("true"));
    }

    #[test]
    fn number_stores_literal_verbatim() {
        let (mut doc, mut p) = one_param("0.3");
        assert_eq!(apply(&mut doc, &mut p, "0.90"), EditOutcome::Updated);
        assert_eq!(p.value, "0.90");
        assert_eq!(doc.attr(p.node, "Value"), Some("0.90"));
    }

    #[test]
    fn number_rejects_non_number() {
        let (mut doc, mut p) = one_param("0.3");
        assert_eq!(apply(&mut doc, &mut p, "abc"), EditOutcome::InvalidNumber);
        assert_eq!(p.value, "0.3");
        assert_eq!(doc.attr(p.node, "Value"), Some("0.3"));
    }

    #[test]
    fn empty_proposal_keeps_original() {
        let (mut doc, mut p) = one_param("0.3");
        assert_eq!(apply(&mut doc, &mut p, ""), EditOutcome::KeptOriginal);
        assert_eq!(p.value, "0.3");
    }

    #[test]
    fn unrecognized_edits_like_number() {
        let (mut doc, mut p) = one_param("Sawtooth");
        assert_eq!(p.kind, ParamKind::Unrecognized);
        assert_eq!(apply(&mut doc, &mut p, "true"), EditOutcome::InvalidNumber);
        assert_eq!(apply(&mut doc, &mut p, "2.5"), EditOutcome::Updated);
        assert_eq!(p.value, "2.5");
    }

    #[test]
    fn boolean_mixed_case_normalizes() {
        let (mut doc, mut p) = one_param("false");
        assert_eq!(apply(&mut doc, &mut p, "TrUe"), EditOutcome::Updated);
        assert_eq!(p.value, "true");
    }
}
