//! Tag Extractor - finds `<name>…</name>` segments in assistant text.
//!
//! Matching policy:
//! - one left-to-right pass over the content, all kinds tracked at once;
//! - for each kind the first opening marker wins and the segment ends at the
//!   first closing marker of the same kind after it (spans newlines);
//! - no nesting: an opening marker of a kind that is already open is text;
//! - an opening marker never followed by its closing marker means "absent";
//! - different kinds may overlap or coexist freely.
//!
//! The `json` (plan) and `interaction` kinds carry JSON bodies. Their parse
//! outcome is kept as a `Result` so failures stay observable; callers that
//! only care about well-formed payloads use [`TagExtraction::plan`] and
//! [`TagExtraction::interactions`], which collapse errors to `None`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::PayloadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagKind {
    Plan,
    Interaction,
    Thinking,
    Response,
    ExecutePython,
    Observation,
    FinalizePlan,
    FinalCode,
}

impl TagKind {
    pub const ALL: [TagKind; 8] = [
        TagKind::Plan,
        TagKind::Interaction,
        TagKind::Thinking,
        TagKind::Response,
        TagKind::ExecutePython,
        TagKind::Observation,
        TagKind::FinalizePlan,
        TagKind::FinalCode,
    ];

    pub fn marker(self) -> &'static str {
        match self {
            TagKind::Plan => "json",
            TagKind::Interaction => "interaction",
            TagKind::Thinking => "thinking",
            TagKind::Response => "response",
            TagKind::ExecutePython => "execute_python",
            TagKind::Observation => "observation",
            TagKind::FinalizePlan => "finalize_plan",
            TagKind::FinalCode => "final_code",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Kinds whose presence hides an event from the transcript view.
    pub fn is_finalization(self) -> bool {
        matches!(self, TagKind::FinalizePlan | TagKind::FinalCode)
    }
}

/// Plan instructions: either one text value or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instructions {
    Single(String),
    List(Vec<String>),
}

impl Instructions {
    pub fn items(&self) -> Vec<&str> {
        match self {
            Instructions::Single(text) => vec![text.as_str()],
            Instructions::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPayload {
    pub plan: String,
    pub instructions: Instructions,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractionRequest {
    pub function_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractionCall {
    pub request: InteractionRequest,
}

impl InteractionCall {
    pub fn function_name(&self) -> &str {
        &self.request.function_name
    }
}

/// Result of scanning one content string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagExtraction {
    segments: BTreeMap<TagKind, String>,
    plan: Option<Result<PlanPayload, PayloadError>>,
    interactions: Option<Result<Vec<InteractionCall>, PayloadError>>,
}

impl TagExtraction {
    /// Raw inner text of a segment, if the kind is present.
    pub fn get(&self, kind: TagKind) -> Option<&str> {
        self.segments.get(&kind).map(String::as_str)
    }

    pub fn contains(&self, kind: TagKind) -> bool {
        self.segments.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = TagKind> + '_ {
        self.segments.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Parse outcome of the plan segment; `None` when the tag is absent.
    pub fn plan_outcome(&self) -> Option<&Result<PlanPayload, PayloadError>> {
        self.plan.as_ref()
    }

    /// Parse outcome of the interaction segment; `None` when the tag is absent.
    pub fn interaction_outcome(&self) -> Option<&Result<Vec<InteractionCall>, PayloadError>> {
        self.interactions.as_ref()
    }

    /// Well-formed plan only.
    pub fn plan(&self) -> Option<&PlanPayload> {
        self.plan.as_ref().and_then(|r| r.as_ref().ok())
    }

    /// Well-formed interaction list only.
    pub fn interactions(&self) -> Option<&[InteractionCall]> {
        self.interactions
            .as_ref()
            .and_then(|r| r.as_ref().ok())
            .map(Vec::as_slice)
    }
}

/// Scan `content` for every known tag kind.
pub fn extract(content: &str) -> TagExtraction {
    let spans = scan(content);
    let mut segments = BTreeMap::new();
    for kind in TagKind::ALL {
        if let Some((start, end)) = spans[kind.index()] {
            segments.insert(kind, content[start..end].to_string());
        }
    }

    let plan = segments.get(&TagKind::Plan).map(|raw| parse_plan(raw));
    let interactions = segments
        .get(&TagKind::Interaction)
        .map(|raw| parse_interactions(raw));

    TagExtraction {
        segments,
        plan,
        interactions,
    }
}

/// Inner text of the first segment of `kind`.
pub fn find_segment(content: &str, kind: TagKind) -> Option<&str> {
    scan(content)[kind.index()].map(|(start, end)| &content[start..end])
}

/// True when the content carries a `finalize_plan` or `final_code` segment.
pub fn has_finalization_marker(content: &str) -> bool {
    let spans = scan(content);
    TagKind::ALL
        .iter()
        .any(|kind| kind.is_finalization() && spans[kind.index()].is_some())
}

pub fn final_code(content: &str) -> Option<&str> {
    find_segment(content, TagKind::FinalCode)
}

#[derive(Clone, Copy)]
enum ScanState {
    Unseen,
    Open(usize),
    Done(usize, usize),
}

/// Single pass over `<` positions, tracking every kind's open/close state.
fn scan(content: &str) -> [Option<(usize, usize)>; 8] {
    let mut state = [ScanState::Unseen; 8];

    for (pos, _) in content.match_indices('<') {
        let rest = &content[pos + 1..];
        if let Some(after_slash) = rest.strip_prefix('/') {
            for kind in TagKind::ALL {
                let slot = &mut state[kind.index()];
                if let ScanState::Open(start) = *slot {
                    if marker_at(after_slash, kind.marker()) {
                        *slot = ScanState::Done(start, pos);
                    }
                }
            }
        } else {
            for kind in TagKind::ALL {
                let slot = &mut state[kind.index()];
                if matches!(slot, ScanState::Unseen) && marker_at(rest, kind.marker()) {
                    // inner text starts after `<name>`
                    *slot = ScanState::Open(pos + kind.marker().len() + 2);
                }
            }
        }
    }

    state.map(|s| match s {
        ScanState::Done(start, end) => Some((start, end)),
        _ => None,
    })
}

fn marker_at(rest: &str, marker: &str) -> bool {
    rest.strip_prefix(marker)
        .is_some_and(|tail| tail.starts_with('>'))
}

pub fn parse_plan(raw: &str) -> Result<PlanPayload, PayloadError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;

    let plan = value
        .get("plan")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .ok_or(PayloadError::MissingField("plan"))?
        .to_string();

    let instructions = match value.get("instructions") {
        Some(Value::String(text)) if !text.is_empty() => Instructions::Single(text.clone()),
        Some(Value::Array(items)) => Instructions::List(
            items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => return Err(PayloadError::MissingField("instructions")),
    };

    Ok(PlanPayload { plan, instructions })
}

pub fn parse_interactions(raw: &str) -> Result<Vec<InteractionCall>, PayloadError> {
    serde_json::from_str(raw).map_err(|e| PayloadError::InvalidJson(e.to_string()))
}
