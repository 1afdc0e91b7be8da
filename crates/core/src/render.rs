//! Message Renderer - maps one ChatEvent to a display-ready block.
//!
//! The output is a small tree of typed nodes, not markup; front ends decide
//! how each node kind looks.

use crate::{ChatEvent, Role, TagExtraction, TagKind, extract};

pub const OBSERVATION_LABEL: &str = "Observation";
pub const ATTACHMENT_LABEL: &str = "View Media";

/// Horizontal placement of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Bubble background family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleTone {
    Outbound,
    Assistant,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockNode {
    /// `label` followed by free text on the same line.
    Labeled { label: String, text: String },
    /// Monospaced code body under a label.
    Code { label: String, code: String },
    /// Plan summary line plus one entry per instruction.
    Plan {
        label: String,
        summary: String,
        instructions: Vec<String>,
    },
    /// Header line plus one function name per line.
    FunctionCalls { label: String, names: Vec<String> },
    /// Collapsible monospaced body.
    Collapsible {
        label: String,
        body: String,
        collapsed: bool,
    },
    /// Link to an attached media item.
    Attachment { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub role: Role,
    pub alignment: Alignment,
    pub tone: BubbleTone,
    pub nodes: Vec<BlockNode>,
}

impl RenderedBlock {
    /// Nodes excluding attachment links.
    pub fn body(&self) -> impl Iterator<Item = &BlockNode> + '_ {
        self.nodes
            .iter()
            .filter(|n| !matches!(n, BlockNode::Attachment { .. }))
    }

    pub fn attachments(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().filter_map(|n| match n {
            BlockNode::Attachment { url } => Some(url.as_str()),
            _ => None,
        })
    }
}

pub fn alignment_for(role: &Role) -> Alignment {
    if role.is_outbound() {
        Alignment::Right
    } else {
        Alignment::Left
    }
}

pub fn tone_for(role: &Role) -> BubbleTone {
    match role {
        Role::User | Role::InteractionResponse => BubbleTone::Outbound,
        Role::Assistant => BubbleTone::Assistant,
        _ => BubbleTone::Secondary,
    }
}

/// Render a chat event.
pub fn render(event: &ChatEvent) -> RenderedBlock {
    let mut nodes = match &event.role {
        Role::Observation => vec![collapsible(&event.content)],
        Role::Assistant
        | Role::Conversation
        | Role::Planner
        | Role::Interaction
        | Role::Coder
        | Role::Thinking
        | Role::ExecutePython => tagged_nodes(&event.role, &event.content),
        Role::User | Role::InteractionResponse | Role::Other(_) => {
            vec![generic(&event.role, &event.content)]
        }
    };

    nodes.extend(event.media.iter().map(|m| BlockNode::Attachment {
        url: m.file_url.clone(),
    }));

    RenderedBlock {
        role: event.role.clone(),
        alignment: alignment_for(&event.role),
        tone: tone_for(&event.role),
        nodes,
    }
}

fn tagged_nodes(role: &Role, content: &str) -> Vec<BlockNode> {
    let tags = extract(content);
    let mut nodes = Vec::new();
    push_tagged(&mut nodes, role, &tags);
    if nodes.is_empty() {
        nodes.push(generic(role, content));
    }
    nodes
}

fn push_tagged(nodes: &mut Vec<BlockNode>, role: &Role, tags: &TagExtraction) {
    if let Some(plan) = tags.plan() {
        nodes.push(BlockNode::Plan {
            label: format!("[{}]", role.label()),
            summary: plan.plan.clone(),
            instructions: plan
                .instructions
                .items()
                .into_iter()
                .map(str::to_string)
                .collect(),
        });
    }
    if let Some(calls) = tags.interactions() {
        nodes.push(BlockNode::FunctionCalls {
            label: format!("[{}]", role.label()),
            names: calls.iter().map(|c| c.function_name().to_string()).collect(),
        });
    }
    if let Some(text) = tags.get(TagKind::Thinking) {
        nodes.push(BlockNode::Labeled {
            label: "[THINKING]".to_string(),
            text: text.to_string(),
        });
    }
    if let Some(text) = tags.get(TagKind::Response) {
        nodes.push(BlockNode::Labeled {
            label: "[RESPONSE]".to_string(),
            text: text.to_string(),
        });
    }
    if let Some(code) = tags.get(TagKind::ExecutePython) {
        nodes.push(BlockNode::Code {
            label: "[EXECUTE PYTHON]".to_string(),
            code: code.trim().to_string(),
        });
    }
    if let Some(body) = tags.get(TagKind::Observation) {
        nodes.push(collapsible(body));
    }
}

fn collapsible(body: &str) -> BlockNode {
    BlockNode::Collapsible {
        label: OBSERVATION_LABEL.to_string(),
        body: body.to_string(),
        collapsed: true,
    }
}

fn generic(role: &Role, content: &str) -> BlockNode {
    BlockNode::Labeled {
        label: format!("[{}]", role.label()),
        text: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Media;

    fn ev(role: &str, content: &str) -> ChatEvent {
        ChatEvent::new(Role::parse(role), content)
    }

    #[test]
    fn test_observation_role_is_collapsed_verbatim() {
        let content = "  raw <response>not parsed</response>\n  output  ";
        let block = render(&ev("observation", content));
        assert_eq!(
            block.nodes,
            vec![BlockNode::Collapsible {
                label: "Observation".to_string(),
                body: content.to_string(),
                collapsed: true,
            }]
        );
        assert_eq!(block.alignment, Alignment::Left);
    }

    #[test]
    fn test_response_block() {
        let block = render(&ev("assistant", "<response>Hi there</response>"));
        assert_eq!(
            block.nodes,
            vec![BlockNode::Labeled {
                label: "[RESPONSE]".to_string(),
                text: "Hi there".to_string(),
            }]
        );
        assert_eq!(block.tone, BubbleTone::Assistant);
    }

    #[test]
    fn test_plan_block_lists_instructions_in_order() {
        let block = render(&ev(
            "assistant",
            r#"<json>{"plan":"Step A","instructions":["do X","do Y"]}</json>"#,
        ));
        match &block.nodes[0] {
            BlockNode::Plan {
                label,
                summary,
                instructions,
            } => {
                assert_eq!(label, "[ASSISTANT]");
                assert_eq!(summary, "Step A");
                assert_eq!(instructions, &vec!["do X".to_string(), "do Y".to_string()]);
            }
            other => panic!("expected plan, got {other:?}"),
        }
        assert_eq!(block.nodes.len(), 1);
    }

    #[test]
    fn test_untagged_coder_falls_back_to_generic() {
        let block = render(&ev("coder", "no tags here"));
        assert_eq!(
            block.nodes,
            vec![BlockNode::Labeled {
                label: "[CODER]".to_string(),
                text: "no tags here".to_string(),
            }]
        );
        assert_eq!(block.tone, BubbleTone::Secondary);
    }

    #[test]
    fn test_all_sections_in_fixed_order() {
        let content = concat!(
            "<observation>obs</observation>",
            "<execute_python>\n  x = 1\n</execute_python>",
            "<response>resp</response>",
            "<thinking>think</thinking>",
            "<interaction>[{\"request\":{\"function_name\":\"f\"}}]</interaction>",
            "<json>{\"plan\":\"p\",\"instructions\":\"i\"}</json>",
        );
        let block = render(&ev("planner", content));
        let kinds: Vec<&str> = block
            .nodes
            .iter()
            .map(|n| match n {
                BlockNode::Plan { .. } => "plan",
                BlockNode::FunctionCalls { .. } => "calls",
                BlockNode::Labeled { label, .. } if label == "[THINKING]" => "thinking",
                BlockNode::Labeled { label, .. } if label == "[RESPONSE]" => "response",
                BlockNode::Code { .. } => "code",
                BlockNode::Collapsible { .. } => "observation",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["plan", "calls", "thinking", "response", "code", "observation"]
        );
        assert!(block.nodes.contains(&BlockNode::Code {
            label: "[EXECUTE PYTHON]".to_string(),
            code: "x = 1".to_string(),
        }));
    }

    #[test]
    fn test_malformed_plan_falls_through_to_generic() {
        let content = "<json>{broken</json>";
        let block = render(&ev("assistant", content));
        assert_eq!(
            block.nodes,
            vec![BlockNode::Labeled {
                label: "[ASSISTANT]".to_string(),
                text: content.to_string(),
            }]
        );
    }

    #[test]
    fn test_user_and_unknown_roles_are_literal() {
        let user = render(&ev("user", "<response>literal</response>"));
        assert_eq!(user.alignment, Alignment::Right);
        assert_eq!(user.tone, BubbleTone::Outbound);
        assert_eq!(
            user.nodes[0],
            BlockNode::Labeled {
                label: "[USER]".to_string(),
                text: "<response>literal</response>".to_string(),
            }
        );

        let reply = render(&ev("interaction_response", "{\"function_name\":\"f\"}"));
        assert_eq!(reply.alignment, Alignment::Right);

        let other = render(&ev("critic", "fine"));
        assert_eq!(other.alignment, Alignment::Left);
        assert_eq!(
            other.nodes[0],
            BlockNode::Labeled {
                label: "[CRITIC]".to_string(),
                text: "fine".to_string(),
            }
        );
    }

    #[test]
    fn test_media_links_appended_in_order() {
        let event = ev("observation", "o").with_media(vec![
            Media::new("a", "https://x/1.png"),
            Media::new("b", "https://x/2.png"),
        ]);
        let block = render(&event);
        assert_eq!(block.nodes.len(), 3);
        assert_eq!(
            block.attachments().collect::<Vec<_>>(),
            vec!["https://x/1.png", "https://x/2.png"]
        );
        assert_eq!(block.body().count(), 1);
    }
}
