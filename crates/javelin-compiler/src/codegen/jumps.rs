//! Break-target tracking for switch dispatch.
//!
//! Tracks a stack of switch contexts so `break` inside nested switches
//! patches to the right exit point.

use super::JumpLabel;

/// Manages pending break jumps for nested switch contexts.
#[derive(Debug, Default)]
pub struct JumpManager {
    /// Stack of switch contexts (innermost last).
    switches: Vec<SwitchContext>,
}

#[derive(Debug, Default)]
struct SwitchContext {
    /// Pending break jumps to patch when the switch exits.
    break_labels: Vec<JumpLabel>,
}

impl JumpManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a switch context.
    pub fn enter_switch(&mut self) {
        self.switches.push(SwitchContext::default());
    }

    /// Exit the current switch context, returning the break labels that
    /// need patching past the dispatch.
    pub fn exit_switch(&mut self) -> Vec<JumpLabel> {
        self.switches
            .pop()
            .map(|ctx| ctx.break_labels)
            .unwrap_or_default()
    }

    pub fn in_switch(&self) -> bool {
        !self.switches.is_empty()
    }

    /// Register a break to be patched on switch exit. Returns false when
    /// not inside a switch.
    pub fn add_break(&mut self, label: JumpLabel) -> bool {
        match self.switches.last_mut() {
            Some(ctx) => {
                ctx.break_labels.push(label);
                true
            }
            None => false,
        }
    }

    pub fn switch_depth(&self) -> usize {
        self.switches.len()
    }
}
