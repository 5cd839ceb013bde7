//! State-aware placeholder text for the input area.

use askchat_engine::ControllerState;

/// Placeholder shown in the empty input for the current controller state.
#[must_use]
pub fn input_placeholder(state: &ControllerState) -> &'static str {
    match state {
        ControllerState::Idle => "Type a message and press Enter...",
        ControllerState::AwaitingReply { .. } => "Waiting for the assistant...",
        ControllerState::Error { .. } => "Something went wrong. Type to try again...",
    }
}
