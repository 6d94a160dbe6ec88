// Event types for async communication

use crate::api::ApiError;
use crate::conversation::TurnTicket;

#[derive(Debug)]
pub enum AppEvent {
    /// The request tagged `ticket` produced an answer
    Answer { ticket: TurnTicket, text: String },
    /// The request tagged `ticket` failed
    Failed { ticket: TurnTicket, error: ApiError },
}
