// Chat engine: attachment classification, prompt assembly, the transcript
// state machine and the turn pipeline that ties them to the model gateway.

pub mod attachment;
pub mod handlers;
pub mod prompt;
pub mod session;
pub mod store;
pub mod turn;
