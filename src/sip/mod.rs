//! SIP stream parsing: packet assembly and best-effort classification.

mod assembler;
mod classifier;
mod message;

pub use assembler::PacketAssembler;
pub use classifier::{Classifier, HeuristicClassifier, RESPONSE_CODES};
pub use message::{SipLabel, SipMessage, SipMethod};
