// Tapkeeper — unattended tap-claim agent for the CEX.IO tap game.
//
// Layer rule: `atoms` holds pure types, constants, errors, and trait seams
// (no I/O); `engine` holds everything that talks to the network or the
// filesystem. Nothing in atoms may import from engine.

pub mod atoms;
pub mod engine;
