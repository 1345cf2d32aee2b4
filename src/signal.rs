//! Keeping the shell alive across Ctrl-C.

use nix::libc::c_int;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

extern "C" fn on_interrupt(_: c_int) {}

/// Catch SIGINT with a handler that does nothing.
///
/// The foreground child still receives the interrupt and dies from it, while
/// the shell goes back to its prompt. A caught signal, unlike an ignored
/// one, reverts to the default action in children after `exec`.
pub fn install_interrupt_handler() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_interrupt),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler touches no state, so it is async-signal-safe.
    unsafe { sigaction(Signal::SIGINT, &action) }.map(drop)
}
