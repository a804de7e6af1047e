use crate::error::SamplerError;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::thread;
use tokio::runtime::Builder;
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Registers for SIGHUP and returns the receiving end of a single-slot
/// channel that yields `()` once per delivered hang-up.
///
/// Registration happens before this returns, so a hang-up sent after it
/// returns is never lost. Hang-ups arriving while a trigger is still
/// pending collapse into it.
pub fn hangup_triggers() -> Result<Receiver<()>, SamplerError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SamplerError::Signal)?;
    let hangup = {
        let _guard = runtime.enter();
        signal(SignalKind::hangup()).map_err(SamplerError::Signal)?
    };

    let (sender, receiver) = bounded(1);
    thread::Builder::new()
        .name("sighup".to_string())
        .spawn(move || runtime.block_on(forward(hangup, sender)))
        .map_err(SamplerError::Signal)?;

    Ok(receiver)
}

async fn forward(mut hangup: Signal, sender: Sender<()>) {
    while hangup.recv().await.is_some() {
        if !notify(&sender) {
            break;
        }
    }
    log::debug!("SIGHUP listener stopped");
}

/// Posts a trigger without blocking. Returns false once the receiver is gone.
fn notify(sender: &Sender<()>) -> bool {
    match sender.try_send(()) {
        Ok(()) => true,
        Err(TrySendError::Full(())) => {
            log::debug!("SIGHUP while a sample is pending, coalesced");
            true
        }
        Err(TrySendError::Disconnected(())) => false,
    }
}
