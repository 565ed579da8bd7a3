// src/engine/relay.rs

use tokio::sync::mpsc;
use tracing::trace;

use crate::engine::SessionObserver;
use crate::estimate::ProgressEvent;
use crate::exec::RunEvent;

/// Deliver run and progress events to `observer` as they arrive.
///
/// Returns once both senders have closed. Each stream keeps its own
/// order; the two streams interleave by arrival.
pub async fn relay_events<O>(
    mut run_rx: mpsc::Receiver<RunEvent>,
    mut progress_rx: mpsc::Receiver<ProgressEvent>,
    observer: &mut O,
) where
    O: SessionObserver + ?Sized,
{
    let mut run_open = true;
    let mut progress_open = true;

    while run_open || progress_open {
        tokio::select! {
            event = run_rx.recv(), if run_open => match event {
                Some(event) => event.deliver(&mut *observer),
                None => {
                    trace!("run event stream closed");
                    run_open = false;
                }
            },
            event = progress_rx.recv(), if progress_open => match event {
                Some(event) => event.deliver(&mut *observer),
                None => {
                    trace!("progress event stream closed");
                    progress_open = false;
                }
            },
        }
    }
}
