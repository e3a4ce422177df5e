//=========================================================================
// Host Signals
//=========================================================================
//
// Control channel between the host and the frame loop.
//
// Architecture:
//   Sender<HostSignal> (any thread) → Receiver → collect_frame() → TickControl
//
// Draining is bounded per frame so a flooding host cannot starve dispatch.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::{info, warn};

//=== HostSignal ==========================================================

/// Commands a host sends to a running [`super::FrameLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// Stop the loop after the current frame.
    Shutdown,

    /// Keep ticking but skip phase dispatch.
    Pause,

    /// Resume phase dispatch.
    Resume,
}

//=== TickControl =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== SignalCollector =====================================================

pub(crate) struct SignalCollector {
    receiver: Receiver<HostSignal>,
    paused: bool,
}

impl SignalCollector {
    const MAX_SIGNALS_PER_FRAME: usize = 64;

    pub(crate) fn new(receiver: Receiver<HostSignal>) -> Self {
        Self {
            receiver,
            paused: false,
        }
    }

    /// Applies pending signals. `Exit` on shutdown or once every sender is gone.
    pub(crate) fn collect_frame(&mut self) -> TickControl {
        let mut drained = 0;

        while drained < Self::MAX_SIGNALS_PER_FRAME {
            match self.receiver.try_recv() {
                Ok(signal) => {
                    if self.handle_signal(signal) == TickControl::Exit {
                        return TickControl::Exit;
                    }
                    drained += 1;
                }
                Err(TryRecvError::Disconnected) => {
                    info!("Host signal channel disconnected");
                    return TickControl::Exit;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= Self::MAX_SIGNALS_PER_FRAME {
            warn!("Host signal backlog: drained {} signals this frame", drained);
        }

        TickControl::Continue
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    fn handle_signal(&mut self, signal: HostSignal) -> TickControl {
        match signal {
            HostSignal::Shutdown => return TickControl::Exit,
            HostSignal::Pause => self.paused = true,
            HostSignal::Resume => self.paused = false,
        }
        TickControl::Continue
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
