use super::{ChannelConfig, ChannelId, IrqRegistry, PacingSignal, TransferEngine, TransferSize};
use crate::config::{Direction, Topology};
use crate::error::Error;
use crate::ring::EngineId;

/// The transfer channels behind one ring.
///
/// Owned by whichever context services the completion interrupt; the ring
/// borrows it at `begin`, on every completion, and at `deinit`.
pub struct TransferAdapter<'r, E> {
    engine: E,
    registry: &'r IrqRegistry,
    topology: Topology,
    direction: Direction,
    channels: [Option<ChannelId>; 2],
}

impl<'r, E: TransferEngine> TransferAdapter<'r, E> {
    pub fn new(engine: E, registry: &'r IrqRegistry, topology: Topology) -> Self {
        TransferAdapter {
            engine,
            registry,
            topology,
            direction: Direction::Output,
            channels: [None, None],
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Hardware channel backing `id`, if claimed.
    pub fn channel(&self, id: EngineId) -> Option<ChannelId> {
        self.channels[id.index()]
    }

    pub fn is_claimed(&self) -> bool {
        self.channels[0].is_some()
    }

    /// Engines in use for this topology.
    pub fn engines(&self) -> &'static [EngineId] {
        let all: &'static [EngineId; 2] = &EngineId::ALL;
        &all[..self.topology.engines()]
    }

    /// Claim one (single) or two (ping-pong) channels.
    ///
    /// On partial failure the channel already claimed is released before
    /// returning [`Error::NoFreeChannel`].
    pub fn claim(&mut self) -> Result<(), Error> {
        if self.is_claimed() {
            return Ok(());
        }
        let Some(a) = self.engine.claim_channel() else {
            warn!("dma: no free channel");
            return Err(Error::NoFreeChannel);
        };
        let b = match self.topology {
            Topology::Single => None,
            Topology::PingPong => match self.engine.claim_channel() {
                Some(b) => Some(b),
                None => {
                    self.engine.release_channel(a);
                    warn!("dma: second channel unavailable, released {}", a.0);
                    return Err(Error::NoFreeChannel);
                }
            },
        };
        self.channels = [Some(a), b];
        debug!("dma: claimed channels {} {}", a.0, b.map(|c| c.0));
        Ok(())
    }

    /// Set up engine `id` to move `words` words between the protocol FIFO
    /// and the slot at `slot_address`. In ping-pong the engine chains to its
    /// partner; nothing is started.
    pub fn configure(
        &mut self,
        id: EngineId,
        direction: Direction,
        pacing: PacingSignal,
        fifo_address: usize,
        slot_address: usize,
        words: usize,
    ) -> Result<(), Error> {
        let channel = self.channel(id).ok_or(Error::NoFreeChannel)?;
        let chain_to = match self.topology {
            Topology::Single => None,
            Topology::PingPong => self.channel(id.other()),
        };
        self.direction = direction;
        let config = ChannelConfig {
            size: TransferSize::Word,
            read_increment: direction == Direction::Output,
            write_increment: direction == Direction::Input,
            pacing,
            chain_to,
        };
        self.engine.configure(channel, &config);
        match direction {
            Direction::Output => {
                self.engine.set_source_address(channel, slot_address);
                self.engine.set_dest_address(channel, fifo_address);
            }
            Direction::Input => {
                self.engine.set_source_address(channel, fifo_address);
                self.engine.set_dest_address(channel, slot_address);
            }
        }
        self.engine.set_transfer_count(channel, words as u32);
        Ok(())
    }

    /// Route completions to the shared line, enabling the line if this is
    /// its first user.
    pub fn enable_interrupts(&mut self) {
        for channel in self.channels.into_iter().flatten() {
            self.engine.set_channel_interrupt(channel, true);
            if self.registry.attach(channel) {
                debug!("dma: irq line enabled");
                self.engine.set_line_enabled(true);
            }
        }
    }

    /// Start engine A. In ping-pong, B is started by the chain.
    pub fn start(&mut self) {
        if let Some(channel) = self.channels[0] {
            self.engine.start(channel);
        }
    }

    /// Point engine `id` at its next slot. Single topology also re-triggers
    /// the channel; in ping-pong the partner's chain does that.
    pub fn retarget(&mut self, id: EngineId, slot_address: usize, words: usize) {
        let Some(channel) = self.channel(id) else {
            return;
        };
        match self.direction {
            Direction::Output => self.engine.set_source_address(channel, slot_address),
            Direction::Input => self.engine.set_dest_address(channel, slot_address),
        }
        self.engine.set_transfer_count(channel, words as u32);
        if self.topology == Topology::Single {
            self.engine.start(channel);
        }
    }

    pub fn is_complete(&self, id: EngineId) -> bool {
        self.channel(id)
            .map(|channel| self.engine.is_complete(channel))
            .unwrap_or(false)
    }

    pub fn acknowledge(&mut self, id: EngineId) {
        if let Some(channel) = self.channel(id) {
            self.engine.acknowledge(channel);
        }
    }

    /// Disable completions, detach from the shared line (disabling it if
    /// this was its last user) and return the channels.
    pub fn release(&mut self) {
        for slot in self.channels.iter_mut() {
            let Some(channel) = slot.take() else {
                continue;
            };
            self.engine.set_channel_interrupt(channel, false);
            if self.registry.detach(channel) {
                debug!("dma: irq line disabled");
                self.engine.set_line_enabled(false);
            }
            self.engine.release_channel(channel);
        }
    }

    /// Give back the underlying controller. Claimed channels are released first.
    pub fn into_inner(mut self) -> E {
        self.release();
        self.engine
    }
}
