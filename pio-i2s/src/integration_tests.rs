//! End-to-end loopback through the simulated transfer engine.
//!
//! An output stream's slots are "sent" by [`SimDma::transmit`] and the same
//! words are delivered into an input stream's in-flight slot, so the whole
//! path (packing, ring, adapter, completion handling) runs as it would on a
//! board with DOUT wired to DIN.

use std::vec::Vec;

use crate::config::{Direction, Topology};
use crate::dma::{IrqRegistry, TransferAdapter};
use crate::i2s::I2s;
use crate::ring::{EngineId, RingEngine};
use crate::sim::{SimDma, SimPio};

const WORDS: usize = 8;

struct Loopback<'r> {
    sim: SimDma,
    tx: TransferAdapter<'r, SimDma>,
    rx: TransferAdapter<'r, SimDma>,
}

impl<'r> Loopback<'r> {
    fn new(reg: &'r IrqRegistry, tx_topology: Topology) -> Self {
        let sim = SimDma::new(4);
        Loopback {
            tx: TransferAdapter::new(sim.clone(), reg, tx_topology),
            rx: TransferAdapter::new(sim.clone(), reg, Topology::Single),
            sim,
        }
    }

    /// One slot time: the output's in-flight slot goes out and lands in the
    /// input's in-flight slot, then both completion handlers run.
    fn tick<const S: usize>(&mut self, out: &RingEngine<S, WORDS>, inp: &RingEngine<S, WORDS>) {
        let id = if self.tx.topology() == Topology::PingPong
            && out.engine_position(EngineId::B).0 == out.hardware_cursor()
        {
            EngineId::B
        } else {
            EngineId::A
        };
        let words = self.sim.transmit(self.tx.channel(id).unwrap());
        self.sim.receive(self.rx.channel(EngineId::A).unwrap(), &words);
        out.on_interrupt(&mut self.tx);
        inp.on_interrupt(&mut self.rx);
    }
}

fn frames(n: usize) -> Vec<(i16, i16)> {
    (1..=n as i16).map(|i| (i * 3, -i)).collect()
}

fn run_loopback(tx_topology: Topology) {
    let reg = IrqRegistry::new();
    let out_ring: RingEngine<4, WORDS> = RingEngine::new();
    let in_ring: RingEngine<4, WORDS> = RingEngine::new();
    let mut link = Loopback::new(&reg, tx_topology);

    let mut out = I2s::new(&out_ring, SimPio::new(), Direction::Output);
    let mut inp = I2s::new(&in_ring, SimPio::new(), Direction::Input);
    for s in [&mut out, &mut inp] {
        s.set_buffers(WORDS, 0).unwrap();
        s.set_buffer_count(4).unwrap();
    }
    out.begin(&mut link.tx).unwrap();
    inp.begin(&mut link.rx).unwrap();

    let sent = frames(40);
    let mut next = 0;
    let mut received = Vec::new();
    for _ in 0..7 {
        let room = out.available_for_write().min(sent.len() - next);
        for &(l, r) in &sent[next..next + room] {
            out.write16(l, r).unwrap();
        }
        next += room;

        link.tick(&out_ring, &in_ring);
        while inp.available() > 0 {
            received.push(inp.read16().unwrap());
        }
    }

    // Two slots of silence lead the data: the first in-flight slot and
    // the look-ahead slot.
    assert_eq!(received.len(), 7 * WORDS);
    assert!(received[..2 * WORDS].iter().all(|&f| f == (0, 0)));
    assert_eq!(received[2 * WORDS..], sent[..]);
    assert!(!inp.take_over_underflow());

    out.end(&mut link.tx);
    inp.end(&mut link.rx);
    assert_eq!(link.sim.free_channels(), 4);
    assert!(!link.sim.line_enabled());
}

#[test]
fn loopback_single_channel() {
    run_loopback(Topology::Single);
}

#[test]
fn loopback_ping_pong() {
    run_loopback(Topology::PingPong);
}

#[test]
fn producer_stall_sends_silence_and_flags_underrun() {
    let reg = IrqRegistry::new();
    let out_ring: RingEngine<4, WORDS> = RingEngine::new();
    let in_ring: RingEngine<4, WORDS> = RingEngine::new();
    let mut link = Loopback::new(&reg, Topology::Single);

    let mut out = I2s::new(&out_ring, SimPio::new(), Direction::Output);
    let mut inp = I2s::new(&in_ring, SimPio::new(), Direction::Input);
    for s in [&mut out, &mut inp] {
        s.set_bits_per_sample(32).unwrap();
        s.set_buffers(WORDS, 0x7F).unwrap();
        s.set_buffer_count(4).unwrap();
    }
    out.begin(&mut link.tx).unwrap();
    inp.begin(&mut link.rx).unwrap();

    for i in 0..WORDS / 2 {
        out.write32(i as i32 + 1, -(i as i32) - 1).unwrap();
    }
    let mut words = Vec::new();
    for _ in 0..4 {
        link.tick(&out_ring, &in_ring);
        while inp.available() > 0 {
            words.push(inp.read(false).unwrap());
        }
    }

    assert!(out.take_over_underflow());
    assert!(!out.take_over_underflow());
    assert_eq!(words.len(), 4 * WORDS);
    assert!(words[..2 * WORDS].iter().all(|&w| w == 0x7F));
    assert_eq!(words[2 * WORDS..2 * WORDS + 2], [1, 0xFFFF_FFFF]);
    assert!(words[3 * WORDS..].iter().all(|&w| w == 0x7F));
}
