//! Ensemble demo - measure-locked voices over a realtime ticker
//!
//! A handful of voices loop against one shared clock: a bass plays
//! every measure, a lead joins two boundaries in, and a director voice
//! switches the meter to 7/8 partway through. Everything realigns at
//! measure boundaries without any voice knowing about the others.
//!
//! Run with `cargo run --bin ensemble_demo`.

use conductor::{
    Clock, StatusEvent, StatusSink, Ticker, TickerConfig, TimeSignature, VoicePool,
};
use std::rc::Rc;

/// Prints rollovers and state changes as they are published.
struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn publish(&self, event: StatusEvent) {
        match event {
            StatusEvent::Measure(m) => println!("-- measure {m} --"),
            StatusEvent::Signature(sig) => println!("   meter -> {sig}"),
            StatusEvent::Run(state) => println!("   clock {state:?}"),
            StatusEvent::Beat(_) => {}
        }
    }
}

fn main() {
    let clock = Clock::with_sink(Rc::new(ConsoleSink));
    let pool = Rc::new(VoicePool::new());
    clock.attach_voices(pool.clone());

    let bass = clock.clone();
    clock
        .thread_for_measures(8, move || {
            println!("bass | downbeat of measure {}", bass.measure());
        })
        .unwrap();

    let lead = clock.clone();
    pool.spawn(async move {
        // Sit out two boundaries, then loop for four measures.
        let lead = lead.sync_to_measure(None).await;
        let lead = lead.sync_to_measure(None).await;
        let here = lead.clone();
        lead.repeat_for_measures(4, move || {
            println!("lead | phrase from measure {}", here.measure());
        })
        .await;
    });

    let director = clock.clone();
    pool.spawn(async move {
        let director = director.sync_to_measure(None).await;
        let director = director.sync_to_measure(None).await;
        // Queue the meter change for the next boundary.
        director.sync_to_measure(Some(TimeSignature::SevenEight)).await;
    });

    let ticker = Ticker::new(
        clock.clone(),
        pool,
        TickerConfig {
            bpm: 240.0,
            ticks_per_beat: 24,
            rate: 2.0,
        },
    );

    clock.run();
    ticker.run_for_measures(8);
    clock.stop();
    println!("done at measure {}", clock.measure());
}
