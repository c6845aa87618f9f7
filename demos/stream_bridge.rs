//! Demonstration of bridging between streams, outputs, and cells

use futures::executor::block_on;
use futures::StreamExt;
use tripwire::bridge::{from_stream, to_stream};
use tripwire::{bind, Output, Signal};

fn main() {
    println!("=== Stream Bridge Example ===\n");

    println!("1. Pull a push-based stream into a cell");
    let readings = futures::stream::iter([12, 19, 19, 27]);
    let (latest, bridge) = from_stream(readings);
    println!("   before driving: {:?}", latest.get());
    block_on(bridge);
    println!("   after driving:  {:?}", latest.get());

    println!("\n2. Push a cell's accepted writes out as a stream");
    let level = Signal::new(0);
    let stream = to_stream(&level);
    level.set(1);
    level.set(1); // discarded: unchanged
    level.set(2);
    let seen = block_on(stream.take(3).collect::<Vec<_>>());
    println!("   emitted: {seen:?}");

    println!("\n3. Outputs carry discrete events");
    let saved: Output<String> = Output::new();
    let _sub = saved.subscribe(|path| println!("   [output] saved to {path}"));
    saved.emit("/tmp/report.txt".to_string());

    println!("\n4. Two-way binding keeps a pair of cells in sync");
    let parent = Signal::new(String::from("draft"));
    let child = Signal::new(String::new());
    let _binding = bind(&parent, &child).expect("distinct cells");
    child.set("edited".to_string());
    println!("   parent sees: {}", parent.get());
}
