//! Demonstration of basic signal operations

use tripwire::{create_memo, create_signal, Signal};

fn main() {
    println!("=== Basic Signals Example ===\n");

    println!("1. Creating a signal and reading it");
    let count = Signal::new(0);
    println!("   count = {}", count.get());

    println!("\n2. Writing through set and update");
    count.set(10);
    println!("   after set(10): {}", count.get());
    count.update(|n| *n *= 3);
    println!("   after update(*3): {}", count.get());

    println!("\n3. Writes with an equal value are discarded");
    let name = Signal::new("sensor-a".to_string());
    let _guard = name.watch(|value| println!("   [watch] name = {value}"));
    name.set("sensor-a".to_string()); // no output: value unchanged
    name.set("sensor-b".to_string());

    println!("\n4. Read/write handles");
    let (temperature, set_temperature) = create_signal(21.5_f64);
    set_temperature.set(23.0);
    println!("   temperature = {}", temperature.get());

    println!("\n5. Derived values recompute lazily");
    let fahrenheit = create_memo(move || temperature.get() * 9.0 / 5.0 + 32.0);
    println!("   fahrenheit = {}", fahrenheit.get());
    set_temperature.set(30.0);
    println!("   fahrenheit = {}", fahrenheit.get());
}
