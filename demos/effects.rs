//! Demonstration of reactive effects, batching, and untracked reads

use tripwire::{batch, untrack, Effect, Signal};

fn main() {
    println!("=== Effects Example ===\n");

    println!("1. Creating a signal and an effect");
    let count = Signal::new(0);

    let _effect = Effect::new({
        let count = count.clone();
        move || {
            println!("   [effect] count is now: {}", count.get());
        }
    });

    println!("\n2. Effect runs immediately on creation (printed above)");

    println!("\n3. Updating the signal triggers the effect");
    count.set(5);
    count.update(|n| *n += 5);

    println!("\n4. Effect with multiple dependencies");
    let first_name = Signal::new("John".to_string());
    let last_name = Signal::new("Doe".to_string());

    let _name_effect = Effect::new({
        let first = first_name.clone();
        let last = last_name.clone();
        move || {
            println!("   [effect] full name: {} {}", first.get(), last.get());
        }
    });

    println!("\n5. Batching both writes coalesces them into one run");
    batch(|| {
        first_name.set("Jane".to_string());
        last_name.set("Smith".to_string());
    });

    println!("\n6. Untracked reads do not subscribe");
    let logged = Signal::new(0);
    let ignored = Signal::new(0);
    let _audit = Effect::new({
        let (logged, ignored) = (logged.clone(), ignored.clone());
        move || {
            let seen = logged.get();
            let aside = untrack(|| ignored.get());
            println!("   [effect] logged={seen} (ignored was {aside})");
        }
    });
    ignored.set(100); // no effect run
    logged.set(1); // effect runs, sees ignored=100
}
