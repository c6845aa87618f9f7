//! Complete counter application demonstrating signals, memos, effects,
//! and a store working together

use tripwire::{batch, create_memo, Effect, Signal, Store};

#[derive(Clone, Debug, PartialEq)]
struct CounterState {
    count: i32,
    step: i32,
    history: Vec<i32>,
}

impl CounterState {
    fn new() -> Self {
        Self {
            count: 0,
            step: 1,
            history: vec![0],
        }
    }

    fn increment(&mut self) {
        self.count += self.step;
        self.history.push(self.count);
    }

    fn decrement(&mut self) {
        self.count -= self.step;
        self.history.push(self.count);
    }
}

fn main() {
    println!("=== Complete Counter Application ===\n");

    println!("1. Low-level: signals and memos");
    let count = Signal::new(0);
    let step = Signal::new(1);

    let next_value = create_memo({
        let (count, step) = (count.clone(), step.clone());
        move || count.get() + step.get()
    });
    println!("   count={}, next would be {}", count.get(), next_value.get());

    let _display = Effect::new({
        let count = count.clone();
        move || println!("   [display] count is {}", count.get())
    });

    count.set(1);
    count.set(2);

    println!("\n2. Batch a step change and a jump into one repaint");
    batch(|| {
        step.set(5);
        count.set(10);
    });
    println!("   next would be {}", next_value.get());

    println!("\n3. High-level: the same app on a store");
    let store = Store::new(CounterState::new());

    store.add_middleware(|previous, next: &CounterState| {
        println!("   [middleware] {} -> {}", previous.count, next.count);
    });
    store.subscribe(|state| {
        println!("   [subscriber] history: {:?}", state.history);
    });

    store.update(|state| state.increment());
    store.update(|state| state.increment());
    store.update(|state| state.decrement());

    let final_state = store.get();
    println!("\n4. Final count: {}", final_state.count);
}
