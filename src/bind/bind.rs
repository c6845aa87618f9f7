use crate::error::Error;
use crate::signal::{Signal, WatchGuard};

/// RAII connection between two cells created by [`bind`] or
/// [`bind_readonly`]. Dropping it disconnects the mirror.
pub struct Binding {
    _guards: Vec<WatchGuard>,
}

/// Keep two cells in sync in both directions.
///
/// `b` adopts `a`'s current value immediately; afterwards an accepted write
/// to either cell is mirrored into the other. The mirror write is skipped
/// when the destination already holds an equal value, which is what breaks
/// the feedback loop between the two watchers.
///
/// This is the wiring for two-way ownership: one scope owns `a`, another
/// owns `b`, and both observe a single logical value.
///
/// # Examples
///
/// ```
/// use tripwire::{bind, Signal};
///
/// let parent = Signal::new(0);
/// let child = Signal::new(0);
/// let _binding = bind(&parent, &child).unwrap();
///
/// child.set(5);
/// assert_eq!(parent.get(), 5);
///
/// parent.set(9);
/// assert_eq!(child.get(), 9);
/// ```
pub fn bind<T>(a: &Signal<T>, b: &Signal<T>) -> Result<Binding, Error>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    if a.id() == b.id() {
        return Err(Error::SelfBind);
    }

    b.set(a.get_untracked());

    let forward = a.watch({
        let b = b.clone();
        move |value| {
            if b.with_untracked(|current| current != &value) {
                b.set(value);
            }
        }
    });
    let backward = b.watch({
        let a = a.clone();
        move |value| {
            if a.with_untracked(|current| current != &value) {
                a.set(value);
            }
        }
    });

    Ok(Binding {
        _guards: vec![forward, backward],
    })
}

/// Mirror `source` into `target`, one direction only.
///
/// `target` adopts `source`'s current value immediately and follows every
/// accepted write to `source`. Writes to `target` are not propagated back.
pub fn bind_readonly<T>(source: &Signal<T>, target: &Signal<T>) -> Result<Binding, Error>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    if source.id() == target.id() {
        return Err(Error::SelfBind);
    }

    target.set(source.get_untracked());

    let guard = source.watch({
        let target = target.clone();
        move |value| {
            if target.with_untracked(|current| current != &value) {
                target.set(value);
            }
        }
    });

    Ok(Binding {
        _guards: vec![guard],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_way_binding_mirrors_both_directions() {
        let a = Signal::new(1);
        let b = Signal::new(2);

        let binding = bind(&a, &b);
        assert!(binding.is_ok());
        let _binding = binding;

        // b adopted a's value on connection
        assert_eq!(b.get(), 1);

        a.set(10);
        assert_eq!(b.get(), 10);

        b.set(20);
        assert_eq!(a.get(), 20);
    }

    #[test]
    fn readonly_binding_mirrors_one_direction() {
        let source = Signal::new(1);
        let target = Signal::new(0);

        let _binding = bind_readonly(&source, &target).unwrap();
        assert_eq!(target.get(), 1);

        source.set(5);
        assert_eq!(target.get(), 5);

        // Writes to the target do not flow back
        target.set(99);
        assert_eq!(source.get(), 5);
    }

    #[test]
    fn binding_a_cell_to_itself_is_an_error() {
        let a = Signal::new(1);
        assert_eq!(bind(&a, &a.clone()).err(), Some(Error::SelfBind));
    }

    #[test]
    fn dropping_binding_disconnects() {
        let a = Signal::new(1);
        let b = Signal::new(1);

        let binding = bind(&a, &b).unwrap();
        drop(binding);

        a.set(2);
        assert_eq!(b.get(), 1);
    }
}
