//! Small synchronization helpers shared by the runtime modules.
//!
//! No user callable ever runs while one of the runtime's locks is held, so a
//! poisoned lock only means another runtime thread died between two plain field
//! updates. The protected data is still consistent in that case, and the helpers
//! below recover the guard instead of cascading the panic.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, recovering the guard if it was poisoned.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Block on `condvar` while `condition` holds.
pub(crate) fn wait_while<'a, T, F>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    condition: F,
) -> MutexGuard<'a, T>
where
    F: FnMut(&mut T) -> bool,
{
    condvar
        .wait_while(guard, condition)
        .unwrap_or_else(PoisonError::into_inner)
}

/// Render a panic payload caught by `catch_unwind`.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lock_recovers_from_poison() {
        let m = Arc::new(Mutex::new(1));
        let m2 = Arc::clone(&m);
        let _ = thread::spawn(move || {
            let _g = m2.lock().unwrap();
            panic!("poison it");
        })
        .join();
        assert!(m.is_poisoned());
        *lock(&m) += 1;
        assert_eq!(*lock(&m), 2);
    }

    #[test]
    fn panic_message_handles_both_string_kinds() {
        let payload = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload = std::panic::catch_unwind(|| panic!("{}", 5)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "5");
    }
}
