//! User context isolation under concurrency

use std::sync::{Arc, Barrier};
use std::thread;

use kshetra_core::{RegionId, Role, StaticAuth};
use kshetra_logging::UserContextGuard;

/// Each thread sees only its own user, through repeated nesting
#[test]
fn test_concurrent_user_contexts() {
    const NUM_THREADS: usize = 32;
    const ITERATIONS: usize = 100;

    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|thread_id| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let me = format!("user-{thread_id}");
                let auth = StaticAuth::new(Some(RegionId(thread_id as u64)), Role::NagarKaryakarta)
                    .with_user_id(me.clone());
                barrier.wait();

                let _outer = UserContextGuard::new(&auth);
                for i in 0..ITERATIONS {
                    let nested = StaticAuth::new(None, Role::Admin).with_user_id(format!("{me}-{i}"));
                    {
                        let _inner = UserContextGuard::new(&nested);
                        let current = UserContextGuard::current_user_id();
                        assert_eq!(current, Some(format!("{me}-{i}")));
                    }
                    assert_eq!(UserContextGuard::current_user_id(), Some(me.clone()));
                }
                UserContextGuard::current().map(|c| c.assigned_region)
            })
        })
        .collect();

    for (thread_id, handle) in handles.into_iter().enumerate() {
        let region = handle.join().unwrap();
        assert_eq!(region, Some(Some(RegionId(thread_id as u64))));
    }
}
