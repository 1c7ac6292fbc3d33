// SPDX-License-Identifier: MIT
//! Wall-time and resource-usage comparison between `bbsort` and
//! general-purpose sorts, over random `u64` inputs of increasing size.

use std::sync::atomic;
use std::time::Duration;

const MAX_M_ITEMS: usize = 16;

fn main() {
    println!("implementation | 2^20 Is | T wall  | T usr   | T sys   | mem     ");
    println!("---------------|---------|---------|---------|---------|---------");

    let benches: [(_, &dyn Fn(usize) -> Vec<u64>); 4] = [
        ("vec sort", &fill_vec),
        ("quicksort", &fill_quicksort),
        ("bbsort", &fill_bbsort),
        ("bbsort dictless", &fill_bbsort_dictless),
    ];

    std::iter::successors(Some(1usize), |s| (*s).checked_mul(4))
        .take_while(|s| *s <= MAX_M_ITEMS)
        .flat_map(|s| benches.iter().map(move |(n, b)| (n, s, b)))
        .for_each(|(n, s, b)| {
            let (t, d) = bench_func(b, s * 1024 * 1024);
            println!(
                "{:<15}|{:>9}|{:>9}|{:>9}|{:>9}|{:>9}",
                n,
                s,
                t.as_millis(),
                d.user_time.as_millis(),
                d.system_time.as_millis(),
                d.allocated / (1024 * 1024),
            )
        });
}

fn fill_vec(num: usize) -> Vec<u64> {
    let mut buf: Vec<_> = random_items(num).collect();
    buf.sort_unstable();
    buf
}

fn fill_quicksort(num: usize) -> Vec<u64> {
    let mut buf: Vec<_> = random_items(num).collect();
    quicksort(&mut buf);
    buf
}

fn fill_bbsort(num: usize) -> Vec<u64> {
    let mut buf: Vec<_> = random_items(num).collect();
    bbsort::sort(&mut buf).expect("sort failed");
    buf
}

fn fill_bbsort_dictless(num: usize) -> Vec<u64> {
    let mut buf: Vec<_> = random_items(num).collect();
    bbsort::sort_dictless(&mut buf).expect("sort failed");
    buf
}

/// Textbook in-place quicksort, used as the non-general-purpose baseline the
/// spec asks comparisons to be measured against.
fn quicksort(slice: &mut [u64]) {
    if slice.len() <= 1 {
        return;
    }
    let pivot = partition(slice);
    let (left, right) = slice.split_at_mut(pivot);
    quicksort(left);
    quicksort(&mut right[1..]);
}

fn partition(slice: &mut [u64]) -> usize {
    let last = slice.len() - 1;
    let pivot = slice[last];
    let mut i = 0;
    for j in 0..last {
        if slice[j] < pivot {
            slice.swap(i, j);
            i += 1;
        }
    }
    slice.swap(i, last);
    i
}

/// Benchmark a single fill function, measuring wall time and resource usage
/// over the run.
fn bench_func(mk: impl Fn(usize) -> Vec<u64>, items: usize) -> (Duration, Diff) {
    let s0 = Snapshot::new();
    let t0 = std::time::Instant::now();
    let result = mk(items);
    let elapsed = t0.elapsed();
    let s1 = Snapshot::new();

    assert!(result.windows(2).all(|w| w[0] <= w[1]), "result is not sorted");

    (elapsed, s1.diff(s0))
}

/// Create an iterator over random items
fn random_items(num: usize) -> impl Iterator<Item = u64> {
    random_items_with_seed(num, 0xcafef00dd15ea5e5) // seed taken from rand_pcg docs
}

/// Create an iterator over random items with a given seed
fn random_items_with_seed(num: usize, seed: u128) -> impl Iterator<Item = u64> {
    use rand::Rng;

    let mut rng = rand_pcg::Mcg128Xsl64::new(seed);
    std::iter::from_fn(move || Some(rng.gen())).take(num)
}

/// Snapshot of the current resource usage
#[derive(Copy, Clone, Debug)]
struct Snapshot {
    user_time: Duration,
    system_time: Duration,
    allocated: usize,
}

impl Snapshot {
    /// Create a new [Snapshot]
    fn new() -> Self {
        let mut rusage = libc::rusage {
            ru_utime: libc::timeval { tv_sec: 0, tv_usec: 0 },
            ru_stime: libc::timeval { tv_sec: 0, tv_usec: 0 },
            ru_maxrss: 0,
            ru_ixrss: 0,
            ru_idrss: 0,
            ru_isrss: 0,
            ru_minflt: 0,
            ru_majflt: 0,
            ru_nswap: 0,
            ru_inblock: 0,
            ru_oublock: 0,
            ru_msgsnd: 0,
            ru_msgrcv: 0,
            ru_nsignals: 0,
            ru_nvcsw: 0,
            ru_nivcsw: 0,
        };
        if unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut rusage) } != 0 {
            panic!("Failed to retrieve resource usages.")
        }

        Self {
            user_time: duration_from_timeval(rusage.ru_utime),
            system_time: duration_from_timeval(rusage.ru_stime),
            allocated: ALLOCATOR.allocated(),
        }
    }

    /// Compare this [Snapshot] to an earlier one
    fn diff(&self, older: Self) -> Diff {
        Diff {
            user_time: self.user_time.saturating_sub(older.user_time),
            system_time: self.system_time.saturating_sub(older.system_time),
            allocated: self.allocated.saturating_sub(older.allocated),
        }
    }
}

/// The difference between two [Snapshot]s
#[derive(Copy, Clone, Debug)]
struct Diff {
    user_time: Duration,
    system_time: Duration,
    allocated: usize,
}

/// Convert a [libc::timeval] to a [std::time::Duration]
fn duration_from_timeval(val: libc::timeval) -> Duration {
    Duration::new(
        val.tv_sec.try_into().expect("Timeval has unsuitable seconds."),
        (val.tv_usec * 1000).try_into().expect("Timeval has unsuitable microseconds."),
    )
}

struct AccountingAlloc {
    inner: std::alloc::System,
    allocated: atomic::AtomicUsize,
}

impl AccountingAlloc {
    /// Retrieve the number of bytes currently allocated via this allocator.
    fn allocated(&self) -> usize {
        self.allocated.load(atomic::Ordering::SeqCst)
    }
}

unsafe impl std::alloc::GlobalAlloc for AccountingAlloc {
    unsafe fn alloc(&self, layout: std::alloc::Layout) -> *mut u8 {
        self.allocated.fetch_add(layout.size(), atomic::Ordering::Release);
        self.inner.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: std::alloc::Layout) {
        self.allocated.fetch_sub(layout.size(), atomic::Ordering::Release);
        self.inner.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: std::alloc::Layout, new_size: usize) -> *mut u8 {
        if let Some(diff) = layout.size().checked_sub(new_size) {
            self.allocated.fetch_sub(diff, atomic::Ordering::Release);
        } else {
            self.allocated.fetch_add(new_size.saturating_sub(layout.size()), atomic::Ordering::Release);
        }
        self.inner.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static ALLOCATOR: AccountingAlloc = AccountingAlloc {
    inner: std::alloc::System,
    allocated: atomic::AtomicUsize::new(0),
};
