//! Bounded fan-out over scoped threads.

use std::num::NonZeroUsize;
use std::thread;

/// Upper bound on workers regardless of available parallelism.
pub const MAX_WORKERS: usize = 4;

/// Available parallelism, capped at [`MAX_WORKERS`].
pub fn default_workers() -> usize {
	thread::available_parallelism()
		.map_or(1, NonZeroUsize::get)
		.min(MAX_WORKERS)
}

/// Maps `f` over `items` on up to `max_workers` threads, preserving order.
///
/// Items are split into contiguous chunks, one per worker. A panicking worker
/// propagates its panic to the caller.
pub fn map<T, R, F>(items: &[T], max_workers: usize, f: F) -> Vec<R>
where
	T: Sync,
	R: Send,
	F: Fn(&T) -> R + Sync,
{
	let workers = max_workers.clamp(1, items.len().max(1));
	if workers == 1 {
		return items.iter().map(f).collect();
	}

	let per_worker = items.len().div_ceil(workers);
	let f = &f;
	thread::scope(|s| {
		let tasks: Vec<_> = items
			.chunks(per_worker)
			.map(|chunk| s.spawn(move || chunk.iter().map(f).collect::<Vec<R>>()))
			.collect();

		let mut out = Vec::with_capacity(items.len());
		for task in tasks {
			match task.join() {
				Ok(results) => out.extend(results),
				Err(panic) => std::panic::resume_unwind(panic),
			}
		}
		out
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn preserves_order_across_workers() {
		let items: Vec<u32> = (0..37).collect();
		let doubled = map(&items, 4, |x| x * 2);
		assert_eq!(doubled, items.iter().map(|x| x * 2).collect::<Vec<_>>());
	}

	#[test]
	fn handles_empty_and_single_worker() {
		let empty: Vec<u8> = Vec::new();
		assert!(map(&empty, 4, |x| *x).is_empty());
		assert_eq!(map(&[1, 2, 3], 0, |x| x + 1), vec![2, 3, 4]);
	}

	#[test]
	fn default_workers_is_capped() {
		let n = default_workers();
		assert!((1..=MAX_WORKERS).contains(&n));
	}
}
