//! Wall-clock measurement around analysis phases.

use std::time::Instant;

/// A measured phase result: the value the phase produced and how long it
/// took, in milliseconds.
#[derive(Debug)]
pub struct Measured<T> {
    pub result: T,
    pub duration_ms: u64,
}

/// Runs `f` and records its wall-clock duration. Measurement wraps the
/// phase; it never alters its outcome.
pub fn measure_duration<T>(f: impl FnOnce() -> T) -> Measured<T> {
    let start = Instant::now();
    let result = f();
    let duration_ms = start.elapsed().as_millis() as u64;

    Measured {
        result,
        duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_the_result_through() {
        let measured = measure_duration(|| 40 + 2);

        assert_eq!(measured.result, 42);
    }

    #[test]
    fn records_elapsed_time() {
        let measured = measure_duration(|| {
            std::thread::sleep(std::time::Duration::from_millis(15));
        });

        assert!(
            measured.duration_ms >= 10,
            "expected at least 10ms, got {}",
            measured.duration_ms
        );
    }

    #[test]
    fn failure_values_are_measured_too() {
        let measured = measure_duration(|| -> Result<(), &str> { Err("boom") });

        assert!(measured.result.is_err());
    }
}
