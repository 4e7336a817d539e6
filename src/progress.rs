//! Progress reporting for multi-file loads.
//!
//! Loading a manifest reads one file after the other and reports to a
//! [`LoadProgress`] sink after each of them. The sink is cooperative: it is called
//! between two files, never while a file is being read.
//!
//! * [`NoProgress`] – ignores every report.
//! * `ProgressBarSink` – terminal progress bar with per-file timing, available
//!   with the `progress` feature.

/// Receiver of load progress reports.
pub trait LoadProgress {
    /// A load of `total` files described by `label` starts.
    fn begin(&mut self, _total: usize, _label: &str) {}

    /// The `done`-th file, `name`, has been loaded.
    fn advance(&mut self, _done: usize, _name: &str) {}

    /// The load is over, successfully or not.
    fn finish(&mut self) {}
}

/// Sink discarding every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl LoadProgress for NoProgress {}

#[cfg(feature = "progress")]
pub use self::bar::ProgressBarSink;

#[cfg(feature = "progress")]
mod bar {
    use std::time::{Duration, Instant};

    use indicatif::{ProgressBar, ProgressStyle};

    use super::LoadProgress;

    /// Smoothed duration of the files loaded so far.
    struct IterTimer {
        last: Instant,
        ema_ns: f64,
        alpha: f64,
        count: u64,
    }

    impl IterTimer {
        fn new(alpha: f64) -> Self {
            Self {
                last: Instant::now(),
                ema_ns: 0.0,
                alpha,
                count: 0,
            }
        }

        fn restart(&mut self) {
            self.last = Instant::now();
            self.ema_ns = 0.0;
            self.count = 0;
        }

        fn tick(&mut self) -> Duration {
            let now = Instant::now();
            let dt = now.duration_since(self.last);
            self.last = now;
            self.count += 1;

            let dt_ns = dt.as_nanos() as f64;
            self.ema_ns = if self.count == 1 {
                dt_ns
            } else {
                self.alpha * dt_ns + (1.0 - self.alpha) * self.ema_ns
            };
            dt
        }

        fn avg(&self) -> Duration {
            Duration::from_nanos(self.ema_ns as u64)
        }
    }

    fn fmt_dur(d: Duration) -> String {
        let ms = d.as_millis();
        if ms < 1_000 {
            format!("{ms}ms")
        } else {
            format!("{:.2}s", d.as_secs_f32())
        }
    }

    /// Terminal progress bar.
    pub struct ProgressBarSink {
        bar: Option<ProgressBar>,
        timer: IterTimer,
    }

    impl Default for ProgressBarSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ProgressBarSink {
        pub fn new() -> Self {
            ProgressBarSink {
                bar: None,
                timer: IterTimer::new(0.2),
            }
        }
    }

    impl LoadProgress for ProgressBarSink {
        fn begin(&mut self, total: usize, label: &str) {
            let bar = ProgressBar::new(total.max(1) as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{prefix} {bar:40.cyan/blue} {pos}/{len} | ETA {eta_precise} | {msg}",
            ) {
                bar.set_style(style);
            }
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(Duration::from_millis(200));
            self.timer.restart();
            self.bar = Some(bar);
        }

        fn advance(&mut self, done: usize, name: &str) {
            let last = self.timer.tick();
            if let Some(bar) = &self.bar {
                bar.set_message(format!(
                    "{name} in {}, avg {}",
                    fmt_dur(last),
                    fmt_dur(self.timer.avg())
                ));
                bar.set_position(done as u64);
            }
        }

        fn finish(&mut self) {
            if let Some(bar) = self.bar.take() {
                bar.finish_and_clear();
            }
        }
    }
}
