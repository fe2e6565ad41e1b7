use bounded::{Config, DEFAULT_CAPACITY, DEFAULT_QUOTA};
use clap::Parser;

/// Bounded-buffer producers and consumers
#[derive(Debug, Clone, Parser)]
pub struct Args {
    /// Number of producer threads
    #[arg(value_parser = positive)]
    pub producers: usize,
    /// Number of consumer threads
    #[arg(value_parser = positive)]
    pub consumers: usize,
    /// Number of slots in the ring buffer
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY, value_parser = positive)]
    pub capacity: usize,
    /// Items to produce and consume
    #[arg(short = 'n', long, default_value_t = DEFAULT_QUOTA, value_parser = positive)]
    pub items: usize,
    /// Production quota, overrides --items for producers
    #[arg(long, value_parser = positive)]
    pub produce: Option<usize>,
    /// Consumption quota, overrides --items for consumers
    #[arg(long, value_parser = positive)]
    pub consume: Option<usize>,
    /// Seed for the produced values
    ///
    /// Producer `i` draws from a generator seeded with `seed + i`.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Only print the summary
    #[arg(short, long)]
    pub quiet: bool,
    /// Also log worker bookkeeping
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn config(&self) -> Config {
        Config::new(self.producers, self.consumers)
            .with_capacity(self.capacity)
            .with_quotas(
                self.produce.unwrap_or(self.items),
                self.consume.unwrap_or(self.items),
            )
    }
}

fn positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
