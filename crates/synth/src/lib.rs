pub mod records;
pub mod rng;
pub mod trace;

pub use rng::Lcg64;
pub use trace::{SynthConfig, generate_trace, generate_traces, trace_seed};
