/// CSV export for simulated AEP distributions.
pub mod export;
