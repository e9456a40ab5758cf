pub mod expiry_sweep;

pub use expiry_sweep::ExpirySweepWorker;
