use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::error::ProviderError;
use tracing::{info, warn};

use crate::{config::MintRequest, MintExecutor};

pub const SIMULATED_FAILURE_MESSAGE: &str = "Transaction failed. Please try again.";

/// Stand-in for a real contract call: waits `latency`, then fails with
/// probability `failure_rate`.
pub struct SimulatedMintExecutor {
    latency: Duration,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedMintExecutor {
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        Self::with_rng(latency, failure_rate, StdRng::from_entropy())
    }

    pub fn with_seed(latency: Duration, failure_rate: f64, seed: u64) -> Self {
        Self::with_rng(latency, failure_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(latency: Duration, failure_rate: f64, rng: StdRng) -> Self {
        Self {
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl MintExecutor for SimulatedMintExecutor {
    async fn execute(&self, request: &MintRequest) -> Result<(), ProviderError> {
        info!(
            contract = %request.contract_address,
            price = %request.price,
            latency = ?self.latency,
            "mint: submitting simulated transaction"
        );
        tokio::time::sleep(self.latency).await;

        let roll: f64 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen();
        if roll < self.failure_rate {
            warn!(roll, failure_rate = self.failure_rate, "mint: simulated failure");
            return Err(ProviderError::internal(SIMULATED_FAILURE_MESSAGE));
        }
        Ok(())
    }
}
