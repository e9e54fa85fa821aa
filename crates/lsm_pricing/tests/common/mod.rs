//! Shared helpers for integration tests: seeded GBM paths and tracing set-up.

#![allow(dead_code)]

use lsm_pricing::lsm::{PathSimulator, PathTensor, SimulatedPaths, SimulationMatrix};
use lsm_pricing::LsmError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Geometric Brownian motion parameters.
#[derive(Clone, Copy, Debug)]
pub struct GbmParams {
    pub spot: f64,
    pub rate: f64,
    pub volatility: f64,
}

/// Seeded GBM path generator with antithetic pairs.
pub struct GbmSimulator {
    pub params: GbmParams,
    pub time_step: f64,
    pub n_periods: usize,
    pub n_simulations: usize,
    rng: StdRng,
}

impl GbmSimulator {
    pub fn new(
        params: GbmParams,
        time_step: f64,
        n_periods: usize,
        n_simulations: usize,
        seed: u64,
    ) -> Self {
        Self {
            params,
            time_step,
            n_periods,
            n_simulations,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Simulated spot matrix; period 0 holds the spot on every path.
    pub fn spot_matrix(&mut self) -> SimulationMatrix {
        let GbmParams {
            spot,
            rate,
            volatility,
        } = self.params;
        let drift = (rate - 0.5 * volatility * volatility) * self.time_step;
        let diffusion = volatility * self.time_step.sqrt();
        let n = self.n_simulations;

        let mut data = vec![spot; self.n_periods * n];
        for s in (0..n).step_by(2) {
            let mut up = spot;
            let mut down = spot;
            for t in 1..self.n_periods {
                let z: f64 = StandardNormal.sample(&mut self.rng);
                up *= (drift + diffusion * z).exp();
                down *= (drift - diffusion * z).exp();
                data[t * n + s] = up;
                if s + 1 < n {
                    data[t * n + s + 1] = down;
                }
            }
        }
        SimulationMatrix::new(self.n_periods, n, data).expect("consistent GBM shape")
    }
}

impl PathSimulator for GbmSimulator {
    fn simulate(&mut self) -> Result<SimulatedPaths, LsmError> {
        let underlying = self.spot_matrix();
        Ok(SimulatedPaths {
            state_variables: PathTensor::from_matrix(&underlying),
            underlying,
        })
    }
}

/// Standard American put test case: S = 36, K = 40, r = 6%, σ = 20%, T = 1.
pub fn reference_put_paths(n_simulations: usize, seed: u64) -> SimulationMatrix {
    let params = GbmParams {
        spot: 36.0,
        rate: 0.06,
        volatility: 0.2,
    };
    GbmSimulator::new(params, 1.0 / 50.0, 51, n_simulations, seed).spot_matrix()
}
