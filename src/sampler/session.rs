//! The session loop.

use std::path::PathBuf;

use chrono::Utc;

use crate::config::SamplerConfig;
use crate::sampler::{Cadence, PingProber, Prober, PROBE_FAILURE_CODE};
use crate::store::{SessionDocument, SessionStore, StoreError};

/// Runs sampling sessions forever: N paced probes, buffered in memory,
/// published as one document, then straight into the next session.
///
/// Probe failures are data and never abort a session. A failed publish
/// loses that one session and the loop moves on; only directory setup
/// at startup is fatal.
#[derive(Debug)]
pub struct Sampler<P> {
    prober: P,
    store: SessionStore,
    pings_per_file: usize,
    cadence: Cadence,
}

impl Sampler<PingProber> {
    /// Build a ping-backed sampler from configuration, creating the
    /// output directory.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the output directory cannot be
    /// established.
    pub fn from_config(config: &SamplerConfig) -> Result<Self, StoreError> {
        let mut prober =
            PingProber::new(&config.target, config.timeout).with_program(&config.ping_program);
        if let Some(ref iface) = config.interface {
            prober = prober.with_interface(iface);
        }

        let store = SessionStore::create(&config.data_dir)?;
        Ok(Self::new(prober, store, config.pings_per_file, Cadence::new(config.interval)))
    }
}

impl<P: Prober> Sampler<P> {
    /// Assemble a sampler from its parts.
    pub fn new(prober: P, store: SessionStore, pings_per_file: usize, cadence: Cadence) -> Self {
        Self {
            prober,
            store,
            pings_per_file,
            cadence,
        }
    }

    /// Run one complete session and publish its document.
    ///
    /// The cadence scheduler is owned by the sampler, so the first
    /// probe here still respects the slot established by the previous
    /// session's last probe.
    pub async fn run_session(&mut self) -> Result<PathBuf, StoreError> {
        let start_time = Utc::now();
        let mut samples = Vec::with_capacity(self.pings_per_file);

        for _ in 0..self.pings_per_file {
            self.cadence.pace().await;
            let code = match self.prober.probe().await {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!(error = %e, "Probe could not run, recording failure");
                    PROBE_FAILURE_CODE
                }
            };
            samples.push(code);
        }

        let end_time = Utc::now();
        let doc = SessionDocument {
            start_time,
            end_time,
            samples,
        };
        self.store.write(&doc)
    }

    /// Run sessions until the process is terminated.
    pub async fn run(mut self) {
        tracing::info!(
            pings_per_file = self.pings_per_file,
            interval = ?self.cadence.interval(),
            dir = %self.store.dir().display(),
            "Sampler started"
        );

        loop {
            match self.run_session().await {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "Session document published");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to publish session document");
                }
            }
        }
    }
}
