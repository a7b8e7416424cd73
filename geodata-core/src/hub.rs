use crate::cache::DiscoveryCache;
use crate::config::Settings;
use crate::error::Result;
use crate::pipeline::{BundleResult, LogCallback, PipelineOptions, ProgressCallback, run_pipeline};
use geodata_scanner::{LinkResolver, ResolvedLink};
use tracing::warn;

/// Result of one processing request
#[derive(Debug)]
pub enum RunOutcome {
    /// Discovery produced no links, so nothing was downloaded
    NoLinksFound,
    Bundled(BundleResult),
}

/// Entry point for presentation layers: owns the discovery cache and the
/// pipeline options for the lifetime of the process.
pub struct GeodataHub {
    cache: DiscoveryCache,
    options: PipelineOptions,
}

impl GeodataHub {
    pub fn new(cache: DiscoveryCache, options: PipelineOptions) -> Self {
        Self { cache, options }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let resolver =
            LinkResolver::with_timeout(settings.sources.clone(), settings.discovery_timeout_secs)?;
        let options = PipelineOptions {
            download_timeout_secs: settings.download_timeout_secs,
            archive_prefix: settings.archive_prefix.clone(),
        };
        Ok(Self::new(
            DiscoveryCache::new(resolver, settings.cache_ttl()),
            options,
        ))
    }

    pub fn cache(&self) -> &DiscoveryCache {
        &self.cache
    }

    pub async fn discover(&self) -> Vec<ResolvedLink> {
        self.cache.get_links().await
    }

    /// Discover links (cached) and, if any were found, download and bundle them.
    pub async fn process(
        &self,
        progress_callback: Option<ProgressCallback>,
        log_callback: Option<LogCallback>,
    ) -> Result<RunOutcome> {
        let links = self.discover().await;
        if links.is_empty() {
            warn!("No archive links found on any source page");
            return Ok(RunOutcome::NoLinksFound);
        }

        if let Some(ref callback) = log_callback {
            callback(format!(
                "{} archive(s) identified, starting downloads",
                links.len()
            ));
        }

        let result = run_pipeline(&links, &self.options, progress_callback, log_callback).await?;
        Ok(RunOutcome::Bundled(result))
    }
}
