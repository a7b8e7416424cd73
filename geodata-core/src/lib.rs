pub mod bundle;
pub mod cache;
pub mod config;
pub mod error;
pub mod hub;
pub mod pipeline;
pub mod report;

pub use cache::DiscoveryCache;
pub use config::Settings;
pub use error::CoreError;
pub use hub::{GeodataHub, RunOutcome};
pub use pipeline::{
    Artifact, BundleResult, DownloadOutcome, DownloadStatus, LogCallback, PipelineOptions,
    Progress, ProgressCallback, ScratchDir, run_pipeline,
};

pub fn print_banner() {
    println!(
        r#"
   ┌─┐┌─┐┌─┐┌┬┐┌─┐┌┬┐┌─┐  ┬ ┬┬ ┬┌┐
   │ ┬├┤ │ │ ││├─┤ │ ├─┤  ├─┤│ │├┴┐
   └─┘└─┘└─┘─┴┘┴ ┴ ┴ ┴ ┴  ┴ ┴└─┘└─┘  v{}
   IMAC geodata discovery & bundling
"#,
        env!("CARGO_PKG_VERSION")
    );
}
