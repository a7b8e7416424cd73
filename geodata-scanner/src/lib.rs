pub mod client;
pub mod error;
pub mod resolver;
pub mod result;
pub mod source;

pub use client::{browser_client, download_client};
pub use error::ScanError;
pub use resolver::{LinkResolver, extract_links, is_archive_url};
pub use result::ResolvedLink;
pub use source::{SourceDefinition, Target, default_sources};
