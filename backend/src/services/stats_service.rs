//! Stats report orchestration
//!
//! Ties a request to the collaborators: which peers to ask, what to collect,
//! how to parse it, and how to turn it into report rows.

use crate::models::{IdentifierFormat, NameDirectory, TopologyMetadata};
use crate::services::collector::StatsCollector;
use crate::services::stats::{StatsFilter, StatsParser, StatsRequest};
use crate::utils::{StatsError, StatsResult};
use serde_json::Value;
use tracing::{debug, info};

pub struct StatsService {
    collector: StatsCollector,
    parser: StatsParser,
    format: IdentifierFormat,
}

impl StatsService {
    pub fn new(collector: StatsCollector, parser: StatsParser, format: IdentifierFormat) -> Self {
        Self { collector, parser, format }
    }

    /// Render identity fields in a different format
    pub fn with_format(mut self, format: IdentifierFormat) -> Self {
        self.format = format;
        self
    }

    /// Produce the row for one request descriptor
    pub async fn report(
        &self,
        descriptor: &Value,
        directory: &dyn NameDirectory,
        metadata: &dyn TopologyMetadata,
    ) -> StatsResult<Value> {
        let request = StatsRequest::parse(descriptor).ok_or_else(|| StatsError::unrecognized(descriptor))?;
        if !request.exists(metadata) {
            return Err(StatsError::not_found(Self::describe(&request)));
        }

        let peers = request.peers(directory);
        debug!("Collecting stats for {} from {} peers", request, peers.len());
        let documents = self.collector.collect(&request.filter(), &peers).await?;
        let stats = self.parser.parse(&documents)?;

        request
            .to_result(&stats, metadata, self.format)?
            .ok_or_else(|| StatsError::not_found(Self::describe(&request)))
    }

    /// Produce a row for every live request from a single collection pass
    pub async fn report_all(
        &self,
        directory: &dyn NameDirectory,
        metadata: &dyn TopologyMetadata,
    ) -> StatsResult<Vec<Value>> {
        let requests = StatsRequest::enumerate(metadata);
        let peers = directory.server_peers();
        let documents = self.collector.collect(&StatsFilter::global(), &peers).await?;
        let stats = self.parser.parse(&documents)?;

        let mut rows = Vec::with_capacity(requests.len());
        for request in &requests {
            match request.to_result(&stats, metadata, self.format)? {
                Some(row) => rows.push(row),
                None => debug!("Skipping stats row {}: subject no longer exists", request),
            }
        }
        info!("Built {} stats rows from {} servers", rows.len(), documents.len());
        Ok(rows)
    }

    fn describe(request: &StatsRequest) -> String {
        match request {
            StatsRequest::Cluster => "Cluster".to_string(),
            StatsRequest::Table { table_id } => format!("Table `{}`", table_id),
            StatsRequest::Server { server_id } => format!("Server `{}`", server_id),
            StatsRequest::TableServer { table_id, server_id } => {
                format!("Table `{}` on server `{}`", table_id, server_id)
            },
        }
    }
}
