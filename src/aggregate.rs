//! Concurrent multi-artifact generation
//!
//! Runs several independent pipeline executions at once (logo concepts, for
//! example) and keeps whatever succeeds. Each instance is its own failure
//! domain; only when every instance fails does the caller see an error.

use crate::classifier::classify;
use crate::error::{GenerationError, GenerationResult};
use crate::events::{EventSink, GenerationEvent};
use crate::models::{ArtifactResult, GenerationRequest};
use crate::pipeline::Pipeline;
use crate::{Error, Result};
use futures::future::join_all;
use tracing::{info, warn};

/// Successes ordered by invocation index, plus the failures that were
/// tolerated along the way.
#[derive(Debug, Clone)]
pub struct MultiArtifact {
    pub artifacts: Vec<ArtifactResult>,
    pub failures: Vec<(usize, GenerationError)>,
}

#[derive(Clone)]
pub struct Aggregator {
    pipeline: Pipeline,
}

impl Aggregator {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Build and run `multiplicity` requests concurrently.
    ///
    /// `build` receives the zero-based instance index and the variation
    /// assigned to it (variations are cycled). A build error counts as that
    /// instance's failure.
    pub async fn run<F>(
        &self,
        multiplicity: usize,
        variations: &[String],
        build: F,
        events: &EventSink,
    ) -> GenerationResult<MultiArtifact>
    where
        F: Fn(usize, Option<&str>) -> Result<GenerationRequest>,
    {
        if multiplicity == 0 {
            return Err(classify(&Error::InvalidRequest(
                "at least one artifact must be requested".to_string(),
            )));
        }

        let instances = (0..multiplicity).map(|index| {
            let variation = if variations.is_empty() {
                None
            } else {
                Some(variations[index % variations.len()].as_str())
            };
            let built = build(index, variation);
            async move {
                match built {
                    Ok(request) => self.pipeline.run(&request, events).await,
                    Err(e) => Err(classify(&e)),
                }
            }
        });

        let outcomes = join_all(instances).await;

        let mut artifacts = Vec::new();
        let mut failures = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => {
                    warn!(
                        "Instance {}/{} failed ({}): {}",
                        index + 1,
                        multiplicity,
                        e.category,
                        e.message
                    );
                    events.emit(GenerationEvent::InstanceFailed {
                        index,
                        category: e.category,
                    });
                    failures.push((index, e));
                }
            }
        }

        if artifacts.is_empty() {
            // Failures are in index order; surface the first instance's.
            if let Some((_, first)) = failures.into_iter().next() {
                return Err(first);
            }
            return Err(classify(&Error::NoArtifact(
                "No artifacts were generated".to_string(),
            )));
        }

        info!("Generated {}/{} artifacts", artifacts.len(), multiplicity);
        Ok(MultiArtifact {
            artifacts,
            failures,
        })
    }
}
