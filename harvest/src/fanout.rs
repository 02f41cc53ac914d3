// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{fmt::Display, future::Future, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};

/// Outcome of one [`scatter_gather`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatherReport {
    /// Entities whose work returned `Ok`
    pub completed: usize,
    /// Entities whose work returned an error
    pub failed: usize,
    /// Entities whose task panicked
    pub panicked: usize,
}

impl GatherReport {
    pub fn total(&self) -> usize {
        self.completed + self.failed + self.panicked
    }
}

/// Run `work` once per entity, concurrently, and wait for every run to finish.
///
/// Each entity gets its own task. With `limit` set, at most that many run at once; otherwise
/// all are started immediately. A failing or panicking entity is logged and counted but does
/// not stop its siblings. Results are not ordered: whatever `work` writes to a shared sink
/// arrives in completion order.
pub async fn scatter_gather<T, F, Fut, E>(
    entities: impl IntoIterator<Item = T>,
    limit: Option<usize>,
    work: F,
) -> GatherReport
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let work = Arc::new(work);
    let semaphore = limit.map(|n| Arc::new(Semaphore::new(n.max(1))));
    let mut tasks = JoinSet::new();

    for entity in entities {
        let work = work.clone();
        let semaphore = semaphore.clone();
        tasks.spawn(async move {
            let _permit = match semaphore {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            work(entity).await
        });
    }
    drop(work);

    let mut report = GatherReport::default();
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => report.completed += 1,
            Ok(Err(error)) => {
                report.failed += 1;
                tracing::warn!(%error, "entity collection failed");
            }
            Err(err) => {
                report.panicked += 1;
                tracing::error!(?err, "entity collection task failed");
            }
        }
    }
    report
}
