use tokio::sync::mpsc;
use tracing::trace;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A single logical context on which responses are handed to callers.
///
/// Jobs posted from any worker run one at a time, in posting order, on one task.
#[derive(Clone, Debug)]
pub struct DeliveryContext {
    jobs: mpsc::UnboundedSender<Job>,
}

impl DeliveryContext {
    /// Spawns the delivery task on the current tokio runtime.
    pub fn spawn() -> Self {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = queue.recv().await {
                job();
            }
            trace!("delivery context closed");
        });
        Self { jobs }
    }

    /// Queues `job` for the delivery task. If the task is gone the job runs inline,
    /// so a delivery is never lost.
    pub fn post<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(mpsc::error::SendError(job)) = self.jobs.send(Box::new(job)) {
            job();
        }
    }
}
