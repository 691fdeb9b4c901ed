//! Bridge to the external maze generator.
//!
//! The generator is treated as a pure function of the configuration. The bridge
//! runs it either synchronously ([`RenderBridge::render`]) or off the control
//! thread ([`RenderBridge::request`] + [`RenderBridge::poll`]) and keeps the last
//! successful output so a failed render never replaces a good one.
//!
//! Background renders are never cancelled. When results arrive out of order,
//! only the newest request counts and older results are dropped.

use crate::codec;
use crate::store::Observer;
use crate::types::{Configuration, Svg};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Error reported by a [`MazeGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorError(pub String);

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for GeneratorError {}

/// The external maze generator.
pub trait MazeGenerator: Send + Sync {
    /// Renders `configuration`. Must be deterministic for identical input.
    fn generate(&self, configuration: &Configuration) -> Result<Svg, GeneratorError>;

    /// Canonical fragment for `configuration`. Must agree with [`codec::encode`].
    fn canonicalize(&self, configuration: &Configuration) -> String {
        codec::encode(configuration)
    }
}

/// Why a render produced no artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The generator returned an error
    Generator(GeneratorError),
    /// The generator panicked on a background thread
    Panicked(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Generator(err) => write!(f, "maze generation failed: {err}"),
            RenderError::Panicked(msg) => write!(f, "maze generation panicked: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Generator(err) => Some(err),
            RenderError::Panicked(_) => None,
        }
    }
}

/// A successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// The rendered maze
    pub artifact: Svg,
    /// Canonical fragment of the configuration that produced it
    pub canonical_hash: String,
    /// The configuration that produced it
    pub configuration: Configuration,
}

/// Outcome of settling a background render in [`RenderBridge::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStatus {
    /// A new output replaced the cached one
    Rendered,
    /// The newest request failed; the cached output is unchanged
    Failed(RenderError),
}

/// Result of a background render, tagged with the request that started it.
struct RenderJob {
    generation: u64,
    configuration: Configuration,
    result: Result<Svg, RenderError>,
}

/// Runs the generator and caches its last successful output.
pub struct RenderBridge<G: MazeGenerator + 'static> {
    generator: Arc<G>,
    last: Option<RenderOutput>,
    /// Generation of the newest request
    requested: u64,
    /// Generation of the newest request that has been settled
    settled: u64,
    sender: UnboundedSender<RenderJob>,
    receiver: UnboundedReceiver<RenderJob>,
}

impl<G: MazeGenerator + 'static> RenderBridge<G> {
    /// Creates a bridge with nothing rendered yet.
    pub fn new(generator: G) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            generator: Arc::new(generator),
            last: None,
            requested: 0,
            settled: 0,
            sender,
            receiver,
        }
    }

    /// The last successful output, if any.
    pub fn last(&self) -> Option<&RenderOutput> {
        self.last.as_ref()
    }

    /// Returns true while the newest background request has not been settled.
    pub fn is_pending(&self) -> bool {
        self.settled < self.requested
    }

    /// Renders synchronously.
    ///
    /// Supersedes any background request still in flight. On failure the cached
    /// output is left in place.
    pub fn render(&mut self, configuration: &Configuration) -> Result<&RenderOutput, RenderError> {
        self.requested += 1;
        self.settled = self.requested;
        match self.generator.generate(configuration) {
            Ok(artifact) => Ok(self.store(configuration.clone(), artifact)),
            Err(err) => {
                let err = RenderError::Generator(err);
                log::warn!("{err}; keeping the previous maze");
                Err(err)
            }
        }
    }

    /// Starts a background render of `configuration`.
    ///
    /// On native targets this uses the current tokio runtime's blocking pool, or
    /// runs inline when there is no runtime. On wasm it runs on the next turn of
    /// the event loop. Collect the result with [`RenderBridge::poll`].
    ///
    /// # Returns
    ///
    /// The request's generation number.
    pub fn request(&mut self, configuration: Configuration) -> u64 {
        self.requested += 1;
        let generation = self.requested;
        spawn_job(
            Arc::clone(&self.generator),
            generation,
            configuration,
            self.sender.clone(),
        );
        generation
    }

    /// Settles finished background renders.
    ///
    /// Results from requests older than the newest one are discarded.
    ///
    /// # Returns
    ///
    /// The status of the newest request if it finished since the last poll.
    pub fn poll(&mut self) -> Option<RenderStatus> {
        let mut status = None;
        while let Ok(Some(job)) = self.receiver.try_next() {
            if job.generation < self.requested || job.generation <= self.settled {
                log::trace!("discarding stale render #{}", job.generation);
                continue;
            }
            self.settled = job.generation;
            status = Some(match job.result {
                Ok(artifact) => {
                    self.store(job.configuration, artifact);
                    RenderStatus::Rendered
                }
                Err(err) => {
                    log::warn!("{err}; keeping the previous maze");
                    RenderStatus::Failed(err)
                }
            });
        }
        status
    }

    fn store(&mut self, configuration: Configuration, artifact: Svg) -> &RenderOutput {
        let canonical_hash = self.generator.canonicalize(&configuration);
        let local = codec::encode(&configuration);
        if canonical_hash != local {
            log::warn!("generator canonical form {canonical_hash:?} disagrees with {local:?}");
        }
        self.last.insert(RenderOutput {
            artifact,
            canonical_hash,
            configuration,
        })
    }
}

impl<G: MazeGenerator + 'static> RenderBridge<G> {
    /// Store observer that requests a background render for every commit.
    pub fn observer(bridge: &Rc<RefCell<Self>>) -> Observer {
        let bridge = Rc::clone(bridge);
        Box::new(move |configuration| {
            bridge.borrow_mut().request(configuration.clone());
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_job<G: MazeGenerator + 'static>(
    generator: Arc<G>,
    generation: u64,
    configuration: Configuration,
    sender: UnboundedSender<RenderJob>,
) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                let job_configuration = configuration.clone();
                let joined =
                    tokio::task::spawn_blocking(move || generator.generate(&job_configuration))
                        .await;
                let result = match joined {
                    Ok(result) => result.map_err(RenderError::Generator),
                    Err(err) => Err(RenderError::Panicked(err.to_string())),
                };
                send_job(&sender, RenderJob {
                    generation,
                    configuration,
                    result,
                });
            });
        }
        Err(_) => {
            let result = generator
                .generate(&configuration)
                .map_err(RenderError::Generator);
            send_job(&sender, RenderJob {
                generation,
                configuration,
                result,
            });
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn spawn_job<G: MazeGenerator + 'static>(
    generator: Arc<G>,
    generation: u64,
    configuration: Configuration,
    sender: UnboundedSender<RenderJob>,
) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = generator
            .generate(&configuration)
            .map_err(RenderError::Generator);
        send_job(&sender, RenderJob {
            generation,
            configuration,
            result,
        });
    });
}

/// Hands a finished job back to its bridge, if the bridge still exists.
fn send_job(sender: &UnboundedSender<RenderJob>, job: RenderJob) {
    let generation = job.generation;
    if sender.unbounded_send(job).is_err() {
        log::trace!("render #{generation} finished after its bridge was dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::MemoryFragment;
    use crate::seed::SequenceSeeds;
    use crate::store::ConfigurationStore;
    use crate::types::{Defaults, Seed, Shape};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Renders a tiny SVG naming the fragment; refuses theta mazes.
    #[derive(Default)]
    struct FakeGenerator {
        calls: AtomicUsize,
    }

    impl MazeGenerator for FakeGenerator {
        fn generate(&self, configuration: &Configuration) -> Result<Svg, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match configuration.shape {
                Shape::Theta(_) => Err(GeneratorError("theta unsupported".into())),
                _ => Ok(Svg(format!(
                    "<svg xmlns=\"http://www.w3.org/2000/svg\"><title>{}</title></svg>",
                    codec::encode(configuration)
                ))),
            }
        }
    }

    fn config(fragment: &str) -> Configuration {
        codec::decode(fragment, &Defaults::default(), &mut SequenceSeeds::starting_at(1))
    }

    #[test]
    fn render_caches_output_with_canonical_hash() {
        let mut bridge = RenderBridge::new(FakeGenerator::default());
        let output = bridge.render(&config("S8|Kruskal|3")).unwrap();
        assert_eq!(output.canonical_hash, "S8|Kruskal|3");
        assert!(output.artifact.0.contains("S8|Kruskal|3"));
        assert_eq!(bridge.last().map(|o| o.configuration.seed), Some(Seed(3)));
    }

    #[test]
    fn failed_render_keeps_previous_artifact() {
        let mut bridge = RenderBridge::new(FakeGenerator::default());
        bridge.render(&config("R10|Kruskal|1")).unwrap();

        let err = bridge.render(&config("T7|Kruskal|1")).unwrap_err();
        assert_eq!(err, RenderError::Generator(GeneratorError("theta unsupported".into())));
        assert_eq!(bridge.last().unwrap().canonical_hash, "R10|Kruskal|1");
    }

    #[test]
    fn request_without_runtime_runs_inline() {
        let mut bridge = RenderBridge::new(FakeGenerator::default());
        bridge.request(config("R12|GrowingTree|4"));
        assert!(bridge.is_pending());
        assert_eq!(bridge.poll(), Some(RenderStatus::Rendered));
        assert!(!bridge.is_pending());
        assert_eq!(bridge.last().unwrap().canonical_hash, "R12|GrowingTree|4");
        assert_eq!(bridge.poll(), None);
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut bridge = RenderBridge::new(FakeGenerator::default());
        bridge.request(config("R12|GrowingTree|4"));
        bridge.request(config("R13|GrowingTree|4"));
        assert_eq!(bridge.poll(), Some(RenderStatus::Rendered));
        assert_eq!(bridge.last().unwrap().canonical_hash, "R13|GrowingTree|4");
        assert_eq!(bridge.generator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_request_reports_and_keeps_previous() {
        let mut bridge = RenderBridge::new(FakeGenerator::default());
        bridge.render(&config("R10|Kruskal|1")).unwrap();
        bridge.request(config("T7|Kruskal|1"));
        assert!(matches!(bridge.poll(), Some(RenderStatus::Failed(RenderError::Generator(_)))));
        assert_eq!(bridge.last().unwrap().canonical_hash, "R10|Kruskal|1");
    }

    #[test]
    fn sync_render_supersedes_background_request() {
        let mut bridge = RenderBridge::new(FakeGenerator::default());
        bridge.request(config("R20|Kruskal|1"));
        bridge.render(&config("R30|Kruskal|1")).unwrap();
        assert_eq!(bridge.poll(), None);
        assert_eq!(bridge.last().unwrap().canonical_hash, "R30|Kruskal|1");
    }

    #[test]
    fn store_commits_drive_renders() {
        let bridge = Rc::new(RefCell::new(RenderBridge::new(FakeGenerator::default())));
        let mut store = ConfigurationStore::new(
            MemoryFragment::new("R10|GrowingTree|1"),
            SequenceSeeds::starting_at(50),
            Defaults::default(),
        );
        store.subscribe(RenderBridge::observer(&bridge));

        store.increment();
        store.increment();
        assert_eq!(bridge.borrow_mut().poll(), Some(RenderStatus::Rendered));
        assert_eq!(
            bridge.borrow().last().unwrap().canonical_hash,
            "R12|GrowingTree|1"
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn background_render_completes_on_runtime() {
        let mut bridge = RenderBridge::new(FakeGenerator::default());
        bridge.request(config("S40|Kruskal|9"));
        let status = loop {
            if let Some(status) = bridge.poll() {
                break status;
            }
            tokio::task::yield_now().await;
        };
        assert_eq!(status, RenderStatus::Rendered);
        assert_eq!(bridge.last().unwrap().canonical_hash, "S40|Kruskal|9");
    }

    #[test]
    fn job_finishing_after_bridge_drop_is_discarded() {
        let (sender, receiver) = unbounded();
        drop(receiver);
        send_job(
            &sender,
            RenderJob {
                generation: 1,
                configuration: config("R10|Kruskal|1"),
                result: Err(RenderError::Panicked("gone".into())),
            },
        );
        assert!(sender.is_closed());
    }
}
