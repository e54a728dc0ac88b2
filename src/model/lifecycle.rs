//! Model lifecycle manager
//!
//! Owns the one shared model of an `EyeAnalyzer`. State machine:
//!
//! ```text
//! Unloaded ──BeginLoad──▶ Loading ──LoadSucceeded──▶ Ready
//!    ▲                       │
//!    │                  LoadFailed
//!    │                       ▼
//!    └──────(retry)────── Failed
//! any ──Dispose──▶ Disposed (terminal)
//! ```
//!
//! `load()` runs at most one attempt at a time in a detached task; every
//! caller, including ones that arrive late or give up early, only waits on
//! that attempt's shared outcome.

use crate::assets::{AssetProvisioner, ProvisionedAssets};
use crate::errors::{AnalysisError, Result};
use crate::model::descriptor::ModelDescriptor;
use crate::model::executor;
use crate::model::runtime::{InferenceRuntime, RuntimeLoader};
use candle_core::{DType, Device, Tensor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// Lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
    Failed,
    /// Terminal
    Disposed,
}

/// Events that drive state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    BeginLoad,
    LoadSucceeded,
    LoadFailed,
    Dispose,
}

impl ModelState {
    /// Valid transitions:
    /// 1. Unloaded → Loading  (BeginLoad)
    /// 2. Failed   → Loading  (BeginLoad)
    /// 3. Loading  → Ready    (LoadSucceeded)
    /// 4. Loading  → Failed   (LoadFailed)
    /// 5. \*       → Disposed (Dispose)
    pub fn transition(&self, event: LifecycleEvent) -> Result<ModelState> {
        use LifecycleEvent::*;
        use ModelState::*;

        let next = match (self, event) {
            (_, Dispose) => Disposed,
            (Unloaded, BeginLoad) | (Failed, BeginLoad) => Loading,
            (Loading, LoadSucceeded) => Ready,
            (Loading, LoadFailed) => Failed,
            (from, event) => {
                return Err(AnalysisError::InvalidTransition {
                    from: from.to_string(),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelState::Unloaded => "Unloaded",
            ModelState::Loading => "Loading",
            ModelState::Ready => "Ready",
            ModelState::Failed => "Failed",
            ModelState::Disposed => "Disposed",
        }
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A Ready model: descriptor plus runtime
pub struct LoadedModel {
    descriptor: ModelDescriptor,
    runtime: Arc<dyn InferenceRuntime>,
}

impl LoadedModel {
    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn labels(&self) -> &[String] {
        &self.descriptor.labels
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Outcome of one load attempt, shared by every caller waiting on it
type LoadOutcome = std::result::Result<Arc<LoadedModel>, Arc<AnalysisError>>;

/// Receives the outcome once; `None` while the load is still running
type LoadWatch = watch::Receiver<Option<LoadOutcome>>;

struct Inner {
    state: ModelState,
    model: Option<Arc<LoadedModel>>,
    /// The running load, if any
    in_flight: Option<LoadWatch>,
    /// Completed load attempts, successful or not
    attempts: u64,
}

impl Inner {
    fn apply(&mut self, event: LifecycleEvent) -> Result<()> {
        let next = self.state.transition(event)?;
        debug!(from = %self.state, to = %next, "model state transition");
        self.state = next;
        Ok(())
    }
}

/// Shared model handle with at-most-one concurrent load
pub struct ModelLifecycle {
    provisioner: AssetProvisioner,
    loader: Arc<dyn RuntimeLoader>,
    lazy_load: bool,
    inner: Arc<RwLock<Inner>>,
    warmups: Arc<AtomicUsize>,
}

impl ModelLifecycle {
    pub fn new(provisioner: AssetProvisioner, loader: Arc<dyn RuntimeLoader>) -> Self {
        Self {
            provisioner,
            loader,
            lazy_load: true,
            inner: Arc::new(RwLock::new(Inner {
                state: ModelState::Unloaded,
                model: None,
                in_flight: None,
                attempts: 0,
            })),
            warmups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// When false, `infer()` on a model that is not Ready fails with NotReady
    pub fn with_lazy_load(mut self, lazy_load: bool) -> Self {
        self.lazy_load = lazy_load;
        self
    }

    pub async fn state(&self) -> ModelState {
        self.inner.read().await.state
    }

    /// Number of warm-up passes run so far
    pub fn warmup_count(&self) -> usize {
        self.warmups.load(Ordering::SeqCst)
    }

    /// Completed load attempts, successful or not
    pub async fn load_attempts(&self) -> u64 {
        self.inner.read().await.attempts
    }

    /// Ready model, or None if a load is still needed. Disposed is an error.
    async fn ready_model(&self) -> Result<Option<Arc<LoadedModel>>> {
        let inner = self.inner.read().await;
        match (inner.state, &inner.model) {
            (ModelState::Ready, Some(model)) => Ok(Some(model.clone())),
            (ModelState::Disposed, _) => Err(AnalysisError::NotReady {
                state: ModelState::Disposed.to_string(),
            }),
            _ => Ok(None),
        }
    }

    /// Load the model once; no-op when already Ready.
    ///
    /// The load runs in its own task. Callers only wait on its outcome, so
    /// a caller that is dropped midway never abandons or restarts it, and
    /// concurrent callers all share the one in-flight attempt.
    pub async fn load(&self) -> Result<Arc<LoadedModel>> {
        if let Some(model) = self.ready_model().await? {
            return Ok(model);
        }

        let mut outcome = {
            let mut inner = self.inner.write().await;
            match (inner.state, &inner.model) {
                (ModelState::Ready, Some(model)) => return Ok(model.clone()),
                (ModelState::Disposed, _) => {
                    return Err(AnalysisError::NotReady {
                        state: ModelState::Disposed.to_string(),
                    })
                }
                _ => {}
            }

            match inner.in_flight.clone() {
                Some(in_flight) => in_flight,
                None => {
                    inner.apply(LifecycleEvent::BeginLoad)?;
                    let (tx, rx) = watch::channel(None);
                    inner.in_flight = Some(rx.clone());
                    self.spawn_load(tx);
                    rx
                }
            }
        };

        let shared = outcome
            .wait_for(Option::is_some)
            .await
            .map_err(|_| AnalysisError::ModelLoad("load task ended without a result".to_string()))?
            .clone();

        match shared {
            Some(Ok(model)) => Ok(model),
            Some(Err(e)) => Err(replay(&e)),
            None => Err(AnalysisError::ModelLoad("load task ended without a result".to_string())),
        }
    }

    fn spawn_load(&self, tx: watch::Sender<Option<LoadOutcome>>) {
        let provisioner = self.provisioner.clone();
        let loader = self.loader.clone();
        let inner = self.inner.clone();
        let warmups = self.warmups.clone();

        info!("loading model");
        tokio::spawn(async move {
            let result = load_and_warm_up(provisioner, loader, warmups).await;

            let mut inner = inner.write().await;
            inner.attempts += 1;
            inner.in_flight = None;

            let outcome: LoadOutcome = if inner.state == ModelState::Disposed {
                debug!("model disposed while loading, discarding result");
                Err(Arc::new(AnalysisError::NotReady {
                    state: ModelState::Disposed.to_string(),
                }))
            } else {
                match result {
                    Ok(model) => {
                        let model = Arc::new(model);
                        match inner.apply(LifecycleEvent::LoadSucceeded) {
                            Ok(()) => {
                                inner.model = Some(model.clone());
                                info!(labels = model.labels().len(), input = ?model.descriptor().input.dims(), "model ready");
                                Ok(model)
                            }
                            Err(e) => Err(Arc::new(e)),
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, kind = e.kind(), "model load failed");
                        if let Err(transition) = inner.apply(LifecycleEvent::LoadFailed) {
                            warn!(error = %transition, "cannot record load failure");
                        }
                        Err(Arc::new(e))
                    }
                }
            };

            // Waiters may all be gone; the outcome is already recorded above.
            let _ = tx.send(Some(outcome));
        });
    }

    /// Ready model for this call, loading first when lazy loading is on
    pub async fn acquire(&self) -> Result<Arc<LoadedModel>> {
        if let Some(model) = self.ready_model().await? {
            return Ok(model);
        }
        if self.lazy_load {
            return self.load().await;
        }
        Err(AnalysisError::NotReady {
            state: self.state().await.to_string(),
        })
    }

    /// Run one forward pass.
    ///
    /// Passes run concurrently on the blocking pool; the candle runtime is
    /// reentrant so no execution slot is needed.
    pub async fn infer(&self, input: Tensor) -> Result<Vec<f32>> {
        let model = self.acquire().await?;
        tokio::task::spawn_blocking(move || {
            executor::execute(model.runtime.as_ref(), &model.descriptor, input)
        })
        .await
        .map_err(|e| AnalysisError::ModelLoad(format!("inference task aborted: {}", e)))?
    }

    /// Release the model; every later `infer()` fails with NotReady.
    ///
    /// A load still in flight finishes in the background and its result is
    /// dropped.
    pub async fn dispose(&self) {
        let mut inner = self.inner.write().await;
        inner.model = None;
        if inner.apply(LifecycleEvent::Dispose).is_ok() {
            info!("model disposed");
        }
    }
}

async fn load_and_warm_up(
    provisioner: AssetProvisioner,
    loader: Arc<dyn RuntimeLoader>,
    warmups: Arc<AtomicUsize>,
) -> Result<LoadedModel> {
    let assets: ProvisionedAssets = provisioner.ensure().await?;
    let descriptor = ModelDescriptor::read(&assets).await?;

    let model = tokio::task::spawn_blocking(move || -> Result<LoadedModel> {
        let runtime = loader.load(&assets, &descriptor)?;
        let zeros = Tensor::zeros(descriptor.input.dims().as_slice(), DType::F32, &Device::Cpu)?;
        executor::execute(runtime.as_ref(), &descriptor, zeros).map_err(|e| {
            AnalysisError::ModelLoad(format!("warm-up inference failed: {}", e))
        })?;
        Ok(LoadedModel { descriptor, runtime })
    })
    .await
    .map_err(|e| AnalysisError::ModelLoad(format!("load task aborted: {}", e)))??;

    warmups.fetch_add(1, Ordering::SeqCst);
    debug!("warm-up inference complete");
    Ok(model)
}

/// Rebuild a shared load error for one waiter; kinds the caller can act on
/// are kept, everything else reads as a model load failure.
fn replay(error: &AnalysisError) -> AnalysisError {
    match error {
        AnalysisError::Provision { asset, reason } => AnalysisError::Provision {
            asset: asset.clone(),
            reason: reason.clone(),
        },
        AnalysisError::NotReady { state } => AnalysisError::NotReady { state: state.clone() },
        AnalysisError::ModelLoad(message) => AnalysisError::ModelLoad(message.clone()),
        other => AnalysisError::ModelLoad(other.to_string()),
    }
}
