//! Integration tests for the on-device model path
//!
//! Covers provisioning, single-flight loading, disposal and a real candle
//! classifier built from safetensors written at test time.

use candle_core::{DType, Device, Tensor};
use eyecheck::{
    assets::{AssetProvisioner, AssetSet, ProvisionedAssets},
    errors::Result,
    model::{InferenceRuntime, ModelDescriptor, ModelLifecycle, ModelState, RuntimeLoader},
    AnalysisError, EyeAnalyzer,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const LABELS: [&str; 2] = ["Cataract", "Normal"];

struct FixedRuntime(Vec<f32>);

impl InferenceRuntime for FixedRuntime {
    fn forward(&self, _input: &Tensor) -> Result<Tensor> {
        Ok(Tensor::from_vec(self.0.clone(), (1, self.0.len()), &Device::Cpu)?)
    }
}

/// Counts loads and sleeps so concurrent callers overlap
struct CountingLoader {
    loads: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    delay: Duration,
    fail: bool,
}

impl CountingLoader {
    fn new() -> Self {
        Self::with_delay(Duration::from_millis(50))
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            delay,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl RuntimeLoader for CountingLoader {
    fn load(
        &self,
        _assets: &ProvisionedAssets,
        _descriptor: &ModelDescriptor,
    ) -> Result<Arc<dyn InferenceRuntime>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(AnalysisError::ModelLoad("corrupt weights".to_string()));
        }
        Ok(Arc::new(FixedRuntime(vec![0.25, 0.75])))
    }
}

struct Fixture {
    bundle: TempDir,
    cache: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let bundle = tempfile::tempdir().unwrap();
        let metadata = serde_json::json!({
            "labels": LABELS,
            "imageSize": 4,
            "channels": 3,
        });
        std::fs::write(bundle.path().join("metadata.json"), metadata.to_string()).unwrap();
        std::fs::write(bundle.path().join("model.json"), r#"{"hidden": []}"#).unwrap();
        std::fs::write(bundle.path().join("weights.safetensors"), b"placeholder").unwrap();

        Self {
            bundle,
            cache: tempfile::tempdir().unwrap(),
        }
    }

    fn provisioner(&self) -> AssetProvisioner {
        AssetProvisioner::new(
            self.bundle.path(),
            self.cache.path().join("model"),
            AssetSet {
                descriptor: "model.json".to_string(),
                metadata: "metadata.json".to_string(),
                weights: vec!["weights.safetensors".to_string()],
            },
        )
    }

    fn lifecycle(&self, loader: Arc<CountingLoader>) -> ModelLifecycle {
        ModelLifecycle::new(self.provisioner(), loader)
    }
}

fn zeros() -> Tensor {
    Tensor::zeros((1, 4, 4, 3), DType::F32, &Device::Cpu).unwrap()
}

fn write_png(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("eye.png");
    image::RgbImage::from_pixel(8, 8, image::Rgb([120, 60, 30]))
        .save(&path)
        .unwrap();
    path
}

#[tokio::test]
async fn test_concurrent_first_loads_warm_up_once() {
    let fixture = Fixture::new();
    let loader = Arc::new(CountingLoader::new());
    let lifecycle = Arc::new(fixture.lifecycle(loader.clone()));

    let (a, b) = tokio::join!(lifecycle.load(), lifecycle.load());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(loader.loads(), 1);
    assert_eq!(lifecycle.warmup_count(), 1);
    assert_eq!(lifecycle.state().await, ModelState::Ready);

    // Already Ready: no further loads
    lifecycle.load().await.unwrap();
    assert_eq!(loader.loads(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_analyses_share_one_load() {
    let fixture = Fixture::new();
    let image = write_png(fixture.cache.path());
    let loader = Arc::new(CountingLoader::new());
    let lifecycle = Arc::new(fixture.lifecycle(loader.clone()));
    let analyzer = Arc::new(EyeAnalyzer::with_model(lifecycle.clone()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let analyzer = analyzer.clone();
            let image = image.clone();
            tokio::spawn(async move { analyzer.analyze(image).await })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap();
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.primary().condition, "Normal");
        assert_eq!(outcome.confidence(), 75.0);
    }
    assert_eq!(loader.loads(), 1);
    assert_eq!(lifecycle.warmup_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_load_is_not_restarted() {
    let fixture = Fixture::new();
    let loader = Arc::new(CountingLoader::with_delay(Duration::from_millis(400)));
    let lifecycle = fixture.lifecycle(loader.clone());

    let abandoned = tokio::time::timeout(Duration::from_millis(100), lifecycle.load()).await;
    assert!(abandoned.is_err());
    assert_eq!(lifecycle.state().await, ModelState::Loading);

    let model = lifecycle.load().await.unwrap();
    assert_eq!(model.labels()[0], "Cataract");
    assert_eq!(loader.loads(), 1);
    assert_eq!(loader.max_concurrent(), 1);
    assert_eq!(lifecycle.warmup_count(), 1);
    assert_eq!(lifecycle.load_attempts().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_analysis_timeout_during_first_load_keeps_single_load() {
    let fixture = Fixture::new();
    let image = write_png(fixture.cache.path());
    let loader = Arc::new(CountingLoader::with_delay(Duration::from_millis(400)));
    let lifecycle = Arc::new(fixture.lifecycle(loader.clone()));

    let impatient = EyeAnalyzer::with_model(lifecycle.clone()).with_timeout(Duration::from_millis(100));
    assert!(impatient.analyze(image.clone()).await.is_fallback());

    let patient = EyeAnalyzer::with_model(lifecycle.clone());
    let outcome = patient.analyze(image).await;
    assert!(!outcome.is_fallback());
    assert_eq!(outcome.primary().condition, "Normal");
    assert_eq!(loader.loads(), 1);
    assert_eq!(loader.max_concurrent(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispose_during_load_discards_model() {
    let fixture = Fixture::new();
    let loader = Arc::new(CountingLoader::with_delay(Duration::from_millis(300)));
    let lifecycle = Arc::new(fixture.lifecycle(loader.clone()));

    let waiter = {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move { lifecycle.load().await.map(|_| ()) })
    };
    while lifecycle.state().await != ModelState::Loading {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    lifecycle.dispose().await;

    let err = waiter.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), "not_ready");
    assert_eq!(lifecycle.state().await, ModelState::Disposed);
    assert_eq!(loader.loads(), 1);
}

#[tokio::test]
async fn test_loaded_model_debug_omits_runtime() {
    let fixture = Fixture::new();
    let lifecycle = fixture.lifecycle(Arc::new(CountingLoader::new()));

    let model = lifecycle.load().await.unwrap();
    let rendered = format!("{:?}", model);
    assert!(rendered.starts_with("LoadedModel"));
    assert!(rendered.contains("Cataract"));
    assert!(!rendered.contains("runtime"));
}

#[tokio::test]
async fn test_failed_load_is_shared_then_retried() {
    let fixture = Fixture::new();
    let loader = Arc::new(CountingLoader::failing());
    let lifecycle = fixture.lifecycle(loader.clone());

    let (a, b) = tokio::join!(lifecycle.load(), lifecycle.load());
    assert_eq!(a.unwrap_err().kind(), "model_load");
    assert_eq!(b.unwrap_err().kind(), "model_load");
    assert_eq!(loader.loads(), 1);
    assert_eq!(lifecycle.state().await, ModelState::Failed);
    assert_eq!(lifecycle.warmup_count(), 0);

    // A later call starts a fresh attempt
    assert!(lifecycle.load().await.is_err());
    assert_eq!(loader.loads(), 2);
}

#[tokio::test]
async fn test_missing_bundle_is_a_provision_error() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.bundle.path().join("weights.safetensors")).unwrap();
    let loader = Arc::new(CountingLoader::new());
    let lifecycle = fixture.lifecycle(loader.clone());

    let err = lifecycle.load().await.unwrap_err();
    assert_eq!(err.kind(), "provision");
    assert_eq!(loader.loads(), 0);
    assert_eq!(lifecycle.state().await, ModelState::Failed);
}

#[tokio::test]
async fn test_infer_after_dispose_is_not_ready() {
    let fixture = Fixture::new();
    let loader = Arc::new(CountingLoader::new());
    let lifecycle = fixture.lifecycle(loader.clone());

    assert_eq!(lifecycle.infer(zeros()).await.unwrap(), vec![0.25, 0.75]);
    lifecycle.dispose().await;
    assert_eq!(lifecycle.state().await, ModelState::Disposed);

    let err = lifecycle.infer(zeros()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::NotReady { .. }));
    assert_eq!(lifecycle.load().await.unwrap_err().kind(), "not_ready");
    assert_eq!(loader.loads(), 1);

    // Disposing twice is harmless
    lifecycle.dispose().await;
    assert_eq!(lifecycle.state().await, ModelState::Disposed);
}

#[tokio::test]
async fn test_eager_mode_requires_explicit_load() {
    let fixture = Fixture::new();
    let loader = Arc::new(CountingLoader::new());
    let lifecycle = fixture.lifecycle(loader.clone()).with_lazy_load(false);

    let err = lifecycle.infer(zeros()).await.unwrap_err();
    assert_eq!(err.kind(), "not_ready");
    assert_eq!(loader.loads(), 0);

    lifecycle.load().await.unwrap();
    assert_eq!(lifecycle.infer(zeros()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_wrong_input_shape_is_rejected() {
    let fixture = Fixture::new();
    let lifecycle = fixture.lifecycle(Arc::new(CountingLoader::new()));

    let wrong = Tensor::zeros((1, 8, 8, 3), DType::F32, &Device::Cpu).unwrap();
    let err = lifecycle.infer(wrong).await.unwrap_err();
    match err {
        AnalysisError::ShapeMismatch { expected, actual } => {
            assert_eq!(expected, vec![1, 4, 4, 3]);
            assert_eq!(actual, vec![1, 8, 8, 3]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_candle_classifier_end_to_end() {
    let fixture = Fixture::new();

    // No hidden layers: zero weights leave softmax(bias), so the bias
    // fixes the output at [0.87, 0.13] for any input.
    let mut tensors = HashMap::new();
    tensors.insert(
        "head.weight".to_string(),
        Tensor::zeros((2, 4 * 4 * 3), DType::F32, &Device::Cpu).unwrap(),
    );
    tensors.insert(
        "head.bias".to_string(),
        Tensor::new(&[0.87f32.ln(), 0.13f32.ln()], &Device::Cpu).unwrap(),
    );
    candle_core::safetensors::save(&tensors, fixture.bundle.path().join("weights.safetensors")).unwrap();

    let lifecycle = Arc::new(ModelLifecycle::new(
        fixture.provisioner(),
        Arc::new(eyecheck::model::CandleLoader::new()),
    ));
    let analyzer = EyeAnalyzer::with_model(lifecycle.clone());
    let image = write_png(fixture.cache.path());

    analyzer.warm_up().await.unwrap();
    assert_eq!(lifecycle.warmup_count(), 1);

    let outcome = analyzer.analyze(image.clone()).await;
    assert!(!outcome.is_fallback());
    assert_eq!(outcome.primary().condition, "Cataract");
    assert_eq!(outcome.confidence(), 87.0);
    assert_eq!(outcome.other_possibilities()[0].condition, "Normal");
    assert_eq!(outcome.other_possibilities()[0].probability, 13.0);

    analyzer.shutdown().await;
    assert_eq!(lifecycle.state().await, ModelState::Disposed);
    assert!(analyzer.analyze(image).await.is_fallback());
}

#[tokio::test]
async fn test_undecodable_image_falls_back() {
    let fixture = Fixture::new();
    let analyzer = EyeAnalyzer::with_model(Arc::new(fixture.lifecycle(Arc::new(CountingLoader::new()))));

    let err = analyzer
        .try_analyze(&eyecheck::ImageSource::Bytes(b"not an image".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "preprocess");
    assert!(analyzer.analyze(b"not an image".to_vec()).await.is_fallback());
}
