use std::path::Path;

use super::asr_engine::{AsrEngine, EngineError, EngineHandle};
use super::inference_options::InferenceOptions;
use super::model_tier::ModelTier;
use super::segment::RawResult;

/// Scoped ownership of a loaded engine handle.
///
/// The handle is released exactly once: explicitly via [`EngineLease::release`],
/// or on drop, which also covers early returns and unwinding panics.
pub struct EngineLease {
    handle: Box<dyn EngineHandle>,
    tier: ModelTier,
    released: bool,
}

impl EngineLease {
    pub fn acquire(engine: &dyn AsrEngine, tier: ModelTier) -> Result<Self, EngineError> {
        log::info!("Loading {tier} model");
        let handle = engine.load_engine(tier)?;
        Ok(Self {
            handle,
            tier,
            released: false,
        })
    }

    pub fn tier(&self) -> ModelTier {
        self.tier
    }

    pub fn infer(
        &mut self,
        audio_path: &Path,
        options: &InferenceOptions,
    ) -> Result<RawResult, EngineError> {
        self.handle.infer(audio_path, options)
    }

    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        log::info!("Releasing {} model", self.tier);
        self.handle.release();
    }
}

impl Drop for EngineLease {
    fn drop(&mut self) {
        self.release_once();
    }
}

/// Load an engine for `tier`, run `f` with it, and release it whether `f`
/// returns `Ok`, returns `Err`, or panics.
pub fn with_engine<T, F>(engine: &dyn AsrEngine, tier: ModelTier, f: F) -> Result<T, EngineError>
where
    F: FnOnce(&mut EngineLease) -> Result<T, EngineError>,
{
    let mut lease = EngineLease::acquire(engine, tier)?;
    let outcome = f(&mut lease);
    lease.release();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counters {
        loads: AtomicUsize,
        releases: AtomicUsize,
    }

    struct CountingEngine {
        counters: Arc<Counters>,
        fail_load: bool,
    }

    struct CountingHandle {
        counters: Arc<Counters>,
    }

    impl AsrEngine for CountingEngine {
        fn load_engine(&self, tier: ModelTier) -> Result<Box<dyn EngineHandle>, EngineError> {
            self.counters.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_load {
                return Err(EngineError::Load {
                    tier,
                    message: "weights missing".to_string(),
                });
            }
            Ok(Box::new(CountingHandle {
                counters: self.counters.clone(),
            }))
        }
    }

    impl EngineHandle for CountingHandle {
        fn infer(&mut self, _: &Path, _: &InferenceOptions) -> Result<RawResult, EngineError> {
            Ok(RawResult::default())
        }

        fn release(&mut self) {
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn engine(fail_load: bool) -> (CountingEngine, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (
            CountingEngine {
                counters: counters.clone(),
                fail_load,
            },
            counters,
        )
    }

    #[test]
    fn test_with_engine_releases_after_success() {
        let (engine, counters) = engine(false);
        let out = with_engine(&engine, ModelTier::Base, |lease| {
            assert_eq!(lease.tier(), ModelTier::Base);
            assert_eq!(counters.releases.load(Ordering::SeqCst), 0);
            Ok(42)
        });
        assert_eq!(out.unwrap(), 42);
        assert_eq!(counters.loads.load(Ordering::SeqCst), 1);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_with_engine_releases_after_error() {
        let (engine, counters) = engine(false);
        let out: Result<(), _> = with_engine(&engine, ModelTier::Tiny, |_| {
            Err(EngineError::Infer("corrupt audio".to_string()))
        });
        assert!(matches!(out, Err(EngineError::Infer(_))));
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_with_engine_releases_during_panic() {
        let (engine, counters) = engine(false);
        let caught = catch_unwind(AssertUnwindSafe(|| {
            let _: Result<(), EngineError> =
                with_engine(&engine, ModelTier::Small, |_| panic!("engine blew up"));
        }));
        assert!(caught.is_err());
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_releases_nothing() {
        let (engine, counters) = engine(true);
        let out: Result<(), _> = with_engine(&engine, ModelTier::Large, |_| Ok(()));
        assert!(matches!(out, Err(EngineError::Load { .. })));
        assert_eq!(counters.loads.load(Ordering::SeqCst), 1);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_explicit_release_then_drop_releases_once() {
        let (engine, counters) = engine(false);
        let lease = EngineLease::acquire(&engine, ModelTier::Base).unwrap();
        lease.release();
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let (engine, counters) = engine(false);
        {
            let _lease = EngineLease::acquire(&engine, ModelTier::Base).unwrap();
        }
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }
}
