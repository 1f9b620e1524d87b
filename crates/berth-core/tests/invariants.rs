//! Property tests: the delegate's structural invariants hold at every
//! observable point, for duplicate-heavy legal callback sequences and for
//! outright hostile orderings.

mod common;

use std::sync::Arc;

use berth_core::{
    DelegatePhase, EngineCache, EngineGroup, Host, LifecycleDelegate, ViewContainer,
};
use common::RecordingHost;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Create,
    CreateView,
    Start,
    Resume,
    Pause,
    Stop,
    DestroyView,
    Destroy,
}

const ALL_OPS: [Op; 8] = [
    Op::Create,
    Op::CreateView,
    Op::Start,
    Op::Resume,
    Op::Pause,
    Op::Stop,
    Op::DestroyView,
    Op::Destroy,
];

fn apply<H: Host>(delegate: &mut LifecycleDelegate<H>, op: Op) {
    match op {
        Op::Create => delegate.on_create(None),
        Op::CreateView => {
            let _ = delegate.on_create_view(&ViewContainer::new(), None);
        }
        Op::Start => delegate.on_start(),
        Op::Resume => delegate.on_resume(),
        Op::Pause => delegate.on_pause(),
        Op::Stop => delegate.on_stop(),
        Op::DestroyView => delegate.on_destroy_view(),
        Op::Destroy => delegate.on_destroy(),
    }
}

/// I1: platform plugin ⇒ view ⇒ engine, plus phase/resource agreement.
fn assert_structural_invariants<H: Host>(delegate: &LifecycleDelegate<H>) {
    if delegate.platform_plugin().is_some() {
        assert!(
            delegate.surface().is_some(),
            "platform plugin without a surface"
        );
    }
    if delegate.surface().is_some() {
        assert!(delegate.engine().is_some(), "surface without an engine");
    }

    match delegate.phase() {
        DelegatePhase::ViewAttached => {
            assert!(delegate.surface().is_some());
            assert!(delegate.platform_plugin().is_some());
        }
        DelegatePhase::Detached => {
            assert!(delegate.surface().is_none());
            assert!(delegate.platform_plugin().is_none());
            assert!(delegate.engine().is_none());
        }
        DelegatePhase::Created | DelegatePhase::ViewDetached => {
            assert!(delegate.surface().is_none());
            assert!(delegate.platform_plugin().is_none());
        }
    }

    // I3: the delegate's surface is the one the engine is bound to.
    if let (Some(engine), Some(surface)) = (delegate.engine(), delegate.surface()) {
        assert_eq!(engine.attached_surface(), Some(surface.id()));
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop::sample::select(ALL_OPS.to_vec())
}

/// A legal-order lifecycle with each stage delivered 0..=3 times.
fn duplicate_heavy_sequence() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(0_usize..=3, 8).prop_map(|counts| {
        ALL_OPS
            .iter()
            .zip(counts)
            .flat_map(|(op, count)| std::iter::repeat_n(*op, count))
            .collect()
    })
}

proptest! {
    /// Legal-order callbacks with duplicate deliveries: invariants hold
    /// after every step, and the configurator never runs twice.
    #[test]
    fn duplicate_deliveries_preserve_invariants(ops in duplicate_heavy_sequence()) {
        let mut delegate = LifecycleDelegate::new(RecordingHost::new().with_configurator());
        let created = ops.contains(&Op::Create);
        let destroyed = ops.contains(&Op::Destroy);

        for op in &ops {
            apply(&mut delegate, *op);
            assert_structural_invariants(&delegate);
        }

        let configure_calls = delegate.host().configure_count();
        prop_assert!(configure_calls <= 1);
        if created {
            prop_assert_eq!(configure_calls, 1);
        }
        if destroyed {
            prop_assert_eq!(delegate.phase(), DelegatePhase::Detached);
            prop_assert!(delegate.engine().is_none());
        }
    }

    /// Arbitrary (even illegal) orderings never panic and never break the
    /// structural invariants; the guards turn bad calls into no-ops.
    #[test]
    fn hostile_orderings_are_harmless(ops in proptest::collection::vec(op_strategy(), 0..48)) {
        let mut delegate = LifecycleDelegate::new(RecordingHost::new());
        for op in ops {
            apply(&mut delegate, op);
            assert_structural_invariants(&delegate);
        }
    }

    /// Cached-engine delegates never destroy the shared engine, whatever
    /// the callback ordering.
    #[test]
    fn cached_engine_survives_any_ordering(ops in proptest::collection::vec(op_strategy(), 0..48)) {
        let cache = Arc::new(EngineCache::new());
        let group = Arc::new(EngineGroup::new());
        let mut delegate = LifecycleDelegate::with_runtime(
            RecordingHost::new().cached("shared"),
            Arc::clone(&cache),
            group,
        );

        for op in ops {
            apply(&mut delegate, op);
            assert_structural_invariants(&delegate);
            if let Some(engine) = cache.get("shared") {
                prop_assert!(!engine.is_destroyed());
            }
        }
    }
}
