#![no_main]

use std::sync::Arc;

use berth_core::{
    DelegatePhase, EngineCache, EngineGroup, Host, HostOptions, LifecycleDelegate, RegionHost,
    ViewContainer, WindowHost,
};
use libfuzzer_sys::fuzz_target;

fn check_invariants<H: Host>(delegate: &LifecycleDelegate<H>) {
    if delegate.platform_plugin().is_some() {
        assert!(delegate.surface().is_some());
    }
    if delegate.surface().is_some() {
        assert!(delegate.engine().is_some());
    }
    if delegate.phase() == DelegatePhase::Detached {
        assert!(delegate.engine().is_none());
    }
    if let (Some(engine), Some(surface)) = (delegate.engine(), delegate.surface()) {
        assert_eq!(engine.attached_surface(), Some(surface.id()));
    }
}

fn drive<H: Host>(delegate: &mut LifecycleDelegate<H>, ops: &[u8]) {
    for op in ops {
        match op % 8 {
            0 => delegate.on_create(Some(&[op & 0x7F])),
            1 => {
                let _ = delegate.on_create_view(&ViewContainer::new(), None);
            }
            2 => delegate.on_start(),
            3 => delegate.on_resume(),
            4 => delegate.on_pause(),
            5 => delegate.on_stop(),
            6 => delegate.on_destroy_view(),
            _ => delegate.on_destroy(),
        }
        check_invariants(delegate);
    }
    // Whatever the input did, a final teardown must leave nothing behind.
    delegate.on_destroy_view();
    delegate.on_destroy();
    check_invariants(delegate);
    assert_eq!(delegate.phase(), DelegatePhase::Detached);
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 4_096 {
        return;
    }
    let Some((config, ops)) = data.split_first() else {
        return;
    };

    let cached = config & 1 != 0;
    let windowless = config & 2 != 0;
    let keep_alive = config & 4 != 0;
    let auto_plugins = config & 8 == 0;

    let options = HostOptions {
        cached_engine_id: cached.then(|| format!("fuzz-{}", config >> 4)),
        attach_engine_to_host: keep_alive,
        auto_register_plugins: auto_plugins,
        ..HostOptions::default()
    };

    let cache = Arc::new(EngineCache::new());
    let group = Arc::new(EngineGroup::new());

    if windowless {
        let host = RegionHost::new(options);
        let mut delegate = LifecycleDelegate::with_runtime(host, cache, group);
        drive(&mut delegate, ops);
    } else {
        let host = WindowHost::new(options);
        let mut delegate = LifecycleDelegate::with_runtime(host, cache, group);
        drive(&mut delegate, ops);
    }
});
