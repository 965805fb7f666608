//! Behaviour-driven coverage for the locale resolver.
//!
//! Scenarios drive language changes through a scripted bundle source so late
//! responses, missing bundles, and aliases can be reproduced deterministically.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use common::i18n::testing::{ScriptHandle, ScriptedSource, StepValue};
use common::i18n::{
    LoadOutcome, LocaleRegistry, LocaleResolver, MemoryStore, PREFERENCE_KEY, PendingLoad,
    PreferenceStore, StaticSource,
};
use logtest::Logger;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::{Builder, Runtime};


const EN: &str = include_str!("../../locales/en.json");
const HI: &str = include_str!("../../locales/hi.json");
const UR: &str = include_str!("../../locales/ur.json");

fn document(code: &str) -> &'static str {
    match code {
        "en" => EN,
        "hi" => HI,
        "ur" => UR,
        other => panic!("no bundle document for `{other}`"),
    }
}

struct ResolverWorld {
    runtime: Runtime,
    source: Arc<ScriptedSource>,
    store: Arc<MemoryStore>,
    missing: RefCell<HashSet<String>>,
    gates: RefCell<HashMap<String, ScriptHandle>>,
    pending: RefCell<HashMap<String, PendingLoad>>,
    outcomes: RefCell<HashMap<String, LoadOutcome>>,
    resolver: RefCell<Option<LocaleResolver>>,
}

#[fixture]
fn world() -> ResolverWorld {
    ResolverWorld {
        runtime: Builder::new_current_thread()
            .build()
            .expect("current-thread runtime"),
        source: Arc::new(ScriptedSource::new()),
        store: Arc::new(MemoryStore::new()),
        missing: RefCell::new(HashSet::new()),
        gates: RefCell::new(HashMap::new()),
        pending: RefCell::new(HashMap::new()),
        outcomes: RefCell::new(HashMap::new()),
        resolver: RefCell::new(None),
    }
}

impl ResolverWorld {
    fn resolver(&self) -> LocaleResolver {
        self.resolver
            .borrow_mut()
            .get_or_insert_with(|| {
                for code in ["en", "hi", "ur"] {
                    if !self.missing.borrow().contains(code) {
                        self.source.ready(code, document(code));
                    }
                }
                let registry = LocaleRegistry::standard_with(Arc::clone(&self.source));
                let store: Arc<dyn PreferenceStore> = self.store.clone();
                LocaleResolver::with_shared_store(registry, store)
            })
            .clone()
    }

    fn run(&self, code: &str, pending: PendingLoad) {
        let outcome = self.runtime.block_on(pending.finish());
        self.outcomes.borrow_mut().insert(code.to_owned(), outcome);
    }
}

#[given("the standard bundles are available")]
fn standard_bundles(world: &ResolverWorld) {
    world.missing.borrow_mut().clear();
}

#[given("the {code} bundle is missing")]
fn bundle_missing(world: &ResolverWorld, code: StepValue) {
    world.missing.borrow_mut().insert(code.into_inner());
}

#[given("the {code} bundle is delayed")]
fn bundle_delayed(world: &ResolverWorld, code: StepValue) {
    let code = code.into_inner();
    let handle = world.source.script(code.as_str());
    world.gates.borrow_mut().insert(code, handle);
}

#[given("the stored preference is {value}")]
fn stored_preference(world: &ResolverWorld, value: StepValue) {
    world
        .store
        .set(PREFERENCE_KEY, value.as_str())
        .expect("memory writes succeed");
}

#[when("the resolver initializes")]
fn initialize(world: &ResolverWorld) {
    let pending = world.resolver().initialize();
    let code = pending.language().code();
    world.run(code, pending);
}

#[when("the user requests {code}")]
fn request(world: &ResolverWorld, code: StepValue) {
    let code = code.into_inner();
    let Some(pending) = world.resolver().change_language(&code) else {
        return;
    };

    if world.gates.borrow().contains_key(&code) {
        world.pending.borrow_mut().insert(code, pending);
    } else {
        world.run(&code, pending);
    }
}

#[when("the {code} bundle arrives")]
fn bundle_arrives(world: &ResolverWorld, code: StepValue) {
    let code = code.into_inner();
    let handle = world
        .gates
        .borrow_mut()
        .remove(&code)
        .unwrap_or_else(|| panic!("`{code}` should have been delayed"));
    handle.deliver(document(&code));

    let pending = world
        .pending
        .borrow_mut()
        .remove(&code)
        .unwrap_or_else(|| panic!("`{code}` should have been requested"));
    world.run(&code, pending);
}

#[then("the current language is {code}")]
fn assert_language(world: &ResolverWorld, code: StepValue) {
    assert_eq!(world.resolver().current_language().code(), code.as_str());
}

#[then("the key {key} translates to {value}")]
fn assert_translation(world: &ResolverWorld, key: StepValue, value: StepValue) {
    assert_eq!(world.resolver().t(key.as_str()), value.as_str());
}

#[then("the resolver is not loading")]
fn assert_not_loading(world: &ResolverWorld) {
    assert!(!world.resolver().is_loading());
}

#[then("the bundle in use is {code}")]
fn assert_bundle_language(world: &ResolverWorld, code: StepValue) {
    let served = world
        .resolver()
        .bundle_language()
        .expect("a bundle should be installed");
    assert_eq!(served.code(), code.as_str());
}

#[then("the fallback bundle is in use")]
fn assert_fallback(world: &ResolverWorld) {
    assert!(world.resolver().used_fallback());
}

#[then("the fallback bundle is not in use")]
fn assert_no_fallback(world: &ResolverWorld) {
    assert!(!world.resolver().used_fallback());
}

#[then("the late {code} response was discarded")]
fn assert_discarded(world: &ResolverWorld, code: StepValue) {
    let outcomes = world.outcomes.borrow();
    let outcome = outcomes
        .get(code.as_str())
        .unwrap_or_else(|| panic!("`{}` should have completed", code.as_str()));
    assert!(matches!(outcome, LoadOutcome::Superseded { .. }));
}

#[then("the preference {value} is recorded")]
fn assert_recorded(world: &ResolverWorld, value: StepValue) {
    assert_eq!(
        world.store.get(PREFERENCE_KEY).as_deref(),
        Some(value.as_str())
    );
}

#[then("no preference is recorded")]
fn assert_nothing_recorded(world: &ResolverWorld) {
    assert_eq!(world.store.get(PREFERENCE_KEY), None);
}

#[scenario("tests/features/resolver_behaviour.feature", index = 0)]
fn scenario_fresh_start(world: ResolverWorld) {
    let _ = world;
}

#[scenario("tests/features/resolver_behaviour.feature", index = 1)]
fn scenario_restores_preference(world: ResolverWorld) {
    let _ = world;
}

#[scenario("tests/features/resolver_behaviour.feature", index = 2)]
fn scenario_unknown_codes(world: ResolverWorld) {
    let _ = world;
}

#[scenario("tests/features/resolver_behaviour.feature", index = 3)]
fn scenario_aliases(world: ResolverWorld) {
    let _ = world;
}

#[scenario("tests/features/resolver_behaviour.feature", index = 4)]
fn scenario_last_request_wins(world: ResolverWorld) {
    let _ = world;
}

#[scenario("tests/features/resolver_behaviour.feature", index = 5)]
fn scenario_fallback(world: ResolverWorld) {
    let _ = world;
}

#[test]
fn failed_load_warns_before_falling_back() {
    let mut logger = Logger::start();
    let registry = LocaleRegistry::standard_with(StaticSource::new().with("en", EN));
    let resolver = LocaleResolver::new(registry, MemoryStore::new());
    let runtime = Builder::new_current_thread()
        .build()
        .expect("current-thread runtime");

    let pending = resolver.change_language("hi").expect("hi is registered");
    let outcome = runtime.block_on(pending.finish());
    assert!(matches!(outcome, LoadOutcome::Installed { .. }));
    assert_eq!(resolver.t("navigation.home"), "Home");

    let mut warned = false;
    while let Some(record) = logger.pop() {
        if record.target() == "i18n::resolver"
            && record
                .args()
                .to_string()
                .contains("failed to load `hi` bundle")
        {
            warned = true;
            break;
        }
    }

    assert!(warned, "expected the fallback warning to be logged");
}
