//! Behaviour-driven coverage for dotted key lookup.

use std::cell::RefCell;

use common::i18n::Bundle;
use common::i18n::testing::StepValue;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};


#[derive(Default)]
struct LookupWorld {
    bundle: RefCell<Option<Bundle>>,
    result: RefCell<Option<String>>,
}

#[fixture]
fn world() -> LookupWorld {
    LookupWorld::default()
}

impl LookupWorld {
    fn translate(&self, key: &str, fallback: Option<&str>) {
        let result = self
            .bundle
            .borrow()
            .as_ref()
            .map(|bundle| bundle.translate(key, fallback))
            .unwrap_or_else(|| panic!("a bundle should have been prepared"));
        self.result.replace(Some(result));
    }
}

/// Build a bundle holding a single string at a dotted path.
fn nested(path: &str, value: &str) -> Bundle {
    let document = path.rsplit('.').fold(serde_value(value), |inner, segment| {
        format!("{{{}: {inner}}}", serde_value(segment))
    });
    Bundle::from_json("scenario", &document).expect("scenario bundle parses")
}

fn serde_value(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[given("a bundle where {path} is {value}")]
fn bundle_with(world: &LookupWorld, path: StepValue, value: StepValue) {
    world
        .bundle
        .replace(Some(nested(path.as_str(), value.as_str())));
}

#[given("the embedded English bundle")]
fn embedded_english(world: &LookupWorld) {
    let bundle = Bundle::from_json("en", include_str!("../../locales/en.json"))
        .expect("English bundle parses");
    world.bundle.replace(Some(bundle));
}

#[when("the key {key} is looked up")]
fn look_up(world: &LookupWorld, key: StepValue) {
    world.translate(key.as_str(), None);
}

#[when("the key {key} is looked up with fallback {fallback}")]
fn look_up_with_fallback(world: &LookupWorld, key: StepValue, fallback: StepValue) {
    world.translate(key.as_str(), Some(fallback.as_str()));
}

#[then("the lookup yields {expected}")]
fn assert_result(world: &LookupWorld, expected: StepValue) {
    let result = world.result.borrow().clone();
    assert_eq!(result.as_deref(), Some(expected.as_str()));
}

#[scenario("tests/features/lookup.feature", index = 0)]
fn scenario_nested(world: LookupWorld) {
    let _ = world;
}

#[scenario("tests/features/lookup.feature", index = 1)]
fn scenario_echo(world: LookupWorld) {
    let _ = world;
}

#[scenario("tests/features/lookup.feature", index = 2)]
fn scenario_fallback(world: LookupWorld) {
    let _ = world;
}

#[scenario("tests/features/lookup.feature", index = 3)]
fn scenario_mapping_miss(world: LookupWorld) {
    let _ = world;
}

#[scenario("tests/features/lookup.feature", index = 4)]
fn scenario_indexed(world: LookupWorld) {
    let _ = world;
}
