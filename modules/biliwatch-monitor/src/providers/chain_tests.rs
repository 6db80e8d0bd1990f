//! Provider chain tests, end-to-end with fakes.
//!
//! Each test follows MOCK -> FUNCTION -> OUTPUT: script the providers,
//! call search_with_fallback, assert on the tagged result. We never reach
//! into a provider and call its internals.

use std::time::Duration;

use biliwatch_common::ProviderKind;

use crate::pacing::Pacing;
use crate::providers::{search_with_fallback, SearchProvider};
use crate::retry::RetryPolicy;
use crate::testing::{make_record, ScriptedProvider, Step};

fn boxed(providers: Vec<ScriptedProvider>) -> Vec<Box<dyn SearchProvider>> {
    providers
        .into_iter()
        .map(|p| Box::new(p) as Box<dyn SearchProvider>)
        .collect()
}

#[tokio::test]
async fn blocked_primary_falls_through_to_secondary() {
    let api = ScriptedProvider::blocked(ProviderKind::Api);
    let stealth = ScriptedProvider::returning(ProviderKind::Stealth, vec![make_record("BV1aa")]);
    let providers = boxed(vec![api.clone(), stealth.clone()]);
    let retry = RetryPolicy::new(1, Duration::ZERO);

    let result = search_with_fallback(&providers, &retry, &Pacing::none(), "demo", 5).await;

    assert_eq!(result.provider, Some(ProviderKind::Stealth));
    assert_eq!(result.records.len(), 1);
    // The blocked rung burned all its attempts before the chain moved on.
    assert_eq!(api.calls(), 2);
    assert_eq!(stealth.calls(), 1);
}

#[tokio::test]
async fn first_rung_success_short_circuits_the_chain() {
    let api = ScriptedProvider::returning(ProviderKind::Api, vec![make_record("BV1bb")]);
    let stealth = ScriptedProvider::returning(ProviderKind::Stealth, vec![make_record("BV1cc")]);
    let providers = boxed(vec![api.clone(), stealth.clone()]);
    let retry = RetryPolicy::new(1, Duration::ZERO);

    let result = search_with_fallback(&providers, &retry, &Pacing::none(), "demo", 5).await;

    assert_eq!(result.provider, Some(ProviderKind::Api));
    assert_eq!(result.records[0].bvid, "BV1bb");
    assert_eq!(stealth.calls(), 0);
}

#[tokio::test]
async fn exhausted_chain_is_empty_not_an_error() {
    let api = ScriptedProvider::blocked(ProviderKind::Api);
    let stealth = ScriptedProvider::failing(ProviderKind::Stealth);
    let browser = ScriptedProvider::empty(ProviderKind::Browser);
    let providers = boxed(vec![api, stealth, browser]);
    let retry = RetryPolicy::new(2, Duration::ZERO);

    let result = search_with_fallback(&providers, &retry, &Pacing::none(), "demo", 5).await;

    assert_eq!(result.provider, None);
    assert!(result.records.is_empty());
    assert_eq!(result.keyword, "demo");
}

#[tokio::test]
async fn empty_success_falls_through_without_retrying() {
    let api = ScriptedProvider::empty(ProviderKind::Api);
    let stealth = ScriptedProvider::returning(ProviderKind::Stealth, vec![make_record("BV1dd")]);
    let providers = boxed(vec![api.clone(), stealth.clone()]);
    let retry = RetryPolicy::new(3, Duration::ZERO);

    let result = search_with_fallback(&providers, &retry, &Pacing::none(), "demo", 5).await;

    // An empty Ok is a real answer: no retries spent on it.
    assert_eq!(api.calls(), 1);
    assert_eq!(result.provider, Some(ProviderKind::Stealth));
}

#[tokio::test]
async fn recovery_mid_rung_uses_that_rung() {
    let api = ScriptedProvider::new(ProviderKind::Api)
        .step(Step::Transport)
        .step(Step::Records(vec![make_record("BV1ee")]));
    let stealth = ScriptedProvider::returning(ProviderKind::Stealth, vec![make_record("BV1ff")]);
    let providers = boxed(vec![api.clone(), stealth.clone()]);
    let retry = RetryPolicy::new(1, Duration::ZERO);

    let result = search_with_fallback(&providers, &retry, &Pacing::none(), "demo", 5).await;

    assert_eq!(result.provider, Some(ProviderKind::Api));
    assert_eq!(result.records[0].bvid, "BV1ee");
    assert_eq!(api.calls(), 2);
    assert_eq!(stealth.calls(), 0);
}
