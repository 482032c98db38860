use city_home_service::config;
use tracing::subscriber::NoSubscriber;

fn subscriber_installed() -> bool {
    tracing::dispatcher::get_default(|dispatch| !dispatch.is::<NoSubscriber>())
}

// Runs alone in this binary so the global subscriber starts unset.
#[test]
fn fallback_tracing_installs_a_subscriber() {
    assert!(!subscriber_installed());
    config::init_fallback_tracing();
    assert!(subscriber_installed());

    // a later configured init must not panic
    config::init_tracing("debug", true);
}
