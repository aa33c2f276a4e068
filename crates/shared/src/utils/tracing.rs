use std::sync::Once;

#[cfg(feature = "wasm")]
pub fn configure_tracing() {
    use time::format_description::well_known::Iso8601;
    use tracing_subscriber::{
        fmt::{format::Pretty, time::UtcTime},
        layer::SubscriberExt,
        util::SubscriberInitExt,
    };
    use tracing_web::{performance_layer, MakeWebConsoleWriter};

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false) // Only partially supported across browsers
        .with_timer(UtcTime::new(Iso8601::DEFAULT))
        .with_writer(MakeWebConsoleWriter::new()); // write events to the console
    let perf_layer = performance_layer().with_details_from_fields(Pretty::default());

    // Install these as subscribers to tracing events
    tracing_subscriber::registry().with(fmt_layer).with(perf_layer).init();
}

#[cfg(not(feature = "wasm"))]
pub fn configure_tracing() {
    use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::TRACE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_line_number(true)
        .with_file(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_test_writer()
        .finish();

    // Something else (a test harness, the embedding host) may already own the
    // global subscriber
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Configures tracing inside a Once block so multiple calls don't panic
pub fn configure_tracing_once() {
    static ONCE: Once = Once::new();
    ONCE.call_once(configure_tracing);
}
